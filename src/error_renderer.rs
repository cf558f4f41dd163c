//! Error rendering using ariadne
//!
//! Parse errors carry the text they were raised on, so they render as
//! annotated source snippets. Other errors fall back to their message.

use std::io::Write;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};

use crate::parser::ParseError;
use crate::{ClasspathError, Diagnostic, Error, Severity, TemplateError};

/// Render an error with formatting to stderr
///
/// # Example
/// ```no_run
/// use rewrite_apache::{artifacts, commons::IsNotEmptyToJdk, render_error, rewrite};
///
/// let classpath = artifacts::bundled().unwrap();
/// if let Err(e) = rewrite(&IsNotEmptyToJdk::new().unwrap(), "class A {", &classpath) {
///     render_error(&e);
/// }
/// ```
pub fn render_error(error: &Error) {
    render_error_to_writer(error, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(error: &Error, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, writer, true)
}

/// Render an error to a String (useful for logs and reports)
pub fn render_error_to_string(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// The parse error behind `error`, with the name of the text it came from.
fn parse_error(error: &Error) -> Option<(&str, &ParseError)> {
    match error {
        Error::Parse(err) => Some(("<source>", err)),
        Error::Template(TemplateError::Parse(err)) => Some(("<template>", err)),
        Error::Classpath(ClasspathError::Stubs { artifact, source }) => Some((artifact, source)),
        _ => None,
    }
}

fn render_error_to_writer(
    error: &Error,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match parse_error(error) {
        Some((name, err)) => render_diagnostics(name, &err.source, &error.diagnostics(), writer, use_color),
        None => writeln!(writer, "error: {}", error),
    }
}

fn render_diagnostics(
    name: &str,
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let mut report = Report::build(kind, (name, diag.span.0.clone()))
            .with_message(&diag.message)
            .with_config(ariadne::Config::default().with_color(use_color));

        if let Some(code) = &diag.code {
            report = report.with_code(code);
        }

        let color = colors.next();
        report = report.with_label(
            Label::new((name, diag.span.0.clone()))
                .with_message(&diag.message)
                .with_color(color),
        );

        for related in &diag.related {
            let color = colors.next();
            report = report.with_label(
                Label::new((name, related.span.0.clone()))
                    .with_message(&related.message)
                    .with_color(color),
            );
        }

        if let Some(help) = &diag.help {
            report = report.with_help(help);
        }

        report.finish().write((name, Source::from(source)), &mut *writer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn parse_failure(source: &str) -> Error {
        match parse(source) {
            Ok(_) => panic!("expected a parse error for {source:?}"),
            Err(err) => err.into(),
        }
    }

    #[test]
    fn test_render_parse_error() {
        let error = parse_failure("class A { void f() { int x = ; } }");
        let output = render_error_to_string_no_color(&error);

        assert!(output.contains("Error") || output.contains("error"));
        assert!(output.contains("int x = ;"));
        assert!(output.contains("P0") || output.contains("P999"));
    }

    #[test]
    fn test_render_to_string_captures_output() {
        let error = parse_failure("class A {");
        let output = render_error_to_string_no_color(&error);

        assert!(!output.is_empty());
        assert!(output.lines().count() > 1);
    }

    #[test]
    fn test_render_error_without_location() {
        let error: Error = crate::PatternSyntaxError::Empty.into();
        let output = render_error_to_string_no_color(&error);

        assert_eq!(output, "error: empty method pattern\n");
    }
}
