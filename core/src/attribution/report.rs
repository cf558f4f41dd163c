use crate::api::Diagnostic;
use crate::parser::Span;

/// Soft failures collected while attributing a unit.
#[derive(Debug, Clone, Default)]
pub struct AttributionReport {
    warnings: Vec<Diagnostic>,
}

impl AttributionReport {
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Names reported as unresolved, in the order they were met.
    pub fn unresolved_names(&self) -> Vec<&str> {
        self.warnings
            .iter()
            .filter_map(|d| d.message.split('`').nth(1))
            .collect()
    }

    pub(crate) fn unresolved_symbol(&mut self, name: &str, span: Option<Span>) {
        self.push(format!("cannot resolve symbol `{}`", name), span, "A001");
    }

    pub(crate) fn unresolved_method(&mut self, name: &str, span: Option<Span>) {
        self.push(format!("cannot resolve method `{}`", name), span, "A002");
    }

    pub(crate) fn unresolved_type(&mut self, name: &str, span: Option<Span>) {
        self.push(format!("cannot resolve type `{}`", name), span, "A003");
    }

    fn push(&mut self, message: String, span: Option<Span>, code: &str) {
        let span = span.unwrap_or_else(|| Span::new(0, 0));
        self.warnings.push(
            Diagnostic::warning(message, span)
                .with_code(code)
                .with_help("add the declaring artifact's stubs to the classpath"),
        );
    }
}
