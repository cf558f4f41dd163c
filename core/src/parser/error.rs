use crate::api::{Diagnostic, Severity};
use crate::parser::{Rule, Span};

/// Parser error with the offending source
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub source: String,
    pub span: Span,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Unexpected token
    UnexpectedToken { expected: String, found: String },
    /// Invalid number literal
    InvalidNumber { text: String },
    /// Invalid character or string escape
    InvalidEscape { text: String },
    /// Template placeholder outside a template
    UnexpectedPlaceholder,
    /// Other parse errors (catch-all for Pest errors we don't specifically handle)
    Other { message: String },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, source: String, span: Span) -> Self {
        Self { kind, source, span }
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (message, code, help) = match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, found } => (
                format!("Expected {}, found {}", expected, found),
                "P001",
                None,
            ),
            ParseErrorKind::InvalidNumber { text } => (
                format!("Invalid number literal '{}'", text),
                "P003",
                Some("Check the number format".to_string()),
            ),
            ParseErrorKind::InvalidEscape { text } => (
                format!("Invalid escape sequence in '{}'", text),
                "P005",
                None,
            ),
            ParseErrorKind::UnexpectedPlaceholder => (
                "Template placeholder found in regular source".to_string(),
                "P006",
                Some("Placeholders like `#{any()}` are only valid in templates".to_string()),
            ),
            ParseErrorKind::Other { message } => (message.clone(), "P999", None),
        };

        Diagnostic {
            severity: Severity::Error,
            message,
            span: self.span.clone(),
            related: Vec::new(),
            help,
            code: Some(code.to_string()),
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let diagnostic = self.to_diagnostic();
        write!(f, "{}: {}", diagnostic.severity, diagnostic.message)?;

        if let Some(ref code) = diagnostic.code {
            write!(f, " [{}]", code)?;
        }

        if let Some(ref help) = diagnostic.help {
            write!(f, "\nhelp: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Convert Pest error to human-readable ParseError
pub fn convert_pest_error(err: pest::error::Error<Rule>, source: &str) -> ParseError {
    use pest::error::ErrorVariant;

    let span = match err.location {
        pest::error::InputLocation::Pos(pos) => Span(pos..pos),
        pest::error::InputLocation::Span((start, end)) => Span(start..end),
    };

    let kind = match err.variant {
        ErrorVariant::ParsingError {
            positives,
            negatives,
        } => ParseErrorKind::UnexpectedToken {
            expected: format_expected_rules(&positives),
            found: found_at(source, span.0.start, &negatives),
        },
        ErrorVariant::CustomError { message } => ParseErrorKind::Other { message },
    };

    ParseError::new(kind, source.to_string(), span)
}

/// Format expected rules in a human-readable way
fn format_expected_rules(rules: &[Rule]) -> String {
    let mut concepts: Vec<&str> = Vec::new();

    for rule in rules {
        let concept = match rule {
            Rule::int_lit
            | Rule::long_lit
            | Rule::float_lit
            | Rule::string_lit
            | Rule::char_lit
            | Rule::bool_lit
            | Rule::null_lit => "literal",
            Rule::ident | Rule::qualified_name | Rule::import_name => "identifier",
            Rule::type_ref | Rule::class_type | Rule::primitive_type => "type",
            Rule::statement | Rule::block | Rule::var_decls => "statement",
            Rule::member | Rule::method_decl | Rule::constructor_decl => {
                "class member"
            }
            Rule::modifier => "modifier",
            Rule::EOI => "end of input",
            _ => "expression",
        };
        if !concepts.contains(&concept) {
            concepts.push(concept);
        }
    }

    match concepts.split_last() {
        None => "something else".to_string(),
        Some((only, [])) => only.to_string(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

/// Describe what sits at the error position
fn found_at(source: &str, pos: usize, negatives: &[Rule]) -> String {
    if let Some(rule) = negatives.first() {
        return format!("{:?}", rule);
    }
    match source[pos.min(source.len())..].chars().next() {
        None => "end of input".to_string(),
        Some(c) if c.is_alphanumeric() || c == '_' => {
            let word: String = source[pos..]
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            format!("'{}'", word)
        }
        Some(c) => format!("'{}'", c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_to_diagnostic() {
        let error = ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected: "expression".to_string(),
                found: "';'".to_string(),
            },
            "test source".to_string(),
            Span(10..20),
        );

        let diagnostic = error.to_diagnostic();
        assert_eq!(diagnostic.severity, Severity::Error);
        assert!(diagnostic.message.contains("Expected expression"));
        assert!(diagnostic.message.contains("found ';'"));
        assert_eq!(diagnostic.code, Some("P001".to_string()));
    }

    #[test]
    fn test_format_expected_rules() {
        let rules = vec![Rule::int_lit, Rule::string_lit];
        assert_eq!(format_expected_rules(&rules), "literal");

        let rules = vec![Rule::ident, Rule::int_lit, Rule::EOI];
        assert_eq!(
            format_expected_rules(&rules),
            "identifier, literal or end of input"
        );
    }

    #[test]
    fn test_found_at_reports_word() {
        assert_eq!(found_at("int x = ;", 8, &[]), "';'");
        assert_eq!(found_at("foo bar", 4, &[]), "'bar'");
        assert_eq!(found_at("foo", 3, &[]), "end of input");
    }
}
