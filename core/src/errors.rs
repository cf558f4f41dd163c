use thiserror::Error;

use crate::api::Diagnostic;
use crate::parser::ParseError;

/// A method pattern that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternSyntaxError {
    #[error("empty method pattern")]
    Empty,

    #[error("method pattern `{0}` is missing a parameter list")]
    MissingParameters(String),

    #[error("method pattern `{0}` has no owner type")]
    MissingOwner(String),

    #[error("invalid owner type `{owner}` in method pattern `{pattern}`")]
    InvalidOwner { pattern: String, owner: String },

    #[error("invalid method name `{name}` in method pattern `{pattern}`")]
    InvalidName { pattern: String, name: String },

    #[error("invalid parameter `{param}` in method pattern `{pattern}`")]
    InvalidParameter { pattern: String, param: String },
}

/// Why a template could not be applied. The caller keeps the original node.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    #[error("template does not parse: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid placeholder `{0}`")]
    InvalidPlaceholder(String),

    #[error("template expects {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("argument {index} has type {actual}, not assignable to {expected}")]
    ArgumentType {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("argument {index} is expected to be {expected}")]
    ArgumentKind { index: usize, expected: &'static str },

    #[error("template references unresolved names: {}", .0.join(", "))]
    Unresolved(Vec<String>),

    #[error("argument {0} fills a repeated placeholder but may have side effects")]
    UnsafeDuplication(usize),

    #[error("cannot apply template at {0}")]
    Coordinates(&'static str),
}

/// Failure to assemble a classpath from stub sources.
#[derive(Debug, Clone, Error)]
pub enum ClasspathError {
    #[error("stub bundle `{artifact}` does not parse: {source}")]
    Stubs {
        artifact: String,
        #[source]
        source: ParseError,
    },

    #[error("unknown classpath artifact `{0}`")]
    UnknownArtifact(String),
}

/// Crate-level error returned by high-level entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Pattern(#[from] PatternSyntaxError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Classpath(#[from] ClasspathError),
}

impl Error {
    /// Diagnostics for errors that carry a source location.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Error::Parse(err) => vec![err.to_diagnostic()],
            Error::Classpath(ClasspathError::Stubs { source, .. }) => vec![source.to_diagnostic()],
            Error::Template(TemplateError::Parse(err)) => vec![err.to_diagnostic()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_error_display() {
        let err = PatternSyntaxError::MissingParameters("java.lang.String trim".to_string());
        assert_eq!(
            err.to_string(),
            "method pattern `java.lang.String trim` is missing a parameter list"
        );
    }

    #[test]
    fn template_error_display() {
        let err = TemplateError::ArgumentCount {
            expected: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "template expects 2 arguments, got 1");

        let err = TemplateError::Unresolved(vec!["Foo".to_string(), "bar".to_string()]);
        assert_eq!(
            err.to_string(),
            "template references unresolved names: Foo, bar"
        );
    }

    #[test]
    fn crate_error_wraps_pattern_error() {
        let err: Error = PatternSyntaxError::Empty.into();
        assert_eq!(err.to_string(), "empty method pattern");
        assert!(err.diagnostics().is_empty());
    }
}
