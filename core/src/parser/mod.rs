pub mod error;
pub mod parser;
mod syntax;

// Re-export the parser and rule enum for external use
pub use parser::JavaGrammar;
pub use parser::Rule;
pub use parser::{parse, parse_stubs, parse_with_options};
pub(crate) use parser::{Fragment, FragmentKind, parse_fragment};

pub use error::{ParseError, ParseErrorKind};
pub use syntax::Span;

#[cfg(test)]
mod parse_test;
