//! Public API surface shared by the engine and the recipe catalogue.
//!
//! Diagnostics are the stable representation of parse errors and attribution
//! warnings at crate boundaries. Options structs carry the knobs callers may
//! tune when parsing sources and running recipes.
//!
//! # Example
//!
//! ```
//! use rewrite_apache_core::api::{ParseOptions, RunOptions};
//!
//! let parse = ParseOptions::default().with_source_path("src/main/java/A.java");
//! let run = RunOptions::default();
//! assert_eq!(run.max_after_visit_depth, 8);
//! assert_eq!(parse.source_path.as_deref(), Some("src/main/java/A.java"));
//! ```

pub mod error;
pub mod options;

pub use error::{Diagnostic, RelatedInfo, Severity};
pub use options::{ParseOptions, RunOptions};
