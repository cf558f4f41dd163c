//! Configuration options for parsing and recipe runs.

/// Configuration options for parsing a Java source file.
///
/// # Example
///
/// ```
/// use rewrite_apache_core::api::ParseOptions;
///
/// let options = ParseOptions::default();
/// assert!(options.source_path.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Path recorded on the compilation unit, used in logs and diagnostics.
    ///
    /// Default: None
    pub source_path: Option<String>,
}

impl ParseOptions {
    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }
}

/// Configuration options for running recipes.
///
/// # Example
///
/// ```
/// use rewrite_apache_core::api::RunOptions;
///
/// let options = RunOptions {
///     max_after_visit_depth: 2,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// How many rounds of `do_after_visit` follow-up visitors may be
    /// chained. Follow-ups queued beyond this depth are dropped with a
    /// warning.
    ///
    /// Default: 8
    pub max_after_visit_depth: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_after_visit_depth: 8,
        }
    }
}
