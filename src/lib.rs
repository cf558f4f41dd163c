//! Recipes that migrate Java sources off old Apache and Codehaus APIs.
//!
//! # Overview
//!
//! The engine lives in `rewrite-apache-core` and is re-exported here. This
//! crate adds the recipe catalogue and the stubs its recipes type against:
//!
//! - [`commons`]: commons-lang, commons-io and commons-codec helpers and
//!   constants to the JDK, `WordUtils` to commons-text
//! - [`plexus`]: plexus-utils `StringUtils`/`FileUtils` and plexus logging
//! - [`poi`]: deprecated POI cell type and font weight setters
//! - [`httpclient5`]: Apache HttpClient 4.x to 5.x
//!
//! # Quick Start
//!
//! ```
//! use rewrite_apache::{artifacts, commons::IsNotEmptyToJdk, rewrite};
//!
//! let classpath = artifacts::bundled().unwrap();
//! let before = "\
//! import org.apache.commons.lang3.StringUtils;
//!
//! class A {
//!     boolean f(String s) {
//!         return StringUtils.isEmpty(s);
//!     }
//! }
//! ";
//! let after = rewrite(&IsNotEmptyToJdk::new().unwrap(), before, &classpath).unwrap();
//! assert!(after.contains("return s == null || s.isEmpty();"));
//! ```

use std::sync::Arc;

use tracing::debug;

pub mod artifacts;
pub mod commons;
pub mod error_renderer;
pub mod httpclient5;
pub mod options;
pub mod plexus;
pub mod poi;

// Re-export the engine
pub use rewrite_apache_core::{
    api, attribution, classpath, errors, matcher, parser, printer, recipe, search, template, tree,
    visitor,
};
pub use rewrite_apache_core::{ClasspathError, Error, PatternSyntaxError, TemplateError};
pub use rewrite_apache_core::api::{Diagnostic, RelatedInfo, Severity};

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};

use crate::attribution::attribute;
use crate::classpath::Classpath;
use crate::recipe::{ExecutionContext, Recipe, run};

/// Parses `source`, runs `recipe` over it and prints the result. Returns
/// `source` unchanged when the recipe made no edit.
pub fn rewrite(recipe: &dyn Recipe, source: &str, classpath: &Arc<Classpath>) -> Result<String, Error> {
    let unit = parser::parse(source)?;
    let attribution = attribute(&unit, classpath);
    for warning in attribution.report.warnings() {
        debug!(%warning, "Attribution");
    }
    let exec = ExecutionContext::new(classpath.clone());
    let result = run(recipe, &attribution.unit, &exec);
    if !result.changed() {
        return Ok(source.to_string());
    }
    Ok(printer::print(&result.unit))
}
