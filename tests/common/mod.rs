#![allow(dead_code)]

use std::sync::{Arc, Once};

use pretty_assertions::assert_eq;

use rewrite_apache::classpath::Classpath;
use rewrite_apache::recipe::Recipe;
use rewrite_apache::{artifacts, rewrite};

static LOGGING: Once = Once::new();

/// Routes `RUST_LOG` filtered engine logs to the test output.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn classpath() -> Arc<Classpath> {
    artifacts::bundled().expect("bundled classpath")
}

/// Runs `recipe` over `before` and compares the printed result with
/// `after`.
pub fn rewrite_run(recipe: &dyn Recipe, before: &str, after: &str) {
    init_logging();
    let actual = rewrite(recipe, before, &classpath()).expect("rewrite");
    assert_eq!(actual, after);
}

/// Like [`rewrite_run`], then checks a second run leaves the result alone.
pub fn rewrite_run_stable(recipe: &dyn Recipe, before: &str, after: &str) {
    rewrite_run(recipe, before, after);
    assert_unchanged(recipe, after);
}

pub fn assert_unchanged(recipe: &dyn Recipe, source: &str) {
    init_logging();
    let actual = rewrite(recipe, source, &classpath()).expect("rewrite");
    assert_eq!(actual, source);
}
