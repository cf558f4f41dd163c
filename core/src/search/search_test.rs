use indoc::indoc;

use super::*;
use crate::recipe::ExecutionContext;
use crate::test_utils::attributed;

const STUBS: &str = indoc! {r#"
    package org.apache.http.client.config;

    public class RequestConfig {
        public static Builder custom();

        public static class Builder {
            public Builder setConnectTimeout(int timeout);
            public RequestConfig build();
        }
    }
"#};

const SOURCE: &str = indoc! {r#"
    class A {
        Object f() {
            return org.apache.http.client.config.RequestConfig.custom().setConnectTimeout(10).build();
        }
    }
"#};

fn check(precondition: &Precondition, source: &str) -> bool {
    let (unit, classpath) = attributed(source, &[("httpclient", STUBS)]);
    let exec = ExecutionContext::new(classpath);
    let mut ctx = VisitContext::new(&exec, &unit);
    precondition.check(&unit, &mut ctx)
}

fn matcher(pattern: &str) -> MethodMatcher {
    MethodMatcher::new(pattern).expect("valid pattern")
}

#[test]
fn uses_type_sees_expression_types_without_imports() {
    assert!(check(&Precondition::uses_type("org.apache.http..*"), SOURCE));
    assert!(check(
        &Precondition::uses_type("org.apache.http.client.config.RequestConfig.Builder"),
        SOURCE
    ));
    assert!(!check(&Precondition::uses_type("org.apache.hc..*"), SOURCE));
}

#[test]
fn uses_type_sees_imports() {
    let source = indoc! {r#"
        import org.apache.http.client.config.RequestConfig;

        class A {
        }
    "#};
    assert!(check(&Precondition::uses_type("org.apache.http.client.config.*"), source));
}

#[test]
fn uses_method_and_combinators() {
    let connect = Precondition::uses_method(matcher(
        "org.apache.http.client.config.RequestConfig.Builder setConnectTimeout(int)",
    ));
    let stale = Precondition::uses_method(matcher(
        "org.apache.http.client.config.RequestConfig.Builder setStaleConnectionCheckEnabled(..)",
    ));
    assert!(check(&connect, SOURCE));
    assert!(!check(&stale, SOURCE));
    assert!(check(&Precondition::any(vec![stale.clone(), connect.clone()]), SOURCE));
    assert!(!check(&Precondition::all(vec![stale.clone(), connect.clone()]), SOURCE));
    assert!(check(&Precondition::negate(stale), SOURCE));
    assert!(check(&Precondition::Always, SOURCE));
}

#[test]
fn predicates_see_the_unit() {
    let has_package = Precondition::predicate(|unit| unit.package.is_some());
    assert!(!check(&has_package, SOURCE));
    assert!(check(&Precondition::negate(has_package), SOURCE));
}
