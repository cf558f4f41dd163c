use std::sync::Arc;

use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;
use crate::matcher::RepeatableArgumentMatcher;
use crate::printer::print;
use crate::template::JavaTemplate;
use crate::test_utils::{attributed, init_test_logging, invocations};
use crate::tree::CompilationUnit;

const STUBS: &str = indoc! {r#"
    package org.apache.http.client.config;

    public class RequestConfig {
        public static Builder custom();
        public static class Builder {
            public Builder setConnectTimeout(int timeout);
            public Builder setStaleConnectionCheckEnabled(boolean enabled);
            public RequestConfig build();
        }
    }

    package org.apache.hc.client5.http.config;

    public class RequestConfig {
        public static Builder custom();
        public static class Builder {
            public Builder setConnectTimeout(int timeout);
            public Builder setConnectionRequestTimeout(int timeout);
            public RequestConfig build();
        }
    }

    package com.acme;

    public class Util {
        public static final String SEPARATOR;
        public static boolean isEmpty(String s);
        public static String name();
    }
"#};

const HTTP4: &str = "org.apache.http.client.config.RequestConfig";
const HTTP5: &str = "org.apache.hc.client5.http.config.RequestConfig";

fn run_on(recipe: &dyn Recipe, source: &str) -> (Arc<CompilationUnit>, RecipeRun, ExecutionContext) {
    init_test_logging();
    let (unit, classpath) = attributed(source, &[("fixtures", STUBS)]);
    let exec = ExecutionContext::new(classpath);
    let result = run(recipe, &unit, &exec);
    (unit, result, exec)
}

#[test]
fn precondition_failure_skips_the_unit() {
    let source = indoc! {r#"
        class A {
            int f() {
                return 1;
            }
        }
    "#};
    let (unit, result, _) = run_on(&ChangeType::new(HTTP4, HTTP5), source);
    assert_eq!(result.state, RunState::Skip);
    assert!(Arc::ptr_eq(&unit, &result.unit));
}

#[test]
fn traversal_without_edits_is_unchanged() {
    let recipe = ChangeMethodName::new("com.acme.Util name()", "name").expect("pattern");
    let source = indoc! {r#"
        import com.acme.Util;

        class A {
            String f() {
                return Util.name();
            }
        }
    "#};
    let (unit, result, _) = run_on(&recipe, source);
    assert_eq!(result.state, RunState::Unchanged);
    assert!(Arc::ptr_eq(&unit, &result.unit));
}

#[test]
fn change_type_moves_imports_and_bindings() {
    let source = indoc! {r#"
        import org.apache.http.client.config.RequestConfig;

        class A {
            RequestConfig f() {
                RequestConfig.Builder b = RequestConfig.custom();
                return b.setConnectTimeout(10).build();
            }
        }
    "#};
    let (_, result, exec) = run_on(&ChangeType::new(HTTP4, HTTP5), source);
    assert_eq!(result.state, RunState::Done);
    assert_eq!(
        print(&result.unit),
        indoc! {r#"
            import org.apache.hc.client5.http.config.RequestConfig;

            class A {
                RequestConfig f() {
                    RequestConfig.Builder b = RequestConfig.custom();
                    return b.setConnectTimeout(10).build();
                }
            }
        "#}
    );
    let declaring: Vec<String> = invocations(&result.unit, exec.classpath())
        .iter()
        .filter_map(|call| call.method_type().map(|m| m.declaring.to_string()))
        .collect();
    assert_eq!(
        declaring,
        vec![
            HTTP5.to_string(),
            format!("{HTTP5}.Builder"),
            format!("{HTTP5}.Builder"),
        ]
    );

    let again = run(&ChangeType::new(HTTP4, HTTP5), &result.unit, &exec);
    assert_eq!(again.state, RunState::Skip);
}

#[test]
fn change_type_rewrites_qualified_references_and_nested_imports() {
    let source = indoc! {r#"
        import org.apache.http.client.config.RequestConfig.Builder;

        class A {
            void f() {
                Builder b = org.apache.http.client.config.RequestConfig.custom();
            }
        }
    "#};
    let (_, result, _) = run_on(&ChangeType::new(HTTP4, HTTP5), source);
    assert_eq!(
        print(&result.unit),
        indoc! {r#"
            import org.apache.hc.client5.http.config.RequestConfig.Builder;

            class A {
                void f() {
                    Builder b = org.apache.hc.client5.http.config.RequestConfig.custom();
                }
            }
        "#}
    );
}

#[test]
fn change_method_name_renames_calls_and_their_binding() {
    let recipe = ChangeMethodName::new(
        &format!("{HTTP5}.Builder setConnectTimeout(int)"),
        "setConnectionRequestTimeout",
    )
    .expect("pattern");
    let source = indoc! {r#"
        import org.apache.hc.client5.http.config.RequestConfig;

        class A {
            RequestConfig f() {
                return RequestConfig.custom().setConnectTimeout(10).build();
            }
        }
    "#};
    let (_, result, exec) = run_on(&recipe, source);
    assert!(print(&result.unit).contains("RequestConfig.custom().setConnectionRequestTimeout(10).build()"));
    let renamed = invocations(&result.unit, exec.classpath())
        .into_iter()
        .find_map(|call| call.method_type().filter(|m| &*m.name == "setConnectionRequestTimeout").cloned());
    assert!(renamed.is_some());
}

#[test]
fn remove_invocations_cuts_chain_links_and_drops_statements() {
    let recipe =
        RemoveMethodInvocations::new(&format!("{HTTP4}.Builder setStaleConnectionCheckEnabled(boolean)"))
            .expect("pattern");
    let source = indoc! {r#"
        import org.apache.http.client.config.RequestConfig;

        class A {
            RequestConfig f(RequestConfig.Builder builder) {
                builder.setStaleConnectionCheckEnabled(false);
                RequestConfig.custom().setStaleConnectionCheckEnabled(false);
                return RequestConfig.custom().setStaleConnectionCheckEnabled(true).setConnectTimeout(10).build();
            }
        }
    "#};
    let (_, result, _) = run_on(&recipe, source);
    assert_eq!(
        print(&result.unit),
        indoc! {r#"
            import org.apache.http.client.config.RequestConfig;

            class A {
                RequestConfig f(RequestConfig.Builder builder) {
                    RequestConfig.custom();
                    return RequestConfig.custom().setConnectTimeout(10).build();
                }
            }
        "#}
    );
}

fn is_empty_to_jdk() -> TemplateRecipe {
    let template = JavaTemplate::builder("#{s:any(java.lang.String)} == null || #{s}.isEmpty()")
        .build()
        .expect("template");
    TemplateRecipe::builder(
        RecipeDescriptor::new("test.IsEmpty", "Is empty", "Inline Util.isEmpty."),
        "com.acme.Util isEmpty(java.lang.String)",
        template,
    )
    .constraint(
        ArgSource::Arg(0),
        ArgumentConstraint::Repeatable(RepeatableArgumentMatcher::strings()),
    )
    .build()
    .expect("pattern")
}

#[test]
fn template_recipe_respects_constraints() {
    let source = indoc! {r#"
        import com.acme.Util;

        class A {
            boolean f(String s) {
                boolean a = Util.isEmpty(s);
                return Util.isEmpty(Util.name());
            }
        }
    "#};
    let (_, result, _) = run_on(&is_empty_to_jdk(), source);
    assert_eq!(
        print(&result.unit),
        indoc! {r#"
            import com.acme.Util;

            class A {
                boolean f(String s) {
                    boolean a = s == null || s.isEmpty();
                    return Util.isEmpty(Util.name());
                }
            }
        "#}
    );
}

#[test]
fn comments_before_a_nested_block_survive_a_rewrite() {
    let source = indoc! {r#"
        import com.acme.Util;

        class Box<T> {
            boolean f(String s, T item) {
                if (item == null)
                    return false;

                // keep me
                {
                    s = s.trim();
                }
                return Util.isEmpty(s);
            }
        }
    "#};
    let (_, result, _) = run_on(&is_empty_to_jdk(), source);
    assert_eq!(
        print(&result.unit),
        indoc! {r#"
            class Box<T> {
                boolean f(String s, T item) {
                    if (item == null)
                        return false;

                    // keep me
                    {
                        s = s.trim();
                    }
                    return s == null || s.isEmpty();
                }
            }
        "#}
    );
}

#[test]
fn template_recipe_drops_the_unused_owner_import() {
    let source = indoc! {r#"
        import com.acme.Util;

        class A {
            boolean f(String s) {
                return Util.isEmpty(s);
            }
        }
    "#};
    let (_, result, _) = run_on(&is_empty_to_jdk(), source);
    let printed = print(&result.unit);
    assert!(!printed.contains("import com.acme.Util;"), "{printed}");
    assert!(printed.contains("return s == null || s.isEmpty();"), "{printed}");
}

#[test]
fn replace_constant_covers_qualified_and_static_imported_reads() {
    let template = JavaTemplate::builder("System.lineSeparator()").build().expect("template");
    let recipe = ReplaceConstant::new("com.acme.Util", "SEPARATOR", template).expect("recipe");
    let source = indoc! {r#"
        import com.acme.Util;

        import static com.acme.Util.SEPARATOR;

        class A {
            String f() {
                return Util.SEPARATOR + SEPARATOR + Util.name();
            }
        }
    "#};
    let (_, result, _) = run_on(&recipe, source);
    assert_eq!(
        print(&result.unit),
        indoc! {r#"
            import com.acme.Util;

            class A {
                String f() {
                    return System.lineSeparator() + System.lineSeparator() + Util.name();
                }
            }
        "#}
    );

    let placeholder = JavaTemplate::builder("#{any()}").build().expect("template");
    assert!(ReplaceConstant::new("com.acme.Util", "SEPARATOR", placeholder).is_err());
}

#[test]
fn composite_runs_members_in_order() {
    let rename = ChangeMethodName::new(
        &format!("{HTTP5}.Builder setConnectTimeout(int)"),
        "setConnectionRequestTimeout",
    )
    .expect("pattern");
    let composite = CompositeRecipe::new(
        RecipeDescriptor::new("test.Upgrade", "Upgrade", "Move and rename."),
        vec![Arc::new(ChangeType::new(HTTP4, HTTP5)), Arc::new(rename)],
    );
    let source = indoc! {r#"
        import org.apache.http.client.config.RequestConfig;

        class A {
            RequestConfig f() {
                return RequestConfig.custom().setConnectTimeout(10).build();
            }
        }
    "#};
    let (_, result, _) = run_on(&composite, source);
    assert_eq!(result.state, RunState::Done);
    assert_eq!(
        print(&result.unit),
        indoc! {r#"
            import org.apache.hc.client5.http.config.RequestConfig;

            class A {
                RequestConfig f() {
                    return RequestConfig.custom().setConnectionRequestTimeout(10).build();
                }
            }
        "#}
    );
}
