use std::sync::Arc;

use tracing::debug;

use rewrite_apache_core::recipe::{CompositeRecipe, Recipe, RecipeDescriptor, TemplateRecipe};
use rewrite_apache_core::search::Precondition;
use rewrite_apache_core::template::JavaTemplate;
use rewrite_apache_core::tree::Expr;
use rewrite_apache_core::visitor::{JavaVisitor, VisitContext, super_field_access};

use super::descriptor;
use crate::Error;

const AUTH_SCOPE_4: &str = "org.apache.http.auth.AuthScope";
const AUTH_SCOPE_5: &str = "org.apache.hc.client5.http.auth.AuthScope";
const CREDENTIALS_5: &str = "org.apache.hc.client5.http.auth.UsernamePasswordCredentials";

/// `AuthScope.ANY` to `new AuthScope(null, -1)`. 5.x has no catch-all
/// scope constant; a `null` host and a negative port match any.
#[derive(Debug, Clone)]
pub struct MigrateAuthScope {
    /// One template per `AuthScope` generation, keyed by its owner.
    templates: Arc<[(&'static str, JavaTemplate)]>,
}

impl MigrateAuthScope {
    pub fn new() -> Result<Self, Error> {
        let mut templates = Vec::with_capacity(2);
        for owner in [AUTH_SCOPE_4, AUTH_SCOPE_5] {
            templates.push((owner, JavaTemplate::builder("new AuthScope(null, -1)").imports(&[owner]).build()?));
        }
        Ok(Self {
            templates: templates.into(),
        })
    }
}

impl Recipe for MigrateAuthScope {
    fn descriptor(&self) -> RecipeDescriptor {
        descriptor(
            "MigrateAuthScope",
            "Replace `AuthScope.ANY` with `new AuthScope(null, -1)`",
            "`AuthScope.ANY` was removed in HttpClient 5.x; an `AuthScope` with no host and a \
             negative port matches any target.",
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::any(vec![
            Precondition::uses_type(AUTH_SCOPE_4),
            Precondition::uses_type(AUTH_SCOPE_5),
        ])
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(AnyScope {
            templates: self.templates.clone(),
        })
    }
}

struct AnyScope {
    templates: Arc<[(&'static str, JavaTemplate)]>,
}

impl JavaVisitor for AnyScope {
    fn visit_field_access(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_field_access(self, expr, ctx);
        let Some(fa) = expr.as_field_access() else {
            return expr;
        };
        if &*fa.name != "ANY" {
            return expr;
        }
        let owner = fa.target.ty.fqn();
        let Some((owner, template)) = self.templates.iter().find(|(fqn, _)| Some(*fqn) == owner) else {
            return expr;
        };
        let replaced = template.replace(ctx, &expr, &[]);
        if !Arc::ptr_eq(&replaced, &expr) {
            debug!(%owner, "Replaced AuthScope.ANY");
            ctx.maybe_add_import(owner);
        }
        replaced
    }
}

/// `new UsernamePasswordCredentials(user, password)` with a `String`
/// password, which 5.x takes as `char[]`.
pub fn username_password_credentials() -> Result<TemplateRecipe, Error> {
    let template = JavaTemplate::builder(
        "new UsernamePasswordCredentials(#{any(java.lang.String)}, #{any(java.lang.String)}.toCharArray())",
    )
    .imports(&[CREDENTIALS_5])
    .build()?;
    Ok(TemplateRecipe::builder(
        descriptor(
            "UsernamePasswordCredentials",
            "Migrate `UsernamePasswordCredentials` to httpclient5",
            "Change the password argument of `UsernamePasswordCredentials` to a `char[]`.",
        ),
        &format!("{CREDENTIALS_5} <constructor>(String, String)"),
        template,
    )
    .build()?)
}

/// Scheme factories lost their charset constructor in 5.x.
pub fn migrate_scheme_factories() -> Result<CompositeRecipe, Error> {
    let mut recipes: Vec<Arc<dyn Recipe>> = Vec::with_capacity(2);
    for factory in ["BasicSchemeFactory", "DigestSchemeFactory"] {
        let fqn = format!("org.apache.hc.client5.http.impl.auth.{factory}");
        let template = JavaTemplate::builder(&format!("new {factory}()")).imports(&[&fqn]).build()?;
        let recipe = TemplateRecipe::builder(
            descriptor(
                &format!("MigrateSchemeFactories.{factory}"),
                &format!("Remove the charset argument of `{factory}`"),
                &format!("`{factory}` only has a no-argument constructor in 5.x."),
            ),
            &format!("{fqn} <constructor>(java.nio.charset.Charset)"),
            template,
        )
        .remove_import("java.nio.charset.Charset")
        .remove_import("java.nio.charset.StandardCharsets")
        .build()?;
        recipes.push(Arc::new(recipe));
    }
    Ok(CompositeRecipe::new(
        descriptor(
            "MigrateSchemeFactories",
            "Migrate scheme factories to httpclient5",
            "Drop the charset argument of `BasicSchemeFactory` and `DigestSchemeFactory`.",
        ),
        recipes,
    ))
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::httpclient5::relocated;
    use crate::{artifacts, rewrite};

    fn run(recipe: &dyn Recipe, source: &str) -> String {
        let classpath = artifacts::bundled().expect("bundled classpath");
        rewrite(recipe, source, &classpath).expect("rewrite")
    }

    #[test]
    fn any_scope_becomes_wildcard_constructor() {
        let before = indoc! {r#"
            import org.apache.http.auth.AuthScope;

            class A {
                AuthScope scope() {
                    return AuthScope.ANY;
                }
            }
        "#};
        assert_eq!(
            run(&MigrateAuthScope::new().expect("recipe"), before),
            indoc! {r#"
                import org.apache.http.auth.AuthScope;

                class A {
                    AuthScope scope() {
                        return new AuthScope(null, -1);
                    }
                }
            "#}
        );
    }

    #[test]
    fn any_scope_is_migrated_after_relocation() {
        let before = indoc! {r#"
            import org.apache.http.auth.AuthScope;
            import org.apache.http.impl.client.BasicCredentialsProvider;

            class A {
                void f(BasicCredentialsProvider provider) {
                    provider.setCredentials(AuthScope.ANY, null);
                }
            }
        "#};
        assert_eq!(
            run(&relocated(MigrateAuthScope::new().expect("recipe")), before),
            indoc! {r#"
                import org.apache.hc.client5.http.auth.AuthScope;
                import org.apache.hc.client5.http.impl.auth.BasicCredentialsProvider;

                class A {
                    void f(BasicCredentialsProvider provider) {
                        provider.setCredentials(new AuthScope(null, -1), null);
                    }
                }
            "#}
        );
    }

    #[test]
    fn other_scope_constants_are_kept() {
        let before = indoc! {r#"
            import org.apache.http.auth.AuthScope;

            class A {
                int port() {
                    return AuthScope.ANY_PORT;
                }
            }
        "#};
        assert_eq!(run(&MigrateAuthScope::new().expect("recipe"), before), before);
    }

    #[test]
    fn password_becomes_char_array() {
        let before = indoc! {r#"
            import org.apache.http.auth.UsernamePasswordCredentials;

            class A {
                UsernamePasswordCredentials credentials(String user, String password) {
                    return new UsernamePasswordCredentials(user, password);
                }
            }
        "#};
        assert_eq!(
            run(&relocated(username_password_credentials().expect("recipe")), before),
            indoc! {r#"
                import org.apache.hc.client5.http.auth.UsernamePasswordCredentials;

                class A {
                    UsernamePasswordCredentials credentials(String user, String password) {
                        return new UsernamePasswordCredentials(user, password.toCharArray());
                    }
                }
            "#}
        );
    }

    #[test]
    fn charset_argument_is_dropped() {
        let before = indoc! {r#"
            import org.apache.http.impl.auth.BasicSchemeFactory;

            import java.nio.charset.Charset;

            class A {
                BasicSchemeFactory factory(Charset charset) {
                    return new BasicSchemeFactory(charset);
                }
            }
        "#};
        assert_eq!(
            run(&relocated(migrate_scheme_factories().expect("recipe")), before),
            indoc! {r#"
                import org.apache.hc.client5.http.impl.auth.BasicSchemeFactory;

                import java.nio.charset.Charset;

                class A {
                    BasicSchemeFactory factory(Charset charset) {
                        return new BasicSchemeFactory();
                    }
                }
            "#}
        );
    }
}
