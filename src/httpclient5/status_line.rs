use std::sync::Arc;

use tracing::debug;

use rewrite_apache_core::matcher::MethodMatcher;
use rewrite_apache_core::recipe::{Recipe, RecipeDescriptor};
use rewrite_apache_core::search::Precondition;
use rewrite_apache_core::template::JavaTemplate;
use rewrite_apache_core::tree::Expr;
use rewrite_apache_core::visitor::{JavaVisitor, VisitContext, super_method_invocation, walk_expr};

use super::descriptor;
use crate::Error;

const RESPONSE: &str = "org.apache.hc.core5.http.HttpResponse";
const STATUS_LINE: &str = "org.apache.hc.core5.http.message.StatusLine";

/// `StatusLine` getter and the `HttpResponse` method that answers it
/// directly.
const ACCESSORS: &[(&str, &str)] = &[
    ("getStatusCode", "getCode"),
    ("getReasonPhrase", "getReasonPhrase"),
    ("getProtocolVersion", "getVersion"),
];

/// `response.getStatusLine()` to `new StatusLine(response)`.
///
/// 5.x responses carry their status themselves, so a getter called right on
/// `getStatusLine()` goes to the response instead:
/// `response.getStatusLine().getStatusCode()` becomes `response.getCode()`.
#[derive(Debug, Clone)]
pub struct NewStatusLine {
    get_status_line: MethodMatcher,
    /// Getter on the status line and the template calling its counterpart
    /// on the response.
    accessors: Arc<[(MethodMatcher, JavaTemplate)]>,
    status_line: JavaTemplate,
}

impl NewStatusLine {
    pub fn new() -> Result<Self, Error> {
        let mut accessors = Vec::with_capacity(ACCESSORS.len());
        for (getter, replacement) in ACCESSORS {
            accessors.push((
                MethodMatcher::new(&format!("{STATUS_LINE} {getter}()"))?,
                JavaTemplate::builder(&format!("#{{any({RESPONSE})}}.{replacement}()")).build()?,
            ));
        }
        Ok(Self {
            get_status_line: MethodMatcher::new(&format!("{RESPONSE} getStatusLine()"))?.match_overrides(true),
            accessors: accessors.into(),
            status_line: JavaTemplate::builder(&format!("new StatusLine(#{{any({RESPONSE})}})"))
                .imports(&[STATUS_LINE])
                .build()?,
        })
    }

    /// The response a `getStatusLine()` call is made on.
    fn response_of<'e>(&self, expr: &'e Expr, ctx: &VisitContext<'_>) -> Option<&'e Arc<Expr>> {
        if !self.get_status_line.matches_invocation_in(expr, ctx.classpath()) {
            return None;
        }
        expr.as_invocation()?.select.as_ref()
    }
}

impl Recipe for NewStatusLine {
    fn descriptor(&self) -> RecipeDescriptor {
        descriptor(
            "NewStatusLine",
            "Replace `getStatusLine()` with `new StatusLine(HttpResponse)`",
            "`HttpResponse.getStatusLine()` was removed in 5.x; build a `StatusLine` from the \
             response, or ask the response for its code, reason phrase and version directly.",
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::uses_method(self.get_status_line.clone())
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(StatusLineVisitor { recipe: self.clone() })
    }
}

struct StatusLineVisitor {
    recipe: NewStatusLine,
}

impl StatusLineVisitor {
    /// `response.getStatusLine().getter()` as `response.counterpart()`.
    fn shortcut(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Option<Arc<Expr>> {
        let select = expr.as_invocation()?.select.as_ref()?;
        let response = self.recipe.response_of(select, ctx)?.clone();
        let recipe = self.recipe.clone();
        let (_, template) = recipe
            .accessors
            .iter()
            .find(|(getter, _)| getter.matches_invocation_in(expr, ctx.classpath()))?;
        let response = walk_expr(self, &response, ctx);
        let replaced = template.replace(ctx, expr, &[response.into()]);
        if Arc::ptr_eq(&replaced, expr) {
            return None;
        }
        debug!(template = %template.code(), "Status line getter moved to the response");
        Some(replaced)
    }
}

impl JavaVisitor for StatusLineVisitor {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        if let Some(replaced) = self.shortcut(expr, ctx) {
            return replaced;
        }
        let expr = super_method_invocation(self, expr, ctx);
        let Some(response) = self.recipe.response_of(&expr, ctx) else {
            return expr;
        };
        let replaced = self.recipe.status_line.replace(ctx, &expr, &[response.into()]);
        if !Arc::ptr_eq(&replaced, &expr) {
            ctx.maybe_add_import(STATUS_LINE);
        }
        replaced
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::httpclient5::relocated;
    use crate::{artifacts, rewrite};

    fn run(source: &str) -> String {
        let classpath = artifacts::bundled().expect("bundled classpath");
        let recipe = relocated(NewStatusLine::new().expect("recipe"));
        rewrite(&recipe, source, &classpath).expect("rewrite")
    }

    #[test]
    fn getters_move_to_the_response() {
        let before = indoc! {r#"
            import org.apache.http.HttpResponse;
            import org.apache.http.ProtocolVersion;

            class A {
                void method(HttpResponse response) {
                    int statusCode = response.getStatusLine().getStatusCode();
                    String reason = response.getStatusLine().getReasonPhrase();
                    ProtocolVersion version = response.getStatusLine().getProtocolVersion();
                }
            }
        "#};
        assert_eq!(
            run(before),
            indoc! {r#"
                import org.apache.hc.core5.http.HttpResponse;
                import org.apache.hc.core5.http.ProtocolVersion;

                class A {
                    void method(HttpResponse response) {
                        int statusCode = response.getCode();
                        String reason = response.getReasonPhrase();
                        ProtocolVersion version = response.getVersion();
                    }
                }
            "#}
        );
    }

    #[test]
    fn status_line_itself_is_built_from_the_response() {
        let before = indoc! {r#"
            import org.apache.http.HttpResponse;
            import org.apache.http.StatusLine;

            class A {
                String describe(HttpResponse response) {
                    StatusLine line = response.getStatusLine();
                    return "status " + response.getStatusLine() + line.getReasonPhrase();
                }
            }
        "#};
        assert_eq!(
            run(before),
            indoc! {r#"
                import org.apache.hc.core5.http.HttpResponse;
                import org.apache.hc.core5.http.message.StatusLine;

                class A {
                    String describe(HttpResponse response) {
                        StatusLine line = new StatusLine(response);
                        return "status " + new StatusLine(response) + line.getReasonPhrase();
                    }
                }
            "#}
        );
    }
}
