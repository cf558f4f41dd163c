use std::sync::Arc;

use tracing::debug;

use rewrite_apache_core::matcher::MethodMatcher;
use rewrite_apache_core::recipe::{Recipe, RecipeDescriptor};
use rewrite_apache_core::search::Precondition;
use rewrite_apache_core::template::{JavaTemplate, TemplateArg};
use rewrite_apache_core::tree::{
    Block, Expr, ExprKind, JavaType, Literal, LiteralValue, NewClass, Statement, StatementKind, Symbol,
    VariableDeclarations,
};
use rewrite_apache_core::visitor::{JavaVisitor, VisitContext, super_block, super_new_class};

use super::descriptor;
use crate::Error;

const STRING_ENTITY_4: &str = "org.apache.http.entity.StringEntity";
const STRING_ENTITY_5: &str = "org.apache.hc.core5.http.io.entity.StringEntity";
const CONTENT_TYPE_4: &str = "org.apache.http.entity.ContentType";
const CONTENT_TYPE_5: &str = "org.apache.hc.core5.http.ContentType";
const STANDARD_CHARSETS: &str = "java.nio.charset.StandardCharsets";

/// Charsets every JVM ships, as named in `StandardCharsets`.
const STANDARD_CHARSET_NAMES: [&str; 6] = ["US-ASCII", "ISO-8859-1", "UTF-8", "UTF-16BE", "UTF-16LE", "UTF-16"];

/// Folds a content encoding set right after construction into the
/// `StringEntity` constructor:
///
/// ```java
/// StringEntity entity = new StringEntity(body, ContentType.APPLICATION_JSON);
/// entity.setContentEncoding("gzip");
/// ```
///
/// becomes `new StringEntity(body, ContentType.APPLICATION_JSON, "gzip", false)`.
/// 5.x entities are immutable and have no setter.
#[derive(Debug, Clone)]
pub struct MigrateStringEntity {
    set_content_encoding: MethodMatcher,
}

impl MigrateStringEntity {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            set_content_encoding: MethodMatcher::new(
                "org.apache.http.entity.AbstractHttpEntity setContentEncoding(String)",
            )?
            .match_overrides(true),
        })
    }
}

impl Recipe for MigrateStringEntity {
    fn descriptor(&self) -> RecipeDescriptor {
        descriptor(
            "MigrateStringEntity",
            "Pass the content encoding to the `StringEntity` constructor",
            "`StringEntity` has no `setContentEncoding` in 5.x; the encoding is a constructor argument.",
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::uses_method(self.set_content_encoding.clone())
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(FoldEncoding {
            set_content_encoding: self.set_content_encoding.clone(),
        })
    }
}

struct FoldEncoding {
    set_content_encoding: MethodMatcher,
}

impl FoldEncoding {
    /// `(variable, new expression)` when `statement` declares one entity
    /// from a content type.
    fn entity(statement: &Statement) -> Option<(&Arc<str>, &Arc<Expr>)> {
        let decls = statement.as_var_decls()?;
        let [var] = decls.vars.as_slice() else {
            return None;
        };
        let init = var.init.as_ref()?;
        let nc = init.as_new_class()?;
        let owner = init.ty.fqn()?;
        let [_, content_type] = nc.args.as_slice() else {
            return None;
        };
        let from_content_type =
            content_type.ty.is_of_class(CONTENT_TYPE_4) || content_type.ty.is_of_class(CONTENT_TYPE_5);
        ((owner == STRING_ENTITY_4 || owner == STRING_ENTITY_5) && from_content_type).then_some((&var.name, init))
    }

    /// The encoding `statement` sets on `var`.
    fn encoding<'s>(&self, statement: &'s Statement, var: &str, ctx: &VisitContext<'_>) -> Option<&'s Arc<Expr>> {
        let call = statement.as_expr()?;
        if !self.set_content_encoding.matches_invocation_in(call, ctx.classpath()) {
            return None;
        }
        let mi = call.as_invocation()?;
        let receiver = mi.select.as_ref()?.as_ident()?;
        if &*receiver.name != var || receiver.symbol != Symbol::Local {
            return None;
        }
        mi.args.first()
    }

    fn with_encoding(declaration: &Statement, init: &Expr, encoding: &Arc<Expr>, ctx: &VisitContext<'_>) -> Option<Statement> {
        let nc = init.as_new_class()?;
        let owner = init.ty.fqn()?;
        let not_chunked = Expr::new(
            ExprKind::Literal(Literal {
                value: LiteralValue::Bool(false),
                raw: Arc::from("false"),
            }),
            JavaType::boolean(),
        );
        let mut args = nc.args.clone();
        args.push(encoding.clone());
        args.push(Arc::new(not_chunked));
        let types: Vec<JavaType> = args.iter().map(|arg| arg.ty.clone()).collect();
        let constructor = ctx.classpath().find_constructor(owner, &types);
        let rebuilt = init.with_kind(ExprKind::NewClass(NewClass {
            class: nc.class.clone(),
            args,
            constructor,
        }));

        let mut decls = VariableDeclarations::clone(declaration.as_var_decls()?);
        decls.vars[0].init = Some(Arc::new(rebuilt));
        Some(declaration.with_kind(StatementKind::VarDecls(Arc::new(decls))))
    }
}

impl JavaVisitor for FoldEncoding {
    fn visit_block(&mut self, block: &Arc<Block>, ctx: &mut VisitContext<'_>) -> Arc<Block> {
        let block = super_block(self, block, ctx);
        let mut statements: Vec<Arc<Statement>> = Vec::with_capacity(block.statements.len());
        let mut changed = false;
        let mut iter = block.statements.iter().peekable();
        while let Some(statement) = iter.next() {
            let folded = FoldEncoding::entity(statement).and_then(|(var, init)| {
                let next = iter.peek()?;
                let encoding = self.encoding(next, var, ctx)?;
                FoldEncoding::with_encoding(statement, init, encoding, ctx)
            });
            match folded {
                Some(folded) => {
                    debug!("Folded setContentEncoding into StringEntity constructor");
                    statements.push(Arc::new(folded));
                    iter.next();
                    changed = true;
                }
                None => statements.push(statement.clone()),
            }
        }
        if !changed {
            return block;
        }
        Arc::new(block.with_statements(statements))
    }
}

/// `new StringEntity(s, "UTF-8")` to `new StringEntity(s, StandardCharsets.UTF_8)`.
/// 5.x dropped the constructor taking a charset name. Names outside
/// `StandardCharsets` are left for a manual fix.
#[derive(Debug, Clone)]
pub struct MigrateStringEntityStringCharsetConstructor {
    /// `(matcher, template)` per `StringEntity` generation.
    rules: Arc<[(MethodMatcher, JavaTemplate)]>,
}

impl MigrateStringEntityStringCharsetConstructor {
    pub fn new() -> Result<Self, Error> {
        let mut rules = Vec::with_capacity(2);
        for owner in [STRING_ENTITY_4, STRING_ENTITY_5] {
            let matcher = MethodMatcher::new(&format!("{owner} <constructor>(String, String)"))?;
            let template = JavaTemplate::builder("new StringEntity(#{any(java.lang.String)}, StandardCharsets.#{})")
                .imports(&[owner, STANDARD_CHARSETS])
                .build()?;
            rules.push((matcher, template));
        }
        Ok(Self { rules: rules.into() })
    }
}

impl Recipe for MigrateStringEntityStringCharsetConstructor {
    fn descriptor(&self) -> RecipeDescriptor {
        descriptor(
            "MigrateStringEntityStringCharsetConstructor",
            "Replace `StringEntity(String, String)` with `StringEntity(String, Charset)`",
            "The `StringEntity(String, String)` constructor taking a charset name is gone in 5.x. \
             Standard charset names become `StandardCharsets` constants.",
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::any(
            self.rules
                .iter()
                .map(|(matcher, _)| Precondition::uses_method(matcher.clone()))
                .collect(),
        )
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(CharsetName {
            rules: self.rules.clone(),
        })
    }
}

/// The `StandardCharsets` constant for a charset name, if there is one.
fn standard_charset(name: &str) -> Option<String> {
    STANDARD_CHARSET_NAMES
        .iter()
        .find(|standard| standard.eq_ignore_ascii_case(name))
        .map(|standard| standard.replace('-', "_"))
}

struct CharsetName {
    rules: Arc<[(MethodMatcher, JavaTemplate)]>,
}

impl JavaVisitor for CharsetName {
    fn visit_new_class(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_new_class(self, expr, ctx);
        let Some((_, template)) = self
            .rules
            .iter()
            .find(|(matcher, _)| matcher.matches_invocation_in(&expr, ctx.classpath()))
        else {
            return expr;
        };
        let Some([string, charset]) = expr.as_new_class().map(|nc| nc.args.as_slice()) else {
            return expr;
        };
        let constant = match charset.as_literal().map(|literal| &literal.value) {
            Some(LiteralValue::String(name)) => standard_charset(name),
            _ => None,
        };
        let Some(constant) = constant else {
            return expr;
        };
        let replaced = template.replace(ctx, &expr, &[TemplateArg::from(string), TemplateArg::from(constant)]);
        if !Arc::ptr_eq(&replaced, &expr) {
            ctx.maybe_add_import(STANDARD_CHARSETS);
        }
        replaced
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{artifacts, rewrite};

    fn run(recipe: &dyn Recipe, source: &str) -> String {
        let classpath = artifacts::bundled().expect("bundled classpath");
        rewrite(recipe, source, &classpath).expect("rewrite")
    }

    #[test]
    fn charset_names_map_to_constants() {
        assert_eq!(standard_charset("UTF-8").as_deref(), Some("UTF_8"));
        assert_eq!(standard_charset("utf-16le").as_deref(), Some("UTF_16LE"));
        assert_eq!(standard_charset("iso-8859-1").as_deref(), Some("ISO_8859_1"));
        assert_eq!(standard_charset("windows-1252"), None);
    }

    #[test]
    fn content_encoding_moves_into_constructor() {
        let before = indoc! {r#"
            import org.apache.http.entity.ContentType;
            import org.apache.http.entity.StringEntity;

            class A {
                StringEntity entity(String body) {
                    StringEntity se = new StringEntity(body, ContentType.APPLICATION_JSON);
                    se.setContentEncoding("gzip");
                    return se;
                }
            }
        "#};
        assert_eq!(
            run(&MigrateStringEntity::new().expect("recipe"), before),
            indoc! {r#"
                import org.apache.http.entity.ContentType;
                import org.apache.http.entity.StringEntity;

                class A {
                    StringEntity entity(String body) {
                        StringEntity se = new StringEntity(body, ContentType.APPLICATION_JSON, "gzip", false);
                        return se;
                    }
                }
            "#}
        );
    }

    #[test]
    fn encoding_set_later_is_kept() {
        let before = indoc! {r#"
            import org.apache.http.entity.ContentType;
            import org.apache.http.entity.StringEntity;

            class A {
                StringEntity entity(String body) {
                    StringEntity se = new StringEntity(body, ContentType.APPLICATION_JSON);
                    body = body.trim();
                    se.setContentEncoding("gzip");
                    return se;
                }
            }
        "#};
        assert_eq!(run(&MigrateStringEntity::new().expect("recipe"), before), before);
    }

    #[test]
    fn charset_name_becomes_standard_charset() {
        let before = indoc! {r#"
            import org.apache.http.entity.StringEntity;

            class A {
                StringEntity entity(String body) {
                    return new StringEntity(body, "utf-8");
                }
            }
        "#};
        assert_eq!(
            run(&MigrateStringEntityStringCharsetConstructor::new().expect("recipe"), before),
            indoc! {r#"
                import org.apache.http.entity.StringEntity;

                import java.nio.charset.StandardCharsets;

                class A {
                    StringEntity entity(String body) {
                        return new StringEntity(body, StandardCharsets.UTF_8);
                    }
                }
            "#}
        );
    }

    #[test]
    fn unknown_charset_name_is_kept() {
        let before = indoc! {r#"
            import org.apache.http.entity.StringEntity;

            class A {
                StringEntity entity(String body, String charset) {
                    StringEntity a = new StringEntity(body, "windows-1252");
                    return new StringEntity(body, charset);
                }
            }
        "#};
        assert_eq!(
            run(&MigrateStringEntityStringCharsetConstructor::new().expect("recipe"), before),
            before
        );
    }
}
