use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use rewrite_apache_core::matcher::{MethodMatcher, RepeatableArgumentMatcher};
use rewrite_apache_core::recipe::{Recipe, RecipeDescriptor};
use rewrite_apache_core::search::Precondition;
use rewrite_apache_core::template::JavaTemplate;
use rewrite_apache_core::tree::{BinaryOp, Expr, ExprKind};
use rewrite_apache_core::visitor::{
    JavaVisitor, VisitContext, super_binary, super_method_invocation,
};

use crate::Error;

/// Owners whose `isEmpty`/`isNotEmpty` this recipe inlines.
const STRING_UTILS: [&str; 4] = [
    "org.apache.commons.lang3.StringUtils",
    "org.apache.commons.lang.StringUtils",
    "org.apache.maven.shared.utils.StringUtils",
    "org.codehaus.plexus.util.StringUtils",
];

/// Replaces `StringUtils.isEmpty(s)` and `StringUtils.isNotEmpty(s)` with
/// JDK checks, and `s.length() == 0` with `s.isEmpty()`.
///
/// | before | after |
/// |---|---|
/// | `StringUtils.isEmpty(s)` | `s == null \|\| s.isEmpty()` |
/// | `StringUtils.isNotEmpty(s)` | `s != null && !s.isEmpty()` |
/// | `StringUtils.isEmpty(s.trim())` | `s.trim().isEmpty()` |
/// | `s.length() != 0` | `!s.isEmpty()` |
///
/// The null check repeats its argument, so it only applies to arguments
/// that are safe to evaluate twice. A trimmed argument is only rewritten
/// when the trimmed string is a plain name, since the trim result cannot
/// be null.
#[derive(Debug, Clone)]
pub struct IsNotEmptyToJdk {
    rules: Arc<Rules>,
}

#[derive(Debug)]
struct Rules {
    is_empty: MethodMatcher,
    is_not_empty: MethodMatcher,
    length: MethodMatcher,
    trim: MethodMatcher,
    strings: RepeatableArgumentMatcher,
    empty: Pair,
    trimmed: Pair,
    by_length: Pair,
}

/// A template per polarity.
#[derive(Debug)]
struct Pair {
    empty: JavaTemplate,
    not_empty: JavaTemplate,
}

impl Pair {
    fn new(empty: &str, not_empty: &str) -> Result<Pair, Error> {
        Ok(Pair {
            empty: JavaTemplate::builder(empty).build()?,
            not_empty: JavaTemplate::builder(not_empty).build()?,
        })
    }

    fn pick(&self, empty: bool) -> &JavaTemplate {
        if empty { &self.empty } else { &self.not_empty }
    }
}

impl IsNotEmptyToJdk {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            rules: Arc::new(Rules {
                is_empty: MethodMatcher::new("*..StringUtils isEmpty(..)")?,
                is_not_empty: MethodMatcher::new("*..StringUtils isNotEmpty(..)")?,
                length: MethodMatcher::new("java.lang.String length()")?,
                trim: MethodMatcher::new("java.lang.String trim()")?,
                strings: RepeatableArgumentMatcher::strings(),
                empty: Pair::new(
                    "#{s:any(java.lang.String)} == null || #{s}.isEmpty()",
                    "#{s:any(java.lang.String)} != null && !#{s}.isEmpty()",
                )?,
                trimmed: Pair::new(
                    "#{any(java.lang.String)}.trim().isEmpty()",
                    "!#{any(java.lang.String)}.trim().isEmpty()",
                )?,
                by_length: Pair::new(
                    "#{any(java.lang.String)}.isEmpty()",
                    "!#{any(java.lang.String)}.isEmpty()",
                )?,
            }),
        })
    }
}

impl Recipe for IsNotEmptyToJdk {
    fn descriptor(&self) -> RecipeDescriptor {
        RecipeDescriptor::new(
            "apache.commons.lang.IsNotEmptyToJdk",
            "Replace any StringUtils#isEmpty(String) and #isNotEmpty(String)",
            "Replace `StringUtils#isEmpty(String)` and `#isNotEmpty(String)` with \
             `s == null || s.isEmpty()` and `s != null && !s.isEmpty()`.",
        )
        .with_tags(&["apache", "commons"])
        .with_effort(Duration::from_secs(60))
    }

    fn precondition(&self) -> Precondition {
        let mut uses = Vec::new();
        for owner in STRING_UTILS {
            for method in ["isEmpty", "isNotEmpty"] {
                if let Ok(matcher) = MethodMatcher::new(&format!("{owner} {method}(..)")) {
                    uses.push(Precondition::uses_method(matcher));
                }
            }
        }
        uses.push(Precondition::uses_method(self.rules.length.clone()));
        Precondition::any(uses)
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(IsNotEmptyVisitor {
            rules: self.rules.clone(),
        })
    }
}

struct IsNotEmptyVisitor {
    rules: Arc<Rules>,
}

impl IsNotEmptyVisitor {
    /// The receiver of `s.trim()` when `s` is a name.
    fn trimmed_name<'e>(&self, arg: &'e Expr, ctx: &VisitContext<'_>) -> Option<&'e Arc<Expr>> {
        if !self.rules.trim.matches_invocation_in(arg, ctx.classpath()) {
            return None;
        }
        let select = arg.as_invocation()?.select.as_ref()?;
        matches!(select.kind, ExprKind::Ident(_) | ExprKind::FieldAccess(_)).then_some(select)
    }
}

impl JavaVisitor for IsNotEmptyVisitor {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_method_invocation(self, expr, ctx);
        let rules = &self.rules;
        let empty = rules.is_empty.matches_invocation_in(&expr, ctx.classpath());
        if !empty && !rules.is_not_empty.matches_invocation_in(&expr, ctx.classpath()) {
            return expr;
        }
        let Some(arg) = expr.as_invocation().and_then(|mi| mi.args.first()) else {
            return expr;
        };

        let replaced = if rules.strings.matches(arg, ctx.classpath()) {
            rules.empty.pick(empty).replace(ctx, &expr, &[arg.into()])
        } else if let Some(name) = self.trimmed_name(arg, ctx) {
            rules.trimmed.pick(empty).replace(ctx, &expr, &[name.into()])
        } else {
            trace!(arg = ?arg.kind, "Argument may not be evaluated twice");
            return expr;
        };
        if !Arc::ptr_eq(&replaced, &expr) {
            for owner in STRING_UTILS {
                ctx.maybe_remove_import(owner);
            }
        }
        replaced
    }

    fn visit_binary(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_binary(self, expr, ctx);
        let ExprKind::Binary(binary) = &expr.kind else {
            return expr;
        };
        let empty = match binary.op {
            BinaryOp::Eq => true,
            BinaryOp::Ne => false,
            _ => return expr,
        };
        let is_zero = binary.right.as_literal().is_some() && binary.right.int_value() == Some(0);
        if !is_zero || !self.rules.length.matches_invocation_in(&binary.left, ctx.classpath()) {
            return expr;
        }
        // `s.trim().length() == 0` lands here too, as `s.trim().isEmpty()`.
        let Some(receiver) = binary.left.as_invocation().and_then(|mi| mi.select.as_ref()) else {
            return expr;
        };
        self.rules.by_length.pick(empty).replace(ctx, &expr, &[receiver.into()])
    }
}
