use std::sync::Arc;

use tracing::{debug, warn};

use rewrite_apache_core::matcher::MethodMatcher;
use rewrite_apache_core::recipe::{Recipe, RecipeDescriptor};
use rewrite_apache_core::search::Precondition;
use rewrite_apache_core::template::{Coordinates, JavaTemplate, TemplateArg};
use rewrite_apache_core::tree::{Expr, Tree};
use rewrite_apache_core::visitor::{JavaVisitor, VisitContext, super_method_invocation};

use super::descriptor;
use crate::Error;
use crate::options::{AddTimeUnitArgumentOptions, ChangeArgumentToTimeValueOptions};

const TIME_UNIT: &str = "java.util.concurrent.TimeUnit";
const TIME_VALUE: &str = "org.apache.hc.core5.util.TimeValue";

/// Appends a `TimeUnit` argument to calls of a method that took a bare
/// duration: `b.setConnectTimeout(500)` reads
/// `b.setConnectTimeout(500, TimeUnit.MILLISECONDS)`.
#[derive(Debug, Clone)]
pub struct AddTimeUnitArgument {
    options: AddTimeUnitArgumentOptions,
    matcher: MethodMatcher,
}

impl AddTimeUnitArgument {
    pub fn new(options: AddTimeUnitArgumentOptions) -> Result<Self, Error> {
        let matcher = MethodMatcher::new(&options.method_pattern)?;
        Ok(Self { options, matcher })
    }
}

impl Recipe for AddTimeUnitArgument {
    fn descriptor(&self) -> RecipeDescriptor {
        descriptor(
            "AddTimeUnitArgument",
            "Adds a TimeUnit argument to the matched method invocations",
            "In Apache Http Client 5.x migration, an extra TimeUnit argument is required in the timeout \
             and duration methods. Previously in 4.x, all these methods were implicitly having the \
             timeout or duration expressed in milliseconds, but in 5.x the unit of the timeout or \
             duration is required. So, by default this recipe adds `TimeUnit.MILLISECONDS`, it is \
             possible to specify this as a parameter.",
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::uses_method(self.matcher.clone())
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(AddUnit { recipe: self.clone() })
    }
}

struct AddUnit {
    recipe: AddTimeUnitArgument,
}

impl JavaVisitor for AddUnit {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_method_invocation(self, expr, ctx);
        if !self.recipe.matcher.matches_invocation_in(&expr, ctx.classpath()) {
            return expr;
        }
        let Some(mi) = expr.as_invocation() else {
            return expr;
        };
        let unit = self.recipe.options.time_unit;
        let code = format!("{}TimeUnit.#{{}}", "#{any()}, ".repeat(mi.args.len()));
        let mut args: Vec<TemplateArg> = mi.args.iter().map(TemplateArg::from).collect();
        args.push(TemplateArg::from(unit.constant()));
        match rewrite_arguments(&code, &[TIME_UNIT], &expr, &args, ctx) {
            Some(rewritten) => {
                debug!(method = %mi.name, %unit, "Added time unit argument");
                ctx.maybe_add_import(TIME_UNIT);
                rewritten
            }
            None => expr,
        }
    }
}

/// Wraps the duration passed to a method in a `TimeValue`:
/// `b.setSelectInterval(1000)` reads
/// `b.setSelectInterval(TimeValue.of(1000, TimeUnit.MILLISECONDS))`.
///
/// A call that already passes a unit next to its duration keeps it.
#[derive(Debug, Clone)]
pub struct ChangeArgumentToTimeValue {
    options: ChangeArgumentToTimeValueOptions,
    matcher: MethodMatcher,
}

impl ChangeArgumentToTimeValue {
    pub fn new(options: ChangeArgumentToTimeValueOptions) -> Result<Self, Error> {
        let matcher = MethodMatcher::new(&options.method_pattern)?;
        Ok(Self { options, matcher })
    }
}

impl Recipe for ChangeArgumentToTimeValue {
    fn descriptor(&self) -> RecipeDescriptor {
        descriptor(
            "ChangeArgumentToTimeValue",
            "Changes an argument to a `TimeValue` for matched method invocations",
            "In Apache Http Client 5.x migration, some methods that previously took a single long \
             argument representing time now require a `TimeValue` argument.",
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::uses_method(self.matcher.clone())
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(ToTimeValue { recipe: self.clone() })
    }
}

struct ToTimeValue {
    recipe: ChangeArgumentToTimeValue,
}

impl JavaVisitor for ToTimeValue {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_method_invocation(self, expr, ctx);
        if !self.recipe.matcher.matches_invocation_in(&expr, ctx.classpath()) {
            return expr;
        }
        let Some(mi) = expr.as_invocation() else {
            return expr;
        };
        let (code, args) = match mi.args.as_slice() {
            [duration] => (
                "TimeValue.of(#{any()}, TimeUnit.#{})",
                vec![TemplateArg::from(duration), TemplateArg::from(self.recipe.options.time_unit.constant())],
            ),
            [duration, unit] => (
                "TimeValue.of(#{any()}, #{any()})",
                vec![TemplateArg::from(duration), TemplateArg::from(unit)],
            ),
            _ => return expr,
        };
        match rewrite_arguments(code, &[TIME_VALUE, TIME_UNIT], &expr, &args, ctx) {
            Some(rewritten) => {
                debug!(method = %mi.name, "Wrapped duration in TimeValue");
                ctx.maybe_add_import(TIME_VALUE);
                ctx.maybe_add_import(TIME_UNIT);
                rewritten
            }
            None => expr,
        }
    }
}

/// `call` with its arguments replaced by the argument list `code`.
fn rewrite_arguments(
    code: &str,
    imports: &[&str],
    call: &Arc<Expr>,
    args: &[TemplateArg],
    ctx: &VisitContext<'_>,
) -> Option<Arc<Expr>> {
    let template = match JavaTemplate::builder(code).imports(imports).context_sensitive().build() {
        Ok(template) => template,
        Err(err) => {
            warn!(template = code, error = %err, "Template does not compile");
            return None;
        }
    };
    match template.apply(ctx, Coordinates::ReplaceArguments(call.clone()), args) {
        Ok(Tree::Expr(rewritten)) => Some(rewritten),
        Ok(_) => None,
        Err(err) => {
            warn!(template = code, error = %err, "Template skipped");
            None
        }
    }
}
