use core::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::classpath::Classpath;
use crate::errors::PatternSyntaxError;
use crate::matcher::{MethodMatcher, RepeatableArgumentMatcher};
use crate::recipe::{Recipe, RecipeDescriptor};
use crate::search::Precondition;
use crate::template::{JavaTemplate, TemplateArg};
use crate::tree::{Expr, ExprKind, JavaType};
use crate::visitor::{JavaVisitor, VisitContext, super_method_invocation, super_new_class};

/// A part of the matched call a template argument is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgSource {
    /// The receiver of a method call.
    Select,
    /// A call argument, by position.
    Arg(usize),
}

/// A condition on one part of the matched call. Calls failing any
/// constraint are left alone.
#[derive(Clone)]
pub enum ArgumentConstraint {
    Repeatable(RepeatableArgumentMatcher),
    AssignableTo(JavaType),
    /// An integer constant with this value.
    IntValue(i64),
    Predicate(Arc<dyn Fn(&Expr) -> bool + Send + Sync>),
}

impl ArgumentConstraint {
    pub fn predicate(f: impl Fn(&Expr) -> bool + Send + Sync + 'static) -> Self {
        ArgumentConstraint::Predicate(Arc::new(f))
    }

    fn holds(&self, expr: &Expr, classpath: &Classpath) -> bool {
        match self {
            ArgumentConstraint::Repeatable(matcher) => matcher.matches(expr, classpath),
            ArgumentConstraint::AssignableTo(ty) => classpath.is_assignable(&expr.ty, ty),
            ArgumentConstraint::IntValue(value) => expr.int_value() == Some(*value),
            ArgumentConstraint::Predicate(f) => f(expr),
        }
    }
}

impl fmt::Debug for ArgumentConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentConstraint::Repeatable(m) => f.debug_tuple("Repeatable").field(m).finish(),
            ArgumentConstraint::AssignableTo(ty) => f.debug_tuple("AssignableTo").field(ty).finish(),
            ArgumentConstraint::IntValue(v) => f.debug_tuple("IntValue").field(v).finish(),
            ArgumentConstraint::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

#[derive(Debug)]
struct Rule {
    descriptor: RecipeDescriptor,
    matcher: MethodMatcher,
    constraints: Vec<(ArgSource, ArgumentConstraint)>,
    template: JavaTemplate,
    args: Vec<ArgSource>,
    remove_imports: Vec<String>,
}

impl Rule {
    /// Template arguments drawn from `expr`, or `None` when a constraint
    /// fails or a source is missing.
    fn arguments(&self, expr: &Expr, classpath: &Classpath) -> Option<Vec<TemplateArg>> {
        let (select, args) = match &expr.kind {
            ExprKind::MethodInvocation(mi) => (mi.select.as_ref(), &mi.args),
            ExprKind::NewClass(nc) => (None, &nc.args),
            _ => return None,
        };
        let part = |source: ArgSource| match source {
            ArgSource::Select => select,
            ArgSource::Arg(i) => args.get(i),
        };
        for (source, constraint) in &self.constraints {
            if !constraint.holds(part(*source)?, classpath) {
                debug!(recipe = %self.descriptor.name, ?source, ?constraint, "Constraint not met");
                return None;
            }
        }
        self.args
            .iter()
            .map(|source| part(*source).map(TemplateArg::from))
            .collect()
    }
}

/// Replaces calls a method pattern matches with a template filled from
/// the call's receiver and arguments.
///
/// ```
/// use rewrite_apache_core::recipe::{ArgSource, RecipeDescriptor, TemplateRecipe};
/// use rewrite_apache_core::template::JavaTemplate;
///
/// let template = JavaTemplate::builder("#{any(java.lang.String)}.trim()").build().unwrap();
/// let recipe = TemplateRecipe::builder(
///     RecipeDescriptor::new("example.Trim", "Trim", "Use String.trim()."),
///     "org.apache.commons.lang3.StringUtils trim(java.lang.String)",
///     template,
/// )
/// .args(&[ArgSource::Arg(0)])
/// .build()
/// .unwrap();
/// assert_eq!(recipe.descriptor_name(), "example.Trim");
/// ```
#[derive(Debug, Clone)]
pub struct TemplateRecipe {
    rule: Arc<Rule>,
}

#[derive(Debug)]
pub struct TemplateRecipeBuilder {
    descriptor: RecipeDescriptor,
    pattern: String,
    match_overrides: bool,
    template: JavaTemplate,
    constraints: Vec<(ArgSource, ArgumentConstraint)>,
    args: Option<Vec<ArgSource>>,
    remove_imports: Vec<String>,
}

impl TemplateRecipeBuilder {
    /// Also match calls resolving to overrides of the pattern's method.
    pub fn match_overrides(mut self) -> Self {
        self.match_overrides = true;
        self
    }

    pub fn constraint(mut self, source: ArgSource, constraint: ArgumentConstraint) -> Self {
        self.constraints.push((source, constraint));
        self
    }

    /// Where each placeholder's argument comes from. Defaults to the call
    /// arguments in order.
    pub fn args(mut self, sources: &[ArgSource]) -> Self {
        self.args = Some(sources.to_vec());
        self
    }

    /// Another import to drop once the rewritten unit no longer uses it.
    /// The matched method's declaring type is always a candidate.
    pub fn remove_import(mut self, fqn: &str) -> Self {
        self.remove_imports.push(fqn.to_string());
        self
    }

    pub fn build(self) -> Result<TemplateRecipe, PatternSyntaxError> {
        let matcher = MethodMatcher::new(&self.pattern)?.match_overrides(self.match_overrides);
        let arity = self.template.arity();
        let args = self
            .args
            .unwrap_or_else(|| (0..arity).map(ArgSource::Arg).collect());
        Ok(TemplateRecipe {
            rule: Arc::new(Rule {
                descriptor: self.descriptor,
                matcher,
                constraints: self.constraints,
                template: self.template,
                args,
                remove_imports: self.remove_imports,
            }),
        })
    }
}

impl TemplateRecipe {
    pub fn builder(
        descriptor: RecipeDescriptor,
        pattern: &str,
        template: JavaTemplate,
    ) -> TemplateRecipeBuilder {
        TemplateRecipeBuilder {
            descriptor,
            pattern: pattern.to_string(),
            match_overrides: false,
            template,
            constraints: Vec::new(),
            args: None,
            remove_imports: Vec::new(),
        }
    }

    pub fn descriptor_name(&self) -> &str {
        &self.rule.descriptor.name
    }

    pub fn matcher(&self) -> &MethodMatcher {
        &self.rule.matcher
    }
}

impl Recipe for TemplateRecipe {
    fn descriptor(&self) -> RecipeDescriptor {
        self.rule.descriptor.clone()
    }

    fn precondition(&self) -> Precondition {
        Precondition::uses_method(self.rule.matcher.clone())
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(TemplateVisitor {
            rule: self.rule.clone(),
        })
    }
}

struct TemplateVisitor {
    rule: Arc<Rule>,
}

impl TemplateVisitor {
    fn rewrite(&self, expr: Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        if !self.rule.matcher.matches_invocation_in(&expr, ctx.classpath()) {
            return expr;
        }
        let Some(args) = self.rule.arguments(&expr, ctx.classpath()) else {
            return expr;
        };
        let replaced = self.rule.template.replace(ctx, &expr, &args);
        if Arc::ptr_eq(&replaced, &expr) {
            return expr;
        }
        for import in self.rule.template.imports() {
            if import.is_static {
                ctx.maybe_add_static_import(import.container(), import.member());
            } else {
                ctx.maybe_add_import(&import.name);
            }
        }
        if let Some(method) = expr.method_type() {
            ctx.maybe_remove_import(&method.declaring);
        }
        for fqn in &self.rule.remove_imports {
            ctx.maybe_remove_import(fqn);
        }
        replaced
    }
}

impl JavaVisitor for TemplateVisitor {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_method_invocation(self, expr, ctx);
        self.rewrite(expr, ctx)
    }

    fn visit_new_class(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_new_class(self, expr, ctx);
        self.rewrite(expr, ctx)
    }
}
