//! Declarative matching of method bindings.
//!
//! A [`MethodMatcher`] is compiled from a pattern of the form
//! `owner name(params)`:
//!
//! ```
//! use rewrite_apache_core::matcher::MethodMatcher;
//! use rewrite_apache_core::tree::{JavaType, MethodType};
//!
//! let matcher = MethodMatcher::new("*..StringUtils isEmpty(..)").unwrap();
//! let method = MethodType {
//!     declaring: "org.apache.commons.lang3.StringUtils".into(),
//!     name: "isEmpty".into(),
//!     params: vec![JavaType::class("java.lang.CharSequence")],
//!     ret: JavaType::boolean(),
//!     is_static: true,
//! };
//! assert!(matcher.matches_method(&method));
//! ```
//!
//! Matching reads the resolved [`MethodType`], never the source text, so a
//! call that failed attribution does not match unless the matcher opts into
//! [`match_unresolved_by_name`](MethodMatcher::match_unresolved_by_name).

mod glob;
mod repeatable;

use core::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::classpath::Classpath;
use crate::errors::PatternSyntaxError;
use crate::tree::{CONSTRUCTOR_NAME, Expr, ExprKind, JavaType, MethodType};

pub use glob::TypePattern;
pub use repeatable::{RepeatableArgumentMatcher, SafetyClass};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParamPattern {
    /// `..`: any number of parameters, none included.
    Rest,
    /// `*`: exactly one parameter of any type.
    Any,
    Type { element: TypePattern, dims: usize },
}

impl ParamPattern {
    fn matches(&self, ty: &JavaType) -> bool {
        match self {
            ParamPattern::Rest | ParamPattern::Any => true,
            ParamPattern::Type { element, dims } => {
                let mut ty = ty;
                for _ in 0..*dims {
                    match ty.element() {
                        Some(inner) => ty = inner,
                        None => return false,
                    }
                }
                match ty {
                    JavaType::Primitive(p) => element.is_exactly(p.keyword()),
                    JavaType::Class(fqn) => element.matches(fqn),
                    _ => false,
                }
            }
        }
    }
}

/// A compiled method pattern. Immutable; build once and share.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    pattern: Arc<str>,
    owner: TypePattern,
    name: TypePattern,
    params: Vec<ParamPattern>,
    match_overrides: bool,
    match_unresolved_by_name: bool,
}

impl MethodMatcher {
    pub fn new(pattern: &str) -> Result<MethodMatcher, PatternSyntaxError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(PatternSyntaxError::Empty);
        }
        let (head, params) = match (trimmed.find('('), trimmed.ends_with(')')) {
            (Some(open), true) => (&trimmed[..open], &trimmed[open + 1..trimmed.len() - 1]),
            _ => return Err(PatternSyntaxError::MissingParameters(trimmed.to_string())),
        };

        let mut words = head.split_whitespace();
        let (owner, name) = match (words.next(), words.next(), words.next()) {
            (Some(owner), Some(name), None) => (owner, name),
            (Some(_), None, None) => return Err(PatternSyntaxError::MissingOwner(trimmed.to_string())),
            _ => {
                return Err(PatternSyntaxError::InvalidName {
                    pattern: trimmed.to_string(),
                    name: head.trim().to_string(),
                });
            }
        };

        let owner = TypePattern::new(&owner.replace('$', ".")).ok_or_else(|| {
            PatternSyntaxError::InvalidOwner {
                pattern: trimmed.to_string(),
                owner: owner.to_string(),
            }
        })?;

        let name = if name == CONSTRUCTOR_NAME {
            TypePattern::literal(CONSTRUCTOR_NAME)
        } else {
            TypePattern::segment(name).ok_or_else(|| PatternSyntaxError::InvalidName {
                pattern: trimmed.to_string(),
                name: name.to_string(),
            })?
        };

        let params = if params.trim().is_empty() {
            Vec::new()
        } else {
            params
                .split(',')
                .map(|param| {
                    parse_param(param.trim()).ok_or_else(|| PatternSyntaxError::InvalidParameter {
                        pattern: trimmed.to_string(),
                        param: param.trim().to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(MethodMatcher {
            pattern: Arc::from(trimmed),
            owner,
            name,
            params,
            match_overrides: false,
            match_unresolved_by_name: false,
        })
    }

    /// Also match methods declared on a subtype of the owner, i.e. calls
    /// that resolve to an override. Needs a classpath, see
    /// [`matches_invocation_in`](Self::matches_invocation_in).
    pub fn match_overrides(mut self, yes: bool) -> Self {
        self.match_overrides = yes;
        self
    }

    /// Let calls without a binding match on simple name and argument count.
    pub fn match_unresolved_by_name(mut self, yes: bool) -> Self {
        self.match_unresolved_by_name = yes;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the binding's declaring type, name and parameters fit.
    pub fn matches_method(&self, method: &MethodType) -> bool {
        self.owner.matches(&method.declaring) && self.matches_signature(method)
    }

    /// Like [`matches_method`](Self::matches_method), also accepting an owner
    /// that only a supertype of the declaring type matches when overrides
    /// are enabled.
    pub fn matches_method_in(&self, method: &MethodType, classpath: &Classpath) -> bool {
        if self.matches_method(method) {
            return true;
        }
        self.match_overrides
            && self.matches_signature(method)
            && classpath
                .supertypes(&method.declaring)
                .iter()
                .any(|s| self.owner.matches(s))
    }

    /// Matches a method invocation or `new` expression.
    pub fn matches_invocation(&self, expr: &Expr) -> bool {
        self.check(expr, |method| self.matches_method(method))
    }

    pub fn matches_invocation_in(&self, expr: &Expr, classpath: &Classpath) -> bool {
        self.check(expr, |method| self.matches_method_in(method, classpath))
    }

    fn check(&self, expr: &Expr, matches: impl Fn(&MethodType) -> bool) -> bool {
        let (name, args, binding) = match &expr.kind {
            ExprKind::MethodInvocation(mi) => (&*mi.name, mi.args.len(), mi.method_type.as_ref()),
            ExprKind::NewClass(nc) => (CONSTRUCTOR_NAME, nc.args.len(), nc.constructor.as_ref()),
            _ => return false,
        };
        let matched = match binding {
            Some(method) => matches(method),
            None if self.match_unresolved_by_name => {
                self.name.matches(name) && self.accepts_arity(args)
            }
            None => false,
        };
        trace!(pattern = %self.pattern, method = name, matched, "Method pattern checked");
        matched
    }

    fn matches_signature(&self, method: &MethodType) -> bool {
        self.name.matches(&method.name) && self.matches_params(&self.params, &method.params)
    }

    fn matches_params(&self, patterns: &[ParamPattern], params: &[JavaType]) -> bool {
        match patterns.split_first() {
            None => params.is_empty(),
            Some((ParamPattern::Rest, rest)) => {
                (0..=params.len()).any(|skip| self.matches_params(rest, &params[skip..]))
            }
            Some((first, rest)) => match params.split_first() {
                Some((param, remaining)) => {
                    first.matches(param) && self.matches_params(rest, remaining)
                }
                None => false,
            },
        }
    }

    fn accepts_arity(&self, args: usize) -> bool {
        let fixed = self
            .params
            .iter()
            .filter(|p| !matches!(p, ParamPattern::Rest))
            .count();
        if self.params.contains(&ParamPattern::Rest) {
            args >= fixed
        } else {
            args == fixed
        }
    }
}

impl fmt::Display for MethodMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn parse_param(text: &str) -> Option<ParamPattern> {
    match text {
        ".." => return Some(ParamPattern::Rest),
        "*" => return Some(ParamPattern::Any),
        "" => return None,
        _ => {}
    }
    let mut element = text;
    let mut dims = 0;
    while let Some(inner) = element.strip_suffix("[]") {
        element = inner.trim_end();
        dims += 1;
    }
    let element = element.replace('$', ".");
    let pattern = if element.contains('.') || element.contains('*') {
        TypePattern::new(&element)?
    } else if crate::tree::Primitive::from_keyword(&element).is_some() {
        TypePattern::literal(&element)
    } else {
        TypePattern::new(&format!("java.lang.{}", element))?
    };
    Some(ParamPattern::Type {
        element: pattern,
        dims,
    })
}
