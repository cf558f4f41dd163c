use crate::classpath::Classpath;
use crate::tree::{Expr, ExprKind, JavaType};

/// Whether evaluating an expression twice is indistinguishable from
/// evaluating it once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyClass {
    Literal,
    Identifier,
    FieldAccess,
    /// A zero-argument getter on a name, returning the required type or a
    /// subtype of it.
    RepeatableCall,
    Opaque,
}

impl SafetyClass {
    pub fn is_repeatable(self) -> bool {
        self != SafetyClass::Opaque
    }
}

/// Classifies arguments a rewrite wants to mention more than once.
///
/// Getter calls count as repeatable when their receiver is a plain name,
/// their name starts with `get`, they take no arguments and their resolved
/// return type is assignable to `required`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatableArgumentMatcher {
    required: JavaType,
}

impl RepeatableArgumentMatcher {
    pub fn new(required: JavaType) -> Self {
        Self { required }
    }

    pub fn strings() -> Self {
        Self::new(JavaType::string())
    }

    pub fn byte_arrays() -> Self {
        Self::new(JavaType::array_of(JavaType::Primitive(crate::tree::Primitive::Byte)))
    }

    pub fn required(&self) -> &JavaType {
        &self.required
    }

    pub fn classify(&self, expr: &Expr, classpath: &Classpath) -> SafetyClass {
        match &expr.kind {
            ExprKind::Literal(_) => SafetyClass::Literal,
            ExprKind::Ident(_) => SafetyClass::Identifier,
            ExprKind::FieldAccess(_) => SafetyClass::FieldAccess,
            ExprKind::MethodInvocation(mi) => {
                let plain_receiver = mi.select.as_ref().is_some_and(|select| {
                    matches!(select.kind, ExprKind::Ident(_) | ExprKind::FieldAccess(_))
                });
                let getter = mi.name.starts_with("get") && mi.args.is_empty();
                let returns = mi
                    .method_type
                    .as_ref()
                    .is_some_and(|method| classpath.is_assignable(&method.ret, &self.required));
                if plain_receiver && getter && returns {
                    SafetyClass::RepeatableCall
                } else {
                    SafetyClass::Opaque
                }
            }
            _ => SafetyClass::Opaque,
        }
    }

    pub fn matches(&self, expr: &Expr, classpath: &Classpath) -> bool {
        self.classify(expr, classpath).is_repeatable()
    }
}
