use core::fmt;
use std::sync::Arc;

/// Java primitive types, plus `void` for method returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    pub fn from_keyword(keyword: &str) -> Option<Primitive> {
        Some(match keyword {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "char" => Primitive::Char,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "void" => Primitive::Void,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
        }
    }

    /// Rank in the widening chain `byte < short < int < long < float < double`.
    /// `char` widens to `int` and above.
    fn numeric_rank(self) -> Option<u8> {
        match self {
            Primitive::Byte => Some(1),
            Primitive::Short | Primitive::Char => Some(2),
            Primitive::Int => Some(3),
            Primitive::Long => Some(4),
            Primitive::Float => Some(5),
            Primitive::Double => Some(6),
            Primitive::Boolean | Primitive::Void => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Primitive widening conversion (JLS 5.1.2), identity included.
    pub fn widens_to(self, target: Primitive) -> bool {
        if self == target {
            return true;
        }
        match (self, target) {
            (Primitive::Char, Primitive::Short) | (Primitive::Short, Primitive::Char) => false,
            (Primitive::Byte, Primitive::Char) => false,
            _ => match (self.numeric_rank(), target.numeric_rank()) {
                (Some(from), Some(to)) => from < to,
                _ => false,
            },
        }
    }

    /// Binary numeric promotion of two operands.
    pub fn promote(a: Primitive, b: Primitive) -> Option<Primitive> {
        let rank = a.numeric_rank()?.max(b.numeric_rank()?);
        Some(match rank {
            6 => Primitive::Double,
            5 => Primitive::Float,
            4 => Primitive::Long,
            _ => Primitive::Int,
        })
    }
}

/// A resolved Java type.
///
/// Class types are identified by their fully qualified name, nested classes
/// joined with `.` (`org.apache.http.client.config.RequestConfig.Builder`).
/// Generic arguments are not tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JavaType {
    Primitive(Primitive),
    Class(Arc<str>),
    Array(Arc<JavaType>),
    /// The type of the `null` literal.
    Null,
    /// Attribution failed.
    Unknown,
}

impl JavaType {
    pub fn class(fqn: impl Into<Arc<str>>) -> JavaType {
        JavaType::Class(fqn.into())
    }

    pub fn string() -> JavaType {
        JavaType::class("java.lang.String")
    }

    pub fn object() -> JavaType {
        JavaType::class("java.lang.Object")
    }

    pub fn array_of(element: JavaType) -> JavaType {
        JavaType::Array(Arc::new(element))
    }

    pub fn int() -> JavaType {
        JavaType::Primitive(Primitive::Int)
    }

    pub fn boolean() -> JavaType {
        JavaType::Primitive(Primitive::Boolean)
    }

    /// Parses the textual form used in method patterns and template
    /// placeholders: a primitive keyword, a fully qualified name, each
    /// optionally followed by `[]` pairs.
    pub fn parse(text: &str) -> JavaType {
        let text = text.trim();
        if let Some(element) = text.strip_suffix("[]") {
            return JavaType::array_of(JavaType::parse(element));
        }
        match Primitive::from_keyword(text) {
            Some(p) => JavaType::Primitive(p),
            None if text.contains('.') => JavaType::class(text),
            None => JavaType::class(format!("java.lang.{}", text)),
        }
    }

    pub fn fqn(&self) -> Option<&str> {
        match self {
            JavaType::Class(fqn) => Some(fqn),
            _ => None,
        }
    }

    pub fn is_of_class(&self, fqn: &str) -> bool {
        self.fqn() == Some(fqn)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, JavaType::Unknown)
    }

    pub fn is_primitive(&self, p: Primitive) -> bool {
        matches!(self, JavaType::Primitive(q) if *q == p)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, JavaType::Class(_) | JavaType::Array(_) | JavaType::Null)
    }

    pub fn element(&self) -> Option<&JavaType> {
        match self {
            JavaType::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Innermost non-array type.
    pub fn base(&self) -> &JavaType {
        match self {
            JavaType::Array(element) => element.base(),
            other => other,
        }
    }

    /// Replaces every occurrence of class `from` with `to`, including array
    /// elements and classes nested in `from`. Returns `None` when nothing
    /// changed.
    pub fn relocate(&self, from: &str, to: &Arc<str>) -> Option<JavaType> {
        match self {
            JavaType::Class(fqn) => relocate_name(fqn, from, to).map(JavaType::Class),
            JavaType::Array(element) => element
                .relocate(from, to)
                .map(|e| JavaType::Array(Arc::new(e))),
            _ => None,
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(p) => write!(f, "{}", p.keyword()),
            JavaType::Class(fqn) => write!(f, "{}", fqn),
            JavaType::Array(element) => write!(f, "{}[]", element),
            JavaType::Null => write!(f, "null"),
            JavaType::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// `name` with its `from` prefix replaced by `to`, when `name` is `from`
/// or a class nested in it.
pub fn relocate_name(name: &str, from: &str, to: &Arc<str>) -> Option<Arc<str>> {
    if name == from {
        return Some(to.clone());
    }
    let nested = name.strip_prefix(from)?.strip_prefix('.')?;
    Some(Arc::from(format!("{}.{}", to, nested)))
}

/// Name used for constructors in method types and patterns.
pub const CONSTRUCTOR_NAME: &str = "<constructor>";

/// Resolved binding of a method or constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodType {
    pub declaring: Arc<str>,
    pub name: Arc<str>,
    pub params: Vec<JavaType>,
    pub ret: JavaType,
    pub is_static: bool,
}

impl MethodType {
    pub fn is_constructor(&self) -> bool {
        &*self.name == CONSTRUCTOR_NAME
    }

    pub fn with_name(&self, name: impl Into<Arc<str>>) -> MethodType {
        MethodType {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Applies [`JavaType::relocate`] to the declaring type, parameters and
    /// return type.
    pub fn relocate(&self, from: &str, to: &Arc<str>) -> Option<MethodType> {
        let mut changed = false;
        let declaring = match relocate_name(&self.declaring, from, to) {
            Some(declaring) => {
                changed = true;
                declaring
            }
            None => self.declaring.clone(),
        };
        let params = self
            .params
            .iter()
            .map(|p| match p.relocate(from, to) {
                Some(p) => {
                    changed = true;
                    p
                }
                None => p.clone(),
            })
            .collect();
        let ret = match self.ret.relocate(from, to) {
            Some(r) => {
                changed = true;
                r
            }
            None => self.ret.clone(),
        };
        changed.then(|| MethodType {
            declaring,
            name: self.name.clone(),
            params,
            ret,
            is_static: self.is_static,
        })
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.declaring, self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ")")
    }
}
