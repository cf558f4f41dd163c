//! The typed Java syntax tree that recipes read and rewrite.
//!
//! Nodes are immutable and shared through `Arc`. A transformation rebuilds
//! the path from the changed node up to the root and reuses every untouched
//! subtree, so `Arc::ptr_eq` on an unvisited child still holds after a pass.
//!
//! Expressions carry their resolved [`JavaType`]; calls and constructor
//! invocations carry a [`MethodType`] binding. Both are filled in by
//! [`crate::attribution`] and are `Unknown`/`None` when resolution failed.

mod java_type;

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::parser::Span;

pub use java_type::{CONSTRUCTOR_NAME, JavaType, MethodType, Primitive, relocate_name};

/// Identity of a node. Survives `with_*` rebuilds of the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn fresh() -> NodeId {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A comment attached in front of a node. `text` excludes the delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: Arc<str>,
    /// `// text` rather than `/* text */`.
    pub line: bool,
}

impl Comment {
    pub fn new(text: impl Into<Arc<str>>) -> Comment {
        Comment {
            text: text.into(),
            line: false,
        }
    }

    pub fn line(text: impl Into<Arc<str>>) -> Comment {
        Comment {
            text: text.into(),
            line: true,
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub ty: JavaType,
    pub span: Option<Span>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Ident(Ident),
    FieldAccess(FieldAccess),
    MethodInvocation(MethodInvocation),
    NewClass(NewClass),
    Binary(Binary),
    Unary(Unary),
    Parens(Arc<Expr>),
    Ternary(Ternary),
    Cast(Cast),
    Assign(Assign),
    Lambda(Lambda),
    /// `Foo.class`
    ClassLiteral(TypeTree),
    /// A template slot, only present while a template is being compiled.
    Placeholder(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Int(i64),
    Long(i64),
    Float(f64),
    Char(char),
    String(String),
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub value: LiteralValue,
    /// Source text, printed back verbatim.
    pub raw: Arc<str>,
}

/// What a simple name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Unresolved,
    Local,
    Field { owner: Arc<str>, is_static: bool },
    Type,
    /// A package prefix of a fully qualified name.
    Package,
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub name: Arc<str>,
    pub symbol: Symbol,
}

#[derive(Debug, Clone)]
pub struct FieldAccess {
    pub target: Arc<Expr>,
    pub name: Arc<str>,
    pub symbol: Symbol,
}

#[derive(Debug, Clone)]
pub struct MethodInvocation {
    pub select: Option<Arc<Expr>>,
    pub name: Arc<str>,
    pub args: Vec<Arc<Expr>>,
    pub method_type: Option<Arc<MethodType>>,
    /// The `.name` part starts on a continuation line.
    pub wrap: bool,
}

#[derive(Debug, Clone)]
pub struct NewClass {
    pub class: TypeTree,
    pub args: Vec<Arc<Expr>>,
    pub constructor: Option<Arc<MethodType>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Binary {
    pub op: BinaryOp,
    pub left: Arc<Expr>,
    pub right: Arc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Unary {
    pub op: UnaryOp,
    pub operand: Arc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Ternary {
    pub cond: Arc<Expr>,
    pub then: Arc<Expr>,
    pub otherwise: Arc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Cast {
    pub class: TypeTree,
    pub expr: Arc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Assign {
    pub target: Arc<Expr>,
    pub value: Arc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Lambda {
    pub params: Vec<Arc<str>>,
    /// `(a, b) -> ..` rather than `a -> ..`.
    pub parenthesized: bool,
    pub body: Arc<Expr>,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: JavaType) -> Expr {
        Expr {
            id: NodeId::fresh(),
            kind,
            ty,
            span: None,
            comments: Vec::new(),
        }
    }

    pub fn ident(name: impl Into<Arc<str>>, symbol: Symbol, ty: JavaType) -> Expr {
        Expr::new(
            ExprKind::Ident(Ident {
                name: name.into(),
                symbol,
            }),
            ty,
        )
    }

    pub fn with_kind(&self, kind: ExprKind) -> Expr {
        Expr {
            kind,
            ..self.clone()
        }
    }

    pub fn with_ty(&self, ty: JavaType) -> Expr {
        Expr {
            ty,
            ..self.clone()
        }
    }

    pub fn with_comments(&self, comments: Vec<Comment>) -> Expr {
        Expr {
            comments,
            ..self.clone()
        }
    }

    pub fn as_invocation(&self) -> Option<&MethodInvocation> {
        match &self.kind {
            ExprKind::MethodInvocation(mi) => Some(mi),
            _ => None,
        }
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_new_class(&self) -> Option<&NewClass> {
        match &self.kind {
            ExprKind::NewClass(nc) => Some(nc),
            _ => None,
        }
    }

    pub fn as_field_access(&self) -> Option<&FieldAccess> {
        match &self.kind {
            ExprKind::FieldAccess(fa) => Some(fa),
            _ => None,
        }
    }

    /// Name of an identifier or the last segment of a field access.
    pub fn simple_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(&ident.name),
            ExprKind::FieldAccess(fa) => Some(&fa.name),
            ExprKind::MethodInvocation(mi) => Some(&mi.name),
            _ => None,
        }
    }

    /// `a.b.c` for a chain of identifiers and field accesses.
    pub fn qualified_name(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident.name.to_string()),
            ExprKind::FieldAccess(fa) => {
                let mut name = fa.target.qualified_name()?;
                name.push('.');
                name.push_str(&fa.name);
                Some(name)
            }
            _ => None,
        }
    }

    /// Whether the literal is the given boolean.
    pub fn is_bool_literal(&self, expected: bool) -> bool {
        matches!(
            self.as_literal(),
            Some(Literal { value: LiteralValue::Bool(b), .. }) if *b == expected
        )
    }

    /// Integer value of an `int`/`long` literal, looking through casts,
    /// parentheses and unary minus.
    pub fn int_value(&self) -> Option<i64> {
        match &self.kind {
            ExprKind::Literal(Literal {
                value: LiteralValue::Int(v) | LiteralValue::Long(v),
                ..
            }) => Some(*v),
            ExprKind::Cast(cast) => cast.expr.int_value(),
            ExprKind::Parens(inner) => inner.int_value(),
            ExprKind::Unary(Unary {
                op: UnaryOp::Neg,
                operand,
            }) => operand.int_value().map(|v| -v),
            _ => None,
        }
    }

    pub fn method_type(&self) -> Option<&Arc<MethodType>> {
        match &self.kind {
            ExprKind::MethodInvocation(mi) => mi.method_type.as_ref(),
            ExprKind::NewClass(nc) => nc.constructor.as_ref(),
            _ => None,
        }
    }
}

// ============================================================================
// Types as written in source
// ============================================================================

/// A type reference as written: `String`, `RequestConfig.Builder`,
/// `org.apache.http.HttpHost`, `List<String>`, `byte[]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeTree {
    pub name: Arc<str>,
    pub type_args: Option<Vec<TypeTree>>,
    pub dims: usize,
    pub ty: JavaType,
}

impl TypeTree {
    pub fn new(name: impl Into<Arc<str>>, ty: JavaType) -> TypeTree {
        TypeTree {
            name: name.into(),
            type_args: None,
            dims: 0,
            ty,
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.name.contains('.')
    }

    /// Simple name of the type as it should be written once imported.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// A declared type variable: `T`, `K extends Comparable<K> & Serializable`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: Arc<str>,
    pub bounds: Vec<TypeTree>,
}

// ============================================================================
// Statements and declarations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Synchronized,
    Native,
    Transient,
    Volatile,
    Default,
}

impl Modifier {
    pub fn from_keyword(keyword: &str) -> Option<Modifier> {
        Some(match keyword {
            "public" => Modifier::Public,
            "protected" => Modifier::Protected,
            "private" => Modifier::Private,
            "static" => Modifier::Static,
            "final" => Modifier::Final,
            "abstract" => Modifier::Abstract,
            "synchronized" => Modifier::Synchronized,
            "native" => Modifier::Native,
            "transient" => Modifier::Transient,
            "volatile" => Modifier::Volatile,
            "default" => Modifier::Default,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Abstract => "abstract",
            Modifier::Synchronized => "synchronized",
            Modifier::Native => "native",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Default => "default",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub id: NodeId,
    pub kind: StatementKind,
    /// An empty line separates this statement from the previous one.
    pub blank_line_before: bool,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    Expr(Arc<Expr>),
    VarDecls(Arc<VariableDeclarations>),
    Return(Option<Arc<Expr>>),
    Throw(Arc<Expr>),
    If(If),
    Block(Arc<Block>),
    Method(Arc<MethodDecl>),
    Class(Arc<ClassDecl>),
}

#[derive(Debug, Clone)]
pub struct If {
    pub cond: Arc<Expr>,
    pub then: Arc<Statement>,
    pub otherwise: Option<Arc<Statement>>,
}

impl Statement {
    pub fn new(kind: StatementKind) -> Statement {
        Statement {
            id: NodeId::fresh(),
            kind,
            blank_line_before: false,
            comments: Vec::new(),
        }
    }

    pub fn with_kind(&self, kind: StatementKind) -> Statement {
        Statement {
            kind,
            ..self.clone()
        }
    }

    pub fn with_blank_line_before(&self, blank_line_before: bool) -> Statement {
        Statement {
            blank_line_before,
            ..self.clone()
        }
    }

    pub fn as_var_decls(&self) -> Option<&Arc<VariableDeclarations>> {
        match &self.kind {
            StatementKind::VarDecls(vd) => Some(vd),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&Arc<Expr>> {
        match &self.kind {
            StatementKind::Expr(e) => Some(e),
            _ => None,
        }
    }
}

/// `final Foo a = x, b;` as a local, field or parameter.
#[derive(Debug, Clone)]
pub struct VariableDeclarations {
    pub id: NodeId,
    pub modifiers: Vec<Modifier>,
    pub type_tree: TypeTree,
    pub vars: Vec<NamedVariable>,
}

#[derive(Debug, Clone)]
pub struct NamedVariable {
    pub name: Arc<str>,
    pub init: Option<Arc<Expr>>,
    pub ty: JavaType,
}

impl VariableDeclarations {
    pub fn declares(&self, name: &str) -> bool {
        self.vars.iter().any(|v| &*v.name == name)
    }

    pub fn is_of_class(&self, fqn: &str) -> bool {
        self.type_tree.ty.is_of_class(fqn)
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub id: NodeId,
    pub statements: Vec<Arc<Statement>>,
}

impl Block {
    pub fn new(statements: Vec<Arc<Statement>>) -> Block {
        Block {
            id: NodeId::fresh(),
            statements,
        }
    }

    pub fn with_statements(&self, statements: Vec<Arc<Statement>>) -> Block {
        Block {
            id: self.id,
            statements,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub id: NodeId,
    pub annotations: Vec<Arc<str>>,
    pub modifiers: Vec<Modifier>,
    pub type_params: Vec<TypeParam>,
    /// `None` for constructors.
    pub return_type: Option<TypeTree>,
    pub name: Arc<str>,
    pub params: Vec<Arc<VariableDeclarations>>,
    pub throws: Vec<TypeTree>,
    pub body: Option<Arc<Block>>,
    pub method_type: Option<Arc<MethodType>>,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
}

impl ClassKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub id: NodeId,
    pub annotations: Vec<Arc<str>>,
    pub modifiers: Vec<Modifier>,
    pub kind: ClassKind,
    pub name: Arc<str>,
    pub type_params: Vec<TypeParam>,
    pub extends: Option<TypeTree>,
    pub implements: Vec<TypeTree>,
    pub enum_constants: Vec<Arc<str>>,
    pub body: Arc<Block>,
    /// Fully qualified type of the declared class.
    pub ty: JavaType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub is_static: bool,
    /// Qualified name, ending in `.*` for on-demand imports.
    pub name: Arc<str>,
}

impl Import {
    pub fn new(name: impl Into<Arc<str>>) -> Import {
        Import {
            is_static: false,
            name: name.into(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.name.ends_with(".*")
    }

    /// Package (or class, for static imports) the import draws from.
    pub fn container(&self) -> &str {
        match self.name.rfind('.') {
            Some(i) => &self.name[..i],
            None => "",
        }
    }

    /// Last segment, `*` for on-demand imports.
    pub fn member(&self) -> &str {
        match self.name.rfind('.') {
            Some(i) => &self.name[i + 1..],
            None => &self.name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub id: NodeId,
    pub source_path: Option<Arc<str>>,
    pub package: Option<Arc<str>>,
    pub imports: Vec<Import>,
    pub classes: Vec<Arc<ClassDecl>>,
}

impl CompilationUnit {
    pub fn qualify(&self, simple_name: &str) -> String {
        match &self.package {
            Some(pkg) => format!("{}.{}", pkg, simple_name),
            None => simple_name.to_string(),
        }
    }
}

/// Any node that can sit on the cursor or come out of a template.
#[derive(Debug, Clone)]
pub enum Tree {
    CompilationUnit(Arc<CompilationUnit>),
    Class(Arc<ClassDecl>),
    Method(Arc<MethodDecl>),
    Block(Arc<Block>),
    Statement(Arc<Statement>),
    VarDecls(Arc<VariableDeclarations>),
    Expr(Arc<Expr>),
}

impl Tree {
    pub fn into_expr(self) -> Option<Arc<Expr>> {
        match self {
            Tree::Expr(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_statement(self) -> Option<Arc<Statement>> {
        match self {
            Tree::Statement(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_block(self) -> Option<Arc<Block>> {
        match self {
            Tree::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&Arc<Expr>> {
        match self {
            Tree::Expr(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Arc<MethodDecl>> {
        match self {
            Tree::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Arc<ClassDecl>> {
        match self {
            Tree::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Arc<Block>> {
        match self {
            Tree::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_statement(&self) -> Option<&Arc<Statement>> {
        match self {
            Tree::Statement(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_compilation_unit(&self) -> Option<&Arc<CompilationUnit>> {
        match self {
            Tree::CompilationUnit(cu) => Some(cu),
            _ => None,
        }
    }
}
