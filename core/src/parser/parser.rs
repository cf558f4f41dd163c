use std::sync::Arc;

use lazy_static::lazy_static;
use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use crate::api::ParseOptions;
use crate::parser::error::{ParseError, ParseErrorKind, convert_pest_error};
use crate::parser::syntax::{Span, has_blank_line};
use crate::tree::{
    Assign, Binary, BinaryOp, Block, Cast, ClassDecl, ClassKind, Comment, CompilationUnit, Expr,
    ExprKind, FieldAccess, Ident, If, Import, JavaType, Lambda, Literal, LiteralValue,
    MethodDecl, MethodInvocation, Modifier, NamedVariable, NewClass, NodeId, Primitive,
    Statement, StatementKind, Symbol, Ternary, TypeParam, TypeTree, Unary, UnaryOp, VariableDeclarations,
};

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        .op(Op::infix(Rule::assign, Assoc::Right))      // `=`
        .op(Op::infix(Rule::ternary_op, Assoc::Right))  // `? :`
        .op(Op::infix(Rule::or, Assoc::Left))           // `||`
        .op(Op::infix(Rule::and, Assoc::Left))          // `&&`
        .op(
            Op::infix(Rule::eq, Assoc::Left) |
            Op::infix(Rule::ne, Assoc::Left)
        )                                               // `==`, `!=`
        .op(
            Op::infix(Rule::lt, Assoc::Left) |
            Op::infix(Rule::gt, Assoc::Left) |
            Op::infix(Rule::le, Assoc::Left) |
            Op::infix(Rule::ge, Assoc::Left)
        )                                               // `<`, `>`, `<=`, `>=`
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                               // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::rem, Assoc::Left)
        )                                               // `*`, `/`, `%`
        .op(
            Op::prefix(Rule::not) |
            Op::prefix(Rule::neg) |
            Op::prefix(Rule::plus) |
            Op::prefix(Rule::cast_op)
        )                                               // `!`, `-`, `+`, `(T)`
        .op(
            Op::postfix(Rule::method_call_op) |
            Op::postfix(Rule::field_op) |
            Op::postfix(Rule::class_lit_op)
        )                                               // `.m()`, `.f`, `.class`
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "parser/java.pest"]
pub struct JavaGrammar;

/// Parses one Java source file.
pub fn parse(source: &str) -> Result<CompilationUnit, ParseError> {
    parse_with_options(source, &ParseOptions::default())
}

pub fn parse_with_options(
    source: &str,
    options: &ParseOptions,
) -> Result<CompilationUnit, ParseError> {
    let mut pairs = JavaGrammar::parse(Rule::compilation_unit, source)
        .map_err(|e| convert_pest_error(e, source))?;
    let builder = TreeBuilder::new(source, false);
    let root = builder.next(&mut pairs, None)?;
    let mut unit = builder.compilation_unit(root.into_inner())?;
    unit.source_path = options.source_path.as_deref().map(Arc::from);
    Ok(unit)
}

/// Parses a stub bundle: several `package` sections, each a unit of its own.
pub fn parse_stubs(source: &str) -> Result<Vec<CompilationUnit>, ParseError> {
    let mut pairs = JavaGrammar::parse(Rule::stub_bundle, source)
        .map_err(|e| convert_pest_error(e, source))?;
    let builder = TreeBuilder::new(source, false);
    let root = builder.next(&mut pairs, None)?;
    root.into_inner()
        .filter(|pair| pair.as_rule() == Rule::stub_unit)
        .map(|pair| builder.compilation_unit(pair.into_inner()))
        .collect()
}

/// Shape of a template snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FragmentKind {
    Expression,
    Statements,
    Arguments,
}

#[derive(Debug, Clone)]
pub(crate) enum Fragment {
    Expression(Arc<Expr>),
    Statements(Vec<Arc<Statement>>),
    Arguments(Vec<Arc<Expr>>),
}

/// Parses a template snippet. `#{N}` placeholders are accepted.
pub(crate) fn parse_fragment(source: &str, kind: FragmentKind) -> Result<Fragment, ParseError> {
    let rule = match kind {
        FragmentKind::Expression => Rule::expression_unit,
        FragmentKind::Statements => Rule::statements_unit,
        FragmentKind::Arguments => Rule::arguments_unit,
    };
    let mut pairs = JavaGrammar::parse(rule, source).map_err(|e| convert_pest_error(e, source))?;
    let builder = TreeBuilder::new(source, true);
    let root = builder.next(&mut pairs, None)?;
    let span = root.as_span();
    let mut inner = root.into_inner();
    match kind {
        FragmentKind::Expression => {
            let expr = builder.next(&mut inner, Some(span))?;
            Ok(Fragment::Expression(builder.expression(expr)?))
        }
        FragmentKind::Statements => {
            let statements = builder.statement_list(inner, span.start())?;
            Ok(Fragment::Statements(statements))
        }
        FragmentKind::Arguments => {
            let args = inner
                .filter(|pair| pair.as_rule() == Rule::expression)
                .map(|pair| builder.expression(pair))
                .collect::<Result<_, _>>()?;
            Ok(Fragment::Arguments(args))
        }
    }
}

struct TreeBuilder<'s> {
    source: &'s str,
    placeholders: bool,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str, placeholders: bool) -> Self {
        Self {
            source,
            placeholders,
        }
    }

    fn error(&self, kind: ParseErrorKind, span: pest::Span<'_>) -> ParseError {
        ParseError::new(kind, self.source.to_string(), span.into())
    }

    fn malformed(&self, span: pest::Span<'_>, what: &str) -> ParseError {
        self.error(
            ParseErrorKind::Other {
                message: format!("missing expected {} in rule", what),
            },
            span,
        )
    }

    fn next(
        &self,
        pairs: &mut Pairs<'s, Rule>,
        parent: Option<pest::Span<'s>>,
    ) -> Result<Pair<'s, Rule>, ParseError> {
        pairs.next().ok_or_else(|| {
            let start = pest::Position::from_start(self.source);
            self.malformed(parent.unwrap_or_else(|| start.span(&start)), "pair")
        })
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn compilation_unit(&self, pairs: Pairs<'s, Rule>) -> Result<CompilationUnit, ParseError> {
        let mut unit = CompilationUnit {
            id: NodeId::fresh(),
            source_path: None,
            package: None,
            imports: Vec::new(),
            classes: Vec::new(),
        };
        for pair in pairs {
            match pair.as_rule() {
                Rule::package_decl => {
                    let name = pair
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::qualified_name)
                        .map(|p| Arc::from(p.as_str()));
                    unit.package = name;
                }
                Rule::import_decl => {
                    let mut is_static = false;
                    let mut name = None;
                    for inner in pair.into_inner() {
                        match inner.as_rule() {
                            Rule::static_import => is_static = true,
                            Rule::import_name => name = Some(Arc::from(inner.as_str())),
                            _ => {}
                        }
                    }
                    if let Some(name) = name {
                        unit.imports.push(Import { is_static, name });
                    }
                }
                Rule::class_decl | Rule::interface_decl | Rule::enum_decl => {
                    unit.classes.push(Arc::new(self.class_decl(pair)?));
                }
                _ => {}
            }
        }
        Ok(unit)
    }

    fn decl_mods(&self, pair: Pair<'s, Rule>) -> (Vec<Arc<str>>, Vec<Modifier>) {
        let mut annotations = Vec::new();
        let mut modifiers = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::annotation => annotations.push(Arc::from(inner.as_str())),
                Rule::modifier => {
                    if let Some(m) = Modifier::from_keyword(inner.as_str()) {
                        modifiers.push(m);
                    }
                }
                _ => {}
            }
        }
        (annotations, modifiers)
    }

    fn class_decl(&self, pair: Pair<'s, Rule>) -> Result<ClassDecl, ParseError> {
        let kind = match pair.as_rule() {
            Rule::interface_decl => ClassKind::Interface,
            Rule::enum_decl => ClassKind::Enum,
            _ => ClassKind::Class,
        };
        let span = pair.as_span();
        let mut annotations = Vec::new();
        let mut modifiers = Vec::new();
        let mut name: Option<Arc<str>> = None;
        let mut type_params = Vec::new();
        let mut extends = None;
        let mut implements = Vec::new();
        let mut enum_constants = Vec::new();
        let mut body = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::decl_mods => (annotations, modifiers) = self.decl_mods(inner),
                Rule::ident if name.is_none() => name = Some(Arc::from(inner.as_str())),
                Rule::type_params => type_params = self.type_params(inner)?,
                Rule::extends_clause => {
                    let ty = self.next(&mut inner.into_inner(), Some(span))?;
                    extends = Some(self.class_type(ty)?);
                }
                Rule::implements_clause | Rule::interface_extends => {
                    for ty in inner.into_inner() {
                        implements.push(self.class_type(ty)?);
                    }
                }
                Rule::class_body => body = Some(self.class_body(inner)?),
                Rule::enum_body => {
                    let body_start = inner.as_span().start() + 1;
                    let mut members = Vec::new();
                    for part in inner.into_inner() {
                        match part.as_rule() {
                            Rule::enum_constants => {
                                for constant in part.into_inner() {
                                    if let Some(id) = constant
                                        .into_inner()
                                        .find(|p| p.as_rule() == Rule::ident)
                                    {
                                        enum_constants.push(Arc::from(id.as_str()));
                                    }
                                }
                            }
                            Rule::member => members.push(part),
                            _ => {}
                        }
                    }
                    body = Some(Block::new(self.members(members, body_start)?));
                }
                _ => {}
            }
        }

        let name = name.ok_or_else(|| self.malformed(span, "class name"))?;
        Ok(ClassDecl {
            id: NodeId::fresh(),
            annotations,
            modifiers,
            kind,
            name,
            type_params,
            extends,
            implements,
            enum_constants,
            body: Arc::new(body.unwrap_or_else(|| Block::new(Vec::new()))),
            ty: JavaType::Unknown,
        })
    }

    fn type_params(&self, pair: Pair<'s, Rule>) -> Result<Vec<TypeParam>, ParseError> {
        pair.into_inner()
            .map(|param| {
                let span = param.as_span();
                let mut parts = param.into_inner();
                let name = self.next(&mut parts, Some(span))?;
                let bounds = parts.map(|b| self.class_type(b)).collect::<Result<_, _>>()?;
                Ok(TypeParam {
                    name: Arc::from(name.as_str()),
                    bounds,
                })
            })
            .collect()
    }

    fn class_body(&self, pair: Pair<'s, Rule>) -> Result<Block, ParseError> {
        let start = pair.as_span().start() + 1;
        let members: Vec<_> = pair.into_inner().collect();
        Ok(Block::new(self.members(members, start)?))
    }

    fn members(
        &self,
        members: Vec<Pair<'s, Rule>>,
        body_start: usize,
    ) -> Result<Vec<Arc<Statement>>, ParseError> {
        let mut statements = Vec::new();
        let mut prev_end = body_start;
        for member in members {
            let span = member.as_span();
            let Some(inner) = member.into_inner().next() else {
                prev_end = span.end();
                continue;
            };
            let kind = match inner.as_rule() {
                Rule::class_decl | Rule::interface_decl | Rule::enum_decl => {
                    StatementKind::Class(Arc::new(self.class_decl(inner)?))
                }
                Rule::method_decl | Rule::constructor_decl => {
                    StatementKind::Method(Arc::new(self.method_decl(inner)?))
                }
                Rule::var_decls => StatementKind::VarDecls(Arc::new(self.var_decls(inner)?)),
                _ => return Err(self.malformed(span, "class member")),
            };
            statements.push(Arc::new(self.with_leading_trivia(
                Statement::new(kind),
                prev_end,
                span.start(),
            )));
            prev_end = span.end();
        }
        Ok(statements)
    }

    /// Records blank lines and comments found between two siblings.
    fn with_leading_trivia(&self, mut statement: Statement, gap_start: usize, start: usize) -> Statement {
        let gap = &self.source[gap_start.min(start)..start];
        statement.blank_line_before = has_blank_line(gap);
        statement.comments = comments_in(gap);
        statement
    }

    fn method_decl(&self, pair: Pair<'s, Rule>) -> Result<MethodDecl, ParseError> {
        let span = pair.as_span();
        let mut annotations = Vec::new();
        let mut modifiers = Vec::new();
        let mut type_params = Vec::new();
        let mut return_type = None;
        let mut name: Option<Arc<str>> = None;
        let mut params = Vec::new();
        let mut throws = Vec::new();
        let mut body = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::decl_mods => (annotations, modifiers) = self.decl_mods(inner),
                Rule::type_params => type_params = self.type_params(inner)?,
                Rule::type_ref => return_type = Some(self.type_ref(inner)?),
                Rule::ident => name = Some(Arc::from(inner.as_str())),
                Rule::formal_params => {
                    for param in inner.into_inner() {
                        params.push(Arc::new(self.formal_param(param)?));
                    }
                }
                Rule::throws_clause => {
                    for ty in inner.into_inner() {
                        throws.push(self.class_type(ty)?);
                    }
                }
                Rule::block => body = Some(Arc::new(self.block(inner)?)),
                _ => {}
            }
        }

        Ok(MethodDecl {
            id: NodeId::fresh(),
            annotations,
            modifiers,
            type_params,
            return_type,
            name: name.ok_or_else(|| self.malformed(span, "method name"))?,
            params,
            throws,
            body,
            method_type: None,
        })
    }

    fn formal_param(&self, pair: Pair<'s, Rule>) -> Result<VariableDeclarations, ParseError> {
        let span = pair.as_span();
        let mut modifiers = Vec::new();
        let mut type_tree = None;
        let mut name = None;
        let mut varargs = false;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::decl_mods => modifiers = self.decl_mods(inner).1,
                Rule::type_ref => type_tree = Some(self.type_ref(inner)?),
                Rule::varargs => varargs = true,
                Rule::ident => name = Some(Arc::from(inner.as_str())),
                _ => {}
            }
        }
        let mut type_tree = type_tree.ok_or_else(|| self.malformed(span, "parameter type"))?;
        if varargs {
            type_tree.dims += 1;
            type_tree.ty = JavaType::array_of(type_tree.ty);
        }
        Ok(VariableDeclarations {
            id: NodeId::fresh(),
            modifiers,
            type_tree,
            vars: vec![NamedVariable {
                name: name.ok_or_else(|| self.malformed(span, "parameter name"))?,
                init: None,
                ty: JavaType::Unknown,
            }],
        })
    }

    fn var_decls(&self, pair: Pair<'s, Rule>) -> Result<VariableDeclarations, ParseError> {
        let span = pair.as_span();
        let mut modifiers = Vec::new();
        let mut type_tree = None;
        let mut vars = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::decl_mods => modifiers = self.decl_mods(inner).1,
                Rule::type_ref => type_tree = Some(self.type_ref(inner)?),
                Rule::var_declarator => {
                    let decl_span = inner.as_span();
                    let mut parts = inner.into_inner();
                    let name = self.next(&mut parts, Some(decl_span))?;
                    let init = parts.next().map(|e| self.expression(e)).transpose()?;
                    vars.push(NamedVariable {
                        name: Arc::from(name.as_str()),
                        init,
                        ty: JavaType::Unknown,
                    });
                }
                _ => {}
            }
        }
        Ok(VariableDeclarations {
            id: NodeId::fresh(),
            modifiers,
            type_tree: type_tree.ok_or_else(|| self.malformed(span, "type"))?,
            vars,
        })
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn type_ref(&self, pair: Pair<'s, Rule>) -> Result<TypeTree, ParseError> {
        let span = pair.as_span();
        let mut inner = pair.into_inner();
        let base = self.next(&mut inner, Some(span))?;
        let mut tree = match base.as_rule() {
            Rule::primitive_type => {
                let keyword = base.as_str();
                let ty = Primitive::from_keyword(keyword)
                    .map(JavaType::Primitive)
                    .ok_or_else(|| self.malformed(span, "primitive type"))?;
                TypeTree::new(keyword, ty)
            }
            _ => self.class_type(base)?,
        };
        if let Some(dims) = inner.next() {
            tree.dims = dims.as_str().matches('[').count();
            for _ in 0..tree.dims {
                tree.ty = JavaType::array_of(tree.ty);
            }
        }
        Ok(tree)
    }

    fn class_type(&self, pair: Pair<'s, Rule>) -> Result<TypeTree, ParseError> {
        let span = pair.as_span();
        let mut inner = pair.into_inner();
        let name = self.next(&mut inner, Some(span))?;
        let mut tree = TypeTree::new(name.as_str(), JavaType::Unknown);
        if let Some(args) = inner.next() {
            let mut type_args = Vec::new();
            for arg in args.into_inner() {
                type_args.push(match arg.as_rule() {
                    Rule::wildcard => self.wildcard(arg)?,
                    _ => self.type_ref(arg)?,
                });
            }
            tree.type_args = Some(type_args);
        }
        Ok(tree)
    }

    fn wildcard(&self, pair: Pair<'s, Rule>) -> Result<TypeTree, ParseError> {
        let mut inner = pair.into_inner();
        let Some(bound) = inner.next() else {
            return Ok(TypeTree::new("?", JavaType::Unknown));
        };
        let span = bound.as_span();
        let bounded = self.type_ref(self.next(&mut inner, Some(span))?)?;
        let mut tree = TypeTree::new(format!("? {} {}", bound.as_str(), bounded.name), JavaType::Unknown);
        tree.type_args = bounded.type_args;
        Ok(tree)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn block(&self, pair: Pair<'s, Rule>) -> Result<Block, ParseError> {
        let start = pair.as_span().start() + 1;
        Ok(Block::new(self.statement_list(pair.into_inner(), start)?))
    }

    fn statement_list(
        &self,
        pairs: Pairs<'s, Rule>,
        start: usize,
    ) -> Result<Vec<Arc<Statement>>, ParseError> {
        let mut statements = Vec::new();
        let mut prev_end = start;
        for pair in pairs.filter(|p| p.as_rule() == Rule::statement) {
            let span = pair.as_span();
            let statement = self.statement(pair)?;
            statements.push(Arc::new(self.with_leading_trivia(
                statement,
                prev_end,
                span.start(),
            )));
            prev_end = code_end(self.source, span.start(), span.end());
        }
        Ok(statements)
    }

    fn statement(&self, pair: Pair<'s, Rule>) -> Result<Statement, ParseError> {
        let span = pair.as_span();
        let inner = self.next(&mut pair.into_inner(), Some(span))?;
        let kind = match inner.as_rule() {
            Rule::block => StatementKind::Block(Arc::new(self.block(inner)?)),
            Rule::if_stmt => {
                let mut parts = inner.into_inner();
                let cond = self.expression(self.next(&mut parts, Some(span))?)?;
                let then = Arc::new(self.statement(self.next(&mut parts, Some(span))?)?);
                let otherwise = parts
                    .next()
                    .map(|p| self.statement(p).map(Arc::new))
                    .transpose()?;
                StatementKind::If(If {
                    cond,
                    then,
                    otherwise,
                })
            }
            Rule::return_stmt => StatementKind::Return(
                inner
                    .into_inner()
                    .next()
                    .map(|e| self.expression(e))
                    .transpose()?,
            ),
            Rule::throw_stmt => {
                StatementKind::Throw(self.expression(self.next(&mut inner.into_inner(), Some(span))?)?)
            }
            Rule::var_decls => StatementKind::VarDecls(Arc::new(self.var_decls(inner)?)),
            Rule::expression_stmt => {
                StatementKind::Expr(self.expression(self.next(&mut inner.into_inner(), Some(span))?)?)
            }
            _ => return Err(self.malformed(span, "statement")),
        };
        Ok(Statement::new(kind))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&self, pair: Pair<'s, Rule>) -> Result<Arc<Expr>, ParseError> {
        PRATT_PARSER
            .map_primary(|primary| self.primary(primary))
            .map_prefix(|op, rhs| self.prefix(op, rhs?))
            .map_infix(|lhs, op, rhs| self.infix(lhs?, op, rhs?))
            .map_postfix(|lhs, op| self.postfix(lhs?, op))
            .parse(pair.into_inner())
    }

    fn arguments(&self, pair: Pair<'s, Rule>) -> Result<Vec<Arc<Expr>>, ParseError> {
        pair.into_inner().map(|e| self.expression(e)).collect()
    }

    fn primary(&self, pair: Pair<'s, Rule>) -> Result<Arc<Expr>, ParseError> {
        let span = pair.as_span();
        let kind = match pair.as_rule() {
            Rule::paren => {
                let inner = self.expression(self.next(&mut pair.into_inner(), Some(span))?)?;
                ExprKind::Parens(inner)
            }
            Rule::ident => ExprKind::Ident(Ident {
                name: Arc::from(pair.as_str()),
                symbol: Symbol::Unresolved,
            }),
            Rule::this_expr => ExprKind::Ident(Ident {
                name: Arc::from("this"),
                symbol: Symbol::Unresolved,
            }),
            Rule::unqualified_call => {
                let mut parts = pair.into_inner();
                let name = self.next(&mut parts, Some(span))?;
                let args = self.arguments(self.next(&mut parts, Some(span))?)?;
                ExprKind::MethodInvocation(MethodInvocation {
                    select: None,
                    name: Arc::from(name.as_str()),
                    args,
                    method_type: None,
                    wrap: false,
                })
            }
            Rule::new_class => {
                let mut parts = pair.into_inner();
                let class = self.class_type(self.next(&mut parts, Some(span))?)?;
                let args = self.arguments(self.next(&mut parts, Some(span))?)?;
                ExprKind::NewClass(NewClass {
                    class,
                    args,
                    constructor: None,
                })
            }
            Rule::lambda => {
                let mut parts = pair.into_inner();
                let params_pair = self.next(&mut parts, Some(span))?;
                let parenthesized = params_pair.as_str().starts_with('(');
                let params = params_pair
                    .into_inner()
                    .map(|p| Arc::from(p.as_str()))
                    .collect();
                let body = self.expression(self.next(&mut parts, Some(span))?)?;
                ExprKind::Lambda(Lambda {
                    params,
                    parenthesized,
                    body,
                })
            }
            Rule::placeholder => {
                if !self.placeholders {
                    return Err(self.error(ParseErrorKind::UnexpectedPlaceholder, span));
                }
                let text = pair.as_str();
                let index = text[2..text.len() - 1].parse().map_err(|_| {
                    self.error(
                        ParseErrorKind::InvalidNumber {
                            text: text.to_string(),
                        },
                        span,
                    )
                })?;
                ExprKind::Placeholder(index)
            }
            Rule::null_lit
            | Rule::bool_lit
            | Rule::int_lit
            | Rule::long_lit
            | Rule::float_lit
            | Rule::char_lit
            | Rule::string_lit => ExprKind::Literal(self.literal(pair)?),
            _ => return Err(self.malformed(span, "primary expression")),
        };
        Ok(self.spanned(kind, span.start(), span.end()))
    }

    fn literal(&self, pair: Pair<'s, Rule>) -> Result<Literal, ParseError> {
        let span = pair.as_span();
        let raw = pair.as_str();
        let invalid_number = || {
            self.error(
                ParseErrorKind::InvalidNumber {
                    text: raw.to_string(),
                },
                span,
            )
        };
        let value = match pair.as_rule() {
            Rule::null_lit => LiteralValue::Null,
            Rule::bool_lit => LiteralValue::Bool(raw == "true"),
            Rule::int_lit => LiteralValue::Int(parse_integer(raw).ok_or_else(invalid_number)?),
            Rule::long_lit => LiteralValue::Long(
                parse_integer(&raw[..raw.len() - 1]).ok_or_else(invalid_number)?,
            ),
            Rule::float_lit => {
                let digits: String = raw
                    .trim_end_matches(['f', 'F', 'd', 'D'])
                    .chars()
                    .filter(|c| *c != '_')
                    .collect();
                LiteralValue::Float(digits.parse().map_err(|_| invalid_number())?)
            }
            Rule::char_lit => {
                let text = unescape(&raw[1..raw.len() - 1]).ok_or_else(|| {
                    self.error(
                        ParseErrorKind::InvalidEscape {
                            text: raw.to_string(),
                        },
                        span,
                    )
                })?;
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => LiteralValue::Char(c),
                    _ => {
                        return Err(self.error(
                            ParseErrorKind::InvalidEscape {
                                text: raw.to_string(),
                            },
                            span,
                        ));
                    }
                }
            }
            _ => LiteralValue::String(unescape(&raw[1..raw.len() - 1]).ok_or_else(|| {
                self.error(
                    ParseErrorKind::InvalidEscape {
                        text: raw.to_string(),
                    },
                    span,
                )
            })?),
        };
        Ok(Literal {
            value,
            raw: Arc::from(raw),
        })
    }

    fn prefix(&self, op: Pair<'s, Rule>, rhs: Arc<Expr>) -> Result<Arc<Expr>, ParseError> {
        let start = op.as_span().start();
        let end = end_of(&rhs);
        let kind = match op.as_rule() {
            Rule::not => unary(UnaryOp::Not, rhs),
            Rule::neg => unary(UnaryOp::Neg, rhs),
            Rule::plus => unary(UnaryOp::Plus, rhs),
            Rule::cast_op => {
                let span = op.as_span();
                let class = self.type_ref(self.next(&mut op.into_inner(), Some(span))?)?;
                ExprKind::Cast(Cast { class, expr: rhs })
            }
            _ => return Err(self.malformed(op.as_span(), "prefix operator")),
        };
        Ok(self.spanned(kind, start, end))
    }

    fn infix(
        &self,
        lhs: Arc<Expr>,
        op: Pair<'s, Rule>,
        rhs: Arc<Expr>,
    ) -> Result<Arc<Expr>, ParseError> {
        let start = start_of(&lhs);
        let end = end_of(&rhs);
        let binary = |op| {
            ExprKind::Binary(Binary {
                op,
                left: lhs.clone(),
                right: rhs.clone(),
            })
        };
        let kind = match op.as_rule() {
            Rule::mul => binary(BinaryOp::Mul),
            Rule::div => binary(BinaryOp::Div),
            Rule::rem => binary(BinaryOp::Rem),
            Rule::add => binary(BinaryOp::Add),
            Rule::sub => binary(BinaryOp::Sub),
            Rule::lt => binary(BinaryOp::Lt),
            Rule::gt => binary(BinaryOp::Gt),
            Rule::le => binary(BinaryOp::Le),
            Rule::ge => binary(BinaryOp::Ge),
            Rule::eq => binary(BinaryOp::Eq),
            Rule::ne => binary(BinaryOp::Ne),
            Rule::and => binary(BinaryOp::And),
            Rule::or => binary(BinaryOp::Or),
            Rule::assign => ExprKind::Assign(Assign {
                target: lhs.clone(),
                value: rhs.clone(),
            }),
            Rule::ternary_op => {
                let span = op.as_span();
                let then = self.expression(self.next(&mut op.into_inner(), Some(span))?)?;
                ExprKind::Ternary(Ternary {
                    cond: lhs.clone(),
                    then,
                    otherwise: rhs.clone(),
                })
            }
            _ => return Err(self.malformed(op.as_span(), "infix operator")),
        };
        Ok(self.spanned(kind, start, end))
    }

    fn postfix(&self, lhs: Arc<Expr>, op: Pair<'s, Rule>) -> Result<Arc<Expr>, ParseError> {
        let span = op.as_span();
        let start = start_of(&lhs);
        let kind = match op.as_rule() {
            Rule::method_call_op => {
                let gap = &self.source[end_of(&lhs).min(span.start())..span.start()];
                let mut parts = op.into_inner();
                let name = self.next(&mut parts, Some(span))?;
                let args = self.arguments(self.next(&mut parts, Some(span))?)?;
                ExprKind::MethodInvocation(MethodInvocation {
                    select: Some(lhs),
                    name: Arc::from(name.as_str()),
                    args,
                    method_type: None,
                    wrap: gap.contains('\n'),
                })
            }
            Rule::field_op => {
                let name = self.next(&mut op.into_inner(), Some(span))?;
                ExprKind::FieldAccess(FieldAccess {
                    target: lhs,
                    name: Arc::from(name.as_str()),
                    symbol: Symbol::Unresolved,
                })
            }
            Rule::class_lit_op => {
                let name = lhs
                    .qualified_name()
                    .ok_or_else(|| self.malformed(span, "class name"))?;
                ExprKind::ClassLiteral(TypeTree::new(name, JavaType::Unknown))
            }
            _ => return Err(self.malformed(span, "postfix operator")),
        };
        Ok(self.spanned(kind, start, span.end()))
    }

    fn spanned(&self, kind: ExprKind, start: usize, end: usize) -> Arc<Expr> {
        let mut expr = Expr::new(kind, JavaType::Unknown);
        expr.span = Some(Span::new(start, end));
        Arc::new(expr)
    }
}

fn unary(op: UnaryOp, operand: Arc<Expr>) -> ExprKind {
    ExprKind::Unary(Unary { op, operand })
}

fn start_of(expr: &Expr) -> usize {
    expr.span.as_ref().map_or(0, |s| s.0.start)
}

fn end_of(expr: &Expr) -> usize {
    expr.span.as_ref().map_or(0, |s| s.0.end)
}

fn parse_integer(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| *c != '_').collect();
    match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => digits.parse().ok(),
    }
}

/// Decodes Java escape sequences. `None` on a malformed escape.
fn unescape(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            's' => ' ',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?
            }
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

/// End of the last code character in `source[start..end]`.
///
/// A rule ending in an optional part (`if` without `else`) also spans the
/// whitespace and comments skipped while trying that part.
fn code_end(source: &str, start: usize, end: usize) -> usize {
    let text = &source[start..end];
    let mut last = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                while chars.next_if(|(_, c)| *c != '\n').is_some() {}
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut star = false;
                for (_, c) in chars.by_ref() {
                    if star && c == '/' {
                        break;
                    }
                    star = c == '*';
                }
            }
            '"' | '\'' => {
                let mut escaped = false;
                last = i + 1;
                for (j, d) in chars.by_ref() {
                    last = j + d.len_utf8();
                    if !escaped && d == c {
                        break;
                    }
                    escaped = !escaped && d == '\\';
                }
            }
            c if c.is_whitespace() => {}
            c => last = i + c.len_utf8(),
        }
    }
    start + last
}

/// Comments found in the whitespace between two siblings.
fn comments_in(gap: &str) -> Vec<Comment> {
    let mut comments = Vec::new();
    let mut rest = gap;
    while let Some(pos) = rest.find('/') {
        let tail = &rest[pos..];
        if let Some(body) = tail.strip_prefix("/*") {
            let Some(end) = body.find("*/") else { break };
            comments.push(Comment::new(&body[..end]));
            rest = &body[end + 2..];
        } else if let Some(body) = tail.strip_prefix("//") {
            let end = body.find('\n').unwrap_or(body.len());
            comments.push(Comment::line(body[..end].trim_end()));
            rest = &body[end..];
        } else {
            rest = &tail[1..];
        }
    }
    comments
}
