//! Prints trees back to Java source.
//!
//! Output is canonical rather than a byte-for-byte echo of the input:
//! four-space indentation, one member or statement per line, a single space
//! around binary operators. What the tree records about layout is honoured:
//! blank lines before statements, wrapped method chains and comments.

use core::fmt::Write;

use crate::tree::{
    Block, ClassDecl, ClassKind, Comment, CompilationUnit, Expr, ExprKind, Import, MethodDecl,
    Modifier, Statement, StatementKind, TypeParam, TypeTree, VariableDeclarations,
};

const INDENT: &str = "    ";

/// Continuation lines of a wrapped chain sit this many levels deeper than
/// their statement.
const CONTINUATION_LEVELS: usize = 2;

pub fn print(unit: &CompilationUnit) -> String {
    let mut printer = Printer::default();
    printer.unit(unit);
    printer.out
}

pub fn print_expr(expr: &Expr) -> String {
    let mut printer = Printer::default();
    printer.expr(expr);
    printer.out
}

/// Prints a statement at the given nesting depth, without a trailing newline.
pub fn print_statement(statement: &Statement, depth: usize) -> String {
    let mut printer = Printer {
        out: String::new(),
        depth,
    };
    printer.statement(statement);
    printer.out.trim_end_matches('\n').to_string()
}

pub fn print_type_tree(tree: &TypeTree) -> String {
    let mut printer = Printer::default();
    printer.type_tree(tree);
    printer.out
}

/// Which blank-line separated block an import belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImportGroup {
    Other,
    Java,
    Static,
}

impl ImportGroup {
    pub fn of(import: &Import) -> ImportGroup {
        if import.is_static {
            ImportGroup::Static
        } else if import.name.starts_with("java.") || import.name.starts_with("javax.") {
            ImportGroup::Java
        } else {
            ImportGroup::Other
        }
    }
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    fn unit(&mut self, unit: &CompilationUnit) {
        if let Some(package) = &unit.package {
            let _ = writeln!(self.out, "package {};", package);
            self.newline();
        }
        let mut previous: Option<ImportGroup> = None;
        for import in &unit.imports {
            let group = ImportGroup::of(import);
            if previous.is_some_and(|p| p != group) {
                self.newline();
            }
            previous = Some(group);
            let keyword = if import.is_static { "import static" } else { "import" };
            let _ = writeln!(self.out, "{} {};", keyword, import.name);
        }
        if !unit.imports.is_empty() {
            self.newline();
        }
        for (i, class) in unit.classes.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.class_decl(class);
            self.newline();
        }
    }

    fn comments(&mut self, comments: &[Comment]) {
        for comment in comments {
            self.indent();
            if comment.line {
                let _ = write!(self.out, "//{}", comment.text);
            } else {
                let _ = write!(self.out, "/*{}*/", comment.text);
            }
            self.newline();
        }
    }

    fn annotations(&mut self, annotations: &[std::sync::Arc<str>]) {
        for annotation in annotations {
            self.push(annotation);
            self.newline();
            self.indent();
        }
    }

    fn modifiers(&mut self, modifiers: &[Modifier]) {
        for modifier in modifiers {
            self.push(modifier.keyword());
            self.push(" ");
        }
    }

    fn class_decl(&mut self, class: &ClassDecl) {
        self.annotations(&class.annotations);
        self.modifiers(&class.modifiers);
        let _ = write!(self.out, "{} {}", class.kind.keyword(), class.name);
        self.type_params(&class.type_params);
        if let Some(extends) = &class.extends {
            self.push(" extends ");
            self.type_tree(extends);
        }
        if !class.implements.is_empty() {
            self.push(match class.kind {
                ClassKind::Interface => " extends ",
                _ => " implements ",
            });
            self.type_list(&class.implements);
        }
        self.push(" {");
        self.newline();
        self.depth += 1;
        if !class.enum_constants.is_empty() {
            self.indent();
            self.push(&class.enum_constants.join(", "));
            if !class.body.statements.is_empty() {
                self.push(";");
            }
            self.newline();
        }
        for (i, member) in class.body.statements.iter().enumerate() {
            let after_constants = i == 0 && !class.enum_constants.is_empty();
            if member.blank_line_before || after_constants {
                self.newline();
            }
            self.member(member);
        }
        self.depth -= 1;
        self.indent();
        self.push("}");
    }

    fn member(&mut self, member: &Statement) {
        self.comments(&member.comments);
        self.indent();
        match &member.kind {
            StatementKind::Method(method) => self.method_decl(method),
            StatementKind::Class(class) => self.class_decl(class),
            StatementKind::VarDecls(fields) => {
                self.var_decls(fields);
                self.push(";");
            }
            _ => self.statement_body(member),
        }
        self.newline();
    }

    fn method_decl(&mut self, method: &MethodDecl) {
        self.annotations(&method.annotations);
        self.modifiers(&method.modifiers);
        if !method.type_params.is_empty() {
            self.type_params(&method.type_params);
            self.push(" ");
        }
        if let Some(ret) = &method.return_type {
            self.type_tree(ret);
            self.push(" ");
        }
        self.push(&method.name);
        self.push("(");
        for (i, param) in method.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.var_decls(param);
        }
        self.push(")");
        if !method.throws.is_empty() {
            self.push(" throws ");
            self.type_list(&method.throws);
        }
        match &method.body {
            Some(body) => {
                self.push(" ");
                self.block(body);
            }
            None => self.push(";"),
        }
    }

    fn var_decls(&mut self, decls: &VariableDeclarations) {
        self.modifiers(&decls.modifiers);
        self.type_tree(&decls.type_tree);
        for (i, var) in decls.vars.iter().enumerate() {
            self.push(if i == 0 { " " } else { ", " });
            self.push(&var.name);
            if let Some(init) = &var.init {
                self.push(" = ");
                self.expr(init);
            }
        }
    }

    fn type_tree(&mut self, tree: &TypeTree) {
        self.push(&tree.name);
        if let Some(args) = &tree.type_args {
            self.push("<");
            self.type_list(args);
            self.push(">");
        }
        for _ in 0..tree.dims {
            self.push("[]");
        }
    }

    fn type_params(&mut self, params: &[TypeParam]) {
        if params.is_empty() {
            return;
        }
        self.push("<");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(&param.name);
            for (j, bound) in param.bounds.iter().enumerate() {
                self.push(if j == 0 { " extends " } else { " & " });
                self.type_tree(bound);
            }
        }
        self.push(">");
    }

    fn type_list(&mut self, trees: &[TypeTree]) {
        for (i, tree) in trees.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.type_tree(tree);
        }
    }

    fn block(&mut self, block: &Block) {
        self.push("{");
        self.newline();
        self.depth += 1;
        for statement in &block.statements {
            self.statement(statement);
        }
        self.depth -= 1;
        self.indent();
        self.push("}");
    }

    /// A statement on its own line(s), comments and blank line included.
    fn statement(&mut self, statement: &Statement) {
        if statement.blank_line_before {
            self.newline();
        }
        self.comments(&statement.comments);
        self.indent();
        self.statement_body(statement);
        self.newline();
    }

    fn statement_body(&mut self, statement: &Statement) {
        match &statement.kind {
            StatementKind::Expr(e) => {
                self.expr(e);
                self.push(";");
            }
            StatementKind::VarDecls(vd) => {
                self.var_decls(vd);
                self.push(";");
            }
            StatementKind::Return(e) => match e {
                Some(e) => {
                    self.push("return ");
                    self.expr(e);
                    self.push(";");
                }
                None => self.push("return;"),
            },
            StatementKind::Throw(e) => {
                self.push("throw ");
                self.expr(e);
                self.push(";");
            }
            StatementKind::If(if_) => {
                self.push("if (");
                self.expr(&if_.cond);
                self.push(")");
                self.branch(&if_.then);
                if let Some(otherwise) = &if_.otherwise {
                    match &if_.then.kind {
                        StatementKind::Block(_) => self.push(" else"),
                        _ => {
                            self.newline();
                            self.indent();
                            self.push("else");
                        }
                    }
                    match &otherwise.kind {
                        StatementKind::If(_) => {
                            self.push(" ");
                            self.statement_body(otherwise);
                        }
                        _ => self.branch(otherwise),
                    }
                }
            }
            StatementKind::Block(b) => self.block(b),
            StatementKind::Method(m) => self.method_decl(m),
            StatementKind::Class(c) => self.class_decl(c),
        }
    }

    /// The body of an `if` or `else`: a block on the same line, anything else
    /// on the next line one level deeper.
    fn branch(&mut self, statement: &Statement) {
        match &statement.kind {
            StatementKind::Block(b) => {
                self.push(" ");
                self.block(b);
            }
            _ => {
                self.newline();
                self.depth += 1;
                self.indent();
                self.statement_body(statement);
                self.depth -= 1;
            }
        }
    }

    fn args(&mut self, args: &[std::sync::Arc<Expr>]) {
        self.push("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(arg);
        }
        self.push(")");
    }

    fn expr(&mut self, expr: &Expr) {
        for comment in &expr.comments {
            if comment.line {
                let _ = writeln!(self.out, "//{}", comment.text);
                self.indent();
            } else {
                let _ = write!(self.out, "/*{}*/ ", comment.text);
            }
        }
        match &expr.kind {
            ExprKind::Literal(lit) => self.push(&lit.raw),
            ExprKind::Ident(ident) => self.push(&ident.name),
            ExprKind::FieldAccess(fa) => {
                self.expr(&fa.target);
                self.push(".");
                self.push(&fa.name);
            }
            ExprKind::MethodInvocation(mi) => {
                if let Some(select) = &mi.select {
                    self.expr(select);
                    if mi.wrap {
                        self.newline();
                        self.depth += CONTINUATION_LEVELS;
                        self.indent();
                        self.depth -= CONTINUATION_LEVELS;
                    }
                    self.push(".");
                }
                self.push(&mi.name);
                self.args(&mi.args);
            }
            ExprKind::NewClass(nc) => {
                self.push("new ");
                self.type_tree(&nc.class);
                self.args(&nc.args);
            }
            ExprKind::Binary(b) => {
                self.expr(&b.left);
                let _ = write!(self.out, " {} ", b.op.symbol());
                self.expr(&b.right);
            }
            ExprKind::Unary(u) => {
                self.push(u.op.symbol());
                self.expr(&u.operand);
            }
            ExprKind::Parens(inner) => {
                self.push("(");
                self.expr(inner);
                self.push(")");
            }
            ExprKind::Ternary(t) => {
                self.expr(&t.cond);
                self.push(" ? ");
                self.expr(&t.then);
                self.push(" : ");
                self.expr(&t.otherwise);
            }
            ExprKind::Cast(c) => {
                self.push("(");
                self.type_tree(&c.class);
                self.push(") ");
                self.expr(&c.expr);
            }
            ExprKind::Assign(a) => {
                self.expr(&a.target);
                self.push(" = ");
                self.expr(&a.value);
            }
            ExprKind::Lambda(l) => {
                if l.parenthesized {
                    self.push("(");
                    self.push(&l.params.join(", "));
                    self.push(")");
                } else {
                    self.push(&l.params.join(", "));
                }
                self.push(" -> ");
                self.expr(&l.body);
            }
            ExprKind::ClassLiteral(tree) => {
                self.type_tree(tree);
                self.push(".class");
            }
            ExprKind::Placeholder(index) => {
                let _ = write!(self.out, "#{{{}}}", index);
            }
        }
    }
}

#[cfg(test)]
mod printer_test;
