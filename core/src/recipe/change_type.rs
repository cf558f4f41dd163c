use std::sync::Arc;

use crate::recipe::{Recipe, RecipeDescriptor};
use crate::search::Precondition;
use crate::tree::{
    CompilationUnit, Expr, ExprKind, FieldAccess, Ident, Import, JavaType, MethodDecl,
    MethodInvocation, MethodType, NamedVariable, NewClass, Symbol, TypeTree, VariableDeclarations,
    relocate_name,
};
use crate::visitor::{
    JavaVisitor, VisitContext, super_compilation_unit, super_expr, super_method, super_type_tree,
    super_var_decls,
};

/// Moves every reference to class `old`, and to classes nested in it, over
/// to `new`: type names as written, expression types, call bindings and
/// imports.
#[derive(Debug, Clone)]
pub struct ChangeType {
    old: Arc<str>,
    new: Arc<str>,
}

impl ChangeType {
    pub fn new(old: &str, new: &str) -> Self {
        Self {
            old: Arc::from(old),
            new: Arc::from(new),
        }
    }
}

impl Recipe for ChangeType {
    fn descriptor(&self) -> RecipeDescriptor {
        RecipeDescriptor::new(
            "rewrite.ChangeType",
            "Change type",
            format!("Change type `{}` to `{}`.", self.old, self.new),
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::any(vec![
            Precondition::uses_type(&self.old),
            Precondition::uses_type(&format!("{}..*", self.old)),
        ])
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(ChangeTypeVisitor {
            old: self.old.clone(),
            new: self.new.clone(),
        })
    }
}

struct ChangeTypeVisitor {
    old: Arc<str>,
    new: Arc<str>,
}

impl ChangeTypeVisitor {
    fn ty(&self, ty: &JavaType) -> Option<JavaType> {
        ty.relocate(&self.old, &self.new)
    }

    fn method(&self, method: &Option<Arc<MethodType>>) -> Option<Option<Arc<MethodType>>> {
        let moved = method.as_ref()?.relocate(&self.old, &self.new)?;
        Some(Some(Arc::new(moved)))
    }

    fn new_simple_name(&self) -> &str {
        self.new.rsplit('.').next().unwrap_or(&self.new)
    }

    /// How a reference written `written` to class `before` reads once moved.
    /// `None` when the written form stays, e.g. `Builder` under an import of
    /// `Old.Builder`; the import itself is moved instead.
    fn rename(&self, written: &str, before: &str, ctx: &mut VisitContext<'_>) -> Option<Arc<str>> {
        if let Some(moved) = relocate_name(written, &self.old, &self.new) {
            return Some(moved);
        }
        let mut head = before;
        for _ in 0..written.matches('.').count() {
            head = head.rsplit_once('.')?.0;
        }
        if head != &*self.old {
            return None;
        }
        ctx.maybe_add_import(&self.new);
        let rest = written.find('.').map_or("", |i| &written[i..]);
        Some(Arc::from(format!("{}{}", self.new_simple_name(), rest)))
    }

    fn import(&self, import: &Import) -> Import {
        let name = if import.is_static || import.is_wildcard() {
            relocate_name(import.container(), &self.old, &self.new)
                .map(|owner| Arc::from(format!("{}.{}", owner, import.member())))
        } else {
            relocate_name(&import.name, &self.old, &self.new)
        };
        Import {
            is_static: import.is_static,
            name: name.unwrap_or_else(|| import.name.clone()),
        }
    }
}

/// `a.b.C` as a chain of package names ending in a type name.
fn qualified_type(fqn: &str, ty: JavaType) -> Expr {
    let Some((package, simple)) = fqn.rsplit_once('.') else {
        return Expr::ident(fqn, Symbol::Type, ty);
    };
    let mut segments = package.split('.');
    let first = segments.next().unwrap_or(package);
    let mut target = Arc::new(Expr::ident(first, Symbol::Package, JavaType::Unknown));
    for segment in segments {
        target = Arc::new(Expr::new(
            ExprKind::FieldAccess(FieldAccess {
                target,
                name: Arc::from(segment),
                symbol: Symbol::Package,
            }),
            JavaType::Unknown,
        ));
    }
    Expr::new(
        ExprKind::FieldAccess(FieldAccess {
            target,
            name: Arc::from(simple),
            symbol: Symbol::Type,
        }),
        ty,
    )
}

impl JavaVisitor for ChangeTypeVisitor {
    fn visit_compilation_unit(
        &mut self,
        unit: &Arc<CompilationUnit>,
        ctx: &mut VisitContext<'_>,
    ) -> Arc<CompilationUnit> {
        let unit = super_compilation_unit(self, unit, ctx);
        let mut imports: Vec<Import> = Vec::with_capacity(unit.imports.len());
        for import in unit.imports.iter().map(|i| self.import(i)) {
            if !imports.contains(&import) {
                imports.push(import);
            }
        }
        if imports == unit.imports {
            return unit;
        }
        Arc::new(CompilationUnit {
            imports,
            ..CompilationUnit::clone(&unit)
        })
    }

    fn visit_method(&mut self, method: &Arc<MethodDecl>, ctx: &mut VisitContext<'_>) -> Arc<MethodDecl> {
        let method = super_method(self, method, ctx);
        match self.method(&method.method_type) {
            Some(method_type) => Arc::new(MethodDecl {
                method_type,
                ..MethodDecl::clone(&method)
            }),
            None => method,
        }
    }

    fn visit_var_decls(
        &mut self,
        decls: &Arc<VariableDeclarations>,
        ctx: &mut VisitContext<'_>,
    ) -> Arc<VariableDeclarations> {
        let decls = super_var_decls(self, decls, ctx);
        if decls.vars.iter().all(|v| self.ty(&v.ty).is_none()) {
            return decls;
        }
        let vars = decls
            .vars
            .iter()
            .map(|var| NamedVariable {
                ty: self.ty(&var.ty).unwrap_or_else(|| var.ty.clone()),
                ..var.clone()
            })
            .collect();
        Arc::new(VariableDeclarations {
            vars,
            ..VariableDeclarations::clone(&decls)
        })
    }

    fn visit_type_tree(&mut self, tree: &TypeTree, ctx: &mut VisitContext<'_>) -> TypeTree {
        let tree = super_type_tree(self, tree, ctx);
        let Some(ty) = self.ty(&tree.ty) else {
            return tree;
        };
        let name = tree
            .ty
            .base()
            .fqn()
            .and_then(|before| self.rename(&tree.name, before, ctx))
            .unwrap_or_else(|| tree.name.clone());
        TypeTree { name, ty, ..tree }
    }

    fn visit_expr(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let visited = super_expr(self, expr, ctx);
        let kind = match &visited.kind {
            ExprKind::Ident(ident) => match &ident.symbol {
                Symbol::Type => visited
                    .ty
                    .fqn()
                    .and_then(|before| self.rename(&ident.name, before, ctx))
                    .map(|name| {
                        ExprKind::Ident(Ident {
                            name,
                            symbol: Symbol::Type,
                        })
                    }),
                Symbol::Field { owner, is_static } => {
                    relocate_name(owner, &self.old, &self.new).map(|owner| {
                        ExprKind::Ident(Ident {
                            name: ident.name.clone(),
                            symbol: Symbol::Field {
                                owner,
                                is_static: *is_static,
                            },
                        })
                    })
                }
                _ => None,
            },
            ExprKind::FieldAccess(fa)
                if fa.symbol == Symbol::Type
                    && visited.qualified_name().as_deref() == Some(&*self.old) =>
            {
                let moved = qualified_type(&self.new, JavaType::class(self.new.clone()));
                return Arc::new(Expr {
                    id: visited.id,
                    span: visited.span.clone(),
                    comments: visited.comments.clone(),
                    ..moved
                });
            }
            ExprKind::FieldAccess(fa) => match &fa.symbol {
                Symbol::Field { owner, is_static } => {
                    relocate_name(owner, &self.old, &self.new).map(|owner| {
                        ExprKind::FieldAccess(FieldAccess {
                            symbol: Symbol::Field {
                                owner,
                                is_static: *is_static,
                            },
                            ..fa.clone()
                        })
                    })
                }
                _ => None,
            },
            ExprKind::MethodInvocation(mi) => self.method(&mi.method_type).map(|method_type| {
                ExprKind::MethodInvocation(MethodInvocation {
                    method_type,
                    ..mi.clone()
                })
            }),
            ExprKind::NewClass(nc) => self.method(&nc.constructor).map(|constructor| {
                ExprKind::NewClass(NewClass {
                    constructor,
                    ..nc.clone()
                })
            }),
            _ => None,
        };
        let ty = self.ty(&visited.ty);
        if kind.is_none() && ty.is_none() {
            return visited;
        }
        Arc::new(Expr {
            kind: kind.unwrap_or_else(|| visited.kind.clone()),
            ty: ty.unwrap_or_else(|| visited.ty.clone()),
            ..Expr::clone(&visited)
        })
    }
}
