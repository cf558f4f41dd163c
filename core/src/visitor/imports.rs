//! Deferred import maintenance.
//!
//! Visitors only ask for imports to be added or removed. The requests are
//! collected as sets and applied once the tree is final, against the names
//! it actually references, so asking twice or asking for an import that
//! turns out unnecessary is harmless.

use std::sync::Arc;

use hashbrown::HashSet;
use tracing::debug;

use crate::printer::ImportGroup;
use crate::tree::{CompilationUnit, Expr, ExprKind, Import, Symbol, TypeTree};
use crate::visitor::{
    JavaVisitor, VisitContext, super_method_invocation, super_type_tree, visit_unit,
};

#[derive(Debug, Clone, Default)]
pub struct ImportEdits {
    /// `(owner, member)`; `member` is set for static imports.
    add: Vec<(Arc<str>, Option<Arc<str>>)>,
    remove: Vec<Arc<str>>,
}

impl ImportEdits {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    pub(crate) fn add(&mut self, owner: &str, member: Option<&str>) {
        let entry = (Arc::from(owner), member.map(Arc::from));
        if !self.add.contains(&entry) {
            self.add.push(entry);
        }
    }

    pub(crate) fn remove(&mut self, fqn: &str) {
        if !self.remove.iter().any(|r| &**r == fqn) {
            self.remove.push(Arc::from(fqn));
        }
    }

    /// Applies the edits to `unit`. Returns `unit` itself when the import
    /// list ends up the same.
    pub(crate) fn apply(
        self,
        unit: &Arc<CompilationUnit>,
        ctx: &mut VisitContext<'_>,
    ) -> Arc<CompilationUnit> {
        if self.is_empty() {
            return unit.clone();
        }
        let refs = TypeReferences::collect(unit, ctx);
        let mut imports = unit.imports.clone();

        for fqn in &self.remove {
            imports.retain(|import| {
                if !import.is_static && &*import.name == &**fqn {
                    return refs.uses_type(fqn);
                }
                if import.is_static && import.container() == &**fqn {
                    return match import.member() {
                        "*" => refs.uses_static_owner(fqn),
                        member => refs.uses_static(fqn, member),
                    };
                }
                true
            });
        }

        for (owner, member) in &self.add {
            match member {
                None => add_type_import(&mut imports, unit, &refs, owner),
                Some(member) => {
                    let present = imports.iter().any(|i| {
                        i.is_static
                            && i.container() == &**owner
                            && (i.member() == &**member || i.member() == "*")
                    });
                    if !present && refs.uses_static(owner, member) {
                        insert_sorted(
                            &mut imports,
                            Import {
                                is_static: true,
                                name: Arc::from(format!("{}.{}", owner, member)),
                            },
                        );
                    }
                }
            }
        }

        if imports == unit.imports {
            return unit.clone();
        }
        Arc::new(CompilationUnit {
            imports,
            ..CompilationUnit::clone(unit)
        })
    }
}

fn add_type_import(
    imports: &mut Vec<Import>,
    unit: &CompilationUnit,
    refs: &TypeReferences,
    fqn: &str,
) {
    let Some((package, simple)) = fqn.rsplit_once('.') else {
        return;
    };
    if !refs.types.contains(fqn) || package == "java.lang" || unit.package.as_deref() == Some(package)
    {
        return;
    }
    let wildcard = format!("{}.*", package);
    if imports
        .iter()
        .any(|i| !i.is_static && (&*i.name == fqn || *i.name == *wildcard))
    {
        return;
    }
    if imports
        .iter()
        .any(|i| !i.is_static && i.member() == simple)
    {
        debug!(fqn, "Import skipped, simple name already imported");
        return;
    }
    insert_sorted(imports, Import::new(fqn));
}

/// Inserts into the block of imports of the same group, before the first
/// one that sorts after it. A missing group is started after the groups that
/// precede it.
fn insert_sorted(imports: &mut Vec<Import>, import: Import) {
    let group = ImportGroup::of(&import);
    let same: Vec<usize> = imports
        .iter()
        .enumerate()
        .filter(|(_, i)| ImportGroup::of(i) == group)
        .map(|(index, _)| index)
        .collect();
    let position = match same.last() {
        Some(&last) => same
            .iter()
            .copied()
            .find(|&index| imports[index].name > import.name)
            .unwrap_or(last + 1),
        None => imports
            .iter()
            .rposition(|i| ImportGroup::of(i) < group)
            .map_or(0, |index| index + 1),
    };
    imports.insert(position, import);
}

/// Names a unit references in a way an import could satisfy.
#[derive(Debug, Default)]
pub struct TypeReferences {
    /// Classes referenced by a simple or partially qualified name.
    types: HashSet<Arc<str>>,
    /// Simple names of type references that failed to resolve.
    unresolved: HashSet<Arc<str>>,
    /// Members used without qualification: `(declaring class, name)`.
    statics: HashSet<(Arc<str>, Arc<str>)>,
    /// Names of unqualified calls and identifiers that failed to resolve.
    unresolved_members: HashSet<Arc<str>>,
}

impl TypeReferences {
    pub fn collect(unit: &Arc<CompilationUnit>, ctx: &mut VisitContext<'_>) -> TypeReferences {
        let mut refs = TypeReferences::default();
        visit_unit(&mut refs, unit, ctx);
        refs
    }

    pub fn uses_type(&self, fqn: &str) -> bool {
        let simple = fqn.rsplit('.').next().unwrap_or(fqn);
        self.types.contains(fqn) || self.unresolved.contains(simple)
    }

    pub fn uses_static(&self, owner: &str, member: &str) -> bool {
        self.unresolved_members.contains(member)
            || self
                .statics
                .iter()
                .any(|(o, m)| &**o == owner && &**m == member)
    }

    pub fn uses_static_owner(&self, owner: &str) -> bool {
        !self.unresolved_members.is_empty() || self.statics.iter().any(|(o, _)| &**o == owner)
    }

    fn record_type_name(&mut self, written: &str, resolved: Option<&str>) {
        let Some(fqn) = resolved else {
            let first = written.split('.').next().unwrap_or(written);
            self.unresolved.insert(Arc::from(first));
            return;
        };
        if fqn == written {
            return;
        }
        // `Outer.Inner` written against an import of `Outer`.
        let extra = written.matches('.').count();
        let mut imported = fqn;
        for _ in 0..extra {
            match imported.rsplit_once('.') {
                Some((head, _)) => imported = head,
                None => return,
            }
        }
        self.types.insert(Arc::from(imported));
    }
}

impl JavaVisitor for TypeReferences {
    fn visit_type_tree(&mut self, tree: &TypeTree, ctx: &mut VisitContext<'_>) -> TypeTree {
        if !tree.name.starts_with('?') {
            self.record_type_name(&tree.name, tree.ty.base().fqn());
        }
        super_type_tree(self, tree, ctx)
    }

    fn visit_ident(&mut self, expr: &Arc<Expr>, _ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        if let ExprKind::Ident(ident) = &expr.kind {
            match &ident.symbol {
                Symbol::Type => self.record_type_name(&ident.name, expr.ty.fqn()),
                Symbol::Field {
                    owner,
                    is_static: true,
                } => {
                    self.statics.insert((owner.clone(), ident.name.clone()));
                }
                Symbol::Unresolved => {
                    self.unresolved.insert(ident.name.clone());
                    self.unresolved_members.insert(ident.name.clone());
                }
                _ => {}
            }
        }
        expr.clone()
    }

    fn visit_method_invocation(
        &mut self,
        expr: &Arc<Expr>,
        ctx: &mut VisitContext<'_>,
    ) -> Arc<Expr> {
        if let Some(mi) = expr.as_invocation()
            && mi.select.is_none()
        {
            match &mi.method_type {
                Some(method) if method.is_static => {
                    self.statics
                        .insert((method.declaring.clone(), mi.name.clone()));
                }
                Some(_) => {}
                None => {
                    self.unresolved_members.insert(mi.name.clone());
                }
            }
        }
        super_method_invocation(self, expr, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(imports: &[Import]) -> Vec<&str> {
        imports.iter().map(|i| &*i.name).collect()
    }

    #[test]
    fn inserts_into_matching_group_in_order() {
        let mut imports = vec![
            Import::new("org.apache.hc.core5.util.TimeValue"),
            Import::new("org.slf4j.Logger"),
            Import::new("java.util.List"),
        ];
        insert_sorted(&mut imports, Import::new("org.apache.hc.core5.http.HttpHost"));
        insert_sorted(&mut imports, Import::new("java.util.concurrent.TimeUnit"));
        insert_sorted(&mut imports, Import::new("org.slf4j.LoggerFactory"));
        assert_eq!(
            names(&imports),
            vec![
                "org.apache.hc.core5.http.HttpHost",
                "org.apache.hc.core5.util.TimeValue",
                "org.slf4j.Logger",
                "org.slf4j.LoggerFactory",
                "java.util.List",
                "java.util.concurrent.TimeUnit",
            ]
        );
    }

    #[test]
    fn starts_missing_groups_after_earlier_ones() {
        let mut imports = vec![Import::new("org.slf4j.Logger")];
        insert_sorted(&mut imports, Import::new("java.io.File"));
        let mut stat = Import::new("java.util.Objects.requireNonNull");
        stat.is_static = true;
        insert_sorted(&mut imports, stat);
        insert_sorted(&mut imports, Import::new("com.acme.A"));
        assert_eq!(
            names(&imports),
            vec![
                "com.acme.A",
                "org.slf4j.Logger",
                "java.io.File",
                "java.util.Objects.requireNonNull",
            ]
        );
    }

    #[test]
    fn partially_qualified_names_reference_the_outer_class() {
        let mut refs = TypeReferences::default();
        refs.record_type_name(
            "RequestConfig.Builder",
            Some("org.apache.http.client.config.RequestConfig.Builder"),
        );
        refs.record_type_name("java.io.File", Some("java.io.File"));
        refs.record_type_name("Missing", None);
        assert!(refs.uses_type("org.apache.http.client.config.RequestConfig"));
        assert!(!refs.uses_type("java.io.File"));
        assert!(refs.uses_type("org.example.Missing"));
    }
}
