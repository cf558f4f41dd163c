use std::sync::Arc;

use crate::classpath::{Classpath, OBJECT};
use crate::tree::{CompilationUnit, Import, JavaType, TypeParam, TypeTree};

/// Resolves type names as written in one compilation unit.
///
/// Lookup order for the first segment of a name: classes enclosing the
/// current position (and their member classes, inherited ones included),
/// classes declared in the unit, single-type imports, the unit's package,
/// on-demand imports, then `java.lang`. Remaining segments must name member
/// classes. A name that matches none of these is tried as fully qualified.
/// Type variables in scope shadow all of them and resolve to their erasure.
#[derive(Debug, Clone)]
pub struct TypeScope<'a> {
    classpath: &'a Classpath,
    package: Option<&'a str>,
    imports: &'a [Import],
    unit_classes: Vec<Arc<str>>,
    /// Enclosing classes, outermost first.
    enclosing: Vec<Arc<str>>,
    /// Declared type variables and their erasures, innermost last.
    type_vars: Vec<(Arc<str>, Arc<str>)>,
}

impl<'a> TypeScope<'a> {
    pub fn new(
        classpath: &'a Classpath,
        package: Option<&'a str>,
        imports: &'a [Import],
        unit_classes: Vec<Arc<str>>,
    ) -> Self {
        Self {
            classpath,
            package,
            imports,
            unit_classes,
            enclosing: Vec::new(),
            type_vars: Vec::new(),
        }
    }

    pub fn for_unit(classpath: &'a Classpath, unit: &'a CompilationUnit) -> Self {
        Self::new(
            classpath,
            unit.package.as_deref(),
            &unit.imports,
            unit_classes(unit),
        )
    }

    pub fn within(mut self, enclosing: &[Arc<str>]) -> Self {
        self.enclosing = enclosing.to_vec();
        self
    }

    pub fn enter(&mut self, fqn: Arc<str>) {
        self.enclosing.push(fqn);
    }

    pub fn exit(&mut self) {
        self.enclosing.pop();
    }

    /// Brings type variables into scope. Each erases to its first bound,
    /// or `java.lang.Object` when unbounded.
    pub fn declare_type_params(&mut self, params: &[TypeParam]) {
        for param in params {
            let erasure = param
                .bounds
                .first()
                .and_then(|bound| self.resolve(&bound.name))
                .unwrap_or_else(|| Arc::from(OBJECT));
            self.type_vars.push((param.name.clone(), erasure));
        }
    }

    /// Drops the `count` most recently declared type variables.
    pub fn forget_type_params(&mut self, count: usize) {
        let keep = self.type_vars.len().saturating_sub(count);
        self.type_vars.truncate(keep);
    }

    pub fn classpath(&self) -> &'a Classpath {
        self.classpath
    }

    pub fn package(&self) -> Option<&'a str> {
        self.package
    }

    pub fn enclosing(&self) -> &[Arc<str>] {
        &self.enclosing
    }

    /// Innermost enclosing class.
    pub fn current_class(&self) -> Option<&Arc<str>> {
        self.enclosing.last()
    }

    /// Resolves a written class name to its fully qualified name.
    pub fn resolve(&self, name: &str) -> Option<Arc<str>> {
        let mut segments = name.split('.');
        let first = segments.next()?;
        if let Some(mut fqn) = self.resolve_simple(first) {
            for segment in segments {
                fqn = self.member_class(&fqn, segment)?;
            }
            return Some(fqn);
        }
        self.resolve_qualified(name)
    }

    /// Resolves a written type including primitives, array dimensions and
    /// `void`. Unresolved class names yield `Unknown`.
    pub fn resolve_type_tree(&self, tree: &TypeTree) -> JavaType {
        let base = match JavaType::parse(&tree.name) {
            JavaType::Primitive(p) if tree.type_args.is_none() => JavaType::Primitive(p),
            _ => match self.resolve(&tree.name) {
                Some(fqn) => JavaType::Class(fqn),
                None => JavaType::Unknown,
            },
        };
        (0..tree.dims).fold(base, |ty, _| JavaType::array_of(ty))
    }

    fn resolve_simple(&self, name: &str) -> Option<Arc<str>> {
        if let Some((_, erasure)) = self.type_vars.iter().rev().find(|(var, _)| &**var == name) {
            return Some(erasure.clone());
        }

        for outer in self.enclosing.iter().rev() {
            if outer.rsplit('.').next() == Some(name) {
                return Some(outer.clone());
            }
            if let Some(member) = self.member_class(outer, name) {
                return Some(member);
            }
        }

        if let Some(class) = self
            .unit_classes
            .iter()
            .find(|c| c.rsplit('.').next() == Some(name))
        {
            return Some(class.clone());
        }

        // Single-type imports resolve even when the class is not on the
        // classpath: the import states the name outright.
        if let Some(import) = self
            .imports
            .iter()
            .find(|i| !i.is_static && !i.is_wildcard() && i.member() == name)
        {
            return Some(import.name.clone());
        }

        let in_package = match self.package {
            Some(pkg) => format!("{}.{}", pkg, name),
            None => name.to_string(),
        };
        if self.classpath.contains(&in_package) {
            return Some(Arc::from(in_package));
        }

        for import in self.imports.iter().filter(|i| !i.is_static && i.is_wildcard()) {
            let candidate = format!("{}.{}", import.container(), name);
            if self.classpath.contains(&candidate) {
                return Some(Arc::from(candidate));
            }
        }

        let lang = format!("java.lang.{}", name);
        self.classpath
            .contains(&lang)
            .then(|| Arc::from(lang))
    }

    /// `owner.name` as a member class, declared or inherited.
    pub fn member_class(&self, owner: &str, name: &str) -> Option<Arc<str>> {
        std::iter::once(Arc::from(owner))
            .chain(self.classpath.supertypes(owner))
            .map(|fqn| format!("{}.{}", fqn, name))
            .find(|candidate| self.classpath.contains(candidate))
            .map(Arc::from)
    }

    fn resolve_qualified(&self, name: &str) -> Option<Arc<str>> {
        let segments: Vec<&str> = name.split('.').collect();
        for split in 1..=segments.len() {
            let prefix = segments[..split].join(".");
            if self.classpath.contains(&prefix) {
                let mut fqn: Arc<str> = Arc::from(prefix);
                for segment in &segments[split..] {
                    fqn = self.member_class(&fqn, segment)?;
                }
                return Some(fqn);
            }
        }
        None
    }

    /// Classes a statically imported member `name` may come from, explicit
    /// imports first.
    pub fn static_import_owners(&self, name: &str) -> Vec<Arc<str>> {
        let explicit = self
            .imports
            .iter()
            .filter(|i| i.is_static && i.member() == name);
        let on_demand = self
            .imports
            .iter()
            .filter(|i| i.is_static && i.is_wildcard());
        explicit
            .chain(on_demand)
            .map(|i| Arc::from(i.container()))
            .collect()
    }
}

/// Fully qualified names of the top-level classes declared in `unit`.
pub fn unit_classes(unit: &CompilationUnit) -> Vec<Arc<str>> {
    unit.classes
        .iter()
        .map(|c| Arc::from(unit.qualify(&c.name)))
        .collect()
}
