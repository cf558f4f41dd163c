//! Type information the engine resolves names and calls against.
//!
//! A classpath is assembled from *stub bundles*: Java sources whose methods
//! have no bodies, grouped by artifact. Sources being migrated are declared
//! on top of it as an overlay so calls into the project's own classes
//! resolve too.

mod scope;

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::errors::ClasspathError;
use crate::parser::parse_stubs;
use crate::tree::{
    ClassDecl, ClassKind, CompilationUnit, CONSTRUCTOR_NAME, JavaType, MethodType, Modifier,
    Primitive, StatementKind,
};

pub use scope::{TypeScope, unit_classes};

const JDK_STUBS: &str = include_str!("../../resources/jdk.java");

pub const OBJECT: &str = "java.lang.Object";

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: Arc<str>,
    pub ty: JavaType,
    pub is_static: bool,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub fqn: Arc<str>,
    pub kind: ClassKind,
    /// `None` for `java.lang.Object` and interfaces.
    pub supertype: Option<Arc<str>>,
    pub interfaces: Vec<Arc<str>>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<Arc<MethodType>>,
    pub constructors: Vec<Arc<MethodType>>,
}

impl ClassInfo {
    fn skeleton(fqn: Arc<str>, kind: ClassKind) -> ClassInfo {
        ClassInfo {
            fqn,
            kind,
            supertype: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn simple_name(&self) -> &str {
        self.fqn.rsplit('.').next().unwrap_or(&self.fqn)
    }

    fn direct_supertypes(&self) -> impl Iterator<Item = &Arc<str>> {
        self.supertype.iter().chain(self.interfaces.iter())
    }
}

/// Immutable, shareable set of known classes keyed by fully qualified name.
#[derive(Debug, Clone, Default)]
pub struct Classpath {
    classes: HashMap<Arc<str>, Arc<ClassInfo>>,
}

/// Collects stub bundles, then declares them all at once so bundles may
/// reference each other in any order.
#[derive(Debug, Default)]
pub struct ClasspathBuilder {
    units: Vec<CompilationUnit>,
}

impl ClasspathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the JDK subset shipped with this crate.
    pub fn with_jdk(self) -> Result<Self, ClasspathError> {
        self.stubs("jdk", JDK_STUBS)
    }

    pub fn stubs(mut self, artifact: &str, source: &str) -> Result<Self, ClasspathError> {
        let units = parse_stubs(source).map_err(|source| ClasspathError::Stubs {
            artifact: artifact.to_string(),
            source,
        })?;
        debug!(artifact, units = units.len(), "Loaded stub bundle");
        self.units.extend(units);
        Ok(self)
    }

    pub fn build(self) -> Classpath {
        let mut classpath = Classpath::default();
        let units: Vec<&CompilationUnit> = self.units.iter().collect();
        classpath.declare(&units);
        classpath
    }
}

impl Classpath {
    pub fn builder() -> ClasspathBuilder {
        ClasspathBuilder::new()
    }

    /// A classpath holding only the JDK subset.
    pub fn jdk() -> Result<Classpath, ClasspathError> {
        Ok(ClasspathBuilder::new().with_jdk()?.build())
    }

    /// A copy of this classpath that also knows the classes declared in
    /// `units`.
    pub fn with_overlay(&self, units: &[&CompilationUnit]) -> Classpath {
        let mut classpath = self.clone();
        classpath.declare(units);
        classpath
    }

    pub fn class(&self, fqn: &str) -> Option<&Arc<ClassInfo>> {
        self.classes.get(fqn)
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.classes.contains_key(fqn)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Declares every class of `units`.
    ///
    /// Runs in three passes: names first, then supertypes, then members, so
    /// a signature may mention any class declared in the same batch.
    fn declare(&mut self, units: &[&CompilationUnit]) {
        let mut declared = Vec::new();
        for &unit in units {
            for class in &unit.classes {
                let fqn: Arc<str> = Arc::from(unit.qualify(&class.name));
                self.declare_names(unit, class, fqn, &mut declared);
            }
        }

        for (unit, class, fqn, outer) in &declared {
            let scope = TypeScope::for_unit(self, unit).within(outer);
            let mut info = ClassInfo::skeleton(fqn.clone(), class.kind);
            let resolve = |tree: &crate::tree::TypeTree| scope.resolve(&tree.name);
            match class.kind {
                ClassKind::Interface => {
                    info.interfaces = class.implements.iter().filter_map(resolve).collect();
                }
                _ => {
                    info.supertype = match &class.extends {
                        Some(extends) => resolve(extends),
                        None if &**fqn == OBJECT => None,
                        None => Some(Arc::from(OBJECT)),
                    };
                    info.interfaces = class.implements.iter().filter_map(resolve).collect();
                }
            }
            self.classes.insert(fqn.clone(), Arc::new(info));
        }

        for (unit, class, fqn, outer) in &declared {
            let mut inner_scope = outer.clone();
            inner_scope.push(fqn.clone());
            let mut scope = TypeScope::for_unit(self, unit).within(&inner_scope);
            scope.declare_type_params(&class.type_params);
            let members = declare_members(&scope, class, fqn);
            let Some(existing) = self.classes.get(fqn) else {
                continue;
            };
            let mut info = ClassInfo::clone(existing);
            (info.fields, info.methods, info.constructors) = members;
            self.classes.insert(fqn.clone(), Arc::new(info));
        }
    }

    fn declare_names<'u>(
        &mut self,
        unit: &'u CompilationUnit,
        class: &'u Arc<ClassDecl>,
        fqn: Arc<str>,
        declared: &mut Vec<Declared<'u>>,
    ) {
        self.declare_nested(unit, class, fqn, Vec::new(), declared);
    }

    fn declare_nested<'u>(
        &mut self,
        unit: &'u CompilationUnit,
        class: &'u Arc<ClassDecl>,
        fqn: Arc<str>,
        outer: Vec<Arc<str>>,
        declared: &mut Vec<Declared<'u>>,
    ) {
        self.classes.insert(
            fqn.clone(),
            Arc::new(ClassInfo::skeleton(fqn.clone(), class.kind)),
        );
        let mut inner = outer.clone();
        inner.push(fqn.clone());
        declared.push((unit, class, fqn.clone(), outer));
        for member in &class.body.statements {
            if let StatementKind::Class(nested) = &member.kind {
                let nested_fqn: Arc<str> = Arc::from(format!("{}.{}", fqn, nested.name));
                self.declare_nested(unit, nested, nested_fqn, inner.clone(), declared);
            }
        }
    }

    /// Every class and interface `fqn` extends or implements, transitively,
    /// nearest first, ending in `java.lang.Object`. `fqn` itself is not
    /// included.
    pub fn supertypes(&self, fqn: &str) -> Vec<Arc<str>> {
        let mut seen: HashSet<Arc<str>> = HashSet::new();
        let mut order = Vec::new();
        let mut queue: Vec<Arc<str>> = match self.class(fqn) {
            Some(info) => info.direct_supertypes().cloned().collect(),
            None => Vec::new(),
        };
        let mut index = 0;
        while index < queue.len() {
            let current = queue[index].clone();
            index += 1;
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(info) = self.class(&current) {
                queue.extend(info.direct_supertypes().cloned());
            }
            order.push(current);
        }
        // Interfaces have no superclass yet still expose Object's members.
        if fqn != OBJECT && self.contains(fqn) && !seen.contains(OBJECT) {
            order.push(Arc::from(OBJECT));
        }
        order
    }

    /// `sub` is `sup` or one of its subtypes.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        sub == sup || sup == OBJECT || self.supertypes(sub).iter().any(|s| &**s == sup)
    }

    /// Assignment compatibility. Fails closed on `Unknown`.
    pub fn is_assignable(&self, from: &JavaType, to: &JavaType) -> bool {
        match (from, to) {
            (JavaType::Unknown, _) | (_, JavaType::Unknown) => false,
            _ if from == to => true,
            (JavaType::Primitive(a), JavaType::Primitive(b)) => a.widens_to(*b),
            (JavaType::Primitive(p), JavaType::Class(fqn)) => {
                boxed(*p) == Some(&**fqn) || (&**fqn == OBJECT && boxed(*p).is_some())
            }
            (JavaType::Class(fqn), JavaType::Primitive(p)) => unboxed(fqn)
                .map(|q| q.widens_to(*p))
                .unwrap_or(false),
            (JavaType::Null, to) => to.is_reference(),
            (JavaType::Class(a), JavaType::Class(b)) => self.is_subtype(a, b),
            (JavaType::Array(a), JavaType::Array(b)) => {
                a == b || (a.is_reference() && self.is_assignable(a, b))
            }
            (JavaType::Array(_), JavaType::Class(b)) => {
                matches!(&**b, OBJECT | "java.lang.Cloneable" | "java.io.Serializable")
            }
            _ => false,
        }
    }

    /// Finds the field `name` on `owner` or its supertypes.
    pub fn find_field(&self, owner: &str, name: &str) -> Option<(Arc<str>, FieldInfo)> {
        std::iter::once(Arc::from(owner))
            .chain(self.supertypes(owner))
            .find_map(|fqn| {
                let info = self.class(&fqn)?;
                let field = info.fields.iter().find(|f| &*f.name == name)?;
                Some((fqn.clone(), field.clone()))
            })
    }

    /// Resolves a call of `name` on `owner` with arguments of the given
    /// types.
    ///
    /// Candidates come from `owner` and its supertypes with matching name
    /// and arity. A candidate whose parameters all accept the arguments
    /// wins, the most specific one if several do. Failing that, a single
    /// candidate is taken as is.
    pub fn find_method(&self, owner: &str, name: &str, args: &[JavaType]) -> Option<Arc<MethodType>> {
        let mut types = vec![Arc::from(owner)];
        types.extend(self.supertypes(owner));
        let candidates: Vec<Arc<MethodType>> = types
            .iter()
            .filter_map(|fqn| self.class(fqn))
            .flat_map(|info| info.methods.iter())
            .filter(|m| &*m.name == name && m.params.len() == args.len())
            .cloned()
            .collect();
        self.choose(candidates, args)
    }

    pub fn find_constructor(&self, owner: &str, args: &[JavaType]) -> Option<Arc<MethodType>> {
        let candidates = self
            .class(owner)?
            .constructors
            .iter()
            .filter(|c| c.params.len() == args.len())
            .cloned()
            .collect();
        self.choose(candidates, args)
    }

    fn choose(&self, candidates: Vec<Arc<MethodType>>, args: &[JavaType]) -> Option<Arc<MethodType>> {
        let applicable: Vec<&Arc<MethodType>> = candidates
            .iter()
            .filter(|m| {
                m.params
                    .iter()
                    .zip(args)
                    .all(|(param, arg)| self.is_assignable(arg, param))
            })
            .collect();

        let more_specific = |a: &MethodType, b: &MethodType| {
            a.params
                .iter()
                .zip(&b.params)
                .all(|(pa, pb)| self.is_assignable(pa, pb))
        };
        if let Some(best) = applicable
            .iter()
            .find(|m| applicable.iter().all(|other| more_specific(m, other)))
        {
            return Some((*best).clone());
        }
        if let Some(first) = applicable.first() {
            return Some((*first).clone());
        }

        // Arguments that failed attribution: accept a candidate whose
        // remaining parameters fit.
        let lenient: Vec<&Arc<MethodType>> = candidates
            .iter()
            .filter(|m| {
                m.params
                    .iter()
                    .zip(args)
                    .all(|(param, arg)| arg.is_unknown() || param.is_unknown() || self.is_assignable(arg, param))
            })
            .collect();
        match lenient.as_slice() {
            [only] => Some((*only).clone()),
            _ if candidates.len() == 1 => candidates.into_iter().next(),
            _ => None,
        }
    }
}

/// A class being declared: its unit, its tree, its name and the classes
/// enclosing it, outermost first.
type Declared<'u> = (&'u CompilationUnit, &'u Arc<ClassDecl>, Arc<str>, Vec<Arc<str>>);

type Members = (Vec<FieldInfo>, Vec<Arc<MethodType>>, Vec<Arc<MethodType>>);

fn declare_members(scope: &TypeScope<'_>, class: &ClassDecl, fqn: &Arc<str>) -> Members {
    let interface = class.kind == ClassKind::Interface;
    let mut fields: Vec<FieldInfo> = class
        .enum_constants
        .iter()
        .map(|name| FieldInfo {
            name: name.clone(),
            ty: JavaType::Class(fqn.clone()),
            is_static: true,
        })
        .collect();
    let mut methods = Vec::new();
    let mut constructors = Vec::new();

    for member in &class.body.statements {
        match &member.kind {
            StatementKind::VarDecls(vd) => {
                let ty = scope.resolve_type_tree(&vd.type_tree);
                let is_static = interface || vd.modifiers.contains(&Modifier::Static);
                fields.extend(vd.vars.iter().map(|v| FieldInfo {
                    name: v.name.clone(),
                    ty: ty.clone(),
                    is_static,
                }));
            }
            StatementKind::Method(method) => {
                let mut scope = scope.clone();
                scope.declare_type_params(&method.type_params);
                let params = method
                    .params
                    .iter()
                    .map(|p| scope.resolve_type_tree(&p.type_tree))
                    .collect();
                match &method.return_type {
                    None => constructors.push(Arc::new(MethodType {
                        declaring: fqn.clone(),
                        name: Arc::from(CONSTRUCTOR_NAME),
                        params,
                        ret: JavaType::Class(fqn.clone()),
                        is_static: false,
                    })),
                    Some(ret) => methods.push(Arc::new(MethodType {
                        declaring: fqn.clone(),
                        name: method.name.clone(),
                        params,
                        ret: scope.resolve_type_tree(ret),
                        is_static: method.is_static(),
                    })),
                }
            }
            _ => {}
        }
    }

    if constructors.is_empty() && !interface {
        constructors.push(Arc::new(MethodType {
            declaring: fqn.clone(),
            name: Arc::from(CONSTRUCTOR_NAME),
            params: Vec::new(),
            ret: JavaType::Class(fqn.clone()),
            is_static: false,
        }));
    }
    (fields, methods, constructors)
}

fn boxed(p: Primitive) -> Option<&'static str> {
    Some(match p {
        Primitive::Boolean => "java.lang.Boolean",
        Primitive::Byte => "java.lang.Byte",
        Primitive::Char => "java.lang.Character",
        Primitive::Short => "java.lang.Short",
        Primitive::Int => "java.lang.Integer",
        Primitive::Long => "java.lang.Long",
        Primitive::Float => "java.lang.Float",
        Primitive::Double => "java.lang.Double",
        Primitive::Void => return None,
    })
}

fn unboxed(fqn: &str) -> Option<Primitive> {
    [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Char,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
    ]
    .into_iter()
    .find(|p| boxed(*p) == Some(fqn))
}
