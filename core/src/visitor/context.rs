use std::sync::Arc;

use tracing::warn;

use crate::classpath::Classpath;
use crate::recipe::ExecutionContext;
use crate::tree::CompilationUnit;
use crate::visitor::{Cursor, ImportEdits, JavaVisitor, visit_unit};

/// Per-traversal state handed down the recursion.
///
/// Owns the cursor, the follow-up visitors queued with
/// [`do_after_visit`](Self::do_after_visit) and the pending import edits.
/// One context serves one compilation unit and is discarded afterwards.
pub struct VisitContext<'a> {
    pub cursor: Cursor,
    exec: &'a ExecutionContext,
    classpath: Arc<Classpath>,
    unit: Arc<CompilationUnit>,
    after_visits: Vec<Box<dyn JavaVisitor>>,
    imports: ImportEdits,
}

impl<'a> VisitContext<'a> {
    /// A context for visiting `unit`. The unit's own classes are laid over
    /// the execution classpath.
    pub fn new(exec: &'a ExecutionContext, unit: &Arc<CompilationUnit>) -> Self {
        Self {
            cursor: Cursor::new(),
            exec,
            classpath: Arc::new(exec.classpath().with_overlay(&[&**unit])),
            unit: unit.clone(),
            after_visits: Vec::new(),
            imports: ImportEdits::default(),
        }
    }

    pub fn execution(&self) -> &'a ExecutionContext {
        self.exec
    }

    pub fn classpath(&self) -> &Classpath {
        &self.classpath
    }

    /// The unit as it was when this traversal started.
    pub fn unit(&self) -> &Arc<CompilationUnit> {
        &self.unit
    }

    /// Queues a visitor to run over the whole unit once the current pass
    /// is done.
    pub fn do_after_visit(&mut self, visitor: Box<dyn JavaVisitor>) {
        self.after_visits.push(visitor);
    }

    /// Imports `fqn` if the final tree references it by simple name.
    pub fn maybe_add_import(&mut self, fqn: &str) {
        self.imports.add(fqn, None);
    }

    pub fn maybe_add_static_import(&mut self, owner: &str, member: &str) {
        self.imports.add(owner, Some(member));
    }

    /// Drops the import of `fqn`, and static imports of its members, once
    /// nothing references them.
    pub fn maybe_remove_import(&mut self, fqn: &str) {
        self.imports.remove(fqn);
    }

    pub fn pending_imports(&self) -> &ImportEdits {
        &self.imports
    }

    /// Runs queued follow-up visitors, then applies import edits.
    ///
    /// Visitors queued by a follow-up run in a further round, up to the
    /// configured depth.
    pub fn finish(&mut self, mut unit: Arc<CompilationUnit>) -> Arc<CompilationUnit> {
        let max_depth = self.exec.options().max_after_visit_depth;
        let mut round = 0;
        while !self.after_visits.is_empty() {
            if round == max_depth {
                warn!(
                    dropped = self.after_visits.len(),
                    "Follow-up visitor depth exhausted"
                );
                self.after_visits.clear();
                break;
            }
            round += 1;
            let queued = core::mem::take(&mut self.after_visits);
            for mut visitor in queued {
                self.unit = unit.clone();
                self.cursor = Cursor::new();
                unit = visit_unit(&mut *visitor, &unit, self);
            }
        }
        let edits = core::mem::take(&mut self.imports);
        self.cursor = Cursor::new();
        edits.apply(&unit, self)
    }
}

impl core::fmt::Debug for VisitContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VisitContext")
            .field("cursor", &self.cursor)
            .field("after_visits", &self.after_visits.len())
            .field("imports", &self.imports)
            .finish()
    }
}
