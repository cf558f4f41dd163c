use std::sync::Arc;

use tracing::debug;

use crate::recipe::{ExecutionContext, Recipe};
use crate::tree::CompilationUnit;
use crate::visitor::{VisitContext, visit_unit};

/// Where a recipe run on one unit stands.
///
/// `Idle` moves to `Skip` when the precondition rejects the unit, or to
/// `Traverse`. A traversal ends `Done` with a new tree or `Unchanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Idle,
    Skip,
    Traverse,
    Done,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct RecipeRun {
    pub unit: Arc<CompilationUnit>,
    pub state: RunState,
}

impl RecipeRun {
    pub fn changed(&self) -> bool {
        self.state == RunState::Done
    }
}

fn transition(recipe: &str, from: RunState, to: RunState) -> RunState {
    debug!(recipe, ?from, ?to, "Recipe run state");
    to
}

/// Runs `recipe`, then each recipe of its list, on `unit`.
///
/// The result holds `unit` itself, not a copy, when nothing changed.
pub fn run(recipe: &dyn Recipe, unit: &Arc<CompilationUnit>, exec: &ExecutionContext) -> RecipeRun {
    let name = recipe.descriptor().name;
    let mut state = RunState::Idle;

    let mut ctx = VisitContext::new(exec, unit);
    let applicable = recipe.precondition().check(unit, &mut ctx);
    let mut after = if applicable {
        state = transition(&name, state, RunState::Traverse);
        let mut visitor = recipe.visitor();
        let visited = visit_unit(&mut *visitor, unit, &mut ctx);
        ctx.finish(visited)
    } else {
        state = transition(&name, state, RunState::Skip);
        unit.clone()
    };

    for member in recipe.recipe_list() {
        after = run(&*member, &after, exec).unit;
    }

    let end = if !Arc::ptr_eq(&after, unit) {
        RunState::Done
    } else if state == RunState::Skip {
        RunState::Skip
    } else {
        RunState::Unchanged
    };
    if end != state {
        state = transition(&name, state, end);
    }
    RecipeRun { unit: after, state }
}
