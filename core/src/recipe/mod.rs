//! Recipes: a precondition gate plus a visitor, run per compilation unit.
//!
//! A recipe is stateless. Everything a run needs to remember lives in the
//! [`VisitContext`](crate::visitor::VisitContext) of that run, so one recipe
//! value may serve many units, on several threads.

mod builder_fold;
mod change_method_name;
mod change_type;
mod composite;
mod remove_invocations;
mod replace_constant;
mod run;
mod template_recipe;

use core::time::Duration;
use std::sync::Arc;

use crate::api::RunOptions;
use crate::classpath::Classpath;
use crate::search::Precondition;
use crate::visitor::JavaVisitor;

pub use builder_fold::FoldIntoBuilder;
pub use change_method_name::ChangeMethodName;
pub use change_type::ChangeType;
pub use composite::CompositeRecipe;
pub use remove_invocations::RemoveMethodInvocations;
pub use replace_constant::ReplaceConstant;
pub use run::{RecipeRun, RunState, run};
pub use template_recipe::{ArgSource, ArgumentConstraint, TemplateRecipe, TemplateRecipeBuilder};

/// What a recipe is called and what it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDescriptor {
    /// Stable identifier, e.g. `apache.commons.lang.IsNotEmptyToJdk`.
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Manual effort saved per occurrence.
    pub estimated_effort: Option<Duration>,
}

impl RecipeDescriptor {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: description.into(),
            tags: Vec::new(),
            estimated_effort: None,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_effort(mut self, effort: Duration) -> Self {
        self.estimated_effort = Some(effort);
        self
    }
}

pub trait Recipe: Send + Sync {
    fn descriptor(&self) -> RecipeDescriptor;

    /// Units for which this returns `false` are not traversed.
    fn precondition(&self) -> Precondition {
        Precondition::Always
    }

    /// A fresh visitor for one unit.
    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(NoopVisitor)
    }

    /// Recipes run after this one, in order, on its output.
    fn recipe_list(&self) -> Vec<Arc<dyn Recipe>> {
        Vec::new()
    }
}

impl core::fmt::Debug for dyn Recipe {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Recipe").field(&self.descriptor().name).finish()
    }
}

struct NoopVisitor;

impl JavaVisitor for NoopVisitor {}

/// Shared inputs of a recipe run: the classpath and the run options.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    classpath: Arc<Classpath>,
    options: RunOptions,
}

impl ExecutionContext {
    pub fn new(classpath: Arc<Classpath>) -> Self {
        Self {
            classpath,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn classpath(&self) -> &Arc<Classpath> {
        &self.classpath
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }
}

#[cfg(test)]
mod recipe_test;
