use std::sync::Arc;

use crate::recipe::{Recipe, RecipeDescriptor};

/// Runs its members in order, each on the previous one's output.
#[derive(Debug, Clone)]
pub struct CompositeRecipe {
    descriptor: RecipeDescriptor,
    recipes: Vec<Arc<dyn Recipe>>,
}

impl CompositeRecipe {
    pub fn new(descriptor: RecipeDescriptor, recipes: Vec<Arc<dyn Recipe>>) -> Self {
        Self {
            descriptor,
            recipes,
        }
    }

    pub fn recipes(&self) -> &[Arc<dyn Recipe>] {
        &self.recipes
    }
}

impl Recipe for CompositeRecipe {
    fn descriptor(&self) -> RecipeDescriptor {
        self.descriptor.clone()
    }

    fn recipe_list(&self) -> Vec<Arc<dyn Recipe>> {
        self.recipes.clone()
    }
}
