//! Codehaus Plexus recipes: plexus-utils helpers to the JDK and
//! commons-io, plexus container logging to SLF4J.

mod file_utils;
mod logging;
mod string_utils;

use std::sync::Arc;

use rewrite_apache_core::matcher::RepeatableArgumentMatcher;
use rewrite_apache_core::recipe::{
    ArgSource, ArgumentConstraint, CompositeRecipe, Recipe, RecipeDescriptor, TemplateRecipe,
};
use rewrite_apache_core::template::JavaTemplate;
use rewrite_apache_core::tree::JavaType;

use crate::Error;

pub use file_utils::plexus_file_utils;
pub use logging::AbstractLogEnabledToSlf4j;
pub use string_utils::plexus_string_utils;

/// A static helper call replaced by an equivalent expression.
struct Inline {
    name: &'static str,
    /// Method name and parameter list, as in a method pattern.
    method: &'static str,
    template: &'static str,
    imports: &'static [&'static str],
    /// Arguments the template evaluates more than once, with their type.
    repeated: &'static [(usize, &'static str)],
}

impl Inline {
    fn recipe(&self, owner: &str, package: &str) -> Result<TemplateRecipe, Error> {
        let simple_owner = owner.rsplit('.').next().unwrap_or(owner);
        let descriptor = RecipeDescriptor::new(
            format!("{package}.{}", self.name),
            format!("Replace `{simple_owner}.{}` with JDK provided API", self.method),
            format!("Replace Plexus `{simple_owner}.{}` with JDK provided API.", self.method),
        );
        let template = JavaTemplate::builder(self.template)
            .imports(self.imports)
            .build()?;
        let mut builder = TemplateRecipe::builder(descriptor, &format!("{owner} {}", self.method), template);
        for (index, ty) in self.repeated {
            builder = builder.constraint(
                ArgSource::Arg(*index),
                ArgumentConstraint::Repeatable(RepeatableArgumentMatcher::new(JavaType::parse(ty))),
            );
        }
        Ok(builder.build()?)
    }
}

fn composite(
    descriptor: RecipeDescriptor,
    owner: &str,
    package: &str,
    table: &[Inline],
) -> Result<CompositeRecipe, Error> {
    let recipes = table
        .iter()
        .map(|inline| inline.recipe(owner, package).map(|r| Arc::new(r) as Arc<dyn Recipe>))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CompositeRecipe::new(descriptor, recipes))
}
