//! Apache Commons recipes.
//!
//! - commons-lang: `StringUtils` emptiness checks to the JDK, deprecated
//!   `SystemUtils` and `CharEncoding` constants, `WordUtils` to commons-text
//! - commons-io: `FileUtils` reads to `java.nio.file.Files`, `Charsets` to
//!   `StandardCharsets`
//! - commons-codec: `Base64` helpers to `java.util.Base64`

mod codec;
mod io;
mod lang;
mod lang3;

use std::sync::Arc;

use rewrite_apache_core::recipe::{Recipe, RecipeDescriptor, ReplaceConstant, TemplateRecipe};
use rewrite_apache_core::template::JavaTemplate;

use crate::Error;

pub use codec::apache_base64_to_java_base64;
pub use io::{apache_file_utils_to_java_files, use_java_standard_charsets};
pub use lang::IsNotEmptyToJdk;
pub use lang3::{lang3_use_standard_charsets, migrate_system_utils_deprecations, word_utils_to_commons_text};

const TAGS: &[&str] = &["apache", "commons"];

/// The charsets every JVM supports, named alike in commons and the JDK.
const STANDARD_CHARSETS: [&str; 6] = ["ISO_8859_1", "US_ASCII", "UTF_16", "UTF_16BE", "UTF_16LE", "UTF_8"];

const STANDARD_CHARSETS_CLASS: &str = "java.nio.charset.StandardCharsets";

fn descriptor(name: &str, display_name: &str, description: &str) -> RecipeDescriptor {
    RecipeDescriptor::new(format!("apache.commons.{name}"), display_name, description).with_tags(TAGS)
}

/// A static helper call replaced by an equivalent JDK expression.
struct Call {
    name: &'static str,
    /// Method name and parameter list, as in a method pattern.
    method: &'static str,
    template: &'static str,
    imports: &'static [&'static str],
}

impl Call {
    fn recipe(&self, owner: &str, package: &str) -> Result<Arc<dyn Recipe>, Error> {
        let simple_owner = owner.rsplit('.').next().unwrap_or(owner);
        let template = JavaTemplate::builder(self.template).imports(self.imports).build()?;
        let recipe = TemplateRecipe::builder(
            descriptor(
                &format!("{package}.{}", self.name),
                &format!("Replace `{simple_owner}.{}`", self.method),
                &format!("Replace `{simple_owner}.{}` with `{}`.", self.method, self.template),
            ),
            &format!("{owner} {}", self.method),
            template,
        )
        .build()?;
        Ok(Arc::new(recipe))
    }
}

/// One [`TemplateRecipe`] per entry of `table`.
fn calls(owner: &str, package: &str, table: &[Call]) -> Result<Vec<Arc<dyn Recipe>>, Error> {
    table.iter().map(|call| call.recipe(owner, package)).collect()
}

/// `owner.field` replaced by `code`, which may name the classes in
/// `imports` by their simple name.
fn constant(owner: &str, field: &str, code: &str, imports: &[&str]) -> Result<Arc<dyn Recipe>, Error> {
    let template = JavaTemplate::builder(code).imports(imports).build()?;
    Ok(Arc::new(ReplaceConstant::new(owner, field, template)?))
}
