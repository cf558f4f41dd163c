use rewrite_apache_core::recipe::{CompositeRecipe, RecipeDescriptor};

use super::{Inline, composite};
use crate::Error;

const OWNER: &str = "org.codehaus.plexus.util.StringUtils";

const STRING: &str = "java.lang.String";

const TABLE: &[Inline] = &[
    Inline {
        name: "Abbreviate",
        method: "abbreviate(String, int)",
        template: r#"#{s:any(java.lang.String)}.length() <= #{w:any(int)} ? #{s} : #{s}.substring(0, #{w} - 3) + "...""#,
        imports: &[],
        repeated: &[(0, STRING), (1, "int")],
    },
    Inline {
        name: "Capitalise",
        method: "capitalise(String)",
        template: "#{s:any(java.lang.String)} == null || #{s}.isEmpty() ? #{s} : Character.toTitleCase(#{s}.charAt(0)) + #{s}.substring(1)",
        imports: &[],
        repeated: &[(0, STRING)],
    },
    Inline {
        name: "DefaultString",
        method: "defaultString(Object)",
        template: r#"Objects.toString(#{any(java.lang.Object)}, "")"#,
        imports: &["java.util.Objects"],
        repeated: &[],
    },
    Inline {
        name: "DefaultStringFallback",
        method: "defaultString(Object, String)",
        template: "Objects.toString(#{any(java.lang.Object)}, #{any(java.lang.String)})",
        imports: &["java.util.Objects"],
        repeated: &[],
    },
    Inline {
        name: "DeleteWhitespace",
        method: "deleteWhitespace(String)",
        template: r#"#{any(java.lang.String)}.replaceAll("\\s+", "")"#,
        imports: &[],
        repeated: &[(0, STRING)],
    },
    Inline {
        name: "EqualsIgnoreCase",
        method: "equalsIgnoreCase(String, String)",
        template: "#{s:any(java.lang.String)} == null ? #{o:any(java.lang.String)} == null : #{s}.equalsIgnoreCase(#{o})",
        imports: &[],
        repeated: &[(0, STRING), (1, STRING)],
    },
    Inline {
        name: "Equals",
        method: "equals(String, String)",
        template: "Objects.equals(#{any(java.lang.String)}, #{any(java.lang.String)})",
        imports: &["java.util.Objects"],
        repeated: &[],
    },
    Inline {
        name: "Lowercase",
        method: "lowerCase(String)",
        template: "#{s:any(java.lang.String)} == null ? null : #{s}.toLowerCase()",
        imports: &[],
        repeated: &[(0, STRING)],
    },
    Inline {
        name: "Replace",
        method: "replace(String, String, String)",
        template: "#{s:any(java.lang.String)} == null || #{s}.isEmpty() || #{f:any(java.lang.String)} == null || #{f}.isEmpty() || #{r:any(java.lang.String)} == null ? #{s} : #{s}.replace(#{f}, #{r})",
        imports: &[],
        repeated: &[(0, STRING), (1, STRING), (2, STRING)],
    },
    Inline {
        name: "Reverse",
        method: "reverse(String)",
        template: "#{s:any(java.lang.String)} == null ? null : new StringBuilder(#{s}).reverse().toString()",
        imports: &[],
        repeated: &[(0, STRING)],
    },
    Inline {
        name: "Split",
        method: "split(String)",
        template: r#"#{any(java.lang.String)}.split("\\s+")"#,
        imports: &[],
        repeated: &[(0, STRING)],
    },
    Inline {
        name: "Strip",
        method: "strip(String)",
        template: "#{s:any(java.lang.String)} == null ? null : #{s}.trim()",
        imports: &[],
        repeated: &[(0, STRING)],
    },
    Inline {
        name: "Trim",
        method: "trim(String)",
        template: "#{s:any(java.lang.String)} == null ? null : #{s}.trim()",
        imports: &[],
        repeated: &[(0, STRING)],
    },
    Inline {
        name: "Uppercase",
        method: "upperCase(String)",
        template: "#{s:any(java.lang.String)} == null ? null : #{s}.toUpperCase()",
        imports: &[],
        repeated: &[(0, STRING)],
    },
];

/// Plexus `StringUtils` calls to plain `String` and `Objects` code.
pub fn plexus_string_utils() -> Result<CompositeRecipe, Error> {
    composite(
        RecipeDescriptor::new(
            "codehaus.plexus.PlexusStringUtilsRecipes",
            "Replace Plexus `StringUtils` with JDK provided API",
            "Replace Plexus `StringUtils` calls with equivalent JDK expressions.",
        )
        .with_tags(&["plexus"]),
        OWNER,
        "codehaus.plexus.PlexusStringUtils",
        TABLE,
    )
}

#[cfg(test)]
mod tests {
    use rewrite_apache_core::recipe::Recipe;

    use super::*;

    #[test]
    fn every_entry_builds() {
        let recipe = plexus_string_utils().expect("catalogue builds");
        assert_eq!(recipe.recipe_list().len(), TABLE.len());
    }

    #[test]
    fn entry_names_are_unique() {
        let mut names: Vec<&str> = TABLE.iter().map(|inline| inline.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TABLE.len());
    }
}
