use rewrite_apache_core::recipe::{CompositeRecipe, RecipeDescriptor};

use super::{Inline, composite};
use crate::Error;

const OWNER: &str = "org.codehaus.plexus.util.FileUtils";

// commons-io shares the simple name, so it is referenced fully qualified.
const TABLE: &[Inline] = &[
    Inline {
        name: "DeleteDirectoryFile",
        method: "deleteDirectory(java.io.File)",
        template: "org.apache.commons.io.FileUtils.deleteDirectory(#{any(java.io.File)})",
        imports: &[],
        repeated: &[],
    },
    Inline {
        name: "DeleteDirectoryString",
        method: "deleteDirectory(String)",
        template: "org.apache.commons.io.FileUtils.deleteDirectory(new File(#{any(java.lang.String)}))",
        imports: &["java.io.File"],
        repeated: &[],
    },
    Inline {
        name: "FileExistsString",
        method: "fileExists(String)",
        template: "new File(#{any(java.lang.String)}).exists()",
        imports: &["java.io.File"],
        repeated: &[],
    },
    Inline {
        name: "GetFile",
        method: "getFile(String)",
        template: "new File(#{any(java.lang.String)})",
        imports: &["java.io.File"],
        repeated: &[],
    },
];

/// Plexus `FileUtils` calls to `java.io.File` and commons-io.
pub fn plexus_file_utils() -> Result<CompositeRecipe, Error> {
    composite(
        RecipeDescriptor::new(
            "codehaus.plexus.PlexusFileUtilsRecipes",
            "Replace Plexus `FileUtils` with JDK provided API",
            "Replace Plexus `FileUtils` calls with `java.io.File` and commons-io.",
        )
        .with_tags(&["plexus"]),
        OWNER,
        "codehaus.plexus.PlexusFileUtils",
        TABLE,
    )
}
