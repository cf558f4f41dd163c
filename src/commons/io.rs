use std::sync::Arc;

use rewrite_apache_core::recipe::{CompositeRecipe, Recipe};

use super::{Call, STANDARD_CHARSETS, STANDARD_CHARSETS_CLASS, calls, constant, descriptor};
use crate::Error;

const FILE_UTILS: &str = "org.apache.commons.io.FileUtils";
const CHARSETS: &str = "org.apache.commons.io.Charsets";
const FILES: &str = "java.nio.file.Files";

const FILE_UTILS_TABLE: &[Call] = &[
    Call {
        name: "ReadFileToByteArray",
        method: "readFileToByteArray(java.io.File)",
        template: "Files.readAllBytes(#{any(java.io.File)}.toPath())",
        imports: &[FILES],
    },
    Call {
        name: "ReadLines",
        method: "readLines(java.io.File)",
        template: "Files.readAllLines(#{any(java.io.File)}.toPath())",
        imports: &[FILES],
    },
    Call {
        name: "ReadLinesWithCharset",
        method: "readLines(java.io.File, java.nio.charset.Charset)",
        template: "Files.readAllLines(#{any(java.io.File)}.toPath(), #{any(java.nio.charset.Charset)})",
        imports: &[FILES],
    },
    Call {
        name: "ReadLinesWithCharsetId",
        method: "readLines(java.io.File, String)",
        template: "Files.readAllLines(#{any(java.io.File)}.toPath(), Charset.forName(#{any(java.lang.String)}))",
        imports: &[FILES, "java.nio.charset.Charset"],
    },
];

/// commons-io `FileUtils` reads to `java.nio.file.Files`.
pub fn apache_file_utils_to_java_files() -> Result<CompositeRecipe, Error> {
    Ok(CompositeRecipe::new(
        descriptor(
            "io.ApacheFileUtilsToJavaFiles",
            "Use `java.nio.file.Files`",
            "Replace Apache Commons `FileUtils` reads with the `java.nio.file.Files` equivalents.",
        ),
        calls(FILE_UTILS, "io.ApacheFileUtilsToJavaFiles", FILE_UTILS_TABLE)?,
    ))
}

/// commons-io `Charsets` constants to `StandardCharsets`.
pub fn use_java_standard_charsets() -> Result<CompositeRecipe, Error> {
    let recipes = STANDARD_CHARSETS
        .iter()
        .map(|name| constant(CHARSETS, name, &format!("StandardCharsets.{name}"), &[STANDARD_CHARSETS_CLASS]))
        .collect::<Result<Vec<Arc<dyn Recipe>>, _>>()?;
    Ok(CompositeRecipe::new(
        descriptor(
            "io.UseStandardCharsets",
            "Prefer `java.nio.charset.StandardCharsets`",
            "Prefer the Java standard library's `java.nio.charset.StandardCharsets` over \
             `org.apache.commons.io.Charsets`.",
        ),
        recipes,
    ))
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{artifacts, rewrite};

    fn run(recipe: &dyn Recipe, source: &str) -> String {
        let classpath = artifacts::bundled().expect("bundled classpath");
        rewrite(recipe, source, &classpath).expect("rewrite")
    }

    #[test]
    fn file_reads_go_through_paths() {
        let before = indoc! {r#"
            import org.apache.commons.io.FileUtils;

            import java.io.File;
            import java.nio.charset.Charset;
            import java.util.List;

            class A {
                byte[] readFileBytes(File file) {
                    return FileUtils.readFileToByteArray(file);
                }

                List<String> readLines(File file) {
                    return FileUtils.readLines(file);
                }

                List<String> readLinesWithCharset(File file, Charset charset) {
                    return FileUtils.readLines(file, charset);
                }

                List<String> readLinesWithCharsetId(File file) {
                    return FileUtils.readLines(file, "UTF_8");
                }
            }
        "#};
        assert_eq!(
            run(&apache_file_utils_to_java_files().expect("recipe"), before),
            indoc! {r#"
                import java.io.File;
                import java.nio.charset.Charset;
                import java.nio.file.Files;
                import java.util.List;

                class A {
                    byte[] readFileBytes(File file) {
                        return Files.readAllBytes(file.toPath());
                    }

                    List<String> readLines(File file) {
                        return Files.readAllLines(file.toPath());
                    }

                    List<String> readLinesWithCharset(File file, Charset charset) {
                        return Files.readAllLines(file.toPath(), charset);
                    }

                    List<String> readLinesWithCharsetId(File file) {
                        return Files.readAllLines(file.toPath(), Charset.forName("UTF_8"));
                    }
                }
            "#}
        );
    }

    #[test]
    fn other_file_utils_calls_are_kept() {
        let source = indoc! {r#"
            import org.apache.commons.io.FileUtils;

            import java.io.File;
            import java.io.IOException;

            class A {
                void clean(File dir) throws IOException {
                    FileUtils.deleteDirectory(dir);
                }
            }
        "#};
        assert_eq!(run(&apache_file_utils_to_java_files().expect("recipe"), source), source);
    }

    #[test]
    fn charsets_become_standard_charsets() {
        let before = indoc! {r#"
            import org.apache.commons.io.Charsets;

            import java.nio.charset.Charset;

            class A {
                Charset iso88591 = Charsets.ISO_8859_1;
                Charset usAscii = Charsets.US_ASCII;
                Charset utf16 = Charsets.UTF_16;
                Charset utf16be = Charsets.UTF_16BE;
                Charset utf16le = Charsets.UTF_16LE;
                Charset utf8 = Charsets.UTF_8;
            }
        "#};
        assert_eq!(
            run(&use_java_standard_charsets().expect("recipe"), before),
            indoc! {r#"
                import java.nio.charset.Charset;
                import java.nio.charset.StandardCharsets;

                class A {
                    Charset iso88591 = StandardCharsets.ISO_8859_1;
                    Charset usAscii = StandardCharsets.US_ASCII;
                    Charset utf16 = StandardCharsets.UTF_16;
                    Charset utf16be = StandardCharsets.UTF_16BE;
                    Charset utf16le = StandardCharsets.UTF_16LE;
                    Charset utf8 = StandardCharsets.UTF_8;
                }
            "#}
        );
    }
}
