use std::sync::Arc;

use rewrite_apache_core::recipe::{ChangeType, CompositeRecipe, Recipe};

use super::{STANDARD_CHARSETS, STANDARD_CHARSETS_CLASS, constant, descriptor};
use crate::Error;

const CHAR_ENCODING: &str = "org.apache.commons.lang3.CharEncoding";
const SYSTEM_UTILS: &str = "org.apache.commons.lang3.SystemUtils";
const SYSTEM_PROPERTIES: &str = "org.apache.commons.lang3.SystemProperties";
const WORD_UTILS: [&str; 2] = ["org.apache.commons.lang.WordUtils", "org.apache.commons.lang3.WordUtils"];
const TEXT_WORD_UTILS: &str = "org.apache.commons.text.WordUtils";

/// `(SystemUtils field, replacement, imports)`.
const SYSTEM_UTILS_FIELDS: &[(&str, &str, &[&str])] = &[
    ("FILE_SEPARATOR", "File.separator", &["java.io.File"]),
    ("PATH_SEPARATOR", "File.pathSeparator", &["java.io.File"]),
    ("LINE_SEPARATOR", "System.lineSeparator()", &[]),
    ("IS_JAVA_1_9", "SystemUtils.IS_JAVA_9", &[SYSTEM_UTILS]),
    ("USER_HOME_KEY", "SystemProperties.USER_HOME", &[SYSTEM_PROPERTIES]),
    ("USER_DIR_KEY", "SystemProperties.USER_DIR", &[SYSTEM_PROPERTIES]),
    ("JAVA_IO_TMPDIR_KEY", "SystemProperties.JAVA_IO_TMPDIR", &[SYSTEM_PROPERTIES]),
    ("JAVA_HOME_KEY", "SystemProperties.JAVA_HOME", &[SYSTEM_PROPERTIES]),
];

/// `CharEncoding` names to the name of the matching `StandardCharsets`
/// constant.
pub fn lang3_use_standard_charsets() -> Result<CompositeRecipe, Error> {
    let recipes = STANDARD_CHARSETS
        .iter()
        .map(|name| {
            constant(
                CHAR_ENCODING,
                name,
                &format!("StandardCharsets.{name}.name()"),
                &[STANDARD_CHARSETS_CLASS],
            )
        })
        .collect::<Result<Vec<Arc<dyn Recipe>>, _>>()?;
    Ok(CompositeRecipe::new(
        descriptor(
            "lang3.UseStandardCharsets",
            "Prefer `java.nio.charset.StandardCharsets`",
            "Prefer the Java standard library's `java.nio.charset.StandardCharsets` over \
             `org.apache.commons.lang3.CharEncoding`.",
        ),
        recipes,
    ))
}

/// Deprecated `SystemUtils` constants to the JDK and `SystemProperties`.
pub fn migrate_system_utils_deprecations() -> Result<CompositeRecipe, Error> {
    let recipes = SYSTEM_UTILS_FIELDS
        .iter()
        .map(|(field, code, imports)| constant(SYSTEM_UTILS, field, code, imports))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CompositeRecipe::new(
        descriptor(
            "lang3.MigrateSystemUtilsDeprecations",
            "Migrate deprecated `SystemUtils` constants",
            "Replace deprecated `SystemUtils` separators with `java.io.File` and \
             `System.lineSeparator()`, and property keys with `SystemProperties`.",
        ),
        recipes,
    ))
}

/// commons-lang and commons-lang3 `WordUtils` to commons-text, where the
/// class moved with the same methods.
pub fn word_utils_to_commons_text() -> CompositeRecipe {
    CompositeRecipe::new(
        descriptor(
            "lang.WordUtilsToCommonsText",
            "Migrate `WordUtils` to Apache Commons Text",
            "`WordUtils` is deprecated in commons-lang3 and lives on in commons-text.",
        ),
        WORD_UTILS
            .iter()
            .map(|old| Arc::new(ChangeType::new(old, TEXT_WORD_UTILS)) as Arc<dyn Recipe>)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use indoc::{formatdoc, indoc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{artifacts, rewrite};

    fn run(recipe: &dyn Recipe, source: &str) -> String {
        let classpath = artifacts::bundled().expect("bundled classpath");
        rewrite(recipe, source, &classpath).expect("rewrite")
    }

    #[test]
    fn char_encoding_names_come_from_standard_charsets() {
        let before = indoc! {r#"
            import org.apache.commons.lang3.CharEncoding;

            class A {
                String test() {
                    String encoding = CharEncoding.ISO_8859_1;
                    encoding = CharEncoding.US_ASCII;
                    encoding = CharEncoding.UTF_16;
                    encoding = CharEncoding.UTF_16BE;
                    encoding = CharEncoding.UTF_16LE;
                    encoding = CharEncoding.UTF_8;
                    return encoding;
                }
            }
        "#};
        assert_eq!(
            run(&lang3_use_standard_charsets().expect("recipe"), before),
            indoc! {r#"
                import java.nio.charset.StandardCharsets;

                class A {
                    String test() {
                        String encoding = StandardCharsets.ISO_8859_1.name();
                        encoding = StandardCharsets.US_ASCII.name();
                        encoding = StandardCharsets.UTF_16.name();
                        encoding = StandardCharsets.UTF_16BE.name();
                        encoding = StandardCharsets.UTF_16LE.name();
                        encoding = StandardCharsets.UTF_8.name();
                        return encoding;
                    }
                }
            "#}
        );
    }

    #[test]
    fn separators_move_to_the_jdk() {
        let before = indoc! {r#"
            import org.apache.commons.lang3.SystemUtils;

            class Test {
                String f = SystemUtils.FILE_SEPARATOR;
                String p = SystemUtils.PATH_SEPARATOR;
                String l = SystemUtils.LINE_SEPARATOR;
            }
        "#};
        assert_eq!(
            run(&migrate_system_utils_deprecations().expect("recipe"), before),
            indoc! {r#"
                import java.io.File;

                class Test {
                    String f = File.separator;
                    String p = File.pathSeparator;
                    String l = System.lineSeparator();
                }
            "#}
        );
    }

    #[test]
    fn java_version_flag_is_renamed() {
        let before = indoc! {r#"
            import org.apache.commons.lang3.SystemUtils;

            class Test {
                boolean b = SystemUtils.IS_JAVA_1_9;
                boolean w = SystemUtils.IS_OS_WINDOWS;
            }
        "#};
        assert_eq!(
            run(&migrate_system_utils_deprecations().expect("recipe"), before),
            indoc! {r#"
                import org.apache.commons.lang3.SystemUtils;

                class Test {
                    boolean b = SystemUtils.IS_JAVA_9;
                    boolean w = SystemUtils.IS_OS_WINDOWS;
                }
            "#}
        );
    }

    #[test]
    fn property_keys_come_from_system_properties() {
        let before = indoc! {r#"
            import org.apache.commons.lang3.SystemUtils;

            class Test {
                String k1 = SystemUtils.USER_HOME_KEY;
                String k3 = SystemUtils.USER_DIR_KEY;
                String k4 = SystemUtils.JAVA_IO_TMPDIR_KEY;
                String k5 = SystemUtils.JAVA_HOME_KEY;
            }
        "#};
        assert_eq!(
            run(&migrate_system_utils_deprecations().expect("recipe"), before),
            indoc! {r#"
                import org.apache.commons.lang3.SystemProperties;

                class Test {
                    String k1 = SystemProperties.USER_HOME;
                    String k3 = SystemProperties.USER_DIR;
                    String k4 = SystemProperties.JAVA_IO_TMPDIR;
                    String k5 = SystemProperties.JAVA_HOME;
                }
            "#}
        );
    }

    #[test]
    fn word_utils_moves_to_commons_text() {
        for old in WORD_UTILS {
            let before = formatdoc! {r#"
                import {old};

                class A {{
                    String capitalize(String str) {{
                        return WordUtils.capitalize(str);
                    }}

                    String wrap(String str, int width) {{
                        return WordUtils.wrap(str, width);
                    }}
                }}
            "#};
            assert_eq!(
                run(&word_utils_to_commons_text(), &before),
                before.replace(old, TEXT_WORD_UTILS),
                "{old}"
            );
        }
    }
}
