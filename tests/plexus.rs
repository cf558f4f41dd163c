mod common;

use indoc::indoc;

use common::{rewrite_run, rewrite_run_stable};
use rewrite_apache::plexus::{AbstractLogEnabledToSlf4j, plexus_file_utils, plexus_string_utils};

#[test]
fn string_equality_goes_through_objects() {
    rewrite_run_stable(
        &plexus_string_utils().expect("recipe"),
        indoc! {r#"
            import org.codehaus.plexus.util.StringUtils;

            class A {
                boolean f(String a, String b) {
                    return StringUtils.equals(a, b);
                }
            }
        "#},
        indoc! {r#"
            import java.util.Objects;

            class A {
                boolean f(String a, String b) {
                    return Objects.equals(a, b);
                }
            }
        "#},
    );
}

#[test]
fn lower_case_guards_null() {
    rewrite_run(
        &plexus_string_utils().expect("recipe"),
        indoc! {r#"
            import org.codehaus.plexus.util.StringUtils;

            class A {
                String f(String s) {
                    return StringUtils.lowerCase(s);
                }
            }
        "#},
        indoc! {r#"
            class A {
                String f(String s) {
                    return s == null ? null : s.toLowerCase();
                }
            }
        "#},
    );
}

#[test]
fn get_file_becomes_file_constructor() {
    rewrite_run(
        &plexus_file_utils().expect("recipe"),
        indoc! {r#"
            import java.io.File;

            import org.codehaus.plexus.util.FileUtils;

            class A {
                File f(String path) {
                    return FileUtils.getFile(path);
                }
            }
        "#},
        indoc! {r#"
            import java.io.File;

            class A {
                File f(String path) {
                    return new File(path);
                }
            }
        "#},
    );
}

#[test]
fn logger_moves_to_slf4j() {
    rewrite_run(
        &AbstractLogEnabledToSlf4j::new().expect("recipe"),
        indoc! {r#"
            import org.codehaus.plexus.logging.AbstractLogEnabled;

            class A extends AbstractLogEnabled {
                void method() {
                    getLogger().warn("careful");
                }
            }
        "#},
        indoc! {r#"
            import org.slf4j.Logger;
            import org.slf4j.LoggerFactory;

            class A {
                private static final Logger logger = LoggerFactory.getLogger(A.class);

                void method() {
                    logger.warn("careful");
                }
            }
        "#},
    );
}

#[test]
fn logger_moves_to_slf4j_in_a_generic_class() {
    rewrite_run(
        &AbstractLogEnabledToSlf4j::new().expect("recipe"),
        indoc! {r#"
            import org.codehaus.plexus.logging.AbstractLogEnabled;

            class Repo<T> extends AbstractLogEnabled {
                <R> R load(T key) {
                    getLogger().info("loading");
                    return null;
                }
            }
        "#},
        indoc! {r#"
            import org.slf4j.Logger;
            import org.slf4j.LoggerFactory;

            class Repo<T> {
                private static final Logger logger = LoggerFactory.getLogger(Repo.class);

                <R> R load(T key) {
                    logger.info("loading");
                    return null;
                }
            }
        "#},
    );
}
