mod common;

use indoc::indoc;

use common::{assert_unchanged, rewrite_run, rewrite_run_stable};
use rewrite_apache::commons::{
    IsNotEmptyToJdk, apache_base64_to_java_base64, use_java_standard_charsets, word_utils_to_commons_text,
};

fn recipe() -> IsNotEmptyToJdk {
    IsNotEmptyToJdk::new().expect("recipe")
}

#[test]
fn is_empty_becomes_null_or_empty_check() {
    rewrite_run_stable(
        &recipe(),
        indoc! {r#"
            import org.apache.commons.lang3.StringUtils;

            class A {
                boolean f(String s) {
                    return StringUtils.isEmpty(s);
                }
            }
        "#},
        indoc! {r#"
            class A {
                boolean f(String s) {
                    return s == null || s.isEmpty();
                }
            }
        "#},
    );
}

#[test]
fn is_not_empty_on_a_field() {
    rewrite_run(
        &recipe(),
        indoc! {r#"
            import org.apache.commons.lang.StringUtils;

            class A {
                String name;

                boolean f() {
                    return StringUtils.isNotEmpty(name);
                }
            }
        "#},
        indoc! {r#"
            class A {
                String name;

                boolean f() {
                    return name != null && !name.isEmpty();
                }
            }
        "#},
    );
}

#[test]
fn trimmed_argument_drops_the_null_check() {
    rewrite_run(
        &recipe(),
        indoc! {r#"
            import org.apache.commons.lang3.StringUtils;

            class A {
                boolean f(String s) {
                    return StringUtils.isEmpty(s.trim());
                }
            }
        "#},
        indoc! {r#"
            class A {
                boolean f(String s) {
                    return s.trim().isEmpty();
                }
            }
        "#},
    );
}

#[test]
fn length_comparison_becomes_is_empty() {
    rewrite_run(
        &recipe(),
        indoc! {r#"
            class A {
                boolean f(String s) {
                    return s.length() != 0;
                }
            }
        "#},
        indoc! {r#"
            class A {
                boolean f(String s) {
                    return !s.isEmpty();
                }
            }
        "#},
    );
}

#[test]
fn call_arguments_are_left_alone() {
    assert_unchanged(
        &recipe(),
        indoc! {r#"
            import org.apache.commons.lang3.StringUtils;

            class A {
                String name() {
                    return "a";
                }

                boolean f() {
                    return StringUtils.isEmpty(name());
                }
            }
        "#},
    );
}

#[test]
fn getter_results_may_be_repeated() {
    rewrite_run(
        &recipe(),
        indoc! {r#"
            import org.apache.commons.lang3.StringUtils;

            class A {
                boolean f(B b) {
                    return StringUtils.isEmpty(b.getField());
                }
            }

            class B {
                String getField() {
                    return "";
                }
            }
        "#},
        indoc! {r#"
            class A {
                boolean f(B b) {
                    return b.getField() == null || b.getField().isEmpty();
                }
            }

            class B {
                String getField() {
                    return "";
                }
            }
        "#},
    );
}

#[test]
fn negation_keeps_the_check_grouped() {
    rewrite_run(
        &recipe(),
        indoc! {r#"
            import org.apache.commons.lang3.StringUtils;

            class A {
                boolean f(String first) {
                    return !StringUtils.isEmpty(first);
                }
            }
        "#},
        indoc! {r#"
            class A {
                boolean f(String first) {
                    return !(first == null || first.isEmpty());
                }
            }
        "#},
    );
}

#[test]
fn generic_class_is_rewritten() {
    rewrite_run(
        &recipe(),
        indoc! {r#"
            import java.util.List;

            import org.apache.commons.lang3.StringUtils;

            class Box<T> {
                List<T> items;

                boolean f(String s, T item) {
                    items.add(item);
                    return StringUtils.isNotEmpty(s);
                }
            }
        "#},
        indoc! {r#"
            import java.util.List;

            class Box<T> {
                List<T> items;

                boolean f(String s, T item) {
                    items.add(item);
                    return s != null && !s.isEmpty();
                }
            }
        "#},
    );
}

#[test]
fn base64_in_a_static_initializer_is_stable() {
    rewrite_run_stable(
        &apache_base64_to_java_base64().expect("recipe"),
        indoc! {r#"
            import org.apache.commons.codec.binary.Base64;

            class Keys {
                static final byte[] KEY = Base64.decodeBase64("c2VjcmV0");

                String token(byte[] raw) {
                    return "Bearer " + Base64.encodeBase64String(raw);
                }
            }
        "#},
        indoc! {r#"
            import java.util.Base64;

            class Keys {
                static final byte[] KEY = Base64.getDecoder().decode("c2VjcmV0");

                String token(byte[] raw) {
                    return "Bearer " + Base64.getEncoder().encodeToString(raw);
                }
            }
        "#},
    );
}

#[test]
fn statically_imported_charset_is_replaced() {
    rewrite_run(
        &use_java_standard_charsets().expect("recipe"),
        indoc! {r#"
            import java.nio.charset.Charset;

            import static org.apache.commons.io.Charsets.UTF_8;

            class A {
                Charset charset() {
                    return UTF_8;
                }
            }
        "#},
        indoc! {r#"
            import java.nio.charset.Charset;
            import java.nio.charset.StandardCharsets;

            class A {
                Charset charset() {
                    return StandardCharsets.UTF_8;
                }
            }
        "#},
    );
}

#[test]
fn commons_text_word_utils_is_left_alone() {
    assert_unchanged(
        &word_utils_to_commons_text(),
        indoc! {r#"
            import org.apache.commons.text.WordUtils;

            class A {
                String capitalize(String str) {
                    return WordUtils.capitalize(str);
                }
            }
        "#},
    );
}
