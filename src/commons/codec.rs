use rewrite_apache_core::recipe::CompositeRecipe;

use super::{Call, calls, descriptor};
use crate::Error;

const BASE64: &str = "org.apache.commons.codec.binary.Base64";
const JAVA_BASE64: &str = "java.util.Base64";

const TABLE: &[Call] = &[
    Call {
        name: "DecodeBase64Bytes",
        method: "decodeBase64(byte[])",
        template: "Base64.getDecoder().decode(#{any(byte[])})",
        imports: &[JAVA_BASE64],
    },
    Call {
        name: "DecodeBase64String",
        method: "decodeBase64(String)",
        template: "Base64.getDecoder().decode(#{any(java.lang.String)})",
        imports: &[JAVA_BASE64],
    },
    Call {
        name: "EncodeBase64",
        method: "encodeBase64(byte[])",
        template: "Base64.getEncoder().encode(#{any(byte[])})",
        imports: &[JAVA_BASE64],
    },
    Call {
        name: "EncodeBase64String",
        method: "encodeBase64String(byte[])",
        template: "Base64.getEncoder().encodeToString(#{any(byte[])})",
        imports: &[JAVA_BASE64],
    },
    Call {
        name: "EncodeBase64URLSafe",
        method: "encodeBase64URLSafe(byte[])",
        template: "Base64.getUrlEncoder().withoutPadding().encode(#{any(byte[])})",
        imports: &[JAVA_BASE64],
    },
    Call {
        name: "EncodeBase64URLSafeString",
        method: "encodeBase64URLSafeString(byte[])",
        template: "Base64.getUrlEncoder().withoutPadding().encodeToString(#{any(byte[])})",
        imports: &[JAVA_BASE64],
    },
];

/// commons-codec `Base64` static helpers to `java.util.Base64`.
///
/// Both classes are called `Base64`. The JDK import only replaces the
/// commons one once no commons call is left, so a unit that still uses
/// commons-codec `Base64` otherwise keeps it and is not fully migrated.
pub fn apache_base64_to_java_base64() -> Result<CompositeRecipe, Error> {
    Ok(CompositeRecipe::new(
        descriptor(
            "codec.ApacheBase64ToJavaBase64",
            "Prefer `java.util.Base64`",
            "Prefer the Java standard library's `java.util.Base64` over third-party usage of \
             `org.apache.commons.codec.binary.Base64`.",
        ),
        calls(BASE64, "codec.ApacheBase64ToJavaBase64", TABLE)?,
    ))
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{artifacts, rewrite};

    fn run(source: &str) -> String {
        let classpath = artifacts::bundled().expect("bundled classpath");
        let recipe = apache_base64_to_java_base64().expect("recipe");
        rewrite(&recipe, source, &classpath).expect("rewrite")
    }

    #[test]
    fn static_helpers_become_jdk_codecs() {
        let before = indoc! {r#"
            import org.apache.commons.codec.binary.Base64;

            class A {
                byte[] decodeBytes(byte[] b) {
                    return Base64.decodeBase64(b);
                }

                byte[] decodeText(String s) {
                    return Base64.decodeBase64(s);
                }

                String encode(byte[] b) {
                    return Base64.encodeBase64String(b);
                }

                byte[] urlSafe(byte[] b) {
                    return Base64.encodeBase64URLSafe(b);
                }

                String urlSafeText(byte[] b) {
                    return Base64.encodeBase64URLSafeString(b);
                }
            }
        "#};
        assert_eq!(
            run(before),
            indoc! {r#"
                import java.util.Base64;

                class A {
                    byte[] decodeBytes(byte[] b) {
                        return Base64.getDecoder().decode(b);
                    }

                    byte[] decodeText(String s) {
                        return Base64.getDecoder().decode(s);
                    }

                    String encode(byte[] b) {
                        return Base64.getEncoder().encodeToString(b);
                    }

                    byte[] urlSafe(byte[] b) {
                        return Base64.getUrlEncoder().withoutPadding().encode(b);
                    }

                    String urlSafeText(byte[] b) {
                        return Base64.getUrlEncoder().withoutPadding().encodeToString(b);
                    }
                }
            "#}
        );
    }

    #[test]
    fn jdk_codec_is_left_alone() {
        let source = indoc! {r#"
            import java.util.Base64;

            class A {
                byte[] decode(String s) {
                    return Base64.getDecoder().decode(s);
                }
            }
        "#};
        assert_eq!(run(source), source);
    }
}
