use rewrite_apache_core::recipe::{ArgSource, TemplateRecipe};
use rewrite_apache_core::template::JavaTemplate;

use super::descriptor;
use crate::Error;

/// `request.getRequestLine()` to `new RequestLine(request)`.
pub fn new_request_line() -> Result<TemplateRecipe, Error> {
    let template = JavaTemplate::builder("new RequestLine(#{any(org.apache.hc.core5.http.HttpRequest)})")
        .imports(&["org.apache.hc.core5.http.message.RequestLine"])
        .build()?;
    Ok(TemplateRecipe::builder(
        descriptor(
            "NewRequestLine",
            "Replace `getRequestLine()` with `new RequestLine(HttpRequest)`",
            "`HttpRequest.getRequestLine()` was removed in 5.x; build a `RequestLine` from the request.",
        ),
        "org.apache.hc.core5.http.HttpRequest getRequestLine()",
        template,
    )
    .match_overrides()
    .args(&[ArgSource::Select])
    .build()?)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::httpclient5::relocated;
    use crate::{artifacts, rewrite};

    #[test]
    fn request_line_is_built_from_the_request() {
        let classpath = artifacts::bundled().expect("bundled classpath");
        let recipe = relocated(new_request_line().expect("recipe"));
        let before = indoc! {r#"
            import org.apache.http.HttpRequest;
            import org.apache.http.RequestLine;

            class A {
                String method(HttpRequest request) {
                    RequestLine line = request.getRequestLine();
                    return line.getMethod();
                }
            }
        "#};
        assert_eq!(
            rewrite(&recipe, before, &classpath).expect("rewrite"),
            indoc! {r#"
                import org.apache.hc.core5.http.HttpRequest;
                import org.apache.hc.core5.http.message.RequestLine;

                class A {
                    String method(HttpRequest request) {
                        RequestLine line = new RequestLine(request);
                        return line.getMethod();
                    }
                }
            "#}
        );
    }
}
