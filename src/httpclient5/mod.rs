//! Apache HttpClient 4.x to 5.x.
//!
//! [`upgrade_httpclient5`] runs, in order:
//!
//! 1. rewrites that read the 4.x API before it moves: content encoding folded
//!    into the `StringEntity` constructor, the stale connection check,
//!    `PoolingNHttpClientConnectionManager` and the byte buffer allocators;
//! 2. the package relocations of [`RELOCATIONS`];
//! 3. method renames;
//! 4. rewrites of calls whose 5.x counterpart takes other arguments.
//!
//! Steps 3 and 4 match the relocated bindings, so a call keeps the method
//! type it had under 4.x with the owner renamed.

mod auth;
mod entity;
mod nio;
mod request_config;
mod request_line;
mod ssl;
mod status_line;
mod time;

use std::sync::Arc;

use rewrite_apache_core::matcher::MethodMatcher;
use rewrite_apache_core::recipe::{
    ChangeMethodName, ChangeType, CompositeRecipe, Recipe, RecipeDescriptor, RemoveMethodInvocations,
};
use rewrite_apache_core::tree::{Expr, Statement};
use rewrite_apache_core::visitor::{JavaVisitor, VisitContext, super_method_invocation, walk_statement};

use crate::Error;
use crate::options::{AddTimeUnitArgumentOptions, ChangeArgumentToTimeValueOptions, TimeUnit};

pub use auth::{MigrateAuthScope, migrate_scheme_factories, username_password_credentials};
pub use entity::{MigrateStringEntity, MigrateStringEntityStringCharsetConstructor};
pub use nio::{
    migrate_pooling_nhttp_client_connection_manager, output_buffer_write_add_offset_and_length_arguments,
    remove_byte_buffer_allocators, shared_output_buffer_without_allocator,
    use_pooling_async_client_connection_manager_builder,
};
pub use request_config::MigrateRequestConfig;
pub use request_line::new_request_line;
pub use ssl::MigrateSSLConnectionSocketFactory;
pub use status_line::NewStatusLine;
pub use time::{AddTimeUnitArgument, ChangeArgumentToTimeValue};

const TAGS: &[&str] = &["apache", "httpclient"];

/// `(4.x type, 5.x type)`.
pub const RELOCATIONS: &[(&str, &str)] = &[
    ("org.apache.http.Header", "org.apache.hc.core5.http.Header"),
    ("org.apache.http.HttpEntity", "org.apache.hc.core5.http.HttpEntity"),
    ("org.apache.http.HttpHost", "org.apache.hc.core5.http.HttpHost"),
    ("org.apache.http.HttpMessage", "org.apache.hc.core5.http.HttpMessage"),
    ("org.apache.http.HttpRequest", "org.apache.hc.core5.http.HttpRequest"),
    ("org.apache.http.HttpResponse", "org.apache.hc.core5.http.HttpResponse"),
    ("org.apache.http.RequestLine", "org.apache.hc.core5.http.message.RequestLine"),
    ("org.apache.http.StatusLine", "org.apache.hc.core5.http.message.StatusLine"),
    ("org.apache.http.ProtocolVersion", "org.apache.hc.core5.http.ProtocolVersion"),
    ("org.apache.http.entity.ContentType", "org.apache.hc.core5.http.ContentType"),
    ("org.apache.http.entity.AbstractHttpEntity", "org.apache.hc.core5.http.io.entity.AbstractHttpEntity"),
    ("org.apache.http.entity.StringEntity", "org.apache.hc.core5.http.io.entity.StringEntity"),
    ("org.apache.http.util.EntityUtils", "org.apache.hc.core5.http.io.entity.EntityUtils"),
    ("org.apache.http.message.BasicHeader", "org.apache.hc.core5.http.message.BasicHeader"),
    ("org.apache.http.config.SocketConfig", "org.apache.hc.core5.http.io.SocketConfig"),
    ("org.apache.http.client.config.RequestConfig", "org.apache.hc.client5.http.config.RequestConfig"),
    ("org.apache.http.auth.AuthScope", "org.apache.hc.client5.http.auth.AuthScope"),
    ("org.apache.http.auth.Credentials", "org.apache.hc.client5.http.auth.Credentials"),
    (
        "org.apache.http.auth.UsernamePasswordCredentials",
        "org.apache.hc.client5.http.auth.UsernamePasswordCredentials",
    ),
    ("org.apache.http.client.CredentialsProvider", "org.apache.hc.client5.http.auth.CredentialsProvider"),
    ("org.apache.http.client.HttpRequestRetryHandler", "org.apache.hc.client5.http.HttpRequestRetryStrategy"),
    ("org.apache.http.client.methods.HttpUriRequest", "org.apache.hc.client5.http.classic.methods.HttpUriRequest"),
    (
        "org.apache.http.client.methods.HttpRequestBase",
        "org.apache.hc.client5.http.classic.methods.HttpUriRequestBase",
    ),
    ("org.apache.http.client.methods.HttpGet", "org.apache.hc.client5.http.classic.methods.HttpGet"),
    ("org.apache.http.client.methods.HttpPost", "org.apache.hc.client5.http.classic.methods.HttpPost"),
    (
        "org.apache.http.client.methods.CloseableHttpResponse",
        "org.apache.hc.client5.http.impl.classic.CloseableHttpResponse",
    ),
    ("org.apache.http.client.methods.RequestBuilder", "org.apache.hc.core5.http.io.support.ClassicRequestBuilder"),
    ("org.apache.http.conn.HttpClientConnectionManager", "org.apache.hc.client5.http.io.HttpClientConnectionManager"),
    ("org.apache.http.conn.ssl.SSLConnectionSocketFactory", "org.apache.hc.client5.http.ssl.SSLConnectionSocketFactory"),
    (
        "org.apache.http.impl.conn.PoolingHttpClientConnectionManager",
        "org.apache.hc.client5.http.impl.io.PoolingHttpClientConnectionManager",
    ),
    ("org.apache.http.impl.client.CloseableHttpClient", "org.apache.hc.client5.http.impl.classic.CloseableHttpClient"),
    ("org.apache.http.impl.client.HttpClientBuilder", "org.apache.hc.client5.http.impl.classic.HttpClientBuilder"),
    ("org.apache.http.impl.client.HttpClients", "org.apache.hc.client5.http.impl.classic.HttpClients"),
    (
        "org.apache.http.impl.client.BasicCredentialsProvider",
        "org.apache.hc.client5.http.impl.auth.BasicCredentialsProvider",
    ),
    ("org.apache.http.impl.auth.BasicSchemeFactory", "org.apache.hc.client5.http.impl.auth.BasicSchemeFactory"),
    ("org.apache.http.impl.auth.DigestSchemeFactory", "org.apache.hc.client5.http.impl.auth.DigestSchemeFactory"),
    ("org.apache.http.impl.nio.reactor.IOReactorConfig", "org.apache.hc.core5.reactor.IOReactorConfig"),
    ("org.apache.http.nio.util.SharedOutputBuffer", "org.apache.hc.core5.http.nio.support.classic.SharedOutputBuffer"),
];

/// `(method pattern, new name, match overrides)`, on relocated bindings.
const RENAMES: &[(&str, &str, bool)] = &[
    ("org.apache.hc.client5.http.config.RequestConfig.Builder setSocketTimeout(int)", "setResponseTimeout", false),
    ("org.apache.hc.client5.http.impl.classic.HttpClientBuilder setRetryHandler(..)", "setRetryStrategy", false),
    ("org.apache.hc.core5.http.HttpMessage getAllHeaders()", "getHeaders", true),
    ("org.apache.hc.client5.http.classic.methods.HttpUriRequest getURI()", "getUri", true),
    ("org.apache.hc.client5.http.classic.methods.HttpUriRequestBase releaseConnection()", "reset", true),
];

/// Timeout setters that gain a `TimeUnit` argument.
const TIME_UNIT_SETTERS: &[&str] = &[
    "org.apache.hc.client5.http.config.RequestConfig.Builder setConnectionRequestTimeout(int)",
    "org.apache.hc.client5.http.config.RequestConfig.Builder setConnectTimeout(int)",
    "org.apache.hc.client5.http.config.RequestConfig.Builder setResponseTimeout(int)",
    "org.apache.hc.core5.http.io.SocketConfig.Builder setSoTimeout(int)",
    "org.apache.hc.core5.http.io.SocketConfig.Builder setSoLinger(int)",
    "org.apache.hc.core5.reactor.IOReactorConfig.Builder setSoTimeout(int)",
    "org.apache.hc.core5.reactor.IOReactorConfig.Builder setSoLinger(int)",
];

/// `IOReactorConfig.Builder` setters without a 5.x counterpart.
const REMOVED_REACTOR_SETTERS: &[&str] = &[
    "org.apache.hc.core5.reactor.IOReactorConfig.Builder setShutdownGracePeriod(..)",
    "org.apache.hc.core5.reactor.IOReactorConfig.Builder setInterestOpQueued(..)",
    "org.apache.hc.core5.reactor.IOReactorConfig.Builder setConnectTimeout(..)",
];

fn descriptor(name: &str, display_name: &str, description: &str) -> RecipeDescriptor {
    RecipeDescriptor::new(format!("apache.httpclient5.{name}"), display_name, description).with_tags(TAGS)
}

fn shared<R: Recipe + 'static>(recipe: R) -> Arc<dyn Recipe> {
    Arc::new(recipe)
}

/// One [`ChangeType`] per entry of [`RELOCATIONS`].
pub fn relocate_packages() -> CompositeRecipe {
    CompositeRecipe::new(
        descriptor(
            "RelocatePackages",
            "Move HttpClient 4.x types to their 5.x packages",
            "Change references to HttpClient and HttpCore 4.x types to the 5.x types that replace them.",
        ),
        RELOCATIONS
            .iter()
            .map(|(old, new)| shared(ChangeType::new(old, new)))
            .collect(),
    )
}

fn rename_methods() -> Result<CompositeRecipe, Error> {
    let mut recipes = Vec::with_capacity(RENAMES.len());
    for (pattern, new_name, overrides) in RENAMES {
        let mut rename = ChangeMethodName::new(pattern, new_name)?;
        if *overrides {
            rename = rename.match_overrides();
        }
        recipes.push(shared(rename));
    }
    Ok(CompositeRecipe::new(
        descriptor(
            "RenameMethods",
            "Rename HttpClient methods changed in 5.x",
            "Rename methods whose 5.x counterpart kept the semantics under a new name.",
        ),
        recipes,
    ))
}

fn timeouts() -> Result<CompositeRecipe, Error> {
    let mut recipes = Vec::with_capacity(TIME_UNIT_SETTERS.len() + REMOVED_REACTOR_SETTERS.len() + 1);
    for pattern in TIME_UNIT_SETTERS {
        let options = AddTimeUnitArgumentOptions::new(pattern).with_time_unit(TimeUnit::Milliseconds);
        recipes.push(shared(AddTimeUnitArgument::new(options)?));
    }
    recipes.push(shared(ChangeArgumentToTimeValue::new(ChangeArgumentToTimeValueOptions::new(
        "org.apache.hc.core5.reactor.IOReactorConfig.Builder setSelectInterval(long)",
    ))?));
    for pattern in REMOVED_REACTOR_SETTERS {
        recipes.push(shared(RemoveMethodInvocations::new(pattern)?));
    }
    Ok(CompositeRecipe::new(
        descriptor(
            "MigrateTimeouts",
            "Migrate timeouts to `TimeUnit` and `TimeValue` arguments",
            "Timeouts given in milliseconds gain an explicit unit in HttpClient 5.x.",
        ),
        recipes,
    ))
}

/// The full 4.x to 5.x migration.
///
/// ```
/// use rewrite_apache::{artifacts, httpclient5::upgrade_httpclient5, rewrite};
///
/// let classpath = artifacts::bundled().unwrap();
/// let before = "\
/// import org.apache.http.client.methods.HttpGet;
///
/// class A {
///     void f(HttpGet get) {
///         get.releaseConnection();
///     }
/// }
/// ";
/// let after = rewrite(&upgrade_httpclient5().unwrap(), before, &classpath).unwrap();
/// assert!(after.contains("import org.apache.hc.client5.http.classic.methods.HttpGet;"));
/// assert!(after.contains("get.reset();"));
/// ```
pub fn upgrade_httpclient5() -> Result<CompositeRecipe, Error> {
    let recipes: Vec<Arc<dyn Recipe>> = vec![
        shared(MigrateStringEntity::new()?),
        shared(MigrateRequestConfig::new()?),
        shared(migrate_pooling_nhttp_client_connection_manager()?),
        shared(remove_byte_buffer_allocators()?),
        shared(relocate_packages()),
        shared(rename_methods()?),
        shared(timeouts()?),
        shared(MigrateAuthScope::new()?),
        shared(username_password_credentials()?),
        shared(migrate_scheme_factories()?),
        shared(MigrateStringEntityStringCharsetConstructor::new()?),
        shared(new_request_line()?),
        shared(NewStatusLine::new()?),
        shared(shared_output_buffer_without_allocator()?),
        shared(output_buffer_write_add_offset_and_length_arguments()?),
        shared(MigrateSSLConnectionSocketFactory::new()?),
        shared(use_pooling_async_client_connection_manager_builder()?),
    ];
    Ok(CompositeRecipe::new(
        descriptor(
            "UpgradeApacheHttpClient_5",
            "Migrate to ApacheHttpClient 5.x",
            "Migrate applications to the latest Apache HttpClient 5.x release. This recipe modifies \
             the application's source code to move from 4.x to the equivalent 5.x API.",
        ),
        recipes,
    ))
}

/// `recipe` run on sources already moved to the 5.x packages.
#[cfg(test)]
fn relocated<R: Recipe + 'static>(recipe: R) -> CompositeRecipe {
    CompositeRecipe::new(
        descriptor("Relocated", "Relocated", "Relocate, then run one recipe."),
        vec![shared(relocate_packages()), shared(recipe)],
    )
}

/// Whether `statement` holds a call `matcher` matches.
fn calls(statement: &Arc<Statement>, matcher: &MethodMatcher, ctx: &mut VisitContext<'_>) -> bool {
    let mut finder = FindCalls { matcher, found: false };
    walk_statement(&mut finder, statement, ctx);
    finder.found
}

struct FindCalls<'m> {
    matcher: &'m MethodMatcher,
    found: bool,
}

impl JavaVisitor for FindCalls<'_> {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        if self.found || self.matcher.matches_invocation_in(expr, ctx.classpath()) {
            self.found = true;
            return expr.clone();
        }
        super_method_invocation(self, expr, ctx)
    }
}
