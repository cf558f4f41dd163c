use std::sync::Arc;

use rewrite_apache_core::recipe::{
    ArgSource, ChangeType, CompositeRecipe, FoldIntoBuilder, Recipe, TemplateRecipe,
};
use rewrite_apache_core::template::JavaTemplate;

use super::{descriptor, shared};
use crate::Error;

const POOLING_NHTTP_4: &str = "org.apache.http.impl.nio.conn.PoolingNHttpClientConnectionManager";
const POOLING_ASYNC_5: &str = "org.apache.hc.client5.http.impl.nio.PoolingAsyncClientConnectionManager";
const POOLING_ASYNC_BUILDER_5: &str = "org.apache.hc.client5.http.impl.nio.PoolingAsyncClientConnectionManagerBuilder";
const BYTE_BUFFER_ALLOCATOR_4: &str = "org.apache.http.nio.util.ByteBufferAllocator";
const SHARED_OUTPUT_BUFFER_5: &str = "org.apache.hc.core5.http.nio.support.classic.SharedOutputBuffer";
const BYTE_BUFFER: &str = "java.nio.ByteBuffer";

/// `(connection manager setter, builder setter)`.
const POOL_SETTERS: &[(&str, &str)] = &[
    ("setMaxTotal", "setMaxConnTotal"),
    ("setDefaultMaxPerRoute", "setMaxConnPerRoute"),
    ("setDefaultConnectionConfig", "setDefaultConnectionConfig"),
    ("setConnectionConfigResolver", "setConnectionConfigResolver"),
    ("setDefaultTlsConfig", "setDefaultTlsConfig"),
    ("setTlsConfigResolver", "setTlsConfigResolver"),
    ("setValidateAfterInactivity", "setValidateAfterInactivity"),
];

/// `new PoolingNHttpClientConnectionManager(ioReactor)` to
/// `PoolingAsyncClientConnectionManagerBuilder.create().build()`, then the
/// type itself to `PoolingAsyncClientConnectionManager`. The 5.x manager
/// owns its reactor.
pub fn migrate_pooling_nhttp_client_connection_manager() -> Result<CompositeRecipe, Error> {
    let template = JavaTemplate::builder("PoolingAsyncClientConnectionManagerBuilder.create().build()")
        .imports(&[POOLING_ASYNC_BUILDER_5])
        .build()?;
    let construct = TemplateRecipe::builder(
        descriptor(
            "MigratePoolingNHttpClientConnectionManager.Construct",
            "Build the async connection manager",
            "Replace the `PoolingNHttpClientConnectionManager` constructor with its 5.x builder.",
        ),
        &format!("{POOLING_NHTTP_4} <constructor>(..)"),
        template,
    )
    .args(&[])
    .build()?;
    Ok(CompositeRecipe::new(
        descriptor(
            "MigratePoolingNHttpClientConnectionManager",
            "Migrate `PoolingNHttpClientConnectionManager` to `PoolingAsyncClientConnectionManager`",
            "Replace the 4.x async connection manager with `PoolingAsyncClientConnectionManager` \
             made by its builder.",
        ),
        vec![
            shared(construct),
            shared(ChangeType::new(POOLING_NHTTP_4, POOLING_ASYNC_5)),
        ],
    ))
}

/// Folds setters called on a fresh `PoolingAsyncClientConnectionManager`
/// into the builder that made it.
pub fn use_pooling_async_client_connection_manager_builder() -> Result<FoldIntoBuilder, Error> {
    Ok(FoldIntoBuilder::new(
        descriptor(
            "UsePoolingAsyncClientConnectionManagerBuilder",
            "Use `PoolingAsyncClientConnectionManagerBuilder`",
            "Configure the async connection manager through its builder; the 5.x manager setters are \
             meant for runtime changes.",
        ),
        POOLING_ASYNC_BUILDER_5,
        POOL_SETTERS,
    )?)
}

/// Buffers come from `ByteBuffer` directly rather than from the 4.x
/// allocators.
pub fn remove_byte_buffer_allocators() -> Result<CompositeRecipe, Error> {
    let mut recipes: Vec<Arc<dyn Recipe>> = Vec::with_capacity(2);
    for (allocator, factory) in [("HeapByteBufferAllocator", "allocate"), ("DirectByteBufferAllocator", "allocateDirect")] {
        let template = JavaTemplate::builder(&format!("ByteBuffer.{factory}(#{{any(int)}})"))
            .imports(&[BYTE_BUFFER])
            .build()?;
        recipes.push(shared(
            TemplateRecipe::builder(
                descriptor(
                    &format!("RemoveByteBufferAllocators.{allocator}"),
                    &format!("Replace `{allocator}.allocate(int)` with `ByteBuffer.{factory}(int)`"),
                    &format!("`{allocator}` does not exist in 5.x."),
                ),
                &format!("org.apache.http.nio.util.{allocator} allocate(int)"),
                template,
            )
            .args(&[ArgSource::Arg(0)])
            .build()?,
        ));
    }
    Ok(CompositeRecipe::new(
        descriptor(
            "RemoveByteBufferAllocators",
            "Remove byte buffer allocators",
            "Replace the 4.x `ByteBufferAllocator` implementations with `ByteBuffer` calls.",
        ),
        recipes,
    ))
}

/// `new SharedOutputBuffer(size, allocator)` to `new SharedOutputBuffer(size)`.
/// The 5.x buffer allocates its own memory.
pub fn shared_output_buffer_without_allocator() -> Result<TemplateRecipe, Error> {
    let template = JavaTemplate::builder("new SharedOutputBuffer(#{any(int)})")
        .imports(&[SHARED_OUTPUT_BUFFER_5])
        .build()?;
    Ok(TemplateRecipe::builder(
        descriptor(
            "SharedOutputBufferWithoutAllocator",
            "Drop the allocator argument of `SharedOutputBuffer`",
            "The 5.x `SharedOutputBuffer` allocates its own buffer.",
        ),
        &format!("{SHARED_OUTPUT_BUFFER_5} <constructor>(int, {BYTE_BUFFER_ALLOCATOR_4})"),
        template,
    )
    .args(&[ArgSource::Arg(0)])
    .remove_import(BYTE_BUFFER_ALLOCATOR_4)
    .remove_import("org.apache.http.nio.util.HeapByteBufferAllocator")
    .remove_import("org.apache.http.nio.util.DirectByteBufferAllocator")
    .build()?)
}

/// `buffer.write(b)` to `buffer.write(b, 0, b.length)`. When `b` is not a
/// plain variable the call is flagged for review, since `b` is evaluated
/// twice.
pub fn output_buffer_write_add_offset_and_length_arguments() -> Result<TemplateRecipe, Error> {
    let template = JavaTemplate::builder(&format!(
        "#{{any({SHARED_OUTPUT_BUFFER_5})}}.write(#{{b:any(byte[])}}, 0, #{{b}}.length)"
    ))
    .flag_duplication(" TODO: Please check that repeated obtaining of byte[] is safe here ")
    .build()?;
    Ok(TemplateRecipe::builder(
        descriptor(
            "OutputBufferWriteAddOffsetAndLengthArguments",
            "Add offset and length arguments to `SharedOutputBuffer.write(byte[])`",
            "The 5.x `SharedOutputBuffer` only writes a slice of an array.",
        ),
        &format!("{SHARED_OUTPUT_BUFFER_5} write(byte[])"),
        template,
    )
    .args(&[ArgSource::Select, ArgSource::Arg(0)])
    .build()?)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::httpclient5::relocated;
    use crate::{artifacts, rewrite};

    fn run(recipe: &dyn Recipe, source: &str) -> String {
        let classpath = artifacts::bundled().expect("bundled classpath");
        rewrite(recipe, source, &classpath).expect("rewrite")
    }

    #[test]
    fn heap_allocator_becomes_byte_buffer() {
        let before = indoc! {r#"
            import java.nio.ByteBuffer;

            import org.apache.http.nio.util.HeapByteBufferAllocator;

            class A {
                ByteBuffer buffer() {
                    return HeapByteBufferAllocator.INSTANCE.allocate(1024);
                }
            }
        "#};
        assert_eq!(
            run(&remove_byte_buffer_allocators().expect("recipe"), before),
            indoc! {r#"
                import java.nio.ByteBuffer;

                class A {
                    ByteBuffer buffer() {
                        return ByteBuffer.allocate(1024);
                    }
                }
            "#}
        );
    }

    #[test]
    fn direct_allocator_becomes_allocate_direct() {
        let before = indoc! {r#"
            import org.apache.http.nio.util.DirectByteBufferAllocator;

            class A {
                void f(DirectByteBufferAllocator allocator) {
                    allocator.allocate(64).array();
                }
            }
        "#};
        assert_eq!(
            run(&remove_byte_buffer_allocators().expect("recipe"), before),
            indoc! {r#"
                import org.apache.http.nio.util.DirectByteBufferAllocator;

                import java.nio.ByteBuffer;

                class A {
                    void f(DirectByteBufferAllocator allocator) {
                        ByteBuffer.allocateDirect(64).array();
                    }
                }
            "#}
        );
    }

    #[test]
    fn shared_output_buffer_loses_its_allocator() {
        let before = indoc! {r#"
            import org.apache.http.nio.util.HeapByteBufferAllocator;
            import org.apache.http.nio.util.SharedOutputBuffer;

            class A {
                SharedOutputBuffer buffer() {
                    return new SharedOutputBuffer(4096, HeapByteBufferAllocator.INSTANCE);
                }
            }
        "#};
        assert_eq!(
            run(&relocated(shared_output_buffer_without_allocator().expect("recipe")), before),
            indoc! {r#"
                import org.apache.hc.core5.http.nio.support.classic.SharedOutputBuffer;

                class A {
                    SharedOutputBuffer buffer() {
                        return new SharedOutputBuffer(4096);
                    }
                }
            "#}
        );
    }

    #[test]
    fn write_gains_offset_and_length() {
        let before = indoc! {r#"
            import org.apache.http.nio.util.SharedOutputBuffer;

            class A {
                void f(SharedOutputBuffer buffer, byte[] data, String text) {
                    buffer.write(data);
                    buffer.write(text.getBytes());
                    buffer.write(text.trim().getBytes());
                }
            }
        "#};
        assert_eq!(
            run(&relocated(output_buffer_write_add_offset_and_length_arguments().expect("recipe")), before),
            indoc! {r#"
                import org.apache.hc.core5.http.nio.support.classic.SharedOutputBuffer;

                class A {
                    void f(SharedOutputBuffer buffer, byte[] data, String text) {
                        buffer.write(data, 0, data.length);
                        buffer.write(text.getBytes(), 0, text.getBytes().length);
                        /* TODO: Please check that repeated obtaining of byte[] is safe here */ buffer.write(text.trim().getBytes(), 0, text.trim().getBytes().length);
                    }
                }
            "#}
        );
    }

    #[test]
    fn async_manager_is_built_and_configured_through_builder() {
        let recipe = CompositeRecipe::new(
            descriptor("Test", "Test", "Construct, relocate, fold."),
            vec![
                shared(migrate_pooling_nhttp_client_connection_manager().expect("construct")),
                shared(use_pooling_async_client_connection_manager_builder().expect("fold")),
            ],
        );
        let before = indoc! {r#"
            import org.apache.http.impl.nio.conn.PoolingNHttpClientConnectionManager;
            import org.apache.http.nio.reactor.ConnectingIOReactor;

            class A {
                void f(ConnectingIOReactor ioReactor) {
                    PoolingNHttpClientConnectionManager cm = new PoolingNHttpClientConnectionManager(ioReactor);
                    cm.setMaxTotal(100);
                    cm.shutdown();
                    cm.setDefaultMaxPerRoute(10);
                }
            }
        "#};
        assert_eq!(
            run(&recipe, before),
            indoc! {r#"
                import org.apache.hc.client5.http.impl.nio.PoolingAsyncClientConnectionManagerBuilder;
                import org.apache.hc.client5.http.impl.nio.PoolingAsyncClientConnectionManager;
                import org.apache.http.nio.reactor.ConnectingIOReactor;

                class A {
                    void f(ConnectingIOReactor ioReactor) {
                        PoolingAsyncClientConnectionManager cm = PoolingAsyncClientConnectionManagerBuilder.create()
                                .setMaxConnTotal(100)
                                .build();
                        cm.shutdown();
                        cm.setDefaultMaxPerRoute(10);
                    }
                }
            "#}
        );
    }
}
