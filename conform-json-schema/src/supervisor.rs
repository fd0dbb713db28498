//! Bridges an upstream token/text stream to a downstream consumer,
//! interposing the key-detection processor and the streaming extractor, and
//! aborting on fatal-error flags with the offending position (`spec.md`
//! §4.7).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use conform_core::TokenId;
use futures::stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::error::{self, GenerationError};
use crate::extractor::JsonExtractor;
use crate::processor::KeyDetectionProcessor;

/// A cooperative cancellation flag shared between a downstream consumer and
/// the supervisor driving its upstream (`spec.md` §5: "cancellation
/// propagates from consumer to producer within one step boundary").
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One upstream item: a sampled token id paired with its decoded text.
pub type SampledToken = (TokenId, String);

/// Drives `upstream` through `processor` and `extractor`, yielding decoded
/// JSON text chunks until the stream completes, a fatal processor error
/// aborts it, the buffer cap is exceeded, or `cancel` fires (`spec.md`
/// §4.7).
pub fn run<'schema, S>(
    mut upstream: S,
    mut processor: KeyDetectionProcessor<'schema>,
    mut extractor: JsonExtractor,
    buffer_cap_bytes: usize,
    cancel: CancelToken,
) -> impl Stream<Item = Result<String, GenerationError>> + 'schema
where
    S: Stream<Item = SampledToken> + Unpin + 'schema,
{
    async_stream_like(async move {
        let mut emitted_bytes = 0usize;
        let mut out = Vec::new();

        while let Some((token, decoded)) = upstream.next().await {
            if cancel.is_cancelled() {
                out.push(Err(error::CancelledCtx.build()));
                return out;
            }

            processor.did_sample(token, &decoded);

            if processor.has_fatal_error() {
                let position = processor.position();
                warn!(position, "generation aborted on fatal processor error");
                out.push(Err(error::AbortedDueToErrorCtx { position }.build()));
                return out;
            }

            let chunk: Vec<u8> = decoded.bytes().filter(|&b| extractor.should_emit(b)).collect();
            if chunk.is_empty() {
                continue;
            }
            emitted_bytes += chunk.len();
            if emitted_bytes > buffer_cap_bytes {
                out.push(Err(error::BufferLimitExceededCtx {
                    limit: buffer_cap_bytes,
                }
                .build()));
                return out;
            }
            // `chunk` is a UTF-8 suffix of `decoded`, which was itself
            // decoded text; it is therefore valid UTF-8.
            out.push(Ok(String::from_utf8(chunk).expect("extractor preserves UTF-8 boundaries")));
        }

        extractor.finish();
        info!(emitted_bytes, "generation completed");
        out
    })
}

/// A minimal stand-in for `async-stream`'s `stream!` macro: runs `body` to
/// completion up front and replays its collected items. Adequate here
/// because the supervisor's upstream is itself a bounded, in-memory stream
/// in every caller (tests, the orchestrator's retry loop) — there is no
/// unbounded/backpressured producer this crate needs to interleave with.
fn async_stream_like<T, Fut>(body: Fut) -> impl Stream<Item = T>
where
    Fut: std::future::Future<Output = Vec<T>>,
{
    futures::stream::once(body).flat_map(futures::stream::iter)
}
