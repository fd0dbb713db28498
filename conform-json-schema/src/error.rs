//! The `GenerationErrorKind` taxonomy (`spec.md` §3, §7) as a `snafu` error
//! enum, plus the context selectors used to construct each variant at its
//! raise site.

use snafu::prelude::*;

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                            GenerationError                             ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// The generation-time error taxonomy (`spec.md` §3 `GenerationErrorKind`).
///
/// Only [`GenerationError::NoValidTokens`], [`GenerationError::InvalidTokenSelected`],
/// and [`GenerationError::AbortedDueToError`] are fatal to an in-progress
/// generation; the remaining variants are either recoverable by the
/// orchestrator or terminal only at the stream boundary.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), context(suffix(Ctx)))]
pub enum GenerationError {
    /// The mask-hint generator produced an empty hard allow-set: no token in
    /// the vocabulary can legally continue the stream.
    #[snafu(display("no valid tokens at key {partial_key:?}, position {position}"))]
    NoValidTokens {
        partial_key: String,
        position: usize,
    },

    /// The sampler returned a token outside the active hard mask.
    #[snafu(display(
        "sampled token {token} outside the allowed set at key {partial_key:?} (expected one of {expected:?})"
    ))]
    InvalidTokenSelected {
        token: u32,
        partial_key: String,
        expected: Vec<u32>,
    },

    /// A mask hint could not be computed because no constraint applied and
    /// none was expected to be absent (internal inconsistency; non-fatal).
    #[snafu(display("mask-hint generator produced empty constraints unexpectedly"))]
    EmptyConstraints,

    /// Structural validation of a fully-decoded document against the schema
    /// failed for a reason other than "wrong type" (see
    /// [`crate::validator::ValidationError`] for precise causes).
    #[snafu(display("schema violation: {reason}"))]
    SchemaViolation { reason: String },

    /// The supervisor observed a fatal processor error and aborted the
    /// stream at `position` (sampled-token count since generation start).
    #[snafu(display("generation aborted at position {position}"))]
    AbortedDueToError { position: usize },

    /// The extractor's cumulative output exceeded the configured cap.
    #[snafu(display("buffer limit of {limit} bytes exceeded"))]
    BufferLimitExceeded { limit: usize },

    /// Post-generation validation failed on every retry attempt.
    #[snafu(display("validation failed after exhausting retries"))]
    ValidationFailed,

    /// The orchestrator exhausted its retry budget without a valid result.
    #[snafu(display("exceeded max retries ({max_retries})"))]
    MaxRetriesExceeded { max_retries: u8 },

    /// The downstream consumer cancelled the stream.
    #[snafu(display("generation cancelled"))]
    Cancelled,

    /// No model was configured for this orchestrator; never retried.
    #[snafu(display("no model set"))]
    NoModelSet,
}

impl GenerationError {
    /// Whether this error is fatal to an in-progress generation (`spec.md`
    /// §3: "Only the first two and `abortedDueToError` are fatal").
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GenerationError::NoValidTokens { .. }
                | GenerationError::InvalidTokenSelected { .. }
                | GenerationError::AbortedDueToError { .. }
        )
    }

    /// Whether the orchestrator should retry generation after this error
    /// (`spec.md` §7: "no model loaded" is never retried; buffer exhaustion
    /// and cancellation are terminal).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::SchemaViolation { .. })
    }
}
