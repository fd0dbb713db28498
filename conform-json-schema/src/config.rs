//! Caller-configurable decoding knobs (`spec.md` §9 Design Notes, both open
//! questions).

/// How a generation responds to a fatal processor error (`spec.md` §9: "the
/// source contains two error-handling postures... this spec elevates the
/// rule to the taxonomy in §7 and leaves the knob configurable per
/// generation").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPosture {
    /// Fatal errors abort the stream immediately (`spec.md` §7 default
    /// framing: grammar/trie violations are fatal).
    #[default]
    AbortImmediately,
    /// Fatal errors are recorded but the stream continues; the snap parser
    /// may still salvage a usable document post-hoc.
    ContinueAndValidate,
}

/// Decoding-time configuration passed to the orchestrator and processor.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeConfig {
    /// Positive logit bias applied to soft-mode allow-sets. Best-effort;
    /// never exercised by hard-mask correctness tests (`spec.md` §9).
    pub soft_bias: f32,
    /// Whether whitespace tokens are unioned into non-error, non-done,
    /// non-key-body mask hints (`spec.md` §4.4).
    pub include_whitespace: bool,
    /// Cumulative cap, in bytes of JSON-emitted text, before the extractor
    /// aborts with `bufferLimitExceeded` (`spec.md` §4.7 default 30 000).
    pub buffer_cap_bytes: usize,
    /// Maximum retry attempts after a recoverable validation failure
    /// (`spec.md` §4.8).
    pub max_retries: u8,
    /// The posture taken on a fatal processor error.
    pub error_posture: ErrorPosture,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            soft_bias: 2.0,
            include_whitespace: true,
            buffer_cap_bytes: 30_000,
            max_retries: 2,
            error_posture: ErrorPosture::AbortImmediately,
        }
    }
}
