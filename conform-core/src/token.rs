//! The tokenizer contract the rest of the engine is generic over.
//!
//! The tensor backend and the concrete tokenizer are external collaborators
//! (see `spec.md` §6); this module only defines the trait they must satisfy.

use std::fmt;

/// Identifies one entry in a tokenizer's vocabulary.
pub type TokenId = u32;

/// A short, deterministic identifier for a tokenizer's vocabulary.
///
/// Two tokenizers with equal fingerprints are interchangeable for trie and
/// special-token caching purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenizerFingerprint(String);

impl TokenizerFingerprint {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenizerFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TokenizerFingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The external tokenizer contract (`spec.md` §6).
///
/// Implementors encode/decode between text and [`TokenId`]s and report
/// enough metadata (`fingerprint`, `vocab_size`, special ids) for the engine
/// to build caches and special-token indices without ever inspecting model
/// weights.
pub trait TokenizerAdapter: Send + Sync {
    /// Encodes `text` to a sequence of token ids. Total: empty input yields
    /// an empty sequence.
    fn encode(&self, text: &str) -> Vec<TokenId>;

    /// Decodes a sequence of token ids back to text. Ids the tokenizer has
    /// never seen decode to an empty string rather than erroring.
    fn decode(&self, tokens: &[TokenId]) -> String;

    /// The end-of-sequence token id, if the vocabulary defines one.
    fn eos_token_id(&self) -> Option<TokenId>;

    /// The beginning-of-sequence token id, if the vocabulary defines one.
    fn bos_token_id(&self) -> Option<TokenId> {
        None
    }

    /// The unknown-token id, if the vocabulary defines one.
    fn unknown_token_id(&self) -> Option<TokenId> {
        None
    }

    /// A short, deterministic identifier for this tokenizer's vocabulary.
    fn fingerprint(&self) -> TokenizerFingerprint;

    /// The number of entries in the vocabulary, if known up front.
    fn vocab_size(&self) -> Option<usize> {
        None
    }
}
