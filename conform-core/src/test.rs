//! Test-only fixtures shared across this crate's unit tests.

use std::collections::HashMap;

use crate::token::{TokenId, TokenizerAdapter, TokenizerFingerprint};

/// A tiny fixed-vocabulary tokenizer used only by `conform-core`'s own unit
/// tests. `conform-json-schema::testing::MockTokenizer` is the richer,
/// publicly exported double used by downstream crates and integration
/// tests.
pub struct FixtureTokenizer {
    by_id: Vec<String>,
    by_text: HashMap<String, TokenId>,
}

impl FixtureTokenizer {
    /// A vocabulary containing one token per JSON structural glyph plus a
    /// handful of whitespace and alphabetic filler tokens.
    #[must_use]
    pub fn with_glyphs() -> Self {
        let glyphs = [
            "{", "}", "[", "]", "\"", ":", ",", "\\", " ", "\t", "\n", "\r", "a", "b", "c",
        ];
        let by_id: Vec<String> = glyphs.iter().map(|s| (*s).to_string()).collect();
        let by_text = by_id
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as TokenId))
            .collect();
        Self { by_id, by_text }
    }
}

impl TokenizerAdapter for FixtureTokenizer {
    fn encode(&self, text: &str) -> Vec<TokenId> {
        if let Some(&id) = self.by_text.get(text) {
            return vec![id];
        }
        // Unseen multi-character text falls back to one token per
        // character, the way a real subword tokenizer degrades for
        // out-of-vocabulary strings.
        text.chars()
            .filter_map(|c| self.by_text.get(&c.to_string()).copied())
            .collect()
    }

    fn decode(&self, tokens: &[TokenId]) -> String {
        tokens
            .iter()
            .map(|id| self.by_id.get(*id as usize).map_or("", String::as_str))
            .collect()
    }

    fn eos_token_id(&self) -> Option<TokenId> {
        None
    }

    fn fingerprint(&self) -> TokenizerFingerprint {
        TokenizerFingerprint::new("fixture-v1")
    }

    fn vocab_size(&self) -> Option<usize> {
        Some(self.by_id.len())
    }
}
