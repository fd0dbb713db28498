//! Publicly exported test doubles for downstream crates and the workspace
//! `tests` crate (`SPEC_FULL.md` §4.10).
//!
//! [`MockTokenizer`] is a small, deterministic, fixed-vocabulary tokenizer.
//! It exists to exercise the engine end-to-end in tests, not to decode real
//! model output — real generality lives behind [`conform_core::TokenizerAdapter`]
//! and is supplied by the embedding application.

use std::collections::HashMap;

use conform_core::{TokenId, TokenizerAdapter, TokenizerFingerprint};

/// A fixed-vocabulary tokenizer built from an explicit string list plus the
/// JSON structural glyphs. Encoding falls back to one token per character
/// for text outside the constructed vocabulary, mirroring how a real
/// subword tokenizer degrades on out-of-vocabulary input
/// (`examples/other_examples` `pixelspark-poly`'s `Tokenizer`/`TokenId`
/// split).
#[derive(Debug, Clone)]
pub struct MockTokenizer {
    by_id: Vec<String>,
    by_text: HashMap<String, TokenId>,
    eos: Option<TokenId>,
}

const STRUCTURAL_GLYPHS: &[&str] = &["{", "}", "[", "]", "\"", ":", ",", "\\", " ", "\t", "\n", "\r"];

impl MockTokenizer {
    /// Builds a vocabulary from the structural glyphs plus `words`, each
    /// assigned one token id in insertion order. An `<eos>` entry is always
    /// appended last.
    #[must_use]
    pub fn with_vocabulary<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut by_id: Vec<String> = STRUCTURAL_GLYPHS.iter().map(|s| (*s).to_string()).collect();
        by_id.extend(words.into_iter().map(Into::into));
        let eos_id = by_id.len() as TokenId;
        by_id.push("<eos>".to_string());

        let by_text = by_id
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as TokenId))
            .collect();

        Self {
            by_id,
            by_text,
            eos: Some(eos_id),
        }
    }

    /// Convenience constructor covering the schema keys that show up across
    /// the scenario tests in `spec.md` §8, so call sites don't each have to
    /// spell out a vocabulary.
    #[must_use]
    pub fn with_common_keys() -> Self {
        Self::with_vocabulary([
            "name",
            "age",
            "city",
            "country",
            "headquarters",
            "firstName",
            "lastName",
            "emailAddress",
            "John",
            "SF",
            "USA",
            "xyz",
        ])
    }
}

impl TokenizerAdapter for MockTokenizer {
    fn encode(&self, text: &str) -> Vec<TokenId> {
        if text.is_empty() {
            return Vec::new();
        }
        if let Some(&id) = self.by_text.get(text) {
            return vec![id];
        }
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
        self.eos
    }

    fn fingerprint(&self) -> TokenizerFingerprint {
        TokenizerFingerprint::new(format!("mock-v1-{}", self.by_id.len()))
    }

    fn vocab_size(&self) -> Option<usize> {
        Some(self.by_id.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_known_word_as_single_token() {
        let tokenizer = MockTokenizer::with_common_keys();
        let tokens = tokenizer.encode("name");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokenizer.decode(&tokens), "name");
    }

    #[test]
    fn falls_back_to_char_level_for_unknown_text() {
        let tokenizer = MockTokenizer::with_vocabulary(["a", "b"]);
        let tokens = tokenizer.encode("ab");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokenizer.decode(&tokens), "ab");
    }
}
