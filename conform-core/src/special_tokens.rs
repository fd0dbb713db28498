//! Maps JSON structural glyphs to the tokenizer ids that decode to them
//! exactly (`spec.md` §2 item 3, §3, §4.11).

use std::collections::HashMap;
use std::sync::Arc;

use ahash::AHashSet;
use once_cell::sync::Lazy;
use strum::IntoEnumIterator;

use crate::cache::Cache;
use crate::token::{TokenId, TokenizerAdapter, TokenizerFingerprint};

/// A structural role a tokenizer id can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum Role {
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Quote,
    Colon,
    Comma,
    Backslash,
    Whitespace,
}

impl Role {
    fn glyph(self) -> Option<&'static str> {
        match self {
            Role::OpenBrace => Some("{"),
            Role::CloseBrace => Some("}"),
            Role::OpenBracket => Some("["),
            Role::CloseBracket => Some("]"),
            Role::Quote => Some("\""),
            Role::Colon => Some(":"),
            Role::Comma => Some(","),
            Role::Backslash => Some("\\"),
            Role::Whitespace => None, // multiple candidate glyphs, see below
        }
    }
}

const WHITESPACE_GLYPHS: &[&str] = &[" ", "\t", "\n", "\r"];

/// Disjoint-by-construction mapping from structural role to the set of
/// tokenizer ids whose decoded text is exactly that role's glyph
/// (`spec.md` §3 `SpecialTokens` invariant).
#[derive(Debug, Clone, Default)]
pub struct SpecialTokens {
    roles: HashMap<Role, AHashSet<TokenId>>,
}

impl SpecialTokens {
    #[must_use]
    pub fn ids_for(&self, role: Role) -> &AHashSet<TokenId> {
        static EMPTY: once_cell::sync::Lazy<AHashSet<TokenId>> =
            once_cell::sync::Lazy::new(AHashSet::new);
        self.roles.get(&role).unwrap_or(&EMPTY)
    }

    /// Union of the ids for every role in `roles`.
    #[must_use]
    pub fn union_of(&self, roles: &[Role]) -> AHashSet<TokenId> {
        let mut out = AHashSet::new();
        for role in roles {
            out.extend(self.ids_for(*role).iter().copied());
        }
        out
    }

    /// Builds the index by probing every candidate glyph against the
    /// tokenizer and keeping only the single-token, exact-decode matches.
    ///
    /// Mirrors the per-glyph token-identification approach in
    /// `JsonToken::token_id` (`examples/other_examples/pixelspark-poly`),
    /// generalized from "one id per glyph" to "a set of ids per role" since
    /// some tokenizers encode the same glyph multiple ways (e.g. a
    /// leading-space variant).
    #[must_use]
    pub fn build(tokenizer: &dyn TokenizerAdapter) -> Self {
        let mut roles: HashMap<Role, AHashSet<TokenId>> = HashMap::new();

        for role in Role::iter() {
            let Some(glyph) = role.glyph() else {
                continue; // Whitespace has several candidate glyphs, handled below.
            };
            roles.insert(role, ids_decoding_to(tokenizer, glyph));
        }

        let mut whitespace = AHashSet::new();
        for glyph in WHITESPACE_GLYPHS {
            whitespace.extend(ids_decoding_to(tokenizer, glyph));
        }
        roles.insert(Role::Whitespace, whitespace);

        Self { roles }
    }
}

static SPECIAL_TOKENS_CACHE: Lazy<Cache<TokenizerFingerprint, SpecialTokens>> =
    Lazy::new(Cache::new);

/// Builds (or returns a cached) [`SpecialTokens`] index for `tokenizer`,
/// computed once per vocabulary fingerprint (`spec.md` §2 item 3).
#[must_use]
pub fn build_cached(tokenizer: &dyn TokenizerAdapter) -> Arc<SpecialTokens> {
    let fingerprint = tokenizer.fingerprint();
    SPECIAL_TOKENS_CACHE.get_or_insert_with(fingerprint, || SpecialTokens::build(tokenizer))
}

/// Clears the process-wide special-token cache (administrative use only).
pub fn clear_cache() {
    SPECIAL_TOKENS_CACHE.clear();
}

fn ids_decoding_to(tokenizer: &dyn TokenizerAdapter, glyph: &str) -> AHashSet<TokenId> {
    let mut ids = AHashSet::new();
    let vocab_size = tokenizer.vocab_size();
    if let Some(vocab_size) = vocab_size {
        for id in 0..vocab_size as TokenId {
            if tokenizer.decode(&[id]) == glyph {
                ids.insert(id);
            }
        }
        return ids;
    }
    // No known vocab size: fall back to round-tripping the glyph itself,
    // accepting only single-token encodings whose decode matches exactly.
    let encoded = tokenizer.encode(glyph);
    if encoded.len() == 1 && tokenizer.decode(&encoded) == glyph {
        ids.insert(encoded[0]);
    }
    ids
}
