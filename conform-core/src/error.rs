//! Errors raised while building schemas, special-token indices, and tries.
//!
//! Validation errors produced while *evaluating* a stream against a schema
//! live in `conform-json-schema::error` instead — this module only covers
//! the construction-time failures the core engine itself can raise.

use thiserror::Error;

use crate::token::TokenId;

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                              SchemaBuildError                         ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// Raised while turning a JSON Schema document into a [`crate::SchemaNode`]
/// tree (`spec.md` §4.1). Per the spec, a malformed subtree doesn't abort
/// the whole build — it collapses to `any` at the call site — so this error
/// is scoped to the single subtree that failed, not the whole document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaBuildError {
    /// `properties` was present but was not a JSON object.
    #[error("`properties` must be an object, found {found}")]
    PropertiesNotAnObject { found: &'static str },

    /// `items` was present but was neither a schema object nor a boolean.
    #[error("`items` must be a schema or boolean, found {found}")]
    ItemsNotASchema { found: &'static str },
}

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                                TrieError                               ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// Raised while advancing a [`crate::TriePath`] or building a
/// [`crate::TokenTrie`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// `append` was called with a token id that has no matching child at
    /// the current node.
    #[error("token {token} is not a valid next token at this trie position")]
    NotAChild { token: TokenId },
}

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                                CoreError                               ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// Umbrella error for `conform-core`. Downstream crates convert into their
/// own error taxonomies at the boundary rather than matching on this
/// directly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error(transparent)]
    SchemaBuild(#[from] SchemaBuildError),

    #[error(transparent)]
    Trie(#[from] TrieError),
}
