//! Core grammar engine for constrained JSON decoding.
//!
//! This crate has no notion of a model, a request, or a retry policy — it is
//! the reusable, dependency-free-of-async engine that [`conform-json-schema`]
//! wires up into a full decoding supervisor: an RFC 8259 pushdown state
//! machine ([`state_machine`]), an immutable schema model
//! ([`schema`]), a token trie over schema-permitted keys ([`trie`]), and the
//! special-token index that bridges a tokenizer's vocabulary to the JSON
//! grammar's structural glyphs ([`special_tokens`]).

#![cfg_attr(all(doc, CHANNEL_NIGHTLY), feature(doc_auto_cfg))]
#![cfg_attr(doc_cfg, feature(doc_cfg))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod cache;
pub mod error;
pub mod schema;
pub mod special_tokens;
pub mod state_machine;
pub mod token;
pub mod trie;

pub use error::{CoreError, SchemaBuildError, TrieError};
pub use schema::{Kind, SchemaNode};
pub use special_tokens::{Role, SpecialTokens};
pub use state_machine::{
    is_json_whitespace, ArrayPhase, ContainerFrame, JsonStateMachine, ObjectPhase, Phase,
    StringKind, StringPhase,
};
pub use token::{TokenId, TokenizerAdapter, TokenizerFingerprint};
pub use trie::{TokenTrie, TriePath};

#[cfg(test)]
pub(crate) mod test;
