//! Constrained JSON decoding for LLM token generation.
//!
//! This crate is a thin facade: [`conform_core`] supplies the grammar
//! engine (schema model, token trie, JSON pushdown state machine) and
//! [`conform_json_schema`] builds the decoding supervisor on top of it
//! (context tracking, mask-hint generation, key detection, streaming
//! extraction, abortable supervision, structural validation, the snap-key
//! salvage matcher, and the `generate`/`stream` orchestrator). Everything
//! a caller needs is re-exported here so most code only ever writes
//! `use conform::...`.

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

pub use conform_core::{
    is_json_whitespace, schema, special_tokens, state_machine, token, trie, ArrayPhase,
    ContainerFrame, CoreError, JsonStateMachine, Kind, ObjectPhase, Phase, Role, SchemaBuildError,
    SchemaNode, SpecialTokens, StringKind, StringPhase, TokenId, TokenTrie, TokenizerAdapter,
    TokenizerFingerprint, TriePath, TrieError,
};

pub use conform_json_schema::{
    config, context, error, extractor, mask, orchestrator, processor, snap, supervisor, testing,
    validator, CancelToken, ContextTracker, DecodeConfig, DetectedKey, ErrorPosture,
    GenerateResult, GenerationError, JsonExtractor, KeyDetectionProcessor, MaskHint, MaskMode,
    ModelAdapter, RequestParams, ResponseFormat, RunPolicy, SampledToken, ValidationError,
};

pub use conform_json_schema::{generate, snap_key, snap_keys, stream, validate};

#[cfg(test)]
mod test {
    use conform_core::{schema, TokenizerAdapter};
    use serde_json::json;

    use crate::testing::MockTokenizer;

    #[test]
    fn facade_reaches_schema_build_and_mock_tokenizer() {
        let (node, _errors) = schema::build(&json!({
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name"],
        }));
        assert_eq!(node.kind(), schema::Kind::Object);

        let tokenizer = MockTokenizer::with_common_keys();
        assert!(!tokenizer.fingerprint().as_str().is_empty());
    }
}
