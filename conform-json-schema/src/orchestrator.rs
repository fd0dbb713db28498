//! `generate`/`stream` entry points (`spec.md` §4.8): wires up the
//! key-detection processor, mask-hint generator and trie when a schema is
//! present, drives the model to completion, validates the result, and
//! retries with a temperature bump on validation failure.
//!
//! The model itself — the tensor backend and its actual forward pass — is
//! out of scope (`SPEC_FULL.md` Non-goals); callers supply a
//! [`ModelAdapter`] that already applies whatever mask this crate hands it
//! and returns one sampled `(token, decoded text)` pair per step. This
//! mirrors the decoder contract in `spec.md` §6: the orchestrator calls
//! `process` before each step and `didSample` after, never reordered.

use std::sync::Arc;

use async_trait::async_trait;
use conform_core::{Kind, SchemaNode, SpecialTokens, TokenId, TokenizerAdapter};
use futures::stream::Stream;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::DecodeConfig;
use crate::error::{self, GenerationError};
use crate::extractor::{JsonExtractor, RunPolicy};
use crate::mask::MaskHint;
use crate::processor::{DetectedKey, KeyDetectionProcessor};
use crate::snap;
use crate::validator;

/// What the caller asked for the response to look like (`spec.md` §6
/// `responseFormat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    JsonSchema,
}

/// Request parameters (`spec.md` §6), plus [`DecodeConfig`] threaded
/// alongside per `SPEC_FULL.md` §6.
#[derive(Debug, Clone)]
pub struct RequestParams {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: Option<u32>,
    pub seed: Option<u64>,
    pub stop: Vec<String>,
    pub schema: Option<SchemaNode>,
    pub response_format: ResponseFormat,
}

/// A generated, optionally schema-validated result.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub text: String,
    pub value: Option<Value>,
    pub detected_keys: Vec<DetectedKey>,
}

/// The per-step collaborator a host implements: sample one token under an
/// optional mask hint, or return `None` to end generation (EOS, `maxTokens`
/// reached, or a stop sequence matched).
#[async_trait]
pub trait ModelAdapter: Send {
    async fn sample_step(&mut self, mask: Option<&MaskHint>, temperature: f32) -> Option<(TokenId, String)>;
}

/// Caps the retry temperature bump at 1.5 regardless of attempt count
/// (`spec.md` §4.8: "exponential temperature bump (bounded at 1.5)").
fn bumped_temperature(base: f32, attempt: u8) -> f32 {
    (base * 1.2f32.powi(i32::from(attempt))).min(1.5)
}

/// Builds/installs a trie for the keys currently in scope, if the context
/// tracker is sitting on an object schema (`spec.md` §4.5 item 3, §4.3).
fn refresh_trie(processor: &mut KeyDetectionProcessor<'_>, tokenizer: &dyn TokenizerAdapter) {
    let schema = processor.context().current_schema();
    if schema.kind() == Kind::Object {
        let keys: Vec<&str> = schema.object_keys();
        let trie = conform_core::trie::build_cached(&keys, tokenizer);
        processor.set_trie(Some(trie));
    } else {
        processor.set_trie(None);
    }
}

/// Runs one full attempt: resets a fresh processor, drives `model` to
/// completion, and returns the decoded text. Fatal processor errors abort
/// immediately with the sampled-token position (`spec.md` §7: "mid-stream
/// ... become fatal ... terminal").
async fn run_once(
    model: &mut dyn ModelAdapter,
    tokenizer: &dyn TokenizerAdapter,
    schema: &SchemaNode,
    config: &DecodeConfig,
    temperature: f32,
) -> Result<(String, Vec<DetectedKey>), GenerationError> {
    let special = Arc::new(SpecialTokens::build(tokenizer));
    let mut processor = KeyDetectionProcessor::new(schema, special, config.include_whitespace);
    processor.on_prompt(&[]);
    refresh_trie(&mut processor, tokenizer);

    let mut text = String::new();
    loop {
        let mask = processor.process();
        let Some((token, decoded)) = model.sample_step(mask.as_ref(), temperature).await else {
            break;
        };
        processor.did_sample(token, &decoded);

        if processor.has_fatal_error() {
            let position = processor.position();
            let error = processor.take_error().unwrap_or_else(|| error::AbortedDueToErrorCtx { position }.build());
            return Err(error);
        }
        if decoded.contains('{') || decoded.contains('[') || decoded.contains('}') || decoded.contains(']') {
            refresh_trie(&mut processor, tokenizer);
        }

        text.push_str(&decoded);
        if processor.state().is_done() {
            break;
        }
    }

    Ok((text, processor.all_detected_keys().to_vec()))
}

/// Non-streaming entry point (`spec.md` §4.8 `generate`). Retries up to
/// `config.max_retries` additional times on validation failure, bumping
/// temperature each time; a fresh processor is used per attempt.
pub async fn generate(
    model: Option<&mut dyn ModelAdapter>,
    tokenizer: &dyn TokenizerAdapter,
    params: &RequestParams,
    config: &DecodeConfig,
) -> Result<GenerateResult, GenerationError> {
    let model = model.ok_or_else(|| error::NoModelSetCtx.build())?;

    let Some(schema) = params.schema.as_ref() else {
        let mut text = String::new();
        while let Some((_, decoded)) = model.sample_step(None, params.temperature).await {
            text.push_str(&decoded);
        }
        return Ok(GenerateResult {
            text,
            value: None,
            detected_keys: Vec::new(),
        });
    };

    let mut attempt = 0u8;
    loop {
        let temperature = bumped_temperature(params.temperature, attempt);
        let (text, detected_keys) = run_once(model, tokenizer, schema, config, temperature).await?;

        let parsed: Result<Value, _> = serde_json::from_str(&text);
        let validation_errors = match &parsed {
            Ok(value) => validator::validate(value, schema),
            Err(_) => vec![validator::ValidationError::WrongKind {
                path: "$".to_string(),
                expected: schema.kind(),
                found: "unparseable",
            }],
        };

        if validation_errors.is_empty() {
            return Ok(GenerateResult {
                text,
                value: parsed.ok(),
                detected_keys,
            });
        }

        if attempt >= config.max_retries {
            warn!(attempt, "exhausted retries without a valid document");
            return Err(error::MaxRetriesExceededCtx {
                max_retries: config.max_retries,
            }
            .build());
        }
        info!(attempt, ?validation_errors, "validation failed, retrying with bumped temperature");
        attempt += 1;
    }
}

/// Streaming entry point (`spec.md` §4.8 `stream`). Yields extracted JSON
/// text chunks as they're produced; does not retry (retries replay the
/// whole generation, which the streaming contract can't do after bytes have
/// already reached the consumer).
pub fn stream<'a>(
    model: &'a mut dyn ModelAdapter,
    tokenizer: &'a dyn TokenizerAdapter,
    params: &'a RequestParams,
    config: &'a DecodeConfig,
) -> impl Stream<Item = Result<String, GenerationError>> + 'a {
    futures::stream::once(async move {
        let Some(schema) = params.schema.as_ref() else {
            let mut chunks = Vec::new();
            while let Some((_, decoded)) = model.sample_step(None, params.temperature).await {
                chunks.push(Ok(decoded));
            }
            return chunks;
        };

        let special = Arc::new(SpecialTokens::build(tokenizer));
        let mut processor = KeyDetectionProcessor::new(schema, special, config.include_whitespace);
        processor.on_prompt(&[]);
        refresh_trie(&mut processor, tokenizer);
        let mut extractor = JsonExtractor::new(RunPolicy::FirstOnly);

        let mut chunks = Vec::new();
        let mut emitted_bytes = 0usize;
        loop {
            let mask = processor.process();
            let Some((token, decoded)) = model.sample_step(mask.as_ref(), params.temperature).await else {
                break;
            };
            processor.did_sample(token, &decoded);

            if processor.has_fatal_error() {
                let position = processor.position();
                chunks.push(Err(error::AbortedDueToErrorCtx { position }.build()));
                return chunks;
            }
            if decoded.contains('{') || decoded.contains('[') || decoded.contains('}') || decoded.contains(']') {
                refresh_trie(&mut processor, tokenizer);
            }

            let emitted: Vec<u8> = decoded.bytes().filter(|&b| extractor.should_emit(b)).collect();
            if !emitted.is_empty() {
                emitted_bytes += emitted.len();
                if emitted_bytes > config.buffer_cap_bytes {
                    chunks.push(Err(error::BufferLimitExceededCtx {
                        limit: config.buffer_cap_bytes,
                    }
                    .build()));
                    return chunks;
                }
                chunks.push(Ok(String::from_utf8(emitted).expect("extractor preserves UTF-8 boundaries")));
            }

            if processor.state().is_done() {
                break;
            }
        }
        extractor.finish();
        chunks
    })
    .flat_map(futures::stream::iter)
}

/// Applies the snap-key salvage pass to a parsed-but-not-validating object,
/// renaming keys within edit distance 1 of a declared property name
/// (`spec.md` §4.9: "used as a salvage step, not as primary acceptance").
#[must_use]
pub fn snap_keys(value: Value, schema: &SchemaNode) -> Value {
    let Value::Object(map) = value else {
        return value;
    };
    let mut snapped = serde_json::Map::with_capacity(map.len());
    for (key, child) in map {
        let final_key = if schema.property(&key).is_some() {
            key
        } else {
            snap::snap_key(&key, schema).unwrap_or(key)
        };
        snapped.insert(final_key, child);
    }
    Value::Object(snapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTokenizer;
    use conform_core::schema;
    use serde_json::json;

    struct ScriptedModel {
        steps: std::vec::IntoIter<(TokenId, String)>,
    }

    impl ScriptedModel {
        fn new(tokenizer: &MockTokenizer, pieces: &[&str]) -> Self {
            let steps = pieces
                .iter()
                .map(|p| (tokenizer.encode(p).first().copied().unwrap_or(9999), (*p).to_string()))
                .collect::<Vec<_>>()
                .into_iter();
            Self { steps }
        }
    }

    #[async_trait]
    impl ModelAdapter for ScriptedModel {
        async fn sample_step(&mut self, _mask: Option<&MaskHint>, _temperature: f32) -> Option<(TokenId, String)> {
            self.steps.next()
        }
    }

    fn base_params(schema: Option<SchemaNode>) -> RequestParams {
        RequestParams {
            prompt: String::new(),
            max_tokens: 64,
            temperature: 0.7,
            top_p: 1.0,
            top_k: None,
            seed: None,
            stop: Vec::new(),
            schema,
            response_format: ResponseFormat::JsonSchema,
        }
    }

    #[tokio::test]
    async fn generate_validates_a_well_formed_object() {
        let (schema, _) = schema::build(&json!({
            "type": "object",
            "properties": { "name": {"type": "string"}, "age": {"type": "integer"} },
            "required": ["name"]
        }));
        let tokenizer = MockTokenizer::with_vocabulary(["name", "age", "John"]);
        let mut model = ScriptedModel::new(
            &tokenizer,
            &["{", "\"", "name", "\"", ":", "\"", "John", "\"", ",", "\"", "age", "\"", ":", "30", "}"],
        );
        let params = base_params(Some(schema));
        let config = DecodeConfig::default();

        let result = generate(Some(&mut model), &tokenizer, &params, &config).await.unwrap();
        assert_eq!(result.value.unwrap(), json!({"name": "John", "age": 30}));
        assert_eq!(
            result.detected_keys.iter().map(|k| k.name.as_str()).collect::<Vec<_>>(),
            vec!["name", "age"]
        );
    }

    #[tokio::test]
    async fn generate_without_model_fails_immediately() {
        let params = base_params(None);
        let config = DecodeConfig::default();
        let tokenizer = MockTokenizer::with_vocabulary(["a"]);
        let err = generate(None, &tokenizer, &params, &config).await.unwrap_err();
        assert!(matches!(err, GenerationError::NoModelSet));
    }

    #[tokio::test]
    async fn generate_reports_max_retries_exceeded_on_persistent_violation() {
        let (schema, _) = schema::build(&json!({
            "type": "object",
            "properties": { "name": {"type": "string"} },
            "required": ["name"]
        }));
        let tokenizer = MockTokenizer::with_vocabulary(["age"]);
        // Never produces the required "name" key, every attempt fails validation.
        let mut model = ScriptedModel::new(&tokenizer, &["{", "}"]);
        let params = base_params(Some(schema));
        let mut config = DecodeConfig::default();
        config.max_retries = 1;

        let err = generate(Some(&mut model), &tokenizer, &params, &config).await.unwrap_err();
        assert!(matches!(err, GenerationError::MaxRetriesExceeded { max_retries: 1 }));
    }

    #[test]
    fn snap_keys_fixes_a_single_edit_distance_one_key() {
        let (schema, _) = schema::build(&json!({
            "type": "object",
            "properties": { "firstName": {"type": "string"} }
        }));
        let value = json!({"first_name": "John"});
        let snapped = snap_keys(value, &schema);
        assert_eq!(snapped, json!({"firstName": "John"}));
    }
}
