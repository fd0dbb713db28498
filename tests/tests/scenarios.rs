//! End-to-end scenario tests driven entirely through the `conform` facade,
//! one per example in `spec.md` §8 (E1-E7).

use std::sync::Arc;

use conform::{
    mask::MaskMode, snap_key, supervisor, validate, ContextTracker, KeyDetectionProcessor, Role,
    SchemaNode, SpecialTokens, TokenizerAdapter,
};
use tests::{first_last_schema, headquarters_schema, name_age_schema, tokenizer};

fn feed_object(processor: &mut KeyDetectionProcessor<'_>, tok: &dyn TokenizerAdapter, pieces: &[&str]) {
    for piece in pieces {
        let id = tok.encode(piece).first().copied().unwrap_or(9999);
        processor.did_sample(id, piece);
    }
}

fn object_processor<'s>(schema: &'s SchemaNode, tok: &dyn TokenizerAdapter) -> KeyDetectionProcessor<'s> {
    let special = Arc::new(SpecialTokens::build(tok));
    let mut processor = KeyDetectionProcessor::new(schema, special, true);
    processor.on_prompt(&[]);
    let keys = schema.object_keys();
    let root_trie = conform::trie::build_cached(&keys, tok);
    processor.set_trie(Some(root_trie));
    processor
}

#[test]
fn e1_simple_object() {
    let schema = name_age_schema();
    let tok = tokenizer(&["name", "age", "John"]);
    let mut processor = object_processor(&schema, &tok);
    feed_object(
        &mut processor,
        &tok,
        &["{", "\"", "name", "\"", ":", "\"", "John", "\"", ",", "\"", "age", "\"", ":", "30", "}"],
    );

    assert!(processor.state().is_done());
    assert!(!processor.has_fatal_error());
    let keys: Vec<&str> = processor.all_detected_keys().iter().map(|k| k.name.as_str()).collect();
    assert_eq!(keys, vec!["name", "age"]);

    let value: serde_json::Value = serde_json::from_str(r#"{"name":"John","age":30}"#).unwrap();
    assert!(validate(&value, &schema).is_empty());
}

#[test]
fn e2_missing_required_key() {
    let schema = name_age_schema();
    let tok = tokenizer(&["age"]);
    let mut processor = object_processor(&schema, &tok);
    feed_object(&mut processor, &tok, &["{", "\"", "age", "\"", ":", "30", "}"]);

    assert!(processor.state().is_done());
    let value: serde_json::Value = serde_json::from_str(r#"{"age":30}"#).unwrap();
    assert!(!validate(&value, &schema).is_empty());
}

#[test]
fn e3_nested_context() {
    let schema = headquarters_schema();
    let mut tracker = ContextTracker::new(&schema);
    tracker.observed_key("headquarters");
    tracker.enter_object();
    assert_eq!(tracker.current_schema().object_keys(), vec!["city", "country"]);
    tracker.exit_container();
    assert!(tracker.current_schema().object_keys().is_empty());
}

#[test]
fn e4_mask_enforces_colon() {
    let schema = name_age_schema();
    let tok = tokenizer(&["name", "age"]);
    let mut processor = object_processor(&schema, &tok);
    feed_object(&mut processor, &tok, &["{", "\"", "name", "\""]);

    let special = SpecialTokens::build(&tok);
    let hint = processor.process().expect("colon position is always constrained");
    assert_eq!(hint.mode, MaskMode::Hard);
    let mut expected = special.ids_for(Role::Colon).clone();
    expected.extend(special.ids_for(Role::Whitespace));
    assert_eq!(hint.allow, expected);
}

#[test]
fn e5_extractor_strips_analysis_prefix() {
    let mut extractor = conform::JsonExtractor::new(conform::RunPolicy::FirstOnly);
    let input = "<|channel|>analysis<|message|>thinking...\n{\"x\":1}<|end|>";
    let out = extractor.filter(input.as_bytes());
    assert_eq!(String::from_utf8(out).unwrap(), r#"{"x":1}"#);
}

#[tokio::test]
async fn e6_aborts_on_invalid_key() {
    let schema = first_last_schema();
    let tok = tokenizer(&["firstName", "lastName", "xyz"]);
    let processor = object_processor(&schema, &tok);

    let pieces: Vec<_> = ["{", "\"", "xyz"]
        .iter()
        .map(|p| (tok.encode(p).first().copied().unwrap_or(9999), (*p).to_string()))
        .collect();
    let upstream = futures::stream::iter(pieces);
    let extractor = conform::JsonExtractor::new(conform::RunPolicy::FirstOnly);

    use futures::StreamExt;
    let results: Vec<_> = supervisor::run(upstream, processor, extractor, 30_000, supervisor::CancelToken::new())
        .collect()
        .await;
    assert!(matches!(
        results.last(),
        Some(Err(conform::GenerationError::AbortedDueToError { position: 3 }))
    ));
}

#[test]
fn e7_snap_key() {
    let schema = {
        let (root, _) = conform::schema::build(&serde_json::json!({
            "type": "object",
            "properties": {
                "firstName": {"type": "string"},
                "lastName": {"type": "string"},
                "emailAddress": {"type": "string"}
            }
        }));
        root
    };
    assert_eq!(snap_key("first_name", &schema), Some("firstName".to_string()));
    assert_eq!(snap_key("emial", &schema), None);
    assert_eq!(snap_key("email", &schema), Some("emailAddress".to_string()));
}
