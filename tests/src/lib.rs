//! Shared fixtures for the scenario tests in `tests/scenarios.rs`.

use conform::schema::{self, SchemaNode};
use conform::testing::MockTokenizer;
use serde_json::json;

/// `{name: string, age: integer}`, `name` required — the schema used by
/// E1, E2, and E4.
#[must_use]
pub fn name_age_schema() -> SchemaNode {
    schema::build(&json!({
        "type": "object",
        "properties": { "name": {"type": "string"}, "age": {"type": "integer"} },
        "required": ["name"]
    }))
    .0
}

/// `{headquarters: {city, country}}` — the schema used by E3.
#[must_use]
pub fn headquarters_schema() -> SchemaNode {
    schema::build(&json!({
        "type": "object",
        "properties": {
            "headquarters": {
                "type": "object",
                "properties": { "city": {"type": "string"}, "country": {"type": "string"} }
            }
        }
    }))
    .0
}

/// `{firstName, lastName}` — the schema used by E6 and E7.
#[must_use]
pub fn first_last_schema() -> SchemaNode {
    schema::build(&json!({
        "type": "object",
        "properties": { "firstName": {"type": "string"}, "lastName": {"type": "string"} }
    }))
    .0
}

#[must_use]
pub fn tokenizer(words: &[&str]) -> MockTokenizer {
    MockTokenizer::with_vocabulary(words.iter().copied())
}
