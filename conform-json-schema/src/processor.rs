//! The key-detection logit processor (`spec.md` §4.5): wraps the state
//! machine, context tracker, and trie; applies mask hints to logits and
//! advances on every sampled token.

use std::sync::Arc;

use conform_core::{JsonStateMachine, ObjectPhase, Phase, SchemaNode, SpecialTokens, TokenId, TokenTrie, TriePath};
use tracing::trace;

use crate::context::ContextTracker;
use crate::error::{self, GenerationError};
use crate::mask::{mask_hint, MaskHint};

fn in_key_body(phase: &Phase) -> bool {
    matches!(
        phase,
        Phase::InString(conform_core::StringPhase::Body {
            kind: conform_core::StringKind::Key,
            ..
        })
    )
}

/// A key observed in the decoded stream (`SPEC_FULL.md` §3 `DetectedKey`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedKey {
    pub name: String,
    pub token_count: usize,
}

/// Wraps the state machine, context tracker, and a per-context token trie,
/// applying mask hints and advancing on sampled tokens (`spec.md` §4.5).
pub struct KeyDetectionProcessor<'schema> {
    state: JsonStateMachine,
    tracker: ContextTracker<'schema>,
    special: Arc<SpecialTokens>,
    include_whitespace: bool,
    trie: Option<Arc<TokenTrie>>,
    trie_path: Option<TriePath>,
    detected_keys: Vec<DetectedKey>,
    current_key_tokens: usize,
    error: Option<GenerationError>,
    fatal: bool,
    position: usize,
}

impl<'schema> KeyDetectionProcessor<'schema> {
    #[must_use]
    pub fn new(root: &'schema SchemaNode, special: Arc<SpecialTokens>, include_whitespace: bool) -> Self {
        Self {
            state: JsonStateMachine::new(),
            tracker: ContextTracker::new(root),
            special,
            include_whitespace,
            trie: None,
            trie_path: None,
            detected_keys: Vec::new(),
            current_key_tokens: 0,
            error: None,
            fatal: false,
            position: 0,
        }
    }

    /// Resets the state machine and tracker for a new generation
    /// (`spec.md` §4.5 item 1). `onPrompt` takes the prompt's tokens only
    /// to mirror the spec's signature; the processor has no use for their
    /// content since the grammar only begins once the model's own output
    /// starts.
    pub fn on_prompt(&mut self, _prompt_tokens: &[TokenId]) {
        self.state.reset();
        self.detected_keys.clear();
        self.error = None;
        self.fatal = false;
        self.position = 0;
        self.current_key_tokens = 0;
        self.trie = None;
        self.trie_path = None;
    }

    /// Installs a freshly-built trie for the object keys currently in
    /// scope. Called by the orchestrator whenever the tracker descends into
    /// a new object (`spec.md` §4.5 item 3: "when the state machine ...
    /// opens an array/object, push/pop the context").
    pub fn set_trie(&mut self, trie: Option<Arc<TokenTrie>>) {
        self.trie_path = trie.as_ref().map(|t| t.root_path());
        self.trie = trie;
    }

    #[must_use]
    pub fn context(&self) -> &ContextTracker<'schema> {
        &self.tracker
    }

    /// Computes the current mask hint and marks fatal errors (`spec.md`
    /// §4.5 item 2). When the state machine has failed, only EOS is
    /// permitted so the sampler terminates instead of thrashing.
    pub fn process(&mut self) -> Option<MaskHint> {
        if self.state.is_error() {
            if !self.fatal {
                self.fatal = true;
                self.error = Some(error::NoValidTokensCtx {
                    partial_key: self.state.current_key().to_string(),
                    position: self.position,
                }.build());
            }
            return Some(MaskHint {
                allow: ahash::AHashSet::new(),
                mode: crate::mask::MaskMode::Hard,
            });
        }
        let hint = mask_hint(
            self.state.phase(),
            self.trie.as_deref(),
            self.trie_path.as_ref(),
            &self.special,
            self.include_whitespace,
        );
        trace!(phase = ?self.state.phase(), has_hint = hint.is_some(), "computed mask hint");
        hint
    }

    /// Feeds a sampled token's decoded text into the state machine,
    /// advances the trie, and updates the context tracker (`spec.md` §4.5
    /// item 3).
    pub fn did_sample(&mut self, token: TokenId, decoded: &str) {
        self.position += 1;

        let was_in_key_body = in_key_body(self.state.phase());

        self.state.feed(decoded);

        let still_in_key_body = in_key_body(self.state.phase());

        if was_in_key_body && still_in_key_body {
            // Genuine key content: this token's characters stayed inside
            // the key string, so it must be a step down the trie.
            self.current_key_tokens += 1;
            if let (Some(trie), Some(path)) = (self.trie.as_ref(), self.trie_path.as_ref()) {
                if let Ok(next) = trie.append(path, token) {
                    self.trie_path = Some(next);
                } else if !self.fatal {
                    self.fatal = true;
                    self.error = Some(
                        error::InvalidTokenSelectedCtx {
                            token,
                            partial_key: self.state.current_key().to_string(),
                            expected: trie.allowed_next(path).0,
                        }
                        .build(),
                    );
                }
            }
        } else if was_in_key_body && matches!(self.state.phase(), Phase::InObject(ObjectPhase::ExpectColon)) {
            // The closing quote: record the completed key.
            let key = self.state.current_key().to_string();
            self.detected_keys.push(DetectedKey {
                name: key.clone(),
                token_count: self.current_key_tokens,
            });
            self.tracker.observed_key(&key);
            self.current_key_tokens = 0;
        }

        if decoded.contains('{') {
            self.tracker.enter_object();
        } else if decoded.contains('}') {
            self.tracker.exit_container();
        } else if decoded.contains('[') {
            self.tracker.enter_array();
        } else if decoded.contains(']') {
            self.tracker.exit_container();
        }

        if self.state.is_error() && !self.fatal {
            self.fatal = true;
            self.error = Some(
                error::NoValidTokensCtx {
                    partial_key: self.state.current_key().to_string(),
                    position: self.position,
                }
                .build(),
            );
        }
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    #[must_use]
    pub fn has_fatal_error(&self) -> bool {
        self.fatal
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.fatal = false;
    }

    #[must_use]
    pub fn take_error(&mut self) -> Option<GenerationError> {
        self.error.take()
    }

    #[must_use]
    pub fn all_detected_keys(&self) -> &[DetectedKey] {
        &self.detected_keys
    }

    #[must_use]
    pub fn state(&self) -> &JsonStateMachine {
        &self.state
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }
}
