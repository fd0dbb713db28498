//! A byte-level filter that isolates JSON runs inside mixed narrative/JSON
//! model output (`spec.md` §4.6): markdown fences, channel sentinels, and
//! XML-like tags never contain unescaped `{`/`[`/`"`, so tracking balanced
//! containers and string escapes is sufficient to suppress them without any
//! fence- or sentinel-specific parsing.

/// Whether the extractor stops after the first complete JSON run or keeps
/// flipping between narrative and JSON for every run it finds (`spec.md`
/// §4.6: "the extractor may be configured to emit all runs or only the
/// first").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPolicy {
    FirstOnly,
    AllRuns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Narrative,
    /// Inside a JSON run. `in_string` and `escape` track a string value
    /// anywhere in the run (top-level or nested); `brace_depth` and
    /// `bracket_depth` track container nesting outside of strings.
    InJson,
}

/// Streaming narrative/JSON flip-flop filter (`spec.md` §4.6).
#[derive(Debug, Clone)]
pub struct JsonExtractor {
    phase: Phase,
    brace_depth: u32,
    bracket_depth: u32,
    in_string: bool,
    escape: bool,
    /// Accumulates ASCII letters since the last non-letter boundary, used
    /// only to recognize a bare top-level `true`/`false`/`null` literal
    /// (`spec.md` §4.6: "a bare literal ... is also accepted"). Discarded,
    /// never emitted, the moment it stops being a prefix of any literal.
    /// Note: because `should_emit` decides byte-by-byte with no
    /// retroactive replay, a confirmed bare literal only flips
    /// [`Self::json_found`] — its bytes were already withheld as narrative
    /// and are not re-emitted. Bare top-level strings don't share this gap;
    /// the opening quote itself is the unambiguous signal.
    literal_candidate: String,
    policy: RunPolicy,
    json_found: bool,
    at_word_boundary: bool,
}

const LITERALS: &[&str] = &["true", "false", "null"];

impl JsonExtractor {
    #[must_use]
    pub fn new(policy: RunPolicy) -> Self {
        Self {
            phase: Phase::Narrative,
            brace_depth: 0,
            bracket_depth: 0,
            in_string: false,
            escape: false,
            literal_candidate: String::new(),
            policy,
            json_found: false,
            at_word_boundary: true,
        }
    }

    #[must_use]
    pub fn json_found(&self) -> bool {
        self.json_found
    }

    fn done_with_first_run(&self) -> bool {
        self.policy == RunPolicy::FirstOnly && self.json_found
    }

    /// Feeds one byte; returns `true` if it should be emitted downstream.
    pub fn should_emit(&mut self, byte: u8) -> bool {
        match self.phase {
            Phase::Narrative => self.step_narrative(byte),
            Phase::InJson => self.step_in_json(byte),
        }
    }

    /// Feeds a whole chunk, returning only the bytes to emit.
    #[must_use]
    pub fn filter(&mut self, bytes: &[u8]) -> Vec<u8> {
        bytes.iter().copied().filter(|&b| self.should_emit(b)).collect()
    }

    fn step_narrative(&mut self, byte: u8) -> bool {
        if self.done_with_first_run() {
            return false;
        }
        match byte {
            b'{' => {
                self.literal_candidate.clear();
                self.enter_json();
                self.brace_depth = 1;
                true
            }
            b'[' => {
                self.literal_candidate.clear();
                self.enter_json();
                self.bracket_depth = 1;
                true
            }
            b'"' if self.at_word_boundary => {
                self.literal_candidate.clear();
                self.enter_json();
                self.in_string = true;
                true
            }
            c if c.is_ascii_alphabetic() => {
                if self.at_word_boundary || !self.literal_candidate.is_empty() {
                    self.literal_candidate.push(c as char);
                    if !LITERALS.iter().any(|l| l.starts_with(&self.literal_candidate)) {
                        self.literal_candidate.clear();
                    }
                }
                self.at_word_boundary = false;
                false
            }
            _ => {
                if LITERALS.contains(&self.literal_candidate.as_str()) {
                    // The word just ended on a non-letter byte: the buffered
                    // literal is a complete bare top-level value.
                    self.json_found = true;
                }
                self.literal_candidate.clear();
                self.at_word_boundary = true;
                false
            }
        }
    }

    fn enter_json(&mut self) {
        self.phase = Phase::InJson;
        self.brace_depth = 0;
        self.bracket_depth = 0;
        self.in_string = false;
        self.escape = false;
    }

    fn step_in_json(&mut self, byte: u8) -> bool {
        if self.in_string {
            if self.escape {
                self.escape = false;
            } else if byte == b'\\' {
                self.escape = true;
            } else if byte == b'"' {
                self.in_string = false;
                if self.brace_depth == 0 && self.bracket_depth == 0 {
                    self.close_run();
                }
            }
            return true;
        }
        match byte {
            b'"' => self.in_string = true,
            b'{' => self.brace_depth += 1,
            b'[' => self.bracket_depth += 1,
            b'}' => {
                self.brace_depth = self.brace_depth.saturating_sub(1);
                if self.brace_depth == 0 && self.bracket_depth == 0 {
                    self.close_run();
                }
            }
            b']' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                if self.brace_depth == 0 && self.bracket_depth == 0 {
                    self.close_run();
                }
            }
            _ => {}
        }
        true
    }

    /// Call once the upstream byte source is exhausted: a bare literal
    /// candidate still pending at end-of-stream (no trailing delimiter byte
    /// ever arrived) is resolved here instead of being silently dropped.
    pub fn finish(&mut self) {
        if LITERALS.contains(&self.literal_candidate.as_str()) {
            self.json_found = true;
        }
        self.literal_candidate.clear();
    }

    fn close_run(&mut self) {
        self.phase = Phase::Narrative;
        self.json_found = true;
        self.at_word_boundary = true;
        self.literal_candidate.clear();
    }
}
