//! A deterministic pushdown automaton over Unicode scalar values that tracks
//! progress through an RFC 8259 JSON grammar (`spec.md` §4.2).
//!
//! The machine is side-effect-free per character and restartable via
//! [`JsonStateMachine::reset`]. It does not allocate beyond the container
//! stack and the in-progress key buffer, and it never panics on malformed
//! input — malformed input is represented by transitioning to
//! [`Phase::Error`], which absorbs all further characters.

/// What the machine is enclosed by at the top of its container stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerFrame {
    Object,
    Array,
    String(StringKind),
}

/// Whether an in-progress string is a key or a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    Key,
    Value,
}

/// Sub-phase while inside an object (`spec.md` §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectPhase {
    ExpectKeyFirstQuote,
    ExpectKeyOrEnd,
    ExpectColon,
    ExpectValue,
    ExpectCommaOrEnd,
}

/// Sub-phase while inside an array (`spec.md` §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayPhase {
    ExpectValueOrEnd,
    ExpectCommaOrEnd,
}

/// Sub-phase while inside a string body or a `\uXXXX` escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringPhase {
    Body { kind: StringKind, escaped: bool },
    UnicodeEscape { kind: StringKind, remaining: u8 },
}

/// Sub-phase while scanning a number literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberSub {
    IntZero,
    IntNonZero,
    Frac,
    Exp,
    ExpSign,
    ExpDigits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NumberPhase {
    sub: NumberSub,
    /// Digits consumed since entering the current `sub` phase. Used only to
    /// decide terminability (e.g. `frac` needs at least one digit before a
    /// value is considered complete); it is bookkeeping, not part of the
    /// spec's named sub-phase set.
    digits_in_sub: u32,
}

/// Which fixed literal (`true`/`false`/`null`) is being scanned, and how far
/// into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralPhase {
    True(u8),
    False(u8),
    Null(u8),
}

/// Where the machine is in the grammar (`spec.md` §3, §4.2).
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Root,
    InObject(ObjectPhase),
    InArray(ArrayPhase),
    InString(StringPhase),
    InNumber(NumberSub),
    InLiteral(LiteralPhase),
    Done,
    Error,
}

/// The JSON grammar pushdown automaton (`spec.md` §3, §4.2).
#[derive(Debug, Clone)]
pub struct JsonStateMachine {
    phase: Phase,
    stack: Vec<ContainerFrame>,
    current_key: String,
    number: Option<NumberPhase>,
    unicode_escape_buf: String,
}

impl Default for JsonStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Root,
            stack: Vec::new(),
            current_key: String::new(),
            number: None,
            unicode_escape_buf: String::new(),
        }
    }

    /// Resets the machine to the exact root state (`spec.md` invariant 5).
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn stack(&self) -> &[ContainerFrame] {
        &self.stack
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.phase, Phase::Error)
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    /// The key currently accumulating (or just closed) while the head of
    /// the stack is `string(key)` or immediately after closing one.
    /// Meaningless (and left stale) outside that window.
    #[must_use]
    pub fn current_key(&self) -> &str {
        &self.current_key
    }

    /// Feeds one Unicode scalar value into the automaton.
    pub fn step(&mut self, ch: char) {
        if self.is_error() || self.is_done() {
            if self.is_done() && !is_json_whitespace(ch) {
                // Trailing non-whitespace after a complete root value: not
                // part of this grammar's single-value acceptance.
                self.phase = Phase::Error;
            }
            return;
        }
        match self.phase.clone() {
            Phase::Root => self.step_value_position(ch, true),
            Phase::InObject(sub) => self.step_object(sub, ch),
            Phase::InArray(sub) => self.step_array(sub, ch),
            Phase::InString(sub) => self.step_string(sub, ch),
            Phase::InNumber(_) => self.step_number(ch),
            Phase::InLiteral(sub) => self.step_literal(sub, ch),
            Phase::Done | Phase::Error => unreachable!("handled above"),
        }
    }

    /// Feeds an entire string, in order, via [`Self::step`].
    pub fn feed(&mut self, text: &str) {
        for ch in text.chars() {
            self.step(ch);
        }
    }

    fn fail(&mut self) {
        self.phase = Phase::Error;
    }

    /// Handles a character where the grammar expects the start of a value.
    /// `is_root` distinguishes the zero-container root position (needed
    /// only to decide what "stack empty" means after the value completes).
    fn step_value_position(&mut self, ch: char, _is_root: bool) {
        match ch {
            '{' => {
                self.stack.push(ContainerFrame::Object);
                self.phase = Phase::InObject(ObjectPhase::ExpectKeyFirstQuote);
            }
            '[' => {
                self.stack.push(ContainerFrame::Array);
                self.phase = Phase::InArray(ArrayPhase::ExpectValueOrEnd);
            }
            '"' => {
                self.begin_string(StringKind::Value);
            }
            '-' => {
                // No digit consumed yet; `digits_in_sub == 0` here means
                // "awaiting the mandatory first digit", not "terminable".
                self.number = Some(NumberPhase {
                    sub: NumberSub::IntNonZero,
                    digits_in_sub: 0,
                });
                self.phase = Phase::InNumber(NumberSub::IntNonZero);
            }
            '0' => {
                self.number = Some(NumberPhase {
                    sub: NumberSub::IntZero,
                    digits_in_sub: 1,
                });
                self.phase = Phase::InNumber(NumberSub::IntZero);
            }
            '1'..='9' => {
                self.number = Some(NumberPhase {
                    sub: NumberSub::IntNonZero,
                    digits_in_sub: 1,
                });
                self.phase = Phase::InNumber(NumberSub::IntNonZero);
            }
            't' => self.phase = Phase::InLiteral(LiteralPhase::True(1)),
            'f' => self.phase = Phase::InLiteral(LiteralPhase::False(1)),
            'n' => self.phase = Phase::InLiteral(LiteralPhase::Null(1)),
            c if is_json_whitespace(c) => {}
            _ => self.fail(),
        }
    }

    fn begin_string(&mut self, kind: StringKind) {
        self.stack.push(ContainerFrame::String(kind));
        if matches!(kind, StringKind::Key) {
            self.current_key.clear();
        }
        self.phase = Phase::InString(StringPhase::Body {
            kind,
            escaped: false,
        });
    }

    fn step_object(&mut self, sub: ObjectPhase, ch: char) {
        if is_json_whitespace(ch) {
            return;
        }
        match sub {
            ObjectPhase::ExpectKeyFirstQuote | ObjectPhase::ExpectKeyOrEnd => match ch {
                '"' => self.begin_string(StringKind::Key),
                '}' if matches!(sub, ObjectPhase::ExpectKeyFirstQuote | ObjectPhase::ExpectKeyOrEnd) => {
                    self.pop_container_and_complete();
                }
                _ => self.fail(),
            },
            ObjectPhase::ExpectColon => match ch {
                ':' => self.phase = Phase::InObject(ObjectPhase::ExpectValue),
                _ => self.fail(),
            },
            ObjectPhase::ExpectValue => self.step_value_position(ch, false),
            ObjectPhase::ExpectCommaOrEnd => match ch {
                ',' => self.phase = Phase::InObject(ObjectPhase::ExpectKeyOrEnd),
                '}' => self.pop_container_and_complete(),
                _ => self.fail(),
            },
        }
    }

    fn step_array(&mut self, sub: ArrayPhase, ch: char) {
        if is_json_whitespace(ch) {
            return;
        }
        match sub {
            ArrayPhase::ExpectValueOrEnd => {
                if ch == ']' {
                    self.pop_container_and_complete();
                } else {
                    self.step_value_position(ch, false);
                }
            }
            ArrayPhase::ExpectCommaOrEnd => match ch {
                ',' => self.phase = Phase::InArray(ArrayPhase::ExpectValueOrEnd),
                ']' => self.pop_container_and_complete(),
                _ => self.fail(),
            },
        }
    }

    /// Pops the container (object/array) that just closed and transitions
    /// based on what, if anything, now encloses it (`spec.md` §4.2 pop
    /// policy).
    fn pop_container_and_complete(&mut self) {
        self.stack.pop();
        self.complete_value();
    }

    fn step_string(&mut self, sub: StringPhase, ch: char) {
        match sub {
            StringPhase::Body { kind, escaped } => {
                if escaped {
                    match ch {
                        'u' => {
                            self.unicode_escape_buf.clear();
                            self.phase = Phase::InString(StringPhase::UnicodeEscape {
                                kind,
                                remaining: 4,
                            });
                        }
                        '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => {
                            if matches!(kind, StringKind::Key) {
                                self.current_key.push(unescape_simple(ch));
                            }
                            self.phase = Phase::InString(StringPhase::Body {
                                kind,
                                escaped: false,
                            });
                        }
                        _ => self.fail(),
                    }
                    return;
                }
                match ch {
                    '"' => self.close_string(kind),
                    '\\' => {
                        self.phase = Phase::InString(StringPhase::Body {
                            kind,
                            escaped: true,
                        });
                    }
                    c if (c as u32) < 0x20 => self.fail(),
                    c => {
                        if matches!(kind, StringKind::Key) {
                            self.current_key.push(c);
                        }
                    }
                }
            }
            StringPhase::UnicodeEscape { kind, remaining } => {
                if !ch.is_ascii_hexdigit() {
                    self.fail();
                    return;
                }
                self.unicode_escape_buf.push(ch);
                if remaining > 1 {
                    self.phase = Phase::InString(StringPhase::UnicodeEscape {
                        kind,
                        remaining: remaining - 1,
                    });
                    return;
                }
                if let Ok(code) = u32::from_str_radix(&self.unicode_escape_buf, 16) {
                    if matches!(kind, StringKind::Key) {
                        if let Some(c) = char::from_u32(code) {
                            self.current_key.push(c);
                        }
                    }
                }
                self.phase = Phase::InString(StringPhase::Body {
                    kind,
                    escaped: false,
                });
            }
        }
    }

    fn close_string(&mut self, kind: StringKind) {
        // Pop the string frame we pushed in `begin_string`.
        self.stack.pop();
        match kind {
            StringKind::Key => {
                // `currentKey` was accumulated while the stack head was
                // `string(key)`; it stays meaningful until the value for
                // this key has been fully parsed.
                self.phase = Phase::InObject(ObjectPhase::ExpectColon);
            }
            StringKind::Value => self.complete_value(),
        }
    }

    fn step_number(&mut self, ch: char) {
        let Some(mut number) = self.number else {
            self.fail();
            return;
        };
        let accepted = match number.sub {
            NumberSub::IntZero => match ch {
                '.' => {
                    number.sub = NumberSub::Frac;
                    number.digits_in_sub = 0;
                    true
                }
                'e' | 'E' => {
                    number.sub = NumberSub::Exp;
                    number.digits_in_sub = 0;
                    true
                }
                _ => false,
            },
            NumberSub::IntNonZero => match ch {
                '0' if number.digits_in_sub == 0 => {
                    // A lone leading zero after '-' (e.g. "-0"): no further
                    // digits may follow without a '.' or exponent.
                    number.sub = NumberSub::IntZero;
                    number.digits_in_sub = 1;
                    true
                }
                '0'..='9' => {
                    number.digits_in_sub += 1;
                    true
                }
                '.' if number.digits_in_sub >= 1 => {
                    number.sub = NumberSub::Frac;
                    number.digits_in_sub = 0;
                    true
                }
                'e' | 'E' if number.digits_in_sub >= 1 => {
                    number.sub = NumberSub::Exp;
                    number.digits_in_sub = 0;
                    true
                }
                _ => false,
            },
            NumberSub::Frac => match ch {
                '0'..='9' => {
                    number.digits_in_sub += 1;
                    true
                }
                'e' | 'E' if number.digits_in_sub >= 1 => {
                    number.sub = NumberSub::Exp;
                    number.digits_in_sub = 0;
                    true
                }
                _ => false,
            },
            NumberSub::Exp => match ch {
                '+' | '-' => {
                    number.sub = NumberSub::ExpSign;
                    true
                }
                '0'..='9' => {
                    number.sub = NumberSub::ExpDigits;
                    number.digits_in_sub = 1;
                    true
                }
                _ => false,
            },
            NumberSub::ExpSign => match ch {
                '0'..='9' => {
                    number.sub = NumberSub::ExpDigits;
                    number.digits_in_sub = 1;
                    true
                }
                _ => false,
            },
            NumberSub::ExpDigits => match ch {
                '0'..='9' => {
                    number.digits_in_sub += 1;
                    true
                }
                _ => false,
            },
        };

        if accepted {
            self.number = Some(number);
            self.phase = Phase::InNumber(number.sub);
            return;
        }

        // The terminator is not part of the number; the number must be in
        // a terminable sub-phase, and the terminator is re-processed in
        // whatever context now applies (`spec.md` §4.2: "the terminator is
        // re-processed in the surrounding context").
        if !is_terminable(number.sub, number.digits_in_sub) {
            self.fail();
            return;
        }
        self.number = None;
        self.complete_value();
        self.step(ch);
    }

    fn step_literal(&mut self, sub: LiteralPhase, ch: char) {
        const TRUE: &[char] = &['t', 'r', 'u', 'e'];
        const FALSE: &[char] = &['f', 'a', 'l', 's', 'e'];
        const NULL: &[char] = &['n', 'u', 'l', 'l'];

        let (table, progress) = match sub {
            LiteralPhase::True(p) => (TRUE, p),
            LiteralPhase::False(p) => (FALSE, p),
            LiteralPhase::Null(p) => (NULL, p),
        };
        if table.get(progress as usize) != Some(&ch) {
            self.fail();
            return;
        }
        let next_progress = progress + 1;
        if next_progress as usize == table.len() {
            self.complete_value();
            return;
        }
        self.phase = Phase::InLiteral(match sub {
            LiteralPhase::True(_) => LiteralPhase::True(next_progress),
            LiteralPhase::False(_) => LiteralPhase::False(next_progress),
            LiteralPhase::Null(_) => LiteralPhase::Null(next_progress),
        });
    }

    /// A value (of any kind) has just finished. Transitions based on what
    /// now encloses it, or to `done` if the stack is empty.
    fn complete_value(&mut self) {
        match self.stack.last() {
            Some(ContainerFrame::Object) => {
                self.phase = Phase::InObject(ObjectPhase::ExpectCommaOrEnd);
                // `currentKey` is cleared when exiting `expectValue`.
                self.current_key.clear();
            }
            Some(ContainerFrame::Array) => {
                self.phase = Phase::InArray(ArrayPhase::ExpectCommaOrEnd);
            }
            Some(ContainerFrame::String(_)) => {
                // Unreachable: string frames are popped before a value they
                // enclose could possibly complete.
                self.fail();
            }
            None => self.phase = Phase::Done,
        }
    }
}

fn is_terminable(sub: NumberSub, digits_in_sub: u32) -> bool {
    match sub {
        NumberSub::IntZero | NumberSub::ExpDigits => true,
        NumberSub::IntNonZero | NumberSub::Frac => digits_in_sub >= 1,
        NumberSub::Exp | NumberSub::ExpSign => false,
    }
}

fn unescape_simple(ch: char) -> char {
    match ch {
        'b' => '\u{0008}',
        'f' => '\u{000C}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        other => other, // '"', '\\', '/'
    }
}

#[must_use]
pub fn is_json_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}
