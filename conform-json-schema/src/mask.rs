//! Fuses state machine, trie, and special-token index into a per-step
//! [`MaskHint`] (`spec.md` §4.4).

use ahash::AHashSet;
use conform_core::{ArrayPhase, ObjectPhase, Phase, Role, SpecialTokens, StringKind, StringPhase, TokenId, TokenTrie, TriePath};

/// Whether a [`MaskHint`]'s allow-set is authoritative or advisory
/// (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    /// The consumer must zero every logit outside `allow` before sampling.
    Hard,
    /// The consumer may add a positive bias to logits inside `allow`;
    /// tokens outside it remain untouched.
    Soft,
}

/// The per-step constraint handed to the decoder (`spec.md` §3, §4.4).
#[derive(Debug, Clone)]
pub struct MaskHint {
    pub allow: AHashSet<TokenId>,
    pub mode: MaskMode,
}

impl MaskHint {
    fn hard(allow: AHashSet<TokenId>) -> Self {
        Self {
            allow,
            mode: MaskMode::Hard,
        }
    }

    fn soft(allow: AHashSet<TokenId>) -> Self {
        Self {
            allow,
            mode: MaskMode::Soft,
        }
    }
}

/// Value-start candidates in soft mode: quotes, object/array openers, and
/// (best-effort) literal/number starters. `spec.md` §4.4's `root` row lists
/// these as "ideally" included since soft mode never blocks a legal
/// continuation, only nudges toward one.
fn value_start_roles() -> &'static [Role] {
    &[Role::Quote, Role::OpenBrace, Role::OpenBracket]
}

/// Computes the mask hint for the current automaton phase (`spec.md` §4.4
/// table). Returns `None` for unconstrained value contents (the
/// `inString(body{value, ..})` row), meaning "no constraint".
#[must_use]
pub fn mask_hint(
    phase: &Phase,
    trie: Option<&TokenTrie>,
    trie_path: Option<&TriePath>,
    special: &SpecialTokens,
    include_whitespace: bool,
) -> Option<MaskHint> {
    let hint = match phase {
        Phase::Root => Some(MaskHint::soft(special.union_of(value_start_roles()))),

        Phase::InObject(ObjectPhase::ExpectKeyFirstQuote | ObjectPhase::ExpectKeyOrEnd) => {
            Some(MaskHint::hard(special.union_of(&[Role::Quote, Role::CloseBrace])))
        }
        Phase::InObject(ObjectPhase::ExpectColon) => {
            Some(MaskHint::hard(special.union_of(&[Role::Colon])))
        }
        Phase::InObject(ObjectPhase::ExpectValue) => {
            Some(MaskHint::soft(special.union_of(value_start_roles())))
        }
        Phase::InObject(ObjectPhase::ExpectCommaOrEnd) => {
            Some(MaskHint::hard(special.union_of(&[Role::Comma, Role::CloseBrace])))
        }

        Phase::InArray(ArrayPhase::ExpectValueOrEnd) => {
            let mut allow = special.union_of(value_start_roles());
            allow.extend(special.ids_for(Role::CloseBracket));
            Some(MaskHint::soft(allow))
        }
        Phase::InArray(ArrayPhase::ExpectCommaOrEnd) => {
            Some(MaskHint::hard(special.union_of(&[Role::Comma, Role::CloseBracket])))
        }

        Phase::InString(StringPhase::Body {
            kind: StringKind::Key,
            escaped: false,
        }) => {
            let (trie, path) = (trie?, trie_path?);
            let (children, at_terminal) = trie.allowed_next(path);
            let mut allow: AHashSet<TokenId> = children.into_iter().collect();
            if at_terminal {
                allow.extend(special.ids_for(Role::Quote));
            }
            Some(MaskHint::hard(allow))
        }
        Phase::InString(StringPhase::Body {
            kind: StringKind::Value,
            ..
        }) => None,
        // Escaped bodies and unicode escapes are only reachable mid-key via
        // the same Body{kind:Key} row in the spec table (the escape
        // sequence's own characters are not constrained by the trie).
        Phase::InString(_) => None,

        Phase::InNumber(_) | Phase::InLiteral(_) => None,

        Phase::Done | Phase::Error => Some(MaskHint::hard(AHashSet::new())),
    };

    hint.map(|mut hint| {
        if include_whitespace && allows_whitespace(phase) {
            hint.allow.extend(special.ids_for(Role::Whitespace));
        }
        hint
    })
}

/// Whitespace is unioned into every row except `error`, `done`, and the
/// in-key-body row (`spec.md` §4.4: "If `includeWhitespace` is enabled,
/// whitespace tokens are unioned into any non-error, non-done,
/// non-inString(key) set").
fn allows_whitespace(phase: &Phase) -> bool {
    !matches!(
        phase,
        Phase::Done
            | Phase::Error
            | Phase::InString(StringPhase::Body {
                kind: StringKind::Key,
                ..
            })
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTokenizer;

    fn fixture() -> (MockTokenizer, SpecialTokens) {
        let tokenizer = MockTokenizer::with_vocabulary(["a"]);
        let special = SpecialTokens::build(&tokenizer);
        (tokenizer, special)
    }

    #[test]
    fn expect_colon_is_hard_colon_only() {
        let (_tok, special) = fixture();
        let hint = mask_hint(
            &Phase::InObject(ObjectPhase::ExpectColon),
            None,
            None,
            &special,
            false,
        )
        .unwrap();
        assert_eq!(hint.mode, MaskMode::Hard);
        assert_eq!(hint.allow, special.ids_for(Role::Colon).clone());
    }

    #[test]
    fn done_and_error_are_empty_hard() {
        let (_tok, special) = fixture();
        for phase in [Phase::Done, Phase::Error] {
            let hint = mask_hint(&phase, None, None, &special, true).unwrap();
            assert_eq!(hint.mode, MaskMode::Hard);
            assert!(hint.allow.is_empty());
        }
    }

    #[test]
    fn value_body_is_unconstrained() {
        let (_tok, special) = fixture();
        let phase = Phase::InString(StringPhase::Body {
            kind: StringKind::Value,
            escaped: false,
        });
        assert!(mask_hint(&phase, None, None, &special, true).is_none());
    }

    #[test]
    fn whitespace_excluded_from_key_body_mask() {
        let (tokenizer, special) = fixture();
        let mut trie = TokenTrie::empty();
        trie.insert(&tokenizer.encode("a"), "a");
        let path = trie.root_path();
        let phase = Phase::InString(StringPhase::Body {
            kind: StringKind::Key,
            escaped: false,
        });
        let hint = mask_hint(&phase, Some(&trie), Some(&path), &special, true).unwrap();
        assert!(hint.allow.is_disjoint(special.ids_for(Role::Whitespace)));
    }
}
