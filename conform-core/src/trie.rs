//! A prefix tree over the tokenizations of schema-permitted keys
//! (`spec.md` §3, §4.3).

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use slotmap::{new_key_type, SlotMap};

use crate::cache::Cache;
use crate::error::TrieError;
use crate::token::{TokenId, TokenizerAdapter, TokenizerFingerprint};

new_key_type! {
    struct NodeKey;
}

struct Node {
    children: HashMap<TokenId, NodeKey>,
    terminal: bool,
    key_name: Option<String>,
}

impl Node {
    fn empty() -> Self {
        Self {
            children: HashMap::new(),
            terminal: false,
            key_name: None,
        }
    }
}

/// A prefix tree keyed by [`TokenId`] over a set of permitted keys
/// (`spec.md` §4.3). Built once per `(keys, tokenizerFingerprint)` and
/// shared read-only thereafter.
pub struct TokenTrie {
    nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,
}

impl TokenTrie {
    #[must_use]
    pub fn empty() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::empty());
        Self { nodes, root }
    }

    /// Inserts a token sequence for `key_name`. An empty sequence is a
    /// no-op (`spec.md` §4.3).
    pub fn insert(&mut self, tokens: &[TokenId], key_name: &str) {
        if tokens.is_empty() {
            return;
        }
        let mut current = self.root;
        for &token in tokens {
            if let Some(&next) = self.nodes[current].children.get(&token) {
                current = next;
            } else {
                let next = self.nodes.insert(Node::empty());
                self.nodes[current].children.insert(token, next);
                current = next;
            }
        }
        let node = &mut self.nodes[current];
        node.terminal = true;
        node.key_name = Some(key_name.to_string());
    }

    #[must_use]
    pub fn root_path(&self) -> TriePath {
        TriePath {
            node: self.root,
        }
    }

    /// The children ids reachable from `path`, and whether `path` is
    /// itself a terminal node.
    #[must_use]
    pub fn allowed_next(&self, path: &TriePath) -> (Vec<TokenId>, bool) {
        let node = &self.nodes[path.node];
        (node.children.keys().copied().collect(), node.terminal)
    }

    #[must_use]
    pub fn is_terminal(&self, path: &TriePath) -> bool {
        self.nodes[path.node].terminal
    }

    #[must_use]
    pub fn key_name(&self, path: &TriePath) -> Option<&str> {
        self.nodes[path.node].key_name.as_deref()
    }

    /// Advances `path` by one token id, failing if it has no matching
    /// child.
    pub fn append(&self, path: &TriePath, token: TokenId) -> Result<TriePath, TrieError> {
        let node = &self.nodes[path.node];
        node.children
            .get(&token)
            .map(|&next| TriePath { node: next })
            .ok_or(TrieError::NotAChild { token })
    }
}

/// A cursor into a [`TokenTrie`]; reset by replacing it with
/// [`TokenTrie::root_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriePath {
    node: NodeKey,
}

type CacheKey = (Vec<String>, TokenizerFingerprint);

static TRIE_CACHE: Lazy<Cache<CacheKey, TokenTrie>> = Lazy::new(Cache::new);

/// Builds (or returns a cached) [`TokenTrie`] for `keys` under `tokenizer`'s
/// vocabulary. The cache is process-wide, content-addressed by
/// `(sorted(keys), fingerprint)`, and never returns a stale entry because
/// the key set itself is part of the cache key (`spec.md` §4.3, §5, §9).
#[must_use]
pub fn build_cached(keys: &[&str], tokenizer: &dyn TokenizerAdapter) -> Arc<TokenTrie> {
    let mut sorted: Vec<String> = keys.iter().map(|k| (*k).to_string()).collect();
    sorted.sort_unstable();
    sorted.dedup();
    let cache_key = (sorted.clone(), tokenizer.fingerprint());

    TRIE_CACHE.get_or_insert_with(cache_key, || {
        let mut trie = TokenTrie::empty();
        for key in &sorted {
            let tokens = tokenizer.encode(key);
            trie.insert(&tokens, key);
        }
        trie
    })
}

/// Clears the process-wide trie cache. Intended for administrative use
/// (e.g. tests that want a clean cache, or a long-running host reclaiming
/// memory) — normal operation never needs to call this.
pub fn clear_cache() {
    TRIE_CACHE.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::FixtureTokenizer;

    fn trie_for(keys: &[&str]) -> TokenTrie {
        let tokenizer = FixtureTokenizer::with_glyphs();
        let mut trie = TokenTrie::empty();
        for key in keys {
            trie.insert(&tokenizer.encode(key), key);
        }
        trie
    }

    #[test]
    fn empty_insert_is_noop() {
        let mut trie = TokenTrie::empty();
        trie.insert(&[], "ignored");
        let (children, terminal) = trie.allowed_next(&trie.root_path());
        assert!(children.is_empty());
        assert!(!terminal);
    }

    #[test]
    fn terminal_node_has_no_further_children_iff_no_longer_key_shares_prefix() {
        let trie = trie_for(&["a", "ab"]);
        let mut path = trie.root_path();
        path = trie.append(&path, 12 /* 'a' in fixture vocab */).unwrap();
        assert!(trie.is_terminal(&path));
        let (children, _) = trie.allowed_next(&path);
        assert_eq!(children.len(), 1); // 'b' continues toward "ab"
    }

    #[test]
    fn append_fails_off_path() {
        let trie = trie_for(&["a"]);
        let path = trie.root_path();
        assert!(trie.append(&path, 999).is_err());
    }

    #[test]
    fn building_is_pure_in_its_inputs() {
        let tokenizer = FixtureTokenizer::with_glyphs();
        clear_cache();
        let a = build_cached(&["a", "b"], &tokenizer);
        let b = build_cached(&["b", "a"], &tokenizer);
        assert_eq!(
            a.allowed_next(&a.root_path()).0.len(),
            b.allowed_next(&b.root_path()).0.len()
        );
    }
}
