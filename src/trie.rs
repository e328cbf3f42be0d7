//! Reverse-ordered n-gram trie.
//!
//! Keys are n-grams with the most recent word first, so `the cat sat` is
//! stored under the path `sat → cat → the`. A node reached after consuming
//! `k` key tokens stands for a `k`-gram; all orders share one structure.
//!
//! Nodes live in a flat `Vec` and refer to their children by index. This
//! keeps a node reference `Copy` (see [`NodeId`]) so scoring can hand one
//! back as a continuation hint without borrowing the trie.

use crate::vocab::TokenId;
use ahash::AHashMap;

/// Probability and backoff weight of an n-gram, natural-log domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmScores {
    pub prob: f32,
    pub backoff: f32,
}

impl LmScores {
    pub fn new(prob: f32, backoff: f32) -> Self {
        Self { prob, backoff }
    }
}

/// Index of a node inside a [`BackoffTrie`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    children: AHashMap<TokenId, NodeId>,
    prob: Option<f32>,
    backoff: f32,
}

impl TrieNode {
    /// Probability, if this exact n-gram was inserted.
    pub fn prob(&self) -> Option<f32> {
        self.prob
    }

    /// Backoff weight, 0 when the model line carried none.
    pub fn backoff(&self) -> f32 {
        self.backoff
    }

    pub fn child(&self, token: TokenId) -> Option<NodeId> {
        self.children.get(&token).copied()
    }
}

/// Write-once trie built by the loader and read concurrently afterwards.
#[derive(Debug, Clone)]
pub struct BackoffTrie {
    nodes: Vec<TrieNode>,
}

impl Default for BackoffTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl BackoffTrie {
    pub fn new() -> Self {
        Self { nodes: vec![TrieNode::default()] }
    }

    /// Inserts `value` under `reversed_key`, creating intermediate nodes
    /// as needed. Re-inserting a key overwrites the previous value.
    pub fn insert(&mut self, reversed_key: &[TokenId], value: LmScores) {
        let mut node_idx = 0usize;
        for &token in reversed_key {
            let next_idx = if let Some(&id) = self.nodes[node_idx].children.get(&token) {
                id.0 as usize
            } else {
                let new_idx = self.nodes.len();
                self.nodes.push(TrieNode::default());
                self.nodes[node_idx].children.insert(token, NodeId(new_idx as u32));
                new_idx
            };
            node_idx = next_idx;
        }

        let node = &mut self.nodes[node_idx];
        node.prob = Some(value.prob);
        node.backoff = value.backoff;
    }

    /// Node for the exact full-length key, if present.
    pub fn lookup(&self, reversed_key: &[TokenId]) -> Option<&TrieNode> {
        self.lookup_id(reversed_key).map(|id| self.node(id))
    }

    pub fn lookup_id(&self, reversed_key: &[TokenId]) -> Option<NodeId> {
        let mut current = NodeId::ROOT;
        for &token in reversed_key {
            current = self.node(current).child(token)?;
        }
        Some(current)
    }

    /// Deepest node reachable by a prefix of the key and the number of
    /// tokens consumed to reach it. The root with 0 when nothing matches.
    pub fn longest_prefix_match(&self, reversed_key: &[TokenId]) -> (NodeId, usize) {
        let mut current = NodeId::ROOT;
        let mut matched = 0;
        for &token in reversed_key {
            match self.node(current).child(token) {
                Some(next) => {
                    current = next;
                    matched += 1;
                }
                None => break,
            }
        }
        (current, matched)
    }

    pub fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id.0 as usize]
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Vocabulary;

    fn key(vocab: &Vocabulary, words: &[&str]) -> Vec<TokenId> {
        words.iter().map(|w| vocab.intern(w)).collect()
    }

    #[test]
    fn test_insert_and_lookup() {
        let vocab = Vocabulary::new();
        let mut trie = BackoffTrie::new();
        assert!(trie.is_empty());

        trie.insert(&key(&vocab, &["sat", "cat", "the"]), LmScores::new(-0.5, 0.0));
        trie.insert(&key(&vocab, &["cat"]), LmScores::new(-1.5, -0.25));

        let node = trie.lookup(&key(&vocab, &["sat", "cat", "the"])).unwrap();
        assert_eq!(node.prob(), Some(-0.5));

        let node = trie.lookup(&key(&vocab, &["cat"])).unwrap();
        assert_eq!(node.prob(), Some(-1.5));
        assert_eq!(node.backoff(), -0.25);

        // Intermediate node of the trigram path, never inserted itself.
        let node = trie.lookup(&key(&vocab, &["sat", "cat"])).unwrap();
        assert_eq!(node.prob(), None);
        assert_eq!(node.backoff(), 0.0);

        assert!(trie.lookup(&key(&vocab, &["dog"])).is_none());
        assert_eq!(trie.len(), 5);
    }

    #[test]
    fn test_reinsert_overwrites() {
        let vocab = Vocabulary::new();
        let mut trie = BackoffTrie::new();
        let k = key(&vocab, &["a", "b"]);
        trie.insert(&k, LmScores::new(-1.0, -1.0));
        trie.insert(&k, LmScores::new(-2.0, 0.0));
        assert_eq!(trie.lookup(&k).unwrap().prob(), Some(-2.0));
        assert_eq!(trie.len(), 3);
    }

    #[test]
    fn test_longest_prefix_match() {
        let vocab = Vocabulary::new();
        let mut trie = BackoffTrie::new();
        trie.insert(&key(&vocab, &["cat", "the"]), LmScores::new(-1.0, -0.5));

        let (node, matched) = trie.longest_prefix_match(&key(&vocab, &["cat", "the", "big"]));
        assert_eq!(matched, 2);
        assert_eq!(trie.node(node).backoff(), -0.5);

        let (node, matched) = trie.longest_prefix_match(&key(&vocab, &["dog", "the"]));
        assert_eq!(matched, 0);
        assert_eq!(node, NodeId::ROOT);

        let (_, matched) = trie.longest_prefix_match(&[]);
        assert_eq!(matched, 0);
    }

    #[test]
    fn test_lookup_empty_key_is_root() {
        let trie = BackoffTrie::new();
        assert_eq!(trie.lookup_id(&[]), Some(NodeId::ROOT));
        assert_eq!(trie.lookup(&[]).unwrap().prob(), None);
    }
}
