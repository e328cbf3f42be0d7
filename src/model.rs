//! Backoff n-gram model and its scoring algorithms.
//!
//! Keys passed to the scorer are always most-recent-first: the token being
//! scored sits at index 0 and its history follows, newest to oldest. The
//! conditional log-probability of `w` given history `h` is
//!
//! ```text
//! P(w | h) = prob(w h)                       if the n-gram was trained
//!          = backoff(h) + P(w | h')          otherwise, h' = h minus its oldest word
//! ```
//!
//! bottoming out at the model's OOV score for words without a unigram.

use crate::trie::{BackoffTrie, NodeId, TrieNode};
use crate::vocab::{TokenId, Word};

/// Score charged for a word with no unigram entry, unless the model file
/// provides an explicit `<unk>` line.
pub const DEFAULT_OOV_SCORE: f32 = -100.0;

/// A loaded language model. Immutable after loading and safe to share
/// between scoring threads.
#[derive(Debug, Clone)]
pub struct Model {
    pub(crate) trie: BackoffTrie,
    pub(crate) order: usize,
    pub(crate) factor: usize,
    pub(crate) oov: f32,
    pub(crate) bos: TokenId,
    pub(crate) eos: TokenId,
    pub(crate) unk: TokenId,
}

impl Model {
    pub fn order(&self) -> usize {
        self.order
    }

    /// Factor index of each target word that this model scores.
    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn oov_score(&self) -> f32 {
        self.oov
    }

    pub fn bos(&self) -> TokenId {
        self.bos
    }

    pub fn eos(&self) -> TokenId {
        self.eos
    }

    pub fn trie(&self) -> &BackoffTrie {
        &self.trie
    }

    /// The id this model scores for `word`. Words missing the configured
    /// factor are scored as unknown.
    pub fn token(&self, word: &Word) -> TokenId {
        word.factor(self.factor).unwrap_or(self.unk)
    }

    /// Whether `token` has a unigram probability.
    pub fn contains(&self, token: TokenId) -> bool {
        self.trie
            .lookup(&[token])
            .is_some_and(|node| node.prob().is_some())
    }

    /// Log-probability of `key[0]` given the history `key[1..]`.
    ///
    /// Also returns the node holding the probability that was finally used,
    /// as a continuation hint. An empty key scores zero.
    pub fn score(&self, key: &[TokenId]) -> (f32, Option<NodeId>) {
        if key.is_empty() {
            return (0.0, None);
        }

        if let Some(id) = self.trie.lookup_id(key) {
            if let Some(prob) = self.trie.node(id).prob() {
                return (prob, Some(id));
            }
        }

        if key.len() == 1 {
            return (self.oov, None);
        }

        let backoff = self.trie.lookup(&key[1..]).map_or(0.0, TrieNode::backoff);
        let (shorter, hint) = self.score(&key[..key.len() - 1]);
        (backoff + shorter, hint)
    }

    /// Total backoff weight charged for reaching a shorter context.
    ///
    /// Matches the longest prefix of `context`. A full match charges that
    /// node's backoff. Otherwise the matched node's backoff (or the OOV
    /// score when not even the first token matches) is charged and the
    /// unmatched remainder is penalized in turn.
    pub fn backoff_penalty(&self, context: &[TokenId]) -> f32 {
        if context.is_empty() {
            return 0.0;
        }

        let (node, matched) = self.trie.longest_prefix_match(context);
        if matched == context.len() {
            return self.trie.node(node).backoff();
        }

        let (charge, consumed) = if matched == 0 {
            (self.oov, 1)
        } else {
            (self.trie.node(node).backoff(), matched)
        };
        charge + self.backoff_penalty(&context[consumed..])
    }
}

#[cfg(test)]
mod tests {
    use crate::loader::tests::{load_str, t};
    use crate::model::DEFAULT_OOV_SCORE;
    use crate::vocab::Vocabulary;

    // No <unk> line, so the default OOV score applies.
    const SMALL_MODEL: &str = "\\data\\
ngram 1=3
ngram 2=1
ngram 3=1

\\1-grams:
-1.2\tthe\t-0.3
-1.5\tcat\t-0.2
-1.8\tsat\t-0.1

\\2-grams:
-0.7\tthe cat\t-0.6

\\3-grams:
-0.2\tthe cat sat

\\end\\
";

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4, "{a} != {b}");
    }

    #[test]
    fn test_exact_trigram_hit() {
        let vocab = Vocabulary::new();
        let model = load_str(SMALL_MODEL, 3, &vocab);
        let key = [vocab.intern("sat"), vocab.intern("cat"), vocab.intern("the")];

        let (score, hint) = model.score(&key);
        assert_eq!(score, t(-0.2));
        assert_eq!(hint, model.trie().lookup_id(&key));
    }

    #[test]
    fn test_unknown_word_backs_off_to_oov() {
        let vocab = Vocabulary::new();
        let model = load_str(SMALL_MODEL, 3, &vocab);
        let key = [vocab.intern("dog"), vocab.intern("cat"), vocab.intern("the")];

        let (score, hint) = model.score(&key);
        assert_close(score, t(-0.6) + t(-0.2) + DEFAULT_OOV_SCORE);
        assert_eq!(hint, None);
    }

    #[test]
    fn test_intermediate_node_without_probability_backs_off() {
        let vocab = Vocabulary::new();
        let model = load_str(SMALL_MODEL, 3, &vocab);
        // "cat sat" exists only as a path towards the trigram.
        let key = [vocab.intern("sat"), vocab.intern("cat")];

        let (score, hint) = model.score(&key);
        assert_close(score, t(-0.2) + t(-1.8));
        assert_eq!(hint, model.trie().lookup_id(&[vocab.intern("sat")]));
    }

    #[test]
    fn test_unknown_history_charges_no_backoff() {
        let vocab = Vocabulary::new();
        let model = load_str(SMALL_MODEL, 3, &vocab);
        let key = [vocab.intern("cat"), vocab.intern("dog")];

        let (score, _) = model.score(&key);
        assert_eq!(score, t(-1.5));
    }

    #[test]
    fn test_unknown_context_terminates() {
        let vocab = Vocabulary::new();
        let model = load_str(SMALL_MODEL, 3, &vocab);
        let key: Vec<_> = ["x1", "x2", "x3", "x4", "x5", "x6"]
            .iter()
            .map(|w| vocab.intern(w))
            .collect();

        let (score, hint) = model.score(&key);
        assert!(score.is_finite());
        assert_eq!(score, DEFAULT_OOV_SCORE);
        assert_eq!(hint, None);
        assert_eq!(model.score(&[]).0, 0.0);
    }

    #[test]
    fn test_backoff_penalty_agrees_with_score() {
        let vocab = Vocabulary::new();
        let model = load_str(SMALL_MODEL, 3, &vocab);
        let the = vocab.intern("the");
        let cat = vocab.intern("cat");
        let sat = vocab.intern("sat");

        // P(sat | cat): one level of backoff through the history "cat".
        let unigram = model.trie().lookup(&[sat]).unwrap().prob().unwrap();
        assert_close(model.backoff_penalty(&[cat]) + unigram, model.score(&[sat, cat]).0);

        // P(cat | sat): history "sat" carries its own backoff.
        let cat_unigram = model.trie().lookup(&[cat]).unwrap().prob().unwrap();
        assert_close(model.backoff_penalty(&[sat]) + cat_unigram, model.score(&[cat, sat]).0);

        // P(sat | the cat) needs no backoff at all.
        assert!(model.trie().lookup(&[sat, cat, the]).is_some());
    }

    #[test]
    fn test_backoff_penalty_walks_unmatched_suffix() {
        let vocab = Vocabulary::new();
        let model = load_str(SMALL_MODEL, 3, &vocab);
        let the = vocab.intern("the");
        let cat = vocab.intern("cat");
        let dog = vocab.intern("dog");

        assert_eq!(model.backoff_penalty(&[]), 0.0);
        assert_close(model.backoff_penalty(&[cat, the]), t(-0.6));
        assert_close(model.backoff_penalty(&[dog, cat]), DEFAULT_OOV_SCORE + t(-0.2));
        assert_close(model.backoff_penalty(&[cat, the, dog]), t(-0.6) + DEFAULT_OOV_SCORE);
    }

    #[test]
    fn test_contains_and_token() {
        let vocab = Vocabulary::new();
        let model = load_str(SMALL_MODEL, 3, &vocab);
        assert!(model.contains(vocab.intern("cat")));
        assert!(!model.contains(vocab.intern("dog")));

        let word = crate::vocab::Word::parse(&vocab, "cat", '|');
        assert_eq!(model.token(&word), vocab.intern("cat"));
    }
}
