//! Token identities and the shared word interner.
//!
//! Every surface string seen by the decoder is interned exactly once into a
//! [`TokenId`]. Identity comparison replaces string comparison everywhere in
//! the scorer, so the trie keys and context windows are plain `u32`s.
//!
//! The [`Vocabulary`] is created once per process, before any model is
//! loaded, and handed to the loader and the feature function as an
//! `Arc<Vocabulary>`. Interning takes a write lock only for strings that
//! have not been seen before.

use ahash::AHashMap;
use parking_lot::RwLock;
use std::fmt;

/// Sentence-start marker.
pub const BOS: &str = "<s>";
/// Sentence-end marker.
pub const EOS: &str = "</s>";
/// Unknown-token marker; a model line with this n-gram sets the OOV score.
pub const UNK: &str = "<unk>";

/// Default separator between the factors of a word, as in `cat|NN|cat`.
pub const FACTOR_DELIMITER: char = '|';

/// Interned identity of a vocabulary item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(u32);

impl TokenId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Default)]
struct Interner {
    ids: AHashMap<String, TokenId>,
    words: Vec<String>,
}

/// Thread-safe string interner.
#[derive(Default)]
pub struct Vocabulary {
    inner: RwLock<Interner>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identity for `text`, allocating a new one if needed.
    pub fn intern(&self, text: &str) -> TokenId {
        if let Some(&id) = self.inner.read().ids.get(text) {
            return id;
        }

        let mut inner = self.inner.write();
        // Another thread may have interned it between the two locks.
        if let Some(&id) = inner.ids.get(text) {
            return id;
        }
        let id = TokenId(inner.words.len() as u32);
        inner.words.push(text.to_owned());
        inner.ids.insert(text.to_owned(), id);
        id
    }

    /// Looks up `text` without interning it.
    pub fn get(&self, text: &str) -> Option<TokenId> {
        self.inner.read().ids.get(text).copied()
    }

    /// Surface text of an interned token, for diagnostics.
    pub fn surface(&self, id: TokenId) -> String {
        self.inner
            .read()
            .words
            .get(id.index())
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.inner.read().words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders a sequence of ids back to space-separated text.
    pub fn render(&self, ids: &[TokenId]) -> String {
        let inner = self.inner.read();
        ids.iter()
            .map(|id| {
                inner
                    .words
                    .get(id.index())
                    .map(String::as_str)
                    .unwrap_or("?")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A target word: one interned id per factor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    factors: Vec<TokenId>,
}

impl Word {
    pub fn new(factors: Vec<TokenId>) -> Self {
        Self { factors }
    }

    /// Parses `surface|factor1|factor2…`, interning each factor.
    pub fn parse(vocab: &Vocabulary, text: &str, delimiter: char) -> Self {
        Self {
            factors: text.split(delimiter).map(|f| vocab.intern(f)).collect(),
        }
    }

    pub fn factor(&self, index: usize) -> Option<TokenId> {
        self.factors.get(index).copied()
    }

    pub fn factors(&self) -> &[TokenId] {
        &self.factors
    }
}

/// Splits a line on whitespace and parses every token as a [`Word`].
pub fn parse_phrase(vocab: &Vocabulary, line: &str, delimiter: char) -> Vec<Word> {
    line.split_whitespace()
        .map(|token| Word::parse(vocab, token, delimiter))
        .collect()
}
