//! The language model as a stateful feature function.
//!
//! The search engine calls the model at two moments:
//!
//! - when a translation option is created, to pre-score its target phrase
//!   without any history ([`evaluate_in_isolation`]);
//! - when a phrase is appended to a hypothesis, to score it against the
//!   parent's context and produce the child's context
//!   ([`evaluate_when_applied`]).
//!
//! [`evaluate_in_isolation`]: StatefulFeatureFunction::evaluate_in_isolation
//! [`evaluate_when_applied`]: StatefulFeatureFunction::evaluate_when_applied

use crate::config::LmConfig;
use crate::error::Result;
use crate::model::Model;
use crate::scores::ScoreSink;
use crate::state::{shift_or_push, StateArena, StateId};
use crate::trie::NodeId;
use crate::vocab::{TokenId, Vocabulary, Word};
use log::{log_enabled, trace, Level};
use std::sync::Arc;

/// A feature whose score depends on the hypothesis it extends.
pub trait StatefulFeatureFunction {
    /// Slot this feature writes to in a score sink.
    fn feature_index(&self) -> usize;

    /// State attached to the empty hypothesis at the start of a sentence.
    fn empty_hypothesis_state(&self, arena: &mut StateArena) -> StateId;

    /// Scores a target phrase with no preceding context. Words whose full
    /// context lies inside the phrase go to `scores`; the rest only to
    /// `estimated`, when the caller wants a pre-pruning estimate.
    fn evaluate_in_isolation(
        &self,
        phrase: &[Word],
        scores: &mut dyn ScoreSink,
        estimated: Option<&mut dyn ScoreSink>,
    );

    /// Scores `phrase` following the context in `prev` and returns the
    /// state of the new hypothesis. `complete` is set once the hypothesis
    /// covers the whole source sentence.
    fn evaluate_when_applied(
        &self,
        arena: &mut StateArena,
        prev: StateId,
        phrase: &[Word],
        complete: bool,
        scores: &mut dyn ScoreSink,
    ) -> StateId;
}

/// Backoff n-gram language model feature.
pub struct LanguageModel {
    model: Model,
    vocab: Arc<Vocabulary>,
    feature_index: usize,
}

impl LanguageModel {
    pub fn new(model: Model, vocab: Arc<Vocabulary>, feature_index: usize) -> Self {
        Self {
            model,
            vocab,
            feature_index,
        }
    }

    /// Loads the model file named by `config`.
    pub fn load(config: &LmConfig, vocab: Arc<Vocabulary>, feature_index: usize) -> Result<Self> {
        let model = Model::load(config, &vocab)?;
        Ok(Self::new(model, vocab, feature_index))
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn vocab(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    fn score(&self, key: &[TokenId]) -> (f32, Option<NodeId>) {
        let scored = self.model.score(key);
        if log_enabled!(Level::Trace) {
            trace!("p({}) = {}", self.vocab.render(key), scored.0);
        }
        scored
    }

    /// Log-probability of a whole sentence, scored left to right.
    ///
    /// With `bos` the first word is conditioned on `<s>`; with `eos` the
    /// sentence-end marker is scored after the last word.
    pub fn score_sentence(&self, tokens: &[TokenId], bos: bool, eos: bool) -> f32 {
        let order = self.model.order();
        let mut key = Vec::with_capacity(order);
        if bos {
            key.push(self.model.bos());
        }

        let mut total = 0.0;
        for &token in tokens {
            shift_or_push(&mut key, order, token);
            total += self.score(&key).0;
        }
        if eos {
            shift_or_push(&mut key, order, self.model.eos());
            total += self.score(&key).0;
        }
        total
    }
}

impl StatefulFeatureFunction for LanguageModel {
    fn feature_index(&self) -> usize {
        self.feature_index
    }

    fn empty_hypothesis_state(&self, arena: &mut StateArena) -> StateId {
        arena.alloc(&[self.model.bos()], None)
    }

    fn evaluate_in_isolation(
        &self,
        phrase: &[Word],
        scores: &mut dyn ScoreSink,
        estimated: Option<&mut dyn ScoreSink>,
    ) {
        if phrase.is_empty() {
            return;
        }

        let order = self.model.order();
        let mut key = Vec::with_capacity(order);
        let mut full = 0.0;
        let mut partial = 0.0;

        for word in phrase {
            shift_or_push(&mut key, order, self.model.token(word));
            if key.len() == order {
                full += self.score(&key).0;
            } else if estimated.is_some() {
                partial += self.score(&key).0;
            }
        }

        scores.plus_equals(self.feature_index, full);
        if let Some(estimated) = estimated {
            estimated.plus_equals(self.feature_index, partial);
        }
    }

    fn evaluate_when_applied(
        &self,
        arena: &mut StateArena,
        prev: StateId,
        phrase: &[Word],
        complete: bool,
        scores: &mut dyn ScoreSink,
    ) -> StateId {
        let order = self.model.order();
        let mut key = Vec::with_capacity(order);
        key.extend_from_slice(arena.window(prev));

        let mut total = 0.0;
        let mut last_match = None;
        for word in phrase {
            shift_or_push(&mut key, order, self.model.token(word));
            let (score, hint) = self.score(&key);
            total += score;
            last_match = hint;
        }

        if complete {
            shift_or_push(&mut key, order, self.model.eos());
            total += self.score(&key).0;
            last_match = None;
            key.clear();
        } else {
            key.truncate(order - 1);
        }

        scores.plus_equals(self.feature_index, total);
        arena.alloc(&key, last_match)
    }
}
