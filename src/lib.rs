//! Backoff n-gram language-model scoring for a phrase-based decoder.
//!
//! # Overview
//!
//! The model answers "how likely is this word sequence", both for a
//! candidate phrase on its own and incrementally while beam search extends
//! partial translations one phrase at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Model file     │
//! └────────┬────────┘
//!          │ load once
//!          ▼
//! ┌─────────────────┐
//! │  BackoffTrie    │ ← reversed n-grams, read-only after load (trie.rs)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  Model          │ ← recursive backoff scoring (model.rs)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────┐
//! │  LanguageModel  │ ──► │  StateArena  │ ← per-sentence contexts (state.rs)
//! └────────┬────────┘     └──────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  ScoreSink      │ ← weighted accumulation (scores.rs)
//! └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - `vocab.rs`: token identities and the shared interner
//! - `trie.rs`: reverse-ordered n-gram trie
//! - `loader.rs`: tab-separated model file parsing
//! - `model.rs`: backoff scoring and backoff penalties
//! - `state.rs`: sliding context windows and their arena
//! - `feature.rs`: isolated and incremental phrase scoring
//! - `scores.rs`: score sink and accumulator
//! - `config.rs`: feature parameters and persisted defaults

pub mod config;
pub mod error;
pub mod feature;
mod loader;
pub mod model;
pub mod scores;
pub mod state;
pub mod trie;
pub mod vocab;

pub use config::{Config, LmConfig};
pub use error::LmError;
pub use feature::{LanguageModel, StatefulFeatureFunction};
pub use loader::transform_lm_score;
pub use model::Model;
pub use scores::{ScoreSink, Scores};
pub use state::{StateArena, StateId};
pub use vocab::{TokenId, Vocabulary, Word};
