//! Text model loader.
//!
//! # Model Format
//!
//! One n-gram per line, fields separated by tabs:
//! ```text
//! <log10 prob>\t<w1 w2 ... wn>[\t<log10 backoff>]
//! ```
//!
//! Lines with fewer than two fields (ARPA section headers such as `\data\`
//! or `\2-grams:`, counts, blank lines) are skipped. A line whose n-gram is
//! `<unk>` sets the out-of-vocabulary score instead of adding an entry.
//! Scores are converted from base 10 to natural logs here and nowhere else.

use crate::config::LmConfig;
use crate::error::{LmError, Result};
use crate::model::{Model, DEFAULT_OOV_SCORE};
use crate::trie::{BackoffTrie, LmScores};
use crate::vocab::{Vocabulary, BOS, EOS, UNK};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Lines between progress reports on large models.
const PROGRESS_INTERVAL: usize = 100_000;

/// Converts an on-disk base-10 log score to the natural-log domain.
pub fn transform_lm_score(log10_score: f32) -> f32 {
    log10_score * std::f32::consts::LN_10
}

/// A parsed model line.
#[derive(Debug, PartialEq)]
enum Entry<'a> {
    Unknown(f32),
    NGram {
        words: Vec<&'a str>,
        scores: LmScores,
    },
}

fn parse_score(field: &str, line_no: usize, line: &str) -> Result<f32> {
    field
        .trim()
        .parse::<f32>()
        .map(transform_lm_score)
        .map_err(|_| LmError::Parse {
            line_no,
            line: line.to_owned(),
        })
}

/// Parses one line. `Ok(None)` means the line carries no entry.
fn parse_line(line: &str, line_no: usize) -> Result<Option<Entry<'_>>> {
    let fields: Vec<&str> = line.split('\t').filter(|f| !f.is_empty()).collect();
    if fields.len() < 2 {
        return Ok(None);
    }
    if fields.len() > 3 {
        return Err(LmError::FieldCount {
            line_no,
            fields: fields.len(),
            line: line.to_owned(),
        });
    }

    let prob = parse_score(fields[0], line_no, line)?;
    if fields[1].trim() == UNK {
        return Ok(Some(Entry::Unknown(prob)));
    }

    let backoff = match fields.get(2) {
        Some(field) => parse_score(field, line_no, line)?,
        None => 0.0,
    };

    let words: Vec<&str> = fields[1].split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }

    Ok(Some(Entry::NGram {
        words,
        scores: LmScores::new(prob, backoff),
    }))
}

impl Model {
    /// Loads the model named by `config`.
    ///
    /// # Errors
    /// Fails if the file cannot be opened or read, or on any malformed
    /// line. No partially loaded model is ever returned.
    pub fn load(config: &LmConfig, vocab: &Vocabulary) -> Result<Self> {
        let file = File::open(&config.path).map_err(|source| LmError::Open {
            path: config.path.clone(),
            source,
        })?;

        info!("Loading language model from {}", config.path.display());
        Self::from_reader(BufReader::new(file), config.order, config.factor, vocab)
    }

    /// Builds a model from any line-oriented reader.
    pub fn from_reader<R: BufRead>(
        reader: R,
        order: usize,
        factor: usize,
        vocab: &Vocabulary,
    ) -> Result<Self> {
        if order == 0 {
            return Err(LmError::Config("order must be at least 1".to_owned()));
        }

        let bos = vocab.intern(BOS);
        let eos = vocab.intern(EOS);
        let unk = vocab.intern(UNK);

        let mut trie = BackoffTrie::new();
        let mut oov = DEFAULT_OOV_SCORE;
        let mut inserted = 0usize;
        let mut highest_order = 0usize;
        let mut warned_order = false;
        let mut key = Vec::with_capacity(order);
        let mut line_no = 0usize;

        for line in reader.lines() {
            let line = line?;
            line_no += 1;
            if line_no % PROGRESS_INTERVAL == 0 {
                debug!("{} lines read, {} n-grams", line_no, inserted);
            }

            let line = line.trim_end_matches('\r');
            match parse_line(line, line_no)? {
                None => continue,
                Some(Entry::Unknown(prob)) => oov = prob,
                Some(Entry::NGram { words, scores }) => {
                    if words.len() > order && !warned_order {
                        warn!(
                            "line {}: {}-gram exceeds configured order {}",
                            line_no,
                            words.len(),
                            order
                        );
                        warned_order = true;
                    }
                    highest_order = highest_order.max(words.len());

                    key.clear();
                    key.extend(words.iter().rev().map(|w| vocab.intern(w)));
                    trie.insert(&key, scores);
                    inserted += 1;
                }
            }
        }

        info!(
            "Loaded {} n-grams (highest order {}) from {} lines, {} trie nodes, OOV score {}",
            inserted,
            highest_order,
            line_no,
            trie.len(),
            oov
        );

        Ok(Self {
            trie,
            order,
            factor,
            oov,
            bos,
            eos,
            unk,
        })
    }
}
