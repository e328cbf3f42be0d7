//! Error type shared by the loader and configuration layers.
//!
//! Scoring itself never fails: every token bottoms out at the model's
//! out-of-vocabulary score. Only building a model can go wrong, and any
//! failure there aborts the whole load.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LmError {
    /// The model file could not be opened.
    #[error("cannot open language model {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading failed part way through the model.
    #[error("error reading language model: {0}")]
    Io(#[from] io::Error),

    /// A line split into more than three tab-separated fields.
    #[error("line {line_no}: expected 2 or 3 tab-separated fields, found {fields}: {line:?}")]
    FieldCount {
        line_no: usize,
        fields: usize,
        line: String,
    },

    /// A probability or backoff field is not a number.
    #[error("line {line_no}: cannot parse score in {line:?}")]
    Parse { line_no: usize, line: String },

    /// Bad feature parameters.
    #[error("invalid language model configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LmError>;
