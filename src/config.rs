use crate::error::{LmError, Result};
use crate::vocab::FACTOR_DELIMITER;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "lmscore";

/// Parameters of one language-model feature.
#[derive(Debug, Clone, PartialEq)]
pub struct LmConfig {
    /// Model file location.
    pub path: PathBuf,
    /// Factor index of each target word to score.
    pub factor: usize,
    /// Maximum n-gram order; must match the trained model.
    pub order: usize,
}

impl LmConfig {
    pub fn new(path: impl AsRef<Path>, order: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            factor: 0,
            order,
        }
    }

    /// Parses a decoder feature line such as
    /// `LanguageModel path=lm.txt factor=0 order=3`.
    ///
    /// A leading word without `=` names the feature type and is ignored.
    pub fn from_feature_line(line: &str) -> Result<Self> {
        let mut path = None;
        let mut factor = 0;
        let mut order = None;

        for (i, token) in line.split_whitespace().enumerate() {
            let Some((key, value)) = token.split_once('=') else {
                if i == 0 {
                    continue;
                }
                return Err(LmError::Config(format!("expected KEY=VALUE, found {token:?}")));
            };

            match key {
                "path" => path = Some(PathBuf::from(value)),
                "factor" => factor = parse_number(key, value)?,
                "order" => order = Some(parse_number(key, value)?),
                _ => return Err(LmError::Config(format!("unknown parameter {key:?}"))),
            }
        }

        let path = path.ok_or_else(|| LmError::Config("missing parameter \"path\"".to_owned()))?;
        let order = order.ok_or_else(|| LmError::Config("missing parameter \"order\"".to_owned()))?;
        if order == 0 {
            return Err(LmError::Config("order must be at least 1".to_owned()));
        }

        Ok(Self { path, factor, order })
    }
}

fn parse_number(key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| LmError::Config(format!("{key}={value} is not a non-negative integer")))
}

/// Persisted defaults for the command-line scorer.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub model_path: Option<PathBuf>,
    pub order: usize,
    pub factor: usize,
    pub factor_delimiter: char,
    /// Score the sentence-end marker after each sentence.
    pub sentence_end: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: None,
            order: 3,
            factor: 0,
            factor_delimiter: FACTOR_DELIMITER,
            sentence_end: true,
        }
    }
}

impl Config {
    pub fn load() -> std::result::Result<Self, confy::ConfyError> {
        match confy::load(APP_NAME, Some("config")) {
            Ok(config) => Ok(config),
            Err(err) => {
                log::warn!("Failed to load config, using defaults: {err}");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self) -> std::result::Result<(), confy::ConfyError> {
        confy::store(APP_NAME, Some("config"), self)
    }

    /// Language-model parameters, once a model path is known.
    pub fn lm_config(&self) -> Result<LmConfig> {
        let path = self
            .model_path
            .as_ref()
            .ok_or_else(|| LmError::Config("no model path configured".to_owned()))?;
        if self.order == 0 {
            return Err(LmError::Config("order must be at least 1".to_owned()));
        }
        Ok(LmConfig {
            path: path.clone(),
            factor: self.factor,
            order: self.order,
        })
    }
}
