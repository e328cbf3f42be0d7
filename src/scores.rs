//! Score accumulation.
//!
//! Feature functions only report raw, additive contributions through
//! [`ScoreSink`]. Weighting them into a hypothesis total is the sink's job.

/// Receives additive score contributions.
pub trait ScoreSink {
    fn plus_equals(&mut self, feature_index: usize, score: f32);
}

/// Per-feature raw scores plus their weighted total.
#[derive(Debug, Clone, PartialEq)]
pub struct Scores {
    weights: Vec<f32>,
    values: Vec<f32>,
    total: f32,
}

impl Scores {
    pub fn new(weights: Vec<f32>) -> Self {
        let values = vec![0.0; weights.len()];
        Self { weights, values, total: 0.0 }
    }

    /// `num_scores` features, each weighted 1.
    pub fn unweighted(num_scores: usize) -> Self {
        Self::new(vec![1.0; num_scores])
    }

    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn get(&self, feature_index: usize) -> f32 {
        self.values.get(feature_index).copied().unwrap_or(0.0)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Adds every component of `other`.
    pub fn add(&mut self, other: &Scores) {
        for (index, &value) in other.values.iter().enumerate() {
            self.plus_equals(index, value);
        }
    }
}

impl ScoreSink for Scores {
    fn plus_equals(&mut self, feature_index: usize, score: f32) {
        debug_assert!(feature_index < self.values.len(), "feature index out of range");
        if let Some(value) = self.values.get_mut(feature_index) {
            *value += score;
            self.total += self.weights[feature_index] * score;
        }
    }
}
