use serde::{Deserialize, Serialize};

/// One tabular example: a dense feature vector and its class label.
/// Autoencoders ignore the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub features: Vec<f32>,
    pub label:    usize,
}

impl Sample {
    pub fn new(features: Vec<f32>, label: usize) -> Self {
        Self { features, label }
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }
}
