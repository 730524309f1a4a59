// ============================================================
// Layer 3 — Metric Descriptors
// ============================================================
// A metric descriptor says what to measure and how to read it:
//
//   name                — key used in reports and summaries
//   kind                — which metric function computes it per batch
//   positive_trend_sign — +1 if bigger is better, -1 if smaller is
//   model_selection     — true if the best checkpoint is chosen by it
//   average             — true: mean over batches, false: plain sum
//
// The actual tensor math lives in ml/metrics.rs; this layer only
// knows the semantics.

use serde::{Deserialize, Serialize};

/// The metric functions available to evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Fraction of top-1 predictions equal to the label
    Accuracy,
    /// Mean softmax cross entropy against the label
    CrossEntropy,
    /// Number of top-1 predictions equal to the label
    Correct,
    /// Mean squared error between reconstruction and input
    ReconstructionError,
    /// Sum of squared errors between reconstruction and input
    SquaredErrorSum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    pub name:                String,
    pub kind:                MetricKind,
    pub positive_trend_sign: i8,
    pub model_selection:     bool,
    pub average:             bool,
}

impl MetricDescriptor {
    pub fn new(
        name:                impl Into<String>,
        kind:                MetricKind,
        positive_trend_sign: i8,
        model_selection:     bool,
        average:             bool,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            positive_trend_sign,
            model_selection,
            average,
        }
    }

    fn higher_is_better(&self) -> bool {
        self.positive_trend_sign >= 0
    }

    /// Value reported when there is no checkpoint to evaluate:
    /// the worst possible value for this metric's trend.
    pub fn missing_checkpoint_value(&self) -> f64 {
        if self.higher_is_better() {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }
    }

    /// Starting point for "best so far" tracking.
    pub fn worst_value(&self) -> f64 {
        self.missing_checkpoint_value()
    }

    /// True if `candidate` is strictly better than `best`.
    pub fn improves(&self, candidate: f64, best: f64) -> bool {
        if candidate.is_nan() {
            return false;
        }
        if self.higher_is_better() {
            candidate > best
        } else {
            candidate < best
        }
    }

    /// Fold per-batch values into the reported value.
    pub fn aggregate(&self, sum: f64, steps: usize) -> f64 {
        if self.average {
            sum / steps as f64
        } else {
            sum
        }
    }
}

/// The first metric flagged for model selection.
pub fn selection_metric(metrics: &[MetricDescriptor]) -> Option<&MetricDescriptor> {
    metrics.iter().find(|m| m.model_selection)
}
