//! Typed failures of the evaluation path.
//!
//! Everything else in the crate reports through `anyhow`; these are the
//! cases a caller may want to tell apart.

use thiserror::Error;

use crate::domain::input_type::InputType;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("evaluator has no model set")]
    NoModel,

    #[error("evaluator has no dataset set")]
    NoDataset,

    /// The model returned a different number of prediction tensors
    /// than the dataset/evaluator produced targets.
    #[error(
        "{model} predictions and {dataset} targets must have the same cardinality \
         but got: {predictions} vs {targets}"
    )]
    Cardinality {
        model:       String,
        dataset:     String,
        predictions: usize,
        targets:     usize,
    },

    #[error("metric '{metric}' requires {expected} targets")]
    TargetMismatch {
        metric:   String,
        expected: &'static str,
    },

    #[error("the {0} split is empty")]
    EmptySplit(InputType),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_message_names_both_sides() {
        let err = EvalError::Cardinality {
            model:       "autoencoder".into(),
            dataset:     "blobs".into(),
            predictions: 2,
            targets:     1,
        };
        assert_eq!(
            err.to_string(),
            "autoencoder predictions and blobs targets must have the same cardinality but got: 2 vs 1"
        );
        assert_eq!(EvalError::EmptySplit(InputType::Test).to_string(), "the test split is empty");
    }
}
