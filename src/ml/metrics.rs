// ============================================================
// Layer 5 — Metric Functions
// ============================================================
// Per-batch implementations of every MetricKind. Evaluators
// call `compute` once per batch and aggregate the scalars.

use burn::{
    nn::loss::{CrossEntropyLossConfig, MseLoss, Reduction},
    prelude::*,
};

use crate::domain::{error::EvalError, metric::MetricDescriptor, metric::MetricKind};
use crate::ml::model::Target;

/// Value of `metric` on one batch of paired predictions and targets.
/// Multiple pairs are averaged.
pub fn compute<B: Backend>(
    metric:      &MetricDescriptor,
    predictions: &[Tensor<B, 2>],
    targets:     &[Target<B>],
) -> Result<f64, EvalError> {
    let mut total = 0.0;
    for (prediction, target) in predictions.iter().zip(targets) {
        total += compute_pair(metric, prediction.clone(), target)?;
    }
    Ok(total / predictions.len().max(1) as f64)
}

fn compute_pair<B: Backend>(
    metric:     &MetricDescriptor,
    prediction: Tensor<B, 2>,
    target:     &Target<B>,
) -> Result<f64, EvalError> {
    match (metric.kind, target) {
        (MetricKind::Accuracy, Target::Labels(labels)) => {
            let n = labels.dims()[0].max(1) as f64;
            Ok(correct(prediction, labels.clone()) / n)
        }
        (MetricKind::Correct, Target::Labels(labels)) => Ok(correct(prediction, labels.clone())),
        (MetricKind::CrossEntropy, Target::Labels(labels)) => {
            let ce = CrossEntropyLossConfig::new().init(&prediction.device());
            Ok(ce.forward(prediction, labels.clone()).into_scalar().elem::<f64>())
        }
        (MetricKind::ReconstructionError, Target::Values(values)) => Ok(MseLoss::new()
            .forward(prediction, values.clone(), Reduction::Mean)
            .into_scalar()
            .elem::<f64>()),
        (MetricKind::SquaredErrorSum, Target::Values(values)) => Ok(MseLoss::new()
            .forward(prediction, values.clone(), Reduction::Sum)
            .into_scalar()
            .elem::<f64>()),
        (MetricKind::Accuracy | MetricKind::Correct | MetricKind::CrossEntropy, _) => {
            Err(EvalError::TargetMismatch { metric: metric.name.clone(), expected: "label" })
        }
        (MetricKind::ReconstructionError | MetricKind::SquaredErrorSum, _) => {
            Err(EvalError::TargetMismatch { metric: metric.name.clone(), expected: "value" })
        }
    }
}

/// Number of rows whose argmax equals the label.
fn correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> f64 {
    // argmax(1) is [batch, 1]; flatten before comparing with [batch]
    logits
        .argmax(1)
        .flatten::<1>(0, 1)
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn logits(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2> {
        // argmax per row: 1, 0, 2, 2
        Tensor::from_data(
            TensorData::new(
                vec![0.1f32, 0.9, 0.0, 2.0, 1.0, 0.0, 0.0, 0.0, 3.0, 0.2, 0.1, 0.7],
                [4, 3],
            ),
            device,
        )
    }

    fn labels(device: &<TestBackend as Backend>::Device) -> Target<TestBackend> {
        Target::Labels(Tensor::from_data(TensorData::new(vec![1i64, 0, 1, 2], [4]), device))
    }

    fn metric(kind: MetricKind) -> MetricDescriptor {
        MetricDescriptor::new("m", kind, 1, false, true)
    }

    #[test]
    fn test_accuracy_and_correct() {
        let device = Default::default();
        let acc = compute(&metric(MetricKind::Accuracy), &[logits(&device)], &[labels(&device)]).unwrap();
        assert!((acc - 0.75).abs() < 1e-9);

        let n = compute(&metric(MetricKind::Correct), &[logits(&device)], &[labels(&device)]).unwrap();
        assert_eq!(n, 3.0);
    }

    #[test]
    fn test_cross_entropy_is_positive() {
        let device = Default::default();
        let ce = compute(&metric(MetricKind::CrossEntropy), &[logits(&device)], &[labels(&device)]).unwrap();
        assert!(ce > 0.0);
    }

    #[test]
    fn test_reconstruction_errors() {
        let device = Default::default();
        let pred: Tensor<TestBackend, 2> =
            Tensor::from_data(TensorData::new(vec![1.0f32, 2.0, 3.0, 4.0], [2, 2]), &device);
        let target = Target::Values(Tensor::from_data(
            TensorData::new(vec![1.0f32, 0.0, 3.0, 2.0], [2, 2]),
            &device,
        ));

        let mse = compute(&metric(MetricKind::ReconstructionError), &[pred.clone()], &[target.clone()]).unwrap();
        assert!((mse - 2.0).abs() < 1e-6);

        let sse = compute(&metric(MetricKind::SquaredErrorSum), &[pred], &[target]).unwrap();
        assert!((sse - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_wrong_target_kind_is_rejected() {
        let device = Default::default();
        let err = compute(
            &metric(MetricKind::ReconstructionError),
            &[logits(&device)],
            &[labels(&device)],
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::TargetMismatch { expected: "value", .. }));
    }
}
