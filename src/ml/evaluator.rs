// ============================================================
// Layer 5 — Evaluators
// ============================================================
// An evaluator scores a trained checkpoint on one split of a
// dataset. It holds:
//
//   model   — a network with the right architecture; weights are
//             restored into a copy of it on every eval
//   dataset — the InputSource to read splits from
//   metrics — what this kind of model is judged on
//
// eval() flow:
//   1. read the split, check predictions/targets cardinality
//   2. no checkpoint.json → worst value for the metric (±inf)
//   3. restore weights, run ceil(examples / batch_size) batches
//   4. average or sum the per-batch values
//
// stats() runs every metric on train, validation and test.
//
// Reference: Burn Book §4 (DataLoader), §5 (Records)

use std::{collections::BTreeMap, marker::PhantomData, path::Path, sync::Arc};

use anyhow::Result;
use burn::{
    data::dataloader::{batcher::Batcher, DataLoaderBuilder},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    augmentation::Augmentation,
    batcher::{Batch, TabularBatcher},
    dataset::TabularDataset,
};
use crate::domain::{
    error::EvalError,
    input_type::InputType,
    metric::{MetricDescriptor, MetricKind},
    traits::InputSource,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    metrics::compute,
    model::{Autoencoder, Classifier, Network},
};

/// Seed for evaluation-time augmentation; fixed so repeated evals agree.
const EVAL_AUGMENTATION_SEED: u64 = 0x5eed;

/// Per-split metric values, keyed by metric name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub train:      BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub validation: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub test:       BTreeMap<String, f64>,
}

impl Stats {
    pub fn split_mut(&mut self, input_type: InputType) -> &mut BTreeMap<String, f64> {
        match input_type {
            InputType::Train      => &mut self.train,
            InputType::Validation => &mut self.validation,
            InputType::Test       => &mut self.test,
        }
    }
}

pub trait Evaluator<B: Backend> {
    type Net: Network<B>;

    /// The network whose architecture checkpoints are restored into
    fn model(&self) -> Result<&Self::Net, EvalError>;

    fn set_model(&mut self, model: Self::Net);

    fn dataset(&self) -> Result<&dyn InputSource, EvalError>;

    fn set_dataset(&mut self, dataset: Arc<dyn InputSource>);

    fn metrics(&self) -> Vec<MetricDescriptor>;

    fn device(&self) -> &B::Device;

    /// Value of `metric` for the newest checkpoint in `checkpoint_dir`
    /// on the `input_type` split.
    fn eval(
        &self,
        metric:         &MetricDescriptor,
        checkpoint_dir: &Path,
        input_type:     InputType,
        batch_size:     usize,
        augmentation:   Option<Augmentation>,
    ) -> Result<f64> {
        let model   = self.model()?;
        let dataset = self.dataset()?;
        let device  = self.device();
        let batch_size = batch_size.max(1);

        let samples = dataset.examples(input_type)?;
        if samples.is_empty() {
            return Err(EvalError::EmptySplit(input_type).into());
        }

        // Predictions and targets are paired one to one by the metric.
        // The check batch is never augmented; augmented batches start
        // at counter zero.
        let check = samples[..batch_size.min(samples.len())].to_vec();
        let check: Batch<B> = TabularBatcher::new().batch(check, device);
        let predictions = model.predict(check.inputs.clone()).len();
        let targets     = model.targets(&check).len();
        if predictions != targets {
            return Err(EvalError::Cardinality {
                model:   model.name().to_string(),
                dataset: dataset.name().to_string(),
                predictions,
                targets,
            }
            .into());
        }

        let checkpoints = CheckpointManager::new(checkpoint_dir);
        if checkpoints.state()?.is_none() {
            tracing::warn!("No checkpoint file found in '{}'", checkpoint_dir.display());
            return Ok(metric.missing_checkpoint_value());
        }
        let model = checkpoints.load_model::<B, _>(model.clone(), device)?;

        let batcher = TabularBatcher::with_optional(augmentation, EVAL_AUGMENTATION_SEED);
        let num_examples = samples.len();
        let num_iter     = num_examples.div_ceil(batch_size);

        let loader = DataLoaderBuilder::<B, _, _>::new(batcher)
            .batch_size(batch_size)
            .num_workers(1)
            .set_device(device.clone())
            .build(TabularDataset::new(samples));

        let mut step = 0usize;
        let mut metric_value_sum = 0.0f64;
        for batch in loader.iter().take(num_iter) {
            step += 1;
            let predictions = model.predict(batch.inputs.clone());
            let targets     = model.targets(&batch);
            metric_value_sum += compute(metric, &predictions, &targets)?;
        }

        let value = metric.aggregate(metric_value_sum, step.max(1));
        tracing::debug!(
            "{} on {} ({} batches): {:.6}",
            metric.name,
            input_type,
            step,
            value
        );
        Ok(value)
    }

    /// Every metric on every non-empty split.
    fn stats(
        &self,
        checkpoint_dir: &Path,
        batch_size:     usize,
        augmentation:   Option<Augmentation>,
    ) -> Result<Stats> {
        let metrics = self.metrics();
        let dataset = self.dataset()?;
        let mut stats = Stats::default();
        for input_type in InputType::ALL {
            if dataset.num_examples(input_type) == 0 {
                tracing::warn!("Skipping the empty {} split", input_type);
                continue;
            }
            for metric in &metrics {
                let value = self.eval(metric, checkpoint_dir, input_type, batch_size, augmentation)?;
                stats.split_mut(input_type).insert(metric.name.clone(), value);
            }
        }
        Ok(stats)
    }
}

// ─── Metric sets ──────────────────────────────────────────────────────────────
/// What each model family is measured on.
pub trait DefaultMetrics {
    fn default_metrics() -> Vec<MetricDescriptor>;
}

impl<B: Backend> DefaultMetrics for Classifier<B> {
    fn default_metrics() -> Vec<MetricDescriptor> {
        vec![
            MetricDescriptor::new("accuracy", MetricKind::Accuracy, 1, true, true),
            MetricDescriptor::new("cross_entropy", MetricKind::CrossEntropy, -1, false, true),
            MetricDescriptor::new("correct", MetricKind::Correct, 1, false, false),
        ]
    }
}

impl<B: Backend> DefaultMetrics for Autoencoder<B> {
    fn default_metrics() -> Vec<MetricDescriptor> {
        vec![
            MetricDescriptor::new("error", MetricKind::ReconstructionError, -1, true, true),
            MetricDescriptor::new("squared_error_sum", MetricKind::SquaredErrorSum, -1, false, false),
        ]
    }
}

// ─── NetworkEvaluator ─────────────────────────────────────────────────────────
pub struct NetworkEvaluator<B: Backend, N> {
    model:   Option<N>,
    dataset: Option<Arc<dyn InputSource>>,
    device:  B::Device,
    _b:      PhantomData<B>,
}

pub type ClassifierEvaluator<B> = NetworkEvaluator<B, Classifier<B>>;
pub type AutoencoderEvaluator<B> = NetworkEvaluator<B, Autoencoder<B>>;

impl<B: Backend, N> NetworkEvaluator<B, N> {
    /// An evaluator with neither model nor dataset set.
    pub fn new(device: B::Device) -> Self {
        Self { model: None, dataset: None, device, _b: PhantomData }
    }

    pub fn with(model: N, dataset: Arc<dyn InputSource>, device: B::Device) -> Self {
        Self { model: Some(model), dataset: Some(dataset), device, _b: PhantomData }
    }
}

impl<B: Backend, N: Network<B> + DefaultMetrics> Evaluator<B> for NetworkEvaluator<B, N> {
    type Net = N;

    fn model(&self) -> Result<&N, EvalError> {
        self.model.as_ref().ok_or(EvalError::NoModel)
    }

    fn set_model(&mut self, model: N) {
        self.model = Some(model);
    }

    fn dataset(&self) -> Result<&dyn InputSource, EvalError> {
        self.dataset.as_deref().ok_or(EvalError::NoDataset)
    }

    fn set_dataset(&mut self, dataset: Arc<dyn InputSource>) {
        self.dataset = Some(dataset);
    }

    fn metrics(&self) -> Vec<MetricDescriptor> {
        N::default_metrics()
    }

    fn device(&self) -> &B::Device {
        &self.device
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::synthetic::{BlobsConfig, BlobsSource};
    use crate::ml::model::{AutoencoderConfig, ClassifierConfig, Target};

    type TestBackend = NdArray;

    // Emits two predictions per batch against a single target.
    #[derive(Module, Debug)]
    struct TwoHeaded<B: Backend> {
        inner: Classifier<B>,
    }

    impl<B: Backend> Network<B> for TwoHeaded<B> {
        fn name(&self) -> &'static str {
            "two_headed"
        }

        fn predict(&self, inputs: Tensor<B, 2>) -> Vec<Tensor<B, 2>> {
            let logits = self.inner.forward(inputs);
            vec![logits.clone(), logits]
        }

        fn targets(&self, batch: &Batch<B>) -> Vec<Target<B>> {
            self.inner.targets(batch)
        }

        fn loss(&self, batch: &Batch<B>) -> Tensor<B, 1> {
            self.inner.loss(batch)
        }
    }

    impl<B: Backend> DefaultMetrics for TwoHeaded<B> {
        fn default_metrics() -> Vec<MetricDescriptor> {
            Classifier::<B>::default_metrics()
        }
    }

    fn blobs(dir: &Path) -> Arc<dyn InputSource> {
        let mut source = BlobsSource::new(
            dir,
            BlobsConfig { num_classes: 3, num_features: 4, samples_per_split: 30, seed: 1 },
        );
        source.prepare().unwrap();
        Arc::new(source)
    }

    fn classifier_evaluator(data: &Path) -> ClassifierEvaluator<TestBackend> {
        let device = Default::default();
        let model = ClassifierConfig::new(4, vec![8], 3).init(&device);
        ClassifierEvaluator::with(model, blobs(data), device)
    }

    #[test]
    fn test_missing_model_or_dataset() {
        let ev: ClassifierEvaluator<TestBackend> = NetworkEvaluator::new(Default::default());
        let metric = &ev.metrics()[0];
        let err = ev
            .eval(metric, Path::new("nowhere"), InputType::Test, 4, None)
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<EvalError>(), Some(EvalError::NoModel)));
    }

    #[test]
    fn test_cardinality_mismatch_is_reported_before_restore() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model = TwoHeaded { inner: ClassifierConfig::new(4, vec![8], 3).init(&device) };
        let ev: NetworkEvaluator<TestBackend, TwoHeaded<TestBackend>> =
            NetworkEvaluator::with(model, blobs(&dir.path().join("data")), device);

        // Reading this state file would fail, so reaching it would change the error
        let ckpt = dir.path().join("ckpt");
        std::fs::create_dir_all(&ckpt).unwrap();
        std::fs::write(ckpt.join("checkpoint.json"), "not json").unwrap();

        let err = ev.eval(&ev.metrics()[0], &ckpt, InputType::Test, 8, None).unwrap_err();
        match err.downcast_ref::<EvalError>() {
            Some(EvalError::Cardinality { model, predictions, targets, .. }) => {
                assert_eq!(model, "two_headed");
                assert_eq!((*predictions, *targets), (2, 1));
            }
            other => panic!("expected a cardinality error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_checkpoint_returns_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let ev = classifier_evaluator(&dir.path().join("data"));
        let ckpt = dir.path().join("empty");

        let accuracy = &ev.metrics()[0];
        let ce = &ev.metrics()[1];
        assert_eq!(ev.eval(accuracy, &ckpt, InputType::Validation, 8, None).unwrap(), f64::NEG_INFINITY);
        assert_eq!(ev.eval(ce, &ckpt, InputType::Validation, 8, None).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_eval_restores_checkpoint_and_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let ev = classifier_evaluator(&dir.path().join("data"));
        let ckpt = CheckpointManager::new(dir.path().join("ckpt"));
        ckpt.save_model::<TestBackend, _>(ev.model().unwrap(), 0, 1).unwrap();

        let metrics = ev.metrics();
        let accuracy = ev.eval(&metrics[0], ckpt.dir(), InputType::Test, 7, None).unwrap();
        assert!((0.0..=1.0).contains(&accuracy));

        // `correct` is summed, so it counts examples over the whole split
        let correct = ev.eval(&metrics[2], ckpt.dir(), InputType::Test, 7, None).unwrap();
        assert!(correct >= 0.0 && correct <= 30.0);
        assert_eq!(correct.fract(), 0.0);
    }

    #[test]
    fn test_augmented_eval_starts_at_first_seed() {
        let dir = tempfile::tempdir().unwrap();
        let ev = classifier_evaluator(&dir.path().join("data"));
        let ckpt = CheckpointManager::new(dir.path().join("ckpt"));
        ckpt.save_model::<TestBackend, _>(ev.model().unwrap(), 0, 1).unwrap();

        let aug = Augmentation::new(0.5, 0.0);
        let ce = &ev.metrics()[1];
        let value = ev.eval(ce, ckpt.dir(), InputType::Test, 30, Some(aug)).unwrap();

        // The whole split fits one batch: it must be the counter-zero batch
        let samples = ev.dataset().unwrap().examples(InputType::Test).unwrap();
        let batch: Batch<TestBackend> = TabularBatcher::augmenting(aug, EVAL_AUGMENTATION_SEED)
            .batch(samples, ev.device());
        let model = ckpt.load_model::<TestBackend, _>(ev.model().unwrap().clone(), ev.device()).unwrap();
        let expected = compute(ce, &model.predict(batch.inputs.clone()), &model.targets(&batch)).unwrap();
        assert!((value - expected).abs() < 1e-5);
    }

    #[test]
    fn test_stats_covers_every_split_and_metric() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model = AutoencoderConfig::new(4, vec![3], 2).init(&device);
        let ev: AutoencoderEvaluator<TestBackend> =
            NetworkEvaluator::with(model, blobs(&dir.path().join("data")), device);
        let ckpt = CheckpointManager::new(dir.path().join("ckpt"));
        ckpt.save_model::<TestBackend, _>(ev.model().unwrap(), 0, 1).unwrap();

        let stats = ev.stats(ckpt.dir(), 16, None).unwrap();
        for split in [&stats.train, &stats.validation, &stats.test] {
            assert_eq!(split.len(), 2);
            assert!(split["error"] > 0.0);
            assert!(split["squared_error_sum"] >= split["error"]);
        }
    }

    #[test]
    fn test_metric_sets_have_one_selection_metric() {
        for metrics in [
            <Classifier<TestBackend> as DefaultMetrics>::default_metrics(),
            <Autoencoder<TestBackend> as DefaultMetrics>::default_metrics(),
        ] {
            assert_eq!(metrics.iter().filter(|m| m.model_selection).count(), 1);
        }
    }
}
