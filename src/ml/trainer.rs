// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Step-driven training with periodic checkpoint + evaluation.
//
//   steps_per_epoch = ceil(num_train / batch_size)
//   max_steps       = steps_per_epoch * epochs
//
// Every step:
//   - next minibatch from a shuffled, augmenting DataLoader
//     (the loader is restarted when an epoch runs out)
//   - forward, loss, backward, optimizer step at lr_at(step)
//   - NaN loss ends the loop
//
// Every 10 steps: throughput log line + loss / learning_rate /
// metric-on-batch summaries.
//
// At every epoch boundary and on the last step:
//   - save the train checkpoint (two kept) with global_step = step + 1
//   - evaluate the selection metric on validation by restoring it
//   - evaluate the same metric on the current batch with the
//     inference copy of the model (model.valid(), no autodiff)
//   - copy the weights to best/ when validation improved
//
// Validation goes through `eval_fn`, which reads the checkpoint from
// disk, so it may run on a different backend than training.
//
// Reference: Burn Book §5 (Custom Training Loop)

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    augmentation::Augmentation,
    batcher::{Batch, TabularBatcher},
    dataset::TabularDataset,
};
use crate::domain::{input_type::InputType, metric::MetricDescriptor, sample::Sample};
use crate::infra::{checkpoint::CheckpointManager, metrics::SummaryWriter};
use crate::ml::{
    metrics::compute,
    model::Network,
    optimizer::{build_optimizer, LearningRateSchedule, OptimizerSettings, WithOptimizer},
};

const LOG_EVERY:      usize = 10;
const TRAIN_KEEP:     usize = 2;
const LOADER_WORKERS: usize = 2;

/// Loop parameters that do not depend on the model type.
#[derive(Debug, Clone)]
pub struct TrainSettings {
    pub batch_size:   usize,
    pub epochs:       usize,
    pub schedule:     LearningRateSchedule,
    pub optimizer:    OptimizerSettings,
    pub restart:      bool,
    pub augmentation: Option<Augmentation>,
    pub seed:         u64,
    /// Train checkpoints and summaries
    pub log_dir:      PathBuf,
    /// Best checkpoint by validation
    pub best_dir:     PathBuf,
}

impl TrainSettings {
    pub fn steps_per_epoch(&self, num_examples: usize) -> usize {
        num_examples.div_ceil(self.batch_size.max(1)).max(1)
    }

    pub fn max_steps(&self, num_examples: usize) -> usize {
        self.steps_per_epoch(num_examples) * self.epochs
    }
}

/// Train `model` on `samples` and return the best validation value of
/// `metric`. `eval_fn(checkpoint_dir, split)` evaluates `metric` on the
/// checkpoint stored in `checkpoint_dir`.
pub fn train<B, M, F>(
    model:    M,
    samples:  Vec<Sample>,
    settings: &TrainSettings,
    metric:   &MetricDescriptor,
    device:   &B::Device,
    eval_fn:  F,
) -> Result<f64>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Network<B>,
    M::InnerModule: Network<B::InnerBackend>,
    F: FnMut(&Path, InputType) -> Result<f64>,
{
    if samples.is_empty() {
        anyhow::bail!("The train split is empty; nothing to train on");
    }

    let run = TrainRun {
        model,
        samples,
        settings,
        metric,
        device: device.clone(),
        eval_fn,
        _b: std::marker::PhantomData,
    };
    build_optimizer::<B, M, _>(&settings.optimizer, run)
}

struct TrainRun<'a, B: AutodiffBackend, M, F> {
    model:    M,
    samples:  Vec<Sample>,
    settings: &'a TrainSettings,
    metric:   &'a MetricDescriptor,
    device:   B::Device,
    eval_fn:  F,
    _b:       std::marker::PhantomData<B>,
}

impl<B, M, F> WithOptimizer<B, M> for TrainRun<'_, B, M, F>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Network<B>,
    M::InnerModule: Network<B::InnerBackend>,
    F: FnMut(&Path, InputType) -> Result<f64>,
{
    type Output = Result<f64>;

    fn run<O: Optimizer<M, B>>(self, mut optim: O) -> Result<f64> {
        let TrainRun { mut model, samples, settings, metric, device, mut eval_fn, .. } = self;

        let num_examples    = samples.len();
        let steps_per_epoch = settings.steps_per_epoch(num_examples);
        let max_steps       = settings.max_steps(num_examples);

        let train_ckpt = CheckpointManager::new(&settings.log_dir).with_max_to_keep(TRAIN_KEEP);
        let best_ckpt  = CheckpointManager::new(&settings.best_dir);

        // ── Resume ────────────────────────────────────────────────────────────
        let mut start_step = 0;
        if !settings.restart {
            match train_ckpt.state()? {
                Some(state) => {
                    model = train_ckpt.load_model::<B, _>(model, &device)?;
                    start_step = state.global_step;
                    tracing::info!("Restored checkpoint, resuming at step {}", start_step);
                }
                None => tracing::info!("Unable to restore from checkpoint"),
            }
        }

        let train_log      = SummaryWriter::new(settings.log_dir.join("train"))?;
        let validation_log = SummaryWriter::new(settings.log_dir.join("validation"))?;

        // ── Input pipeline ────────────────────────────────────────────────────
        let batcher = TabularBatcher::with_optional(settings.augmentation, settings.seed);
        let loader = DataLoaderBuilder::<B, _, _>::new(batcher)
            .batch_size(settings.batch_size)
            .shuffle(settings.seed)
            .num_workers(LOADER_WORKERS)
            .set_device(device.clone())
            .build(TabularDataset::new(samples));
        let mut batches = std::iter::repeat_with(|| loader.iter()).flatten();

        tracing::info!(
            "Training {} on {} examples: {} steps/epoch, {} steps total",
            model.name(),
            num_examples,
            steps_per_epoch,
            max_steps
        );

        let mut best_value = metric.worst_value();

        for step in start_step..max_steps {
            let batch = batches
                .next()
                .context("Training data loader produced no batches")?;

            let start_time = Instant::now();
            let lr = settings.schedule.lr_at(step);

            let loss = model.loss(&batch);
            let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();

            if loss_value.is_nan() {
                tracing::error!("Model diverged with loss = NaN");
                break;
            }

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(lr, model, grads);

            let duration = start_time.elapsed().as_secs_f64().max(f64::EPSILON);

            let log_step = step % LOG_EVERY == 0;
            if log_step {
                let examples_per_sec = batch.batch_size() as f64 / duration;
                tracing::info!(
                    "step {}, loss = {:.4} ({:.1} examples/sec; {:.3} sec/batch)",
                    step,
                    loss_value,
                    examples_per_sec,
                    duration
                );
                train_log.add_scalar(step, "loss", loss_value)?;
                train_log.add_scalar(step, "learning_rate", lr)?;
                let train_value = batch_metric(&model, batch.clone(), metric)?;
                train_log.add_scalar(step, &metric.name, train_value)?;
            }

            // ── End of epoch ──────────────────────────────────────────────────
            if (step > 0 && step % steps_per_epoch == 0) || step + 1 == max_steps {
                train_ckpt.save_model::<B, _>(&model, step, step + 1)?;

                let validation_value = eval_fn(train_ckpt.dir(), InputType::Validation)?;
                validation_log.add_scalar(step, &metric.name, validation_value)?;

                let train_value = batch_metric(&model, batch, metric)?;
                if !log_step {
                    train_log.add_scalar(step, &metric.name, train_value)?;
                }

                tracing::info!(
                    "({}): train {} = {:.3} validation {} = {:.3}",
                    step / steps_per_epoch,
                    metric.name,
                    train_value,
                    metric.name,
                    validation_value
                );

                if metric.improves(validation_value, best_value) {
                    best_value = validation_value;
                    best_ckpt.save_model::<B, _>(&model, step, step + 1)?;
                    tracing::info!("New best validation {} = {:.4}", metric.name, best_value);
                }
            }
        }

        Ok(best_value)
    }
}

// `metric` on one training batch, through the inference copy of the model.
fn batch_metric<B, M>(model: &M, batch: Batch<B>, metric: &MetricDescriptor) -> Result<f64>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    M::InnerModule: Network<B::InnerBackend>,
{
    let inference = model.valid();
    let batch = batch.inner();
    let predictions = inference.predict(batch.inputs.clone());
    let targets = inference.targets(&batch);
    Ok(compute(metric, &predictions, &targets)?)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::domain::{kinds::OptimizerKind, metric::MetricKind};
    use crate::ml::model::ClassifierConfig;

    type TestBackend = Autodiff<NdArray>;

    fn samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                let label = i % 2;
                let x = if label == 0 { -1.0 } else { 1.0 };
                Sample::new(vec![x, x * 0.5, 0.1], label)
            })
            .collect()
    }

    fn settings(dir: &Path, epochs: usize, restart: bool) -> TrainSettings {
        TrainSettings {
            batch_size:   4,
            epochs,
            schedule:     LearningRateSchedule::constant(0.05),
            optimizer:    OptimizerSettings { kind: OptimizerKind::Adam, momentum: 0.9, l2_penalty: 0.0 },
            restart,
            augmentation: None,
            seed:         7,
            log_dir:      dir.to_path_buf(),
            best_dir:     dir.join("best"),
        }
    }

    fn accuracy() -> MetricDescriptor {
        MetricDescriptor::new("accuracy", MetricKind::Accuracy, 1, true, true)
    }

    #[test]
    fn test_step_arithmetic() {
        let s = settings(Path::new("x"), 3, true);
        assert_eq!(s.steps_per_epoch(10), 3);
        assert_eq!(s.max_steps(10), 9);
        assert_eq!(s.steps_per_epoch(8), 2);
    }

    #[test]
    fn test_empty_train_split_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let model = ClassifierConfig::new(3, vec![4], 2).init::<TestBackend>(&Default::default());
        let result = train::<TestBackend, _, _>(
            model,
            Vec::new(),
            &settings(dir.path(), 1, true),
            &accuracy(),
            &Default::default(),
            |_: &Path, _: InputType| Ok(0.0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_train_saves_checkpoints_and_tracks_best() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = settings(dir.path(), 3, true);
        let model = ClassifierConfig::new(3, vec![4], 2).init::<TestBackend>(&Default::default());

        // validation values handed out in order, one per epoch boundary
        let mut scripted = vec![0.5, 0.8, 0.6].into_iter();
        let mut evaluated = Vec::new();
        let best = train::<TestBackend, _, _>(
            model,
            samples(8),
            &cfg,
            &accuracy(),
            &Default::default(),
            |ckpt: &Path, split: InputType| {
                evaluated.push((ckpt.to_path_buf(), split));
                Ok(scripted.next().unwrap_or(0.0))
            },
        )
        .unwrap();

        // 2 steps/epoch, 6 steps: boundaries at steps 2, 4 and the last step 5
        assert_eq!(evaluated.len(), 3);
        assert!(evaluated.iter().all(|(p, s)| p == dir.path() && *s == InputType::Validation));
        assert_eq!(best, 0.8);

        let train_state = CheckpointManager::new(dir.path()).state().unwrap().unwrap();
        assert_eq!(train_state.global_step, 6);
        assert_eq!(train_state.all_model_checkpoint_paths.len(), 2);

        let best_state = CheckpointManager::new(dir.path().join("best")).state().unwrap().unwrap();
        assert_eq!(best_state.model_checkpoint_path, "model_step_4");

        let summaries = std::fs::read_to_string(dir.path().join("train/summaries.csv")).unwrap();
        assert!(summaries.contains("0,loss,"));
        assert!(summaries.contains("0,accuracy,"));
        assert!(summaries.contains("0,learning_rate,0.050000"));
        assert!(summaries.contains("5,accuracy,"));
    }

    #[test]
    fn test_resume_continues_from_global_step() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let init = || ClassifierConfig::new(3, vec![4], 2).init::<TestBackend>(&device);

        train::<TestBackend, _, _>(init(), samples(8), &settings(dir.path(), 1, true), &accuracy(), &device, |_: &Path, _: InputType| Ok(0.1)).unwrap();

        // one more epoch on top of the first: only the second epoch's steps run
        let mut calls = 0;
        train::<TestBackend, _, _>(init(), samples(8), &settings(dir.path(), 2, false), &accuracy(), &device, |_: &Path, _: InputType| {
            calls += 1;
            Ok(0.2)
        })
        .unwrap();
        assert_eq!(calls, 2);

        let state = CheckpointManager::new(dir.path()).state().unwrap().unwrap();
        assert_eq!(state.global_step, 4);
    }

    #[test]
    fn test_nan_loss_stops_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let model = ClassifierConfig::new(3, vec![4], 2).init::<TestBackend>(&Default::default());
        let poisoned: Vec<Sample> = (0..8)
            .map(|i| Sample::new(vec![f32::NAN, 0.0, 1.0], i % 2))
            .collect();

        let mut calls = 0;
        let best = train::<TestBackend, _, _>(
            model,
            poisoned,
            &settings(dir.path(), 2, true),
            &accuracy(),
            &Default::default(),
            |_: &Path, _: InputType| {
                calls += 1;
                Ok(1.0)
            },
        )
        .unwrap();

        assert_eq!(best, f64::NEG_INFINITY);
        assert_eq!(calls, 0);
        assert!(CheckpointManager::new(dir.path()).state().unwrap().is_none());
        assert!(CheckpointManager::new(dir.path().join("best")).state().unwrap().is_none());
    }
}
