// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run in order:
//
//   Step 1: Resolve run name and directories
//             log_dir  = <log_root>/<model>/<run name>
//             best_dir = <log_dir>/best
//   Step 2: Prepare the dataset               (Layer 4 - data)
//   Step 3: Wipe log_dir when restarting, save config (Layer 6)
//   Step 4: Pick backends for the train and eval devices and
//           build the model + its evaluator    (Layer 5 - ml)
//   Step 5: Run the training loop              (Layer 5 - ml)
//   Step 6: Append the best validation value, evaluate best/
//           on test and append that too        (Layer 6 - infra)
//
// Reference: Rust Book §10 (Generics), §13 (Closures)
//            Burn Book §5 (Training)

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use burn::{
    backend::{Autodiff, NdArray, Wgpu},
    module::AutodiffModule,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    augmentation::Augmentation,
    loader::CsvSource,
    synthetic::{BlobsConfig, BlobsSource},
};
use crate::domain::{
    input_type::InputType,
    kinds::{DatasetKind, DeviceKind, ModelKind, OptimizerKind},
    metric::selection_metric,
    traits::InputSource,
};
use crate::infra::{checkpoint::CheckpointManager, results::ResultLog};
use crate::ml::{
    evaluator::{AutoencoderEvaluator, ClassifierEvaluator, Evaluator},
    model::{AutoencoderConfig, ClassifierConfig, Network},
    optimizer::{LearningRateSchedule, OptimizerSettings},
    trainer::{train, TrainSettings},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything needed to rebuild a run. Saved as train_config.json
// next to the checkpoints so `eval` can reconstruct the model and
// the dataset without repeating the flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub model:           ModelKind,
    pub dataset:         DatasetKind,
    /// Defaults to data/<dataset>
    pub data_dir:        Option<String>,
    pub log_root:        String,
    pub results_dir:     String,
    /// Overrides the generated run name
    pub name:            Option<String>,
    pub batch_size:      usize,
    pub epochs:          usize,
    pub optimizer:       OptimizerKind,
    pub learning_rate:   f64,
    pub momentum:        f64,
    pub lr_decay:        bool,
    pub lr_decay_epochs: usize,
    pub lr_decay_factor: f64,
    pub l2_penalty:      f64,
    pub restart:         bool,
    pub train_device:    DeviceKind,
    pub eval_device:     DeviceKind,
    pub hidden_dims:     Vec<usize>,
    pub latent_dim:      usize,
    pub dropout:         f64,
    pub augment_noise:   f64,
    pub augment_drop:    f64,
    pub seed:            u64,
    pub blob_classes:    usize,
    pub blob_features:   usize,
    pub blob_samples:    usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model:           ModelKind::Classifier,
            dataset:         DatasetKind::Blobs,
            data_dir:        None,
            log_root:        "log".to_string(),
            results_dir:     ".".to_string(),
            name:            None,
            batch_size:      32,
            epochs:          20,
            optimizer:       OptimizerKind::Adam,
            learning_rate:   1e-3,
            momentum:        0.9,
            lr_decay:        false,
            lr_decay_epochs: 25,
            lr_decay_factor: 0.1,
            l2_penalty:      0.0,
            restart:         false,
            train_device:    DeviceKind::Cpu,
            eval_device:     DeviceKind::Cpu,
            hidden_dims:     vec![64, 32],
            latent_dim:      4,
            dropout:         0.0,
            augment_noise:   0.0,
            augment_drop:    0.0,
            seed:            42,
            blob_classes:    3,
            blob_features:   8,
            blob_samples:    600,
        }
    }
}

impl TrainConfig {
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(dir),
            None      => Path::new("data").join(self.dataset.as_str()),
        }
    }

    /// `<log_root>/<model>/<run name>`
    pub fn log_dir(&self) -> PathBuf {
        Path::new(&self.log_root)
            .join(self.model.as_str())
            .join(run_name(self))
    }

    pub fn best_dir(&self) -> PathBuf {
        self.log_dir().join("best")
    }

    /// Training-time input distortion, `None` when it would be a no-op.
    pub fn augmentation(&self) -> Option<Augmentation> {
        Augmentation::new(self.augment_noise as f32, self.augment_drop as f32).non_identity()
    }

    pub fn optimizer_settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            kind:       self.optimizer,
            momentum:   self.momentum,
            l2_penalty: self.l2_penalty,
        }
    }

    /// Staircase decay every `lr_decay_epochs` epochs, when enabled.
    pub fn schedule(&self, steps_per_epoch: usize) -> LearningRateSchedule {
        if self.lr_decay {
            LearningRateSchedule::staircase(
                self.learning_rate,
                steps_per_epoch * self.lr_decay_epochs,
                self.lr_decay_factor,
            )
        } else {
            LearningRateSchedule::constant(self.learning_rate)
        }
    }

    pub fn classifier_config(&self, dataset: &dyn InputSource) -> ClassifierConfig {
        ClassifierConfig::new(dataset.num_features(), self.hidden_dims.clone(), dataset.num_classes())
            .with_dropout(self.dropout)
    }

    pub fn autoencoder_config(&self, dataset: &dyn InputSource) -> AutoencoderConfig {
        AutoencoderConfig::new(dataset.num_features(), self.hidden_dims.clone(), self.latent_dim)
            .with_dropout(self.dropout)
    }
}

/// Run name derived from the hyperparameters, unless one was given:
///
///   blobs_adam_lr=0.001_bs=32[_decay=0.1x25][_l2=0.0005]
pub fn run_name(cfg: &TrainConfig) -> String {
    if let Some(name) = &cfg.name {
        return name.clone();
    }
    let mut name = format!(
        "{}_{}_lr={}_bs={}",
        cfg.dataset, cfg.optimizer, cfg.learning_rate, cfg.batch_size
    );
    if cfg.lr_decay {
        name.push_str(&format!("_decay={}x{}", cfg.lr_decay_factor, cfg.lr_decay_epochs));
    }
    if cfg.l2_penalty > 0.0 {
        name.push_str(&format!("_l2={}", cfg.l2_penalty));
    }
    name
}

/// Build the configured InputSource and make its splits available.
pub fn prepare_dataset(cfg: &TrainConfig) -> Result<Arc<dyn InputSource>> {
    let dir = cfg.data_dir();
    let mut source: Box<dyn InputSource> = match cfg.dataset {
        DatasetKind::Blobs => Box::new(BlobsSource::new(
            &dir,
            BlobsConfig {
                num_classes:       cfg.blob_classes,
                num_features:      cfg.blob_features,
                samples_per_split: cfg.blob_samples,
                seed:              cfg.seed,
            },
        )),
        DatasetKind::Csv => Box::new(CsvSource::new(&dir, cfg.seed)),
    };
    source
        .prepare()
        .with_context(|| format!("Cannot prepare dataset '{}' in '{}'", cfg.dataset, dir.display()))?;

    tracing::info!(
        "Dataset '{}': {} features, {} classes, {}/{}/{} train/validation/test examples",
        source.name(),
        source.num_features(),
        source.num_classes(),
        source.num_examples(InputType::Train),
        source.num_examples(InputType::Validation),
        source.num_examples(InputType::Test),
    );
    Ok(Arc::from(source))
}

/// Values a finished run reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainOutcome {
    pub best_validation: f64,
    /// `None` when the dataset has no test split
    pub test:            Option<f64>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;

        // ── Step 1: Names and paths ───────────────────────────────────────────
        let name     = run_name(cfg);
        let log_dir  = cfg.log_dir();
        let best_dir = cfg.best_dir();
        tracing::info!("Run '{}' logging to '{}'", name, log_dir.display());

        // ── Step 2: Dataset ───────────────────────────────────────────────────
        let dataset = prepare_dataset(cfg)?;

        // ── Step 3: Fresh start and config ────────────────────────────────────
        if cfg.restart && log_dir.exists() {
            fs::remove_dir_all(&log_dir)
                .with_context(|| format!("Cannot remove '{}'", log_dir.display()))?;
            tracing::info!("Restart requested, removed '{}'", log_dir.display());
        }
        fs::create_dir_all(&best_dir)
            .with_context(|| format!("Cannot create '{}'", best_dir.display()))?;
        CheckpointManager::new(&log_dir).save_config(cfg)?;

        // ── Step 4: Backends ──────────────────────────────────────────────────
        let outcome = match (cfg.train_device, cfg.eval_device) {
            (DeviceKind::Cpu, DeviceKind::Cpu) => self.run_on::<Autodiff<NdArray>, NdArray>(dataset, &log_dir, &best_dir),
            (DeviceKind::Cpu, DeviceKind::Gpu) => self.run_on::<Autodiff<NdArray>, Wgpu>(dataset, &log_dir, &best_dir),
            (DeviceKind::Gpu, DeviceKind::Cpu) => self.run_on::<Autodiff<Wgpu>, NdArray>(dataset, &log_dir, &best_dir),
            (DeviceKind::Gpu, DeviceKind::Gpu) => self.run_on::<Autodiff<Wgpu>, Wgpu>(dataset, &log_dir, &best_dir),
        }?;

        // ── Step 6: Result ledgers ────────────────────────────────────────────
        let results_dir = Path::new(&cfg.results_dir);
        fs::create_dir_all(results_dir)
            .with_context(|| format!("Cannot create '{}'", results_dir.display()))?;
        ResultLog::validation(results_dir).append(cfg.model.as_str(), &name, outcome.best_validation)?;
        if let Some(test) = outcome.test {
            ResultLog::test(results_dir).append(cfg.model.as_str(), &name, test)?;
        }

        Ok(outcome)
    }

    fn run_on<TB, EB>(
        &self,
        dataset:  Arc<dyn InputSource>,
        log_dir:  &Path,
        best_dir: &Path,
    ) -> Result<TrainOutcome>
    where
        TB: AutodiffBackend,
        EB: Backend,
    {
        let cfg = &self.config;
        let train_device: TB::Device = Default::default();
        let eval_device:  EB::Device = Default::default();
        tracing::info!("Train device: {:?}, eval device: {:?}", train_device, eval_device);

        match cfg.model {
            ModelKind::Classifier => {
                let arch = cfg.classifier_config(dataset.as_ref());
                let evaluator = ClassifierEvaluator::<EB>::with(arch.init::<EB>(&eval_device), dataset.clone(), eval_device);
                self.fit::<TB, EB, _, _>(arch.init::<TB>(&train_device), evaluator, dataset, &train_device, log_dir, best_dir)
            }
            ModelKind::Autoencoder => {
                let arch = cfg.autoencoder_config(dataset.as_ref());
                let evaluator = AutoencoderEvaluator::<EB>::with(arch.init::<EB>(&eval_device), dataset.clone(), eval_device);
                self.fit::<TB, EB, _, _>(arch.init::<TB>(&train_device), evaluator, dataset, &train_device, log_dir, best_dir)
            }
        }
    }

    // ── Step 5: Train, then score best/ on test ───────────────────────────────
    fn fit<TB, EB, M, E>(
        &self,
        model:     M,
        evaluator: E,
        dataset:   Arc<dyn InputSource>,
        device:    &TB::Device,
        log_dir:   &Path,
        best_dir:  &Path,
    ) -> Result<TrainOutcome>
    where
        TB: AutodiffBackend,
        EB: Backend,
        M: AutodiffModule<TB> + Network<TB>,
        M::InnerModule: Network<TB::InnerBackend>,
        E: Evaluator<EB>,
    {
        let cfg = &self.config;
        let metrics = evaluator.metrics();
        let metric = selection_metric(&metrics)
            .context("Model has no metric flagged for model selection")?
            .clone();

        let samples = dataset.examples(InputType::Train)?;
        let steps_per_epoch = samples.len().div_ceil(cfg.batch_size.max(1)).max(1);

        let settings = TrainSettings {
            batch_size:   cfg.batch_size,
            epochs:       cfg.epochs,
            schedule:     cfg.schedule(steps_per_epoch),
            optimizer:    cfg.optimizer_settings(),
            restart:      cfg.restart,
            augmentation: cfg.augmentation(),
            seed:         cfg.seed,
            log_dir:      log_dir.to_path_buf(),
            best_dir:     best_dir.to_path_buf(),
        };

        let best_validation = train::<TB, M, _>(
            model,
            samples,
            &settings,
            &metric,
            device,
            |dir: &Path, split: InputType| evaluator.eval(&metric, dir, split, cfg.batch_size, None),
        )?;
        tracing::info!("Best validation {} = {:.4}", metric.name, best_validation);

        let test = if dataset.num_examples(InputType::Test) == 0 {
            tracing::warn!("Dataset '{}' has no test split, skipping test evaluation", dataset.name());
            None
        } else {
            let value = evaluator.eval(&metric, best_dir, InputType::Test, cfg.batch_size, None)?;
            tracing::info!("Test {} of best model = {:.4}", metric.name, value);
            Some(value)
        };

        Ok(TrainOutcome { best_validation, test })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(root: &Path) -> TrainConfig {
        TrainConfig {
            data_dir:      Some(root.join("data").to_string_lossy().into_owned()),
            log_root:      root.join("log").to_string_lossy().into_owned(),
            results_dir:   root.to_string_lossy().into_owned(),
            batch_size:    16,
            epochs:        2,
            learning_rate: 0.01,
            hidden_dims:   vec![8],
            latent_dim:    2,
            blob_features: 4,
            blob_samples:  48,
            restart:       true,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_run_name_from_hyperparameters() {
        let mut cfg = TrainConfig::default();
        assert_eq!(run_name(&cfg), "blobs_adam_lr=0.001_bs=32");

        cfg.lr_decay = true;
        cfg.l2_penalty = 0.0005;
        cfg.optimizer = OptimizerKind::Momentum;
        assert_eq!(run_name(&cfg), "blobs_momentum_lr=0.001_bs=32_decay=0.1x25_l2=0.0005");

        cfg.name = Some("custom".to_string());
        assert_eq!(run_name(&cfg), "custom");
    }

    #[test]
    fn test_log_dirs_follow_model_and_name() {
        let cfg = TrainConfig { name: Some("r1".to_string()), ..TrainConfig::default() };
        assert_eq!(cfg.log_dir(), Path::new("log").join("classifier").join("r1"));
        assert_eq!(cfg.best_dir(), cfg.log_dir().join("best"));
        assert_eq!(cfg.data_dir(), Path::new("data").join("blobs"));
    }

    #[test]
    fn test_schedule_decays_per_epoch_block() {
        let cfg = TrainConfig { lr_decay: true, lr_decay_epochs: 2, ..TrainConfig::default() };
        let s = cfg.schedule(5);
        assert_eq!(s.lr_at(9), 1e-3);
        assert!((s.lr_at(10) - 1e-4).abs() < 1e-12);
        assert_eq!(TrainConfig::default().schedule(5).lr_at(1000), 1e-3);
    }

    #[test]
    fn test_identity_augmentation_is_dropped() {
        assert!(TrainConfig::default().augmentation().is_none());
        let cfg = TrainConfig { augment_noise: 0.1, ..TrainConfig::default() };
        assert!(cfg.augmentation().is_some());
    }

    #[test]
    fn test_classifier_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = small_config(dir.path());
        let outcome = TrainUseCase::new(cfg.clone()).execute().unwrap();

        assert!((0.0..=1.0).contains(&outcome.best_validation));
        assert!(outcome.test.is_some());

        assert!(CheckpointManager::new(cfg.best_dir()).state().unwrap().is_some());
        assert!(cfg.log_dir().join("train_config.json").exists());

        let validation = fs::read_to_string(dir.path().join("validation_results.txt")).unwrap();
        assert!(validation.contains(&format!("classifier: {}", run_name(&cfg))));
        assert!(dir.path().join("test_results.txt").exists());
    }

    #[test]
    fn test_tiny_csv_without_validation_file_trains() {
        use crate::data::loader::write_csv;
        use crate::domain::sample::Sample;

        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        let rows: Vec<Sample> = (0..4)
            .map(|i| Sample::new(vec![i as f32, 1.0 - i as f32], i % 2))
            .collect();
        write_csv(&data.join("train.csv"), &rows).unwrap();
        write_csv(&data.join("test.csv"), &rows[..2]).unwrap();

        let cfg = TrainConfig {
            dataset:    DatasetKind::Csv,
            batch_size: 2,
            epochs:     1,
            ..small_config(dir.path())
        };
        let outcome = TrainUseCase::new(cfg).execute().unwrap();

        assert!((0.0..=1.0).contains(&outcome.best_validation));
        assert!(outcome.test.is_some());
        assert!(dir.path().join("validation_results.txt").exists());
    }

    #[test]
    fn test_autoencoder_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { model: ModelKind::Autoencoder, ..small_config(dir.path()) };
        let outcome = TrainUseCase::new(cfg).execute().unwrap();

        assert!(outcome.best_validation.is_finite());
        assert!(outcome.best_validation >= 0.0);
    }
}
