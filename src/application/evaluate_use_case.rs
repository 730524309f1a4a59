// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores an existing checkpoint directory:
//
//   Step 1: Load train_config.json (from the dir or its parent)
//   Step 2: Rebuild the dataset exactly as training saw it
//   Step 3: Rebuild the model architecture on the eval backend
//   Step 4: Evaluate the requested metrics on the requested splits
//
// With neither a split nor a metric given, this is the full
// stats() report.

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use burn::{
    backend::{NdArray, Wgpu},
    prelude::*,
};

use crate::domain::{
    input_type::InputType, kinds::{DeviceKind, ModelKind}, traits::InputSource,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::evaluator::{AutoencoderEvaluator, ClassifierEvaluator, Evaluator, Stats};
use crate::application::train_use_case::{prepare_dataset, TrainConfig};

#[derive(Debug, Clone)]
pub struct EvaluateRequest {
    pub checkpoint_dir: PathBuf,
    /// Falls back to the batch size the run was trained with
    pub batch_size:     Option<usize>,
    /// All splits when `None`
    pub split:          Option<InputType>,
    /// All of the model's metrics when `None`
    pub metric:         Option<String>,
    pub device:         DeviceKind,
}

pub struct EvaluateUseCase {
    request: EvaluateRequest,
}

impl EvaluateUseCase {
    pub fn new(request: EvaluateRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<Stats> {
        let req = &self.request;

        let cfg = CheckpointManager::new(&req.checkpoint_dir).load_config()?;
        tracing::info!(
            "Evaluating {} checkpoint in '{}'",
            cfg.model,
            req.checkpoint_dir.display()
        );

        let dataset = prepare_dataset(&cfg)?;

        match req.device {
            DeviceKind::Cpu => self.run_on::<NdArray>(&cfg, dataset),
            DeviceKind::Gpu => self.run_on::<Wgpu>(&cfg, dataset),
        }
    }

    fn run_on<B: Backend>(&self, cfg: &TrainConfig, dataset: Arc<dyn InputSource>) -> Result<Stats> {
        let device: B::Device = Default::default();
        let batch_size = self.request.batch_size.unwrap_or(cfg.batch_size);

        match cfg.model {
            ModelKind::Classifier => {
                let model = cfg.classifier_config(dataset.as_ref()).init::<B>(&device);
                self.report(ClassifierEvaluator::<B>::with(model, dataset, device), batch_size)
            }
            ModelKind::Autoencoder => {
                let model = cfg.autoencoder_config(dataset.as_ref()).init::<B>(&device);
                self.report(AutoencoderEvaluator::<B>::with(model, dataset, device), batch_size)
            }
        }
    }

    fn report<B: Backend, E: Evaluator<B>>(&self, evaluator: E, batch_size: usize) -> Result<Stats> {
        let req = &self.request;
        let dir = req.checkpoint_dir.as_path();

        if req.split.is_none() && req.metric.is_none() {
            return evaluator.stats(dir, batch_size, None);
        }

        let mut metrics = evaluator.metrics();
        if let Some(name) = &req.metric {
            let known: Vec<String> = metrics.iter().map(|m| m.name.clone()).collect();
            metrics.retain(|m| &m.name == name);
            if metrics.is_empty() {
                anyhow::bail!(
                    "Unknown metric '{}' for this model, expected one of: {}",
                    name,
                    known.join(", ")
                );
            }
        }

        let splits = match req.split {
            Some(split) => vec![split],
            None => {
                let dataset = evaluator.dataset()?;
                InputType::ALL
                    .into_iter()
                    .filter(|&split| dataset.num_examples(split) > 0)
                    .collect()
            }
        };

        let mut stats = Stats::default();
        for split in splits {
            for metric in &metrics {
                let value = evaluator.eval(metric, dir, split, batch_size, None)?;
                stats.split_mut(split).insert(metric.name.clone(), value);
            }
        }
        Ok(stats)
    }
}
