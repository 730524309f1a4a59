// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// A checkpoint directory looks like:
//
//   log/classifier/<run>/
//     model_step_120.<ext>   ← weights saved at step 120
//     model_step_240.<ext>   ← weights saved at step 240
//     checkpoint.json        ← which checkpoints exist, which is latest,
//                              and the global step to resume from
//     train_config.json      ← hyperparameters, to rebuild the model
//     best/
//       model_step_240.<ext>
//       checkpoint.json
//
// Only the newest `max_to_keep` weight files are kept; older ones
// are deleted whenever a new checkpoint is written.
//
// A directory without checkpoint.json has no checkpoint: `state()`
// returns None and callers decide what that means.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;

const STATE_FILE:  &str = "checkpoint.json";
const CONFIG_FILE: &str = "train_config.json";

/// Contents of checkpoint.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointState {
    /// Stem of the newest weights file
    pub model_checkpoint_path:      String,
    /// Stems of every retained weights file, oldest first
    pub all_model_checkpoint_paths: Vec<String>,
    /// Step the training loop resumes at
    pub global_step:                usize,
}

pub struct CheckpointManager {
    dir:         PathBuf,
    max_to_keep: usize,
}

impl CheckpointManager {
    /// Manager for an existing or future checkpoint directory.
    /// Nothing is created until the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), max_to_keep: 1 }
    }

    pub fn with_max_to_keep(mut self, max_to_keep: usize) -> Self {
        self.max_to_keep = max_to_keep.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", self.dir.display()))
    }

    /// Save weights taken at `step`; a resumed run restarts at `global_step`.
    pub fn save_model<B: Backend, M: Module<B>>(
        &self,
        model:       &M,
        step:        usize,
        global_step: usize,
    ) -> Result<PathBuf> {
        self.ensure_dir()?;

        let stem = format!("model_step_{step}");
        let path = self.dir.join(&stem);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let mut state = self.state()?.unwrap_or(CheckpointState {
            model_checkpoint_path:      stem.clone(),
            all_model_checkpoint_paths: Vec::new(),
            global_step,
        });
        state.all_model_checkpoint_paths.retain(|s| s != &stem);
        state.all_model_checkpoint_paths.push(stem.clone());
        state.model_checkpoint_path = stem;
        state.global_step = global_step;

        let excess = state
            .all_model_checkpoint_paths
            .len()
            .saturating_sub(self.max_to_keep);
        for old in state.all_model_checkpoint_paths.drain(..excess) {
            self.remove_weights(&old)?;
        }

        self.write_state(&state)?;
        tracing::debug!("Saved checkpoint '{}' (step {})", path.display(), step);
        Ok(path)
    }

    /// Restore the newest weights into `model`.
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        let state = self.state()?.with_context(|| {
            format!("No checkpoint found in '{}'", self.dir.display())
        })?;
        let path = self.dir.join(&state.model_checkpoint_path);

        tracing::debug!("Restoring weights from '{}'", path.display());

        let record: M::Record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        Ok(model.load_record(record))
    }

    /// checkpoint.json, or `None` if nothing was saved here yet.
    pub fn state(&self) -> Result<Option<CheckpointState>> {
        let path = self.dir.join(STATE_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        let state = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt checkpoint state '{}'", path.display()))?;
        Ok(Some(state))
    }

    fn write_state(&self, state: &CheckpointState) -> Result<()> {
        let path = self.dir.join(STATE_FILE);
        fs::write(&path, serde_json::to_string_pretty(state)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    // The recorder appends its own extension, so match on "<stem>.".
    fn remove_weights(&self, stem: &str) -> Result<()> {
        let prefix = format!("{stem}.");
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                fs::remove_file(entry.path())
                    .with_context(|| format!("Cannot remove '{}'", entry.path().display()))?;
                tracing::debug!("Removed old checkpoint '{}'", entry.path().display());
            }
        }
        Ok(())
    }

    /// Write train_config.json so `eval` can rebuild the model.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Read train_config.json from this directory or its parent
    /// (a `best/` directory shares its run's config).
    pub fn load_config(&self) -> Result<TrainConfig> {
        let candidates = std::iter::once(self.dir.as_path())
            .chain(self.dir.parent())
            .map(|d| d.join(CONFIG_FILE));

        for path in candidates {
            if path.exists() {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
                return serde_json::from_str(&json)
                    .with_context(|| format!("Corrupt config '{}'", path.display()));
            }
        }
        anyhow::bail!(
            "Cannot find {CONFIG_FILE} in '{}' or its parent. Has this run been trained?",
            self.dir.display()
        )
    }
}
