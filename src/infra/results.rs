// ============================================================
// Layer 6 — Result Logs
// ============================================================
// Every finished run appends one line to each of two flat files
// shared by all runs:
//
//   validation_results.txt   best validation value of the run
//   test_results.txt         test value of the best checkpoint
//
// Line format: "<local timestamp> <model>: <run name> <value>"

use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

pub const VALIDATION_RESULTS: &str = "validation_results.txt";
pub const TEST_RESULTS: &str = "test_results.txt";

pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn validation(dir: &Path) -> Self {
        Self::new(dir.join(VALIDATION_RESULTS))
    }

    pub fn test(dir: &Path) -> Self {
        Self::new(dir.join(TEST_RESULTS))
    }

    pub fn append(&self, model: &str, name: &str, value: f64) -> Result<()> {
        let line = format_line(&Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string(), model, name, value);
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Cannot open '{}'", self.path.display()))?;
        f.write_all(line.as_bytes())?;
        tracing::info!("Appended to '{}': {}", self.path.display(), line.trim_end());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn format_line(timestamp: &str, model: &str, name: &str, value: f64) -> String {
    format!("{timestamp} {model}: {name} {value}\n")
}
