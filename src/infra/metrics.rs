// ============================================================
// Layer 6 — Summary Writer
// ============================================================
// Records scalar summaries of a run to CSV, one file per phase:
//
//   log/<model>/<run>/train/summaries.csv
//   log/<model>/<run>/validation/summaries.csv
//
// Each row is (step, tag, value), e.g.
//
//   step,tag,value
//   0,loss,2.301585
//   0,learning_rate,0.001000
//   120,accuracy,0.734375
//
// Files are appended to, so a resumed run continues the same
// curves. Plot with anything that reads CSV.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

pub struct SummaryWriter {
    csv_path: PathBuf,
}

impl SummaryWriter {
    /// Writer for `<dir>/summaries.csv`. Writes the header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create summary dir '{}'", dir.display()))?;

        let csv_path = dir.join("summaries.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "step,tag,value")?;
            tracing::debug!("Created summaries CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one scalar.
    pub fn add_scalar(&self, step: usize, tag: &str, value: f64) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        writeln!(f, "{step},{tag},{value:.6}")?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
