// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The dataset handle. Trainers and evaluators only ever see an
// InputSource, so a synthetic generator and a directory of CSV
// files are interchangeable.
//
// Implementations:
//   - BlobsSource → seeded Gaussian clusters (data/synthetic.rs)
//   - CsvSource   → split files on disk       (data/loader.rs)

use anyhow::Result;

use crate::domain::input_type::InputType;
use crate::domain::sample::Sample;

pub trait InputSource: Send + Sync {
    /// Short name used in logs and run names
    fn name(&self) -> &str;

    /// Number of distinct labels
    fn num_classes(&self) -> usize;

    /// Width of every feature vector
    fn num_features(&self) -> usize;

    /// Number of examples in the given split
    fn num_examples(&self, input_type: InputType) -> usize;

    /// All examples of the given split, preprocessed and in file order
    fn examples(&self, input_type: InputType) -> Result<Vec<Sample>>;

    /// Make the data available locally (generate or check files).
    /// Must be called once before any of the accessors above.
    fn prepare(&mut self) -> Result<()>;
}
