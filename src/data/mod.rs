// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from files on disk to tensor batches.
//
//   train.csv / validation.csv / test.csv
//       │            (BlobsSource writes them on first use)
//       ▼
//   CsvLoader         → parses rows into Samples
//       │
//       ▼
//   splitter          → carves validation out of train if needed
//       │
//       ▼
//   Standardizer      → per-feature zero mean / unit variance
//       │
//       ▼
//   TabularDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   TabularBatcher    → stacks samples, applies Augmentation
//       │
//       ▼
//   DataLoader        → worker threads feed the loops
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads split CSV files; the CsvSource dataset handle
pub mod loader;

/// Standardises features using statistics of the train split
pub mod preprocessor;

/// Seeded shuffling and train/validation splitting
pub mod splitter;

/// Synthetic Gaussian-cluster dataset
pub mod synthetic;

/// Implements Burn's Dataset trait over Samples
pub mod dataset;

/// Input distortions applied at batch time
pub mod augmentation;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
