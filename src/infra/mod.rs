// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of a run:
//
//   checkpoint.rs — model weights via Burn's CompactRecorder,
//                   checkpoint.json bookkeeping (latest, retained,
//                   global step) and train_config.json.
//
//   metrics.rs    — scalar summaries (loss, learning rate, metric
//                   values) appended to per-phase CSV files.
//
//   results.rs    — the shared validation_results.txt and
//                   test_results.txt run ledgers.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Scalar summary CSV writer
pub mod metrics;

/// Run result ledgers
pub mod results;
