// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The burn-specific half of the harness: networks, losses,
// metric functions, optimizers and the loops that drive them.
//
//   model.rs     — Network trait, dense Classifier and Autoencoder
//                  (Linear + ReLU + dropout stacks)
//
//   metrics.rs   — per-batch metric functions (accuracy, cross
//                  entropy, reconstruction error, ...)
//
//   optimizer.rs — Adam / SGD / momentum selection, L2 weight
//                  decay, staircase learning-rate schedule
//
//   trainer.rs   — step-driven training loop with checkpointing,
//                  validation and best-model tracking
//
//   evaluator.rs — restores a checkpoint and scores it on a split
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Network trait and the dense model families
pub mod model;

/// Batch-level metric functions
pub mod metrics;

/// Optimizer construction and learning-rate schedule
pub mod optimizer;

/// Training loop
pub mod trainer;

/// Checkpoint evaluation
pub mod evaluator;
