// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow only: each use case wires the data, ml and infra
// layers together for one command.
//
//   train_use_case.rs    — `dytb train`: run config, dataset,
//                          backend dispatch, result ledgers
//
//   evaluate_use_case.rs — `dytb eval`: rebuild a run from its
//                          saved config and score a checkpoint
//
// No tensor math and no printing here; that belongs to Layers 5
// and 1.
//
// Reference: Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// The checkpoint evaluation workflow
pub mod evaluate_use_case;
