// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe what the harness works with:
// which split to read, which model to build, how a metric is
// aggregated and judged.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Train / validation / test split selector
pub mod input_type;

// Model, dataset, optimizer and device selectors
pub mod kinds;

// Metric descriptors and their trend semantics
pub mod metric;

// A single tabular example
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;

// Typed evaluation failures
pub mod error;
