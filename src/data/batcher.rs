// ============================================================
// Layer 4 — Tabular Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<Sample> into
// device tensors.
//
//   Input:  N samples with F features each
//   Output: Batch { inputs: [N, F] float, labels: [N] int }
//
// When an Augmentation is configured every batch gets its own
// RNG, seeded from the batcher seed and a running batch counter.
// The DataLoader may call `batch` from several worker threads,
// so the counter is atomic and shared between clones.
//
// Reference: Burn Book §4 (Batcher)

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::data::augmentation::Augmentation;
use crate::domain::sample::Sample;

// ─── Batch ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct Batch<B: Backend> {
    /// Feature matrix — shape: [batch_size, num_features]
    pub inputs: Tensor<B, 2>,

    /// Class labels — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> Batch<B> {
    pub fn batch_size(&self) -> usize {
        self.inputs.dims()[0]
    }
}

impl<B: AutodiffBackend> Batch<B> {
    /// The same batch without gradient tracking.
    pub fn inner(self) -> Batch<B::InnerBackend> {
        Batch {
            inputs: self.inputs.inner(),
            labels: self.labels.inner(),
        }
    }
}

// ─── TabularBatcher ───────────────────────────────────────────────────────────
#[derive(Clone, Debug, Default)]
pub struct TabularBatcher {
    augmentation: Option<Augmentation>,
    seed:         u64,
    counter:      Arc<AtomicU64>,
}

impl TabularBatcher {
    /// Batcher that passes features through unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Batcher that distorts every batch with `augmentation`.
    pub fn augmenting(augmentation: Augmentation, seed: u64) -> Self {
        Self {
            augmentation: augmentation.non_identity(),
            seed,
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// `augmenting` if `augmentation` is given, plain otherwise.
    pub fn with_optional(augmentation: Option<Augmentation>, seed: u64) -> Self {
        match augmentation {
            Some(a) => Self::augmenting(a, seed),
            None    => Self::new(),
        }
    }
}

impl<B: Backend> Batcher<B, Sample, Batch<B>> for TabularBatcher {
    fn batch(&self, items: Vec<Sample>, device: &B::Device) -> Batch<B> {
        let batch_size   = items.len();
        let num_features = items.first().map_or(0, Sample::num_features);

        let mut features: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        if let Some(aug) = &self.augmentation {
            let n = self.counter.fetch_add(1, Ordering::Relaxed);
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(n));
            for row in features.chunks_mut(num_features.max(1)) {
                aug.apply(row, &mut rng);
            }
        }

        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();

        let inputs = Tensor::<B, 2>::from_data(
            TensorData::new(features, [batch_size, num_features]),
            device,
        );
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            device,
        );

        Batch { inputs, labels }
    }
}
