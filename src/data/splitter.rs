// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles samples and splits them into two sets. Used when a
// dataset ships without its own validation file.
//
// The shuffle is seeded so that the same run name always sees
// the same validation examples, which keeps resumed runs and
// later `eval` calls consistent with the training run.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded shuffle of `samples`, then (first `train_fraction`, rest).
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    samples.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

    let keep = holdout_boundary(samples.len(), train_fraction);
    let validation = samples.split_off(keep);

    tracing::debug!(
        "Held out {} of {} examples for validation (seed {})",
        validation.len(),
        keep + validation.len(),
        seed
    );
    (samples, validation)
}

// Index of the first validation element; fractions outside [0, 1] are clamped.
// Any fraction below 1 holds out at least one element once there are two.
fn holdout_boundary(total: usize, train_fraction: f64) -> usize {
    let fraction = train_fraction.clamp(0.0, 1.0);
    let boundary = ((total as f64 * fraction).round() as usize).min(total);
    if fraction < 1.0 && total >= 2 {
        boundary.min(total - 1)
    } else {
        boundary
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ninety_ten_split() {
        let (train, validation) = split_train_val((0..200).collect::<Vec<u32>>(), 0.9, 3);
        assert_eq!((train.len(), validation.len()), (180, 20));

        let mut joined: Vec<u32> = train.into_iter().chain(validation).collect();
        joined.sort_unstable();
        assert_eq!(joined, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_seed_controls_the_holdout() {
        let split = |seed| split_train_val((0..40).collect::<Vec<u32>>(), 0.75, seed).1;
        assert_eq!(split(9), split(9));
        assert_ne!(split(9), split(10));
    }

    #[test]
    fn test_boundary_clamps() {
        assert_eq!(holdout_boundary(10, 1.5), 10);
        assert_eq!(holdout_boundary(10, -0.2), 0);
        assert_eq!(holdout_boundary(0, 0.9), 0);
    }

    #[test]
    fn test_small_sets_keep_one_for_validation() {
        assert_eq!(holdout_boundary(4, 0.9), 3);
        assert_eq!(holdout_boundary(2, 0.9), 1);
        assert_eq!(holdout_boundary(1, 0.9), 1);

        let (train, validation) = split_train_val(vec![1, 2, 3, 4], 0.9, 0);
        assert_eq!((train.len(), validation.len()), (3, 1));
    }
}
