// ============================================================
// Layer 4 — Feature Standardizer
// ============================================================
// Rescales every feature to zero mean and unit variance.
//
// The statistics come from the TRAIN split only and are then
// applied to all three splits, so validation and test numbers
// are not influenced by their own distribution.
//
// Constant features would divide by zero; their std is floored
// at STD_FLOOR which leaves them centred at 0.

use crate::domain::sample::Sample;

const STD_FLOOR: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    mean: Vec<f32>,
    std:  Vec<f32>,
}

impl Standardizer {
    /// Compute per-feature mean and (population) std.
    pub fn fit(samples: &[Sample]) -> Self {
        let width = samples.first().map_or(0, Sample::num_features);
        let n     = samples.len().max(1) as f64;

        let mut mean = vec![0.0f64; width];
        for s in samples {
            for (m, &x) in mean.iter_mut().zip(&s.features) {
                *m += x as f64;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0f64; width];
        for s in samples {
            for ((v, &x), m) in var.iter_mut().zip(&s.features).zip(&mean) {
                let d = x as f64 - m;
                *v += d * d;
            }
        }

        Self {
            mean: mean.iter().map(|&m| m as f32).collect(),
            std:  var
                .iter()
                .map(|&v| ((v / n).sqrt() as f32).max(STD_FLOOR))
                .collect(),
        }
    }

    pub fn apply(&self, samples: &mut [Sample]) {
        for s in samples {
            for ((x, m), sd) in s.features.iter_mut().zip(&self.mean).zip(&self.std) {
                *x = (*x - m) / sd;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_split_becomes_zero_mean_unit_std() {
        let mut samples = vec![
            Sample::new(vec![1.0, 10.0], 0),
            Sample::new(vec![3.0, 10.0], 1),
        ];
        let s = Standardizer::fit(&samples);
        s.apply(&mut samples);

        assert!((samples[0].features[0] + 1.0).abs() < 1e-6);
        assert!((samples[1].features[0] - 1.0).abs() < 1e-6);
        // constant column stays finite
        assert_eq!(samples[0].features[1], 0.0);
    }

    #[test]
    fn test_other_splits_use_train_statistics() {
        let train = vec![Sample::new(vec![0.0], 0), Sample::new(vec![2.0], 0)];
        let s = Standardizer::fit(&train);
        let mut test = vec![Sample::new(vec![4.0], 0)];
        s.apply(&mut test);
        // mean 1, std 1
        assert!((test[0].features[0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_fit_is_a_no_op() {
        let s = Standardizer::fit(&[]);
        let mut none: Vec<Sample> = Vec::new();
        s.apply(&mut none);
        assert!(none.is_empty());
    }
}
