// ============================================================
// Layer 5 — Optimizer and Learning Rate Schedule
// ============================================================
// The optimizer is picked at runtime (adam / sgd / momentum) but
// Burn optimizers are distinct concrete types. Instead of naming
// them, `build_optimizer` hands the constructed optimizer to a
// `WithOptimizer` visitor whose `run` is generic over it, so the
// training loop is monomorphised once per optimizer.
//
// L2 regularisation is applied as weight decay.
//
// Learning rate decay is exponential with a staircase:
//
//   lr(step) = initial * factor ^ floor(step / steps_per_decay)
//
// Reference: Burn Book §5 (Optimizers)
//            Kingma & Ba (2015) Adam

use burn::{
    module::AutodiffModule,
    optim::{
        decay::WeightDecayConfig, momentum::MomentumConfig, AdamConfig, Optimizer, SgdConfig,
    },
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::domain::kinds::OptimizerKind;

// ─── Learning rate ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningRateSchedule {
    pub initial: f64,
    /// (steps_per_decay, factor); `None` keeps the rate constant
    pub decay:   Option<(usize, f64)>,
}

impl LearningRateSchedule {
    pub fn constant(initial: f64) -> Self {
        Self { initial, decay: None }
    }

    pub fn staircase(initial: f64, steps_per_decay: usize, factor: f64) -> Self {
        Self { initial, decay: Some((steps_per_decay.max(1), factor)) }
    }

    pub fn lr_at(&self, step: usize) -> f64 {
        match self.decay {
            None => self.initial,
            Some((steps_per_decay, factor)) => {
                let exponent = (step / steps_per_decay) as i32;
                self.initial * factor.powi(exponent)
            }
        }
    }
}

// ─── Optimizer ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub kind:       OptimizerKind,
    /// Only used by `OptimizerKind::Momentum`
    pub momentum:   f64,
    pub l2_penalty: f64,
}

/// Receives the optimizer chosen at runtime.
pub trait WithOptimizer<B: AutodiffBackend, M: AutodiffModule<B>> {
    type Output;

    fn run<O: Optimizer<M, B>>(self, optimizer: O) -> Self::Output;
}

pub fn build_optimizer<B, M, V>(settings: &OptimizerSettings, visitor: V) -> V::Output
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    V: WithOptimizer<B, M>,
{
    let weight_decay = (settings.l2_penalty > 0.0)
        .then(|| WeightDecayConfig::new(settings.l2_penalty as f32));

    tracing::info!(
        "Optimizer: {} (l2_penalty={}{})",
        settings.kind,
        settings.l2_penalty,
        if settings.kind == OptimizerKind::Momentum {
            format!(", momentum={}", settings.momentum)
        } else {
            String::new()
        }
    );

    match settings.kind {
        OptimizerKind::Adam => visitor.run(
            AdamConfig::new()
                .with_epsilon(1e-8)
                .with_weight_decay(weight_decay)
                .init::<B, M>(),
        ),
        OptimizerKind::Sgd => visitor.run(
            SgdConfig::new()
                .with_weight_decay(weight_decay)
                .init::<B, M>(),
        ),
        OptimizerKind::Momentum => visitor.run(
            SgdConfig::new()
                .with_weight_decay(weight_decay)
                .with_momentum(Some(MomentumConfig::new().with_momentum(settings.momentum)))
                .init::<B, M>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_schedule() {
        let s = LearningRateSchedule::constant(0.01);
        assert_eq!(s.lr_at(0), 0.01);
        assert_eq!(s.lr_at(10_000), 0.01);
    }

    #[test]
    fn test_staircase_decay() {
        let s = LearningRateSchedule::staircase(0.1, 100, 0.5);
        assert_eq!(s.lr_at(0), 0.1);
        assert_eq!(s.lr_at(99), 0.1);
        assert!((s.lr_at(100) - 0.05).abs() < 1e-12);
        assert!((s.lr_at(250) - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_zero_steps_per_decay_is_clamped() {
        let s = LearningRateSchedule::staircase(1.0, 0, 0.5);
        assert!((s.lr_at(2) - 0.25).abs() < 1e-12);
    }
}
