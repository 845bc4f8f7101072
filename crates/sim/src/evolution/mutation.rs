//! Mutation operators for expression levels.
//!
//! A mutation pass visits every (individual, gene) cell in row-major order.
//! For each cell one uniform decision value and one standard-normal value are
//! drawn; the normal draw is only applied when the decision falls below the
//! mutation rate.
//!
//! ## Draw streams
//! Decisions and perturbations come from two separate generators, both seeded
//! from the caller's stream at the start of the pass ([`MutationDraws`]).
//! Because each cell consumes exactly one value from each, a per-cell loop
//! and a pass that draws two N·G-length vectors up front read identical
//! values, and the caller's stream advances by the same two draws either way.

use crate::base::ExpressionMatrix;
use crate::errors::ModelError;
use rand::distr::StandardUniform;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::StandardNormal;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Paired decision/perturbation streams for one mutation pass.
#[derive(Debug, Clone)]
pub struct MutationDraws {
    decisions: Xoshiro256PlusPlus,
    perturbations: Xoshiro256PlusPlus,
}

impl MutationDraws {
    /// Derive both streams from two draws of `rng`.
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let decision_seed: u64 = rng.random();
        let perturbation_seed: u64 = rng.random();
        Self {
            decisions: Xoshiro256PlusPlus::seed_from_u64(decision_seed),
            perturbations: Xoshiro256PlusPlus::seed_from_u64(perturbation_seed),
        }
    }

    /// Next uniform decision value in [0, 1).
    #[inline]
    pub fn next_decision(&mut self) -> f64 {
        self.decisions.random()
    }

    /// Next standard-normal perturbation.
    #[inline]
    pub fn next_perturbation(&mut self) -> f64 {
        self.perturbations.sample(StandardNormal)
    }

    /// The next `len` decision values in one call.
    pub fn decisions(&mut self, len: usize) -> Vec<f64> {
        (&mut self.decisions)
            .sample_iter(StandardUniform)
            .take(len)
            .collect()
    }

    /// The next `len` standard-normal perturbations in one call.
    pub fn perturbations(&mut self, len: usize) -> Vec<f64> {
        (&mut self.perturbations)
            .sample_iter(StandardNormal)
            .take(len)
            .collect()
    }
}

/// Capability shared by every mutation operator.
pub trait MutationModel: fmt::Debug + Send + Sync {
    /// Mutate a single cell, consuming exactly one decision and one
    /// perturbation from `draws`.
    fn mutate_value(&self, value: f64, draws: &mut MutationDraws) -> f64;

    /// Mutate the whole matrix in place and hand it back.
    ///
    /// The default applies [`mutate_value`](Self::mutate_value) per cell in
    /// row-major order.
    fn mutate_batch<'m>(
        &self,
        expression: &'m mut ExpressionMatrix,
        rng: &mut dyn RngCore,
    ) -> Result<&'m mut ExpressionMatrix, ModelError> {
        let mut draws = MutationDraws::from_rng(rng);
        expression.for_each_row_major_mut(|_, _, v| *v = self.mutate_value(*v, &mut draws));
        Ok(expression)
    }
}

/// Floor at exactly 0.0 (also maps -0.0 and NaN to 0.0).
#[inline]
fn floor_at_zero(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Gaussian point mutation.
///
/// Each cell mutates with probability `rate`; a mutated cell receives a
/// perturbation drawn from `N(0, magnitude)` and is then floored at 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMutation {
    /// Per-cell, per-generation mutation probability
    pub rate: f64,
    /// Standard deviation of the Gaussian perturbation
    pub magnitude: f64,
}

impl PointMutation {
    /// # Errors
    /// `ModelError::Configuration` if `rate` is outside [0, 1] or `magnitude`
    /// is negative or not finite.
    pub fn new(rate: f64, magnitude: f64) -> Result<Self, ModelError> {
        let model = Self { rate, magnitude };
        model.validate()?;
        Ok(model)
    }

    /// An operator that never changes anything (rate 0).
    pub fn none() -> Self {
        Self {
            rate: 0.0,
            magnitude: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !(0.0..=1.0).contains(&self.rate) {
            return Err(ModelError::Configuration(format!(
                "mutation rate {} must be between 0.0 and 1.0",
                self.rate
            )));
        }
        if !self.magnitude.is_finite() || self.magnitude < 0.0 {
            return Err(ModelError::Configuration(format!(
                "mutation magnitude {} must be finite and >= 0.0",
                self.magnitude
            )));
        }
        Ok(())
    }

    #[inline]
    fn apply(&self, value: f64, decision: f64, perturbation: f64) -> f64 {
        if decision < self.rate {
            floor_at_zero(value + perturbation * self.magnitude)
        } else {
            value
        }
    }
}

impl MutationModel for PointMutation {
    #[inline]
    fn mutate_value(&self, value: f64, draws: &mut MutationDraws) -> f64 {
        let decision = draws.next_decision();
        let perturbation = draws.next_perturbation();
        self.apply(value, decision, perturbation)
    }

    fn mutate_batch<'m>(
        &self,
        expression: &'m mut ExpressionMatrix,
        rng: &mut dyn RngCore,
    ) -> Result<&'m mut ExpressionMatrix, ModelError> {
        let mut draws = MutationDraws::from_rng(rng);
        let (n, g) = expression.shape();
        let decisions = draws.decisions(n * g);
        let perturbations = draws.perturbations(n * g);

        let mut cell = 0;
        expression.for_each_row_major_mut(|_, _, v| {
            *v = self.apply(*v, decisions[cell], perturbations[cell]);
            cell += 1;
        });
        Ok(expression)
    }
}
