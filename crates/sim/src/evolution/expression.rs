//! Expression kinetics.
//!
//! An expression model maps the transcription-factor input a gene receives to
//! its expression level. Every model has a scalar form, [`ExpressionModel::compute`],
//! and a batch form over the whole population that must agree with the
//! scalar form cell by cell.
//!
//! ## Kinetics
//! - **Constant**: fixed level, input ignored
//! - **Linear**: `slope · tf + intercept`, unclamped
//! - **Hill**: saturating `v_max · tfⁿ / (kⁿ + tfⁿ)`, modelling cooperative
//!   binding of `n` transcription factors with half-saturation at `k`
//! - **Regulatory**: TF input taken from a [`RegulatoryNetwork`] applied to
//!   the previous generation, then passed through per-gene Linear or Hill
//!   kinetics

use crate::base::ExpressionMatrix;
use crate::errors::ModelError;
use crate::network::RegulatoryNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Capability shared by every expression model.
///
/// Implementors only need [`compute`](Self::compute); the batch methods
/// default to applying it once per cell in row-major order. Override them
/// for whole-matrix implementations, keeping the result identical.
pub trait ExpressionModel: fmt::Debug + Send + Sync {
    /// Expression level of `gene` given its TF input.
    fn compute(&self, gene: usize, tf_input: f64) -> f64;

    /// Number of genes this model is bound to, if it is gene-specific.
    fn gene_count(&self) -> Option<usize> {
        None
    }

    /// Level used for a gene when the caller supplies no initial matrix.
    fn default_level(&self, gene: usize) -> f64 {
        self.compute(gene, 0.0)
    }

    /// Compute the expression matrix for a population of `shape`
    /// `(n_individuals, n_genes)`.
    ///
    /// `None` means every gene receives TF input 0.
    ///
    /// # Errors
    /// `ModelError::ShapeMismatch` if `tf_input` does not have `shape`, or if
    /// the model is bound to a different gene count.
    fn compute_batch(
        &self,
        tf_input: Option<&ExpressionMatrix>,
        shape: (usize, usize),
    ) -> Result<ExpressionMatrix, ModelError> {
        let input = prepare_input(self.gene_count(), tf_input, shape)?;
        Ok(input.map_with_gene(|gene, tf| self.compute(gene, tf)))
    }

    /// Run one expression phase given the previous generation's matrix.
    ///
    /// Non-regulatory models receive no TF input.
    fn express(&self, previous: &ExpressionMatrix) -> Result<ExpressionMatrix, ModelError> {
        self.compute_batch(None, previous.shape())
    }
}

/// Validate the batch input shape and substitute zeros for a missing input.
fn prepare_input(
    gene_count: Option<usize>,
    tf_input: Option<&ExpressionMatrix>,
    (n, g): (usize, usize),
) -> Result<ExpressionMatrix, ModelError> {
    if let Some(expected) = gene_count {
        if expected != g {
            return Err(ModelError::shape("expression model gene count", expected, g));
        }
    }
    match tf_input {
        Some(input) => {
            input.check_shape(n, g, "expression TF input")?;
            Ok(input.clone())
        }
        None => Ok(ExpressionMatrix::zeros(n, g)),
    }
}

fn check_finite(parameter: &'static str, value: f64) -> Result<(), ModelError> {
    if !value.is_finite() {
        return Err(ModelError::domain(parameter, value, "finite"));
    }
    Ok(())
}

/// Fixed expression level broadcast to every cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantExpression {
    pub level: f64,
}

impl ConstantExpression {
    /// # Errors
    /// `ModelError::NumericDomain` if `level` is negative or not finite.
    pub fn new(level: f64) -> Result<Self, ModelError> {
        let model = Self { level };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        check_finite("level", self.level)?;
        if self.level < 0.0 {
            return Err(ModelError::domain("level", self.level, ">= 0"));
        }
        Ok(())
    }
}

impl ExpressionModel for ConstantExpression {
    #[inline]
    fn compute(&self, _gene: usize, _tf_input: f64) -> f64 {
        self.level
    }

    fn compute_batch(
        &self,
        tf_input: Option<&ExpressionMatrix>,
        shape: (usize, usize),
    ) -> Result<ExpressionMatrix, ModelError> {
        if let Some(input) = tf_input {
            input.check_shape(shape.0, shape.1, "expression TF input")?;
        }
        Ok(ExpressionMatrix::from_element(shape.0, shape.1, self.level))
    }
}

/// Linear response `slope · tf + intercept`.
///
/// The result is not clamped; a negative intercept can yield negative levels
/// until the next mutation pass floors them at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearExpression {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearExpression {
    /// # Errors
    /// `ModelError::NumericDomain` if either parameter is not finite.
    pub fn new(slope: f64, intercept: f64) -> Result<Self, ModelError> {
        let model = Self { slope, intercept };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        check_finite("slope", self.slope)?;
        check_finite("intercept", self.intercept)
    }

    #[inline]
    fn level(&self, tf_input: f64) -> f64 {
        self.slope * tf_input + self.intercept
    }
}

impl ExpressionModel for LinearExpression {
    #[inline]
    fn compute(&self, _gene: usize, tf_input: f64) -> f64 {
        self.level(tf_input)
    }

    fn compute_batch(
        &self,
        tf_input: Option<&ExpressionMatrix>,
        shape: (usize, usize),
    ) -> Result<ExpressionMatrix, ModelError> {
        let input = prepare_input(None, tf_input, shape)?;
        Ok(input.as_matrix().map(|tf| self.level(tf)).into())
    }
}

/// Saturating Hill response `v_max · tfⁿ / (kⁿ + tfⁿ)`.
///
/// Evaluated as `v_max / (1 + (k / tf)ⁿ)`, which is the same function but
/// does not overflow for large inputs. Non-positive input gives exactly 0.
/// The result lies in `[0, v_max]`: mathematically it stays below `v_max`,
/// but once `(k / tf)ⁿ` underflows against 1 it rounds to `v_max` exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HillExpression {
    /// Maximum expression rate (asymptote)
    pub v_max: f64,
    /// Half-saturation constant
    pub k: f64,
    /// Hill coefficient (cooperativity)
    pub n: f64,
}

impl HillExpression {
    /// # Errors
    /// `ModelError::NumericDomain` unless `v_max >= 0`, `k > 0` and `n >= 1`,
    /// all finite.
    pub fn new(v_max: f64, k: f64, n: f64) -> Result<Self, ModelError> {
        let model = Self { v_max, k, n };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        check_finite("v_max", self.v_max)?;
        check_finite("k", self.k)?;
        check_finite("n", self.n)?;
        if self.v_max < 0.0 {
            return Err(ModelError::domain("v_max", self.v_max, ">= 0"));
        }
        if self.k <= 0.0 {
            return Err(ModelError::domain("k", self.k, "> 0"));
        }
        if self.n < 1.0 {
            return Err(ModelError::domain("n", self.n, ">= 1"));
        }
        Ok(())
    }

    #[inline]
    fn level(&self, tf_input: f64) -> f64 {
        if tf_input <= 0.0 {
            return 0.0;
        }
        self.v_max / (1.0 + (self.k / tf_input).powf(self.n))
    }
}

impl ExpressionModel for HillExpression {
    #[inline]
    fn compute(&self, _gene: usize, tf_input: f64) -> f64 {
        self.level(tf_input)
    }

    fn compute_batch(
        &self,
        tf_input: Option<&ExpressionMatrix>,
        shape: (usize, usize),
    ) -> Result<ExpressionMatrix, ModelError> {
        let input = prepare_input(None, tf_input, shape)?;
        Ok(input.as_matrix().map(|tf| self.level(tf)).into())
    }
}

/// Kinetics usable inside a regulatory model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Kinetics {
    Linear(LinearExpression),
    Hill(HillExpression),
}

impl Kinetics {
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::Linear(m) => m.validate(),
            Self::Hill(m) => m.validate(),
        }
    }

    #[inline]
    pub fn level(&self, tf_input: f64) -> f64 {
        match self {
            Self::Linear(m) => m.level(tf_input),
            Self::Hill(m) => m.level(tf_input),
        }
    }
}

/// Kinetics assignment for a regulatory model: one shared response curve, or
/// one per gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneKinetics {
    Shared(Kinetics),
    PerGene(Vec<Kinetics>),
}

impl GeneKinetics {
    #[inline]
    fn for_gene(&self, gene: usize) -> &Kinetics {
        match self {
            Self::Shared(k) => k,
            Self::PerGene(ks) => &ks[gene],
        }
    }

    /// Validate every curve and, for per-gene kinetics, the gene count.
    pub fn validate(&self, n_genes: usize) -> Result<(), ModelError> {
        match self {
            Self::Shared(k) => k.validate(),
            Self::PerGene(ks) => {
                if ks.len() != n_genes {
                    return Err(ModelError::shape("per-gene kinetics", n_genes, ks.len()));
                }
                ks.iter().try_for_each(Kinetics::validate)
            }
        }
    }
}

/// Network-mediated expression.
///
/// Each phase computes TF input from the previous generation's expression
/// through the regulatory network, then applies the gene's kinetics. Genes
/// with no incoming edges receive TF input 0.
#[derive(Debug, Clone)]
pub struct RegulatoryExpression {
    network: Arc<RegulatoryNetwork>,
    kinetics: GeneKinetics,
}

impl RegulatoryExpression {
    /// # Errors
    /// - `ModelError::ShapeMismatch` if per-gene kinetics do not cover every
    ///   gene of the network.
    /// - `ModelError::NumericDomain` for invalid kinetics parameters.
    pub fn new(
        network: impl Into<Arc<RegulatoryNetwork>>,
        kinetics: GeneKinetics,
    ) -> Result<Self, ModelError> {
        let network = network.into();
        kinetics.validate(network.n_genes())?;
        Ok(Self { network, kinetics })
    }

    pub fn network(&self) -> &RegulatoryNetwork {
        &self.network
    }

    pub fn kinetics(&self) -> &GeneKinetics {
        &self.kinetics
    }
}

impl ExpressionModel for RegulatoryExpression {
    #[inline]
    fn compute(&self, gene: usize, tf_input: f64) -> f64 {
        self.kinetics.for_gene(gene).level(tf_input)
    }

    fn gene_count(&self) -> Option<usize> {
        Some(self.network.n_genes())
    }

    fn express(&self, previous: &ExpressionMatrix) -> Result<ExpressionMatrix, ModelError> {
        let tf_input = self.network.compute_tf_input(previous)?;
        self.compute_batch(Some(&tf_input), previous.shape())
    }
}
