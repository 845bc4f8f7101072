//! Selection and fitness functions over expression profiles.
//!
//! Fitness is scored once per generation from the freshly computed expression
//! matrix and attached to every individual. It is an observed quantity: the
//! population is never resampled from it.
//!
//! ## Fitness Functions
//! - **Proportional**: mean expression across genes
//! - **Threshold**: 1.0 if mean expression reaches a threshold, else 0.0
//! - **Epistatic**: quadratic form `x · W · xᵀ` over a symmetric gene-gene
//!   interaction matrix, so pairs of genes contribute jointly
//! - **MultiObjective**: weighted sums over K objectives, normalised by the
//!   total weight
//!
//! Every function returns a zero vector for a population with no genes.

use crate::base::ExpressionMatrix;
use crate::errors::ModelError;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trait for scoring the fitness of individuals from their expression.
///
/// Implementors provide the per-individual score; the batch form defaults to
/// scoring each row in order. Built-in models override the batch form with
/// column-wise passes that accumulate in the same order as the scalar form.
pub trait SelectionModel: fmt::Debug + Send + Sync {
    /// Fitness of one individual given its expression row.
    fn individual_fitness(&self, expression: &[f64]) -> Result<f64, ModelError>;

    /// Number of genes this model is bound to, if it is gene-specific.
    fn gene_count(&self) -> Option<usize> {
        None
    }

    /// Fitness of every individual (one entry per row).
    fn compute_fitness_batch(&self, expression: &ExpressionMatrix) -> Result<Vec<f64>, ModelError> {
        check_batch(self.gene_count(), expression)?;
        if expression.n_genes() == 0 {
            return Ok(vec![0.0; expression.n_individuals()]);
        }
        expression
            .rows()
            .map(|row| self.individual_fitness(&row))
            .collect()
    }
}

fn check_batch(gene_count: Option<usize>, expression: &ExpressionMatrix) -> Result<(), ModelError> {
    match gene_count {
        Some(g) => expression.check_genes(g, "selection input"),
        None => Ok(()),
    }
}

fn check_row(gene_count: usize, row: &[f64]) -> Result<(), ModelError> {
    if row.len() != gene_count {
        return Err(ModelError::shape("selection input row", gene_count, row.len()));
    }
    Ok(())
}

/// Mean of a row, accumulated left to right from 0.0. Empty rows give 0.0.
#[inline]
fn row_mean(row: &[f64]) -> f64 {
    if row.is_empty() {
        return 0.0;
    }
    row.iter().fold(0.0, |acc, &x| acc + x) / row.len() as f64
}

/// Per-row means accumulated gene by gene; matches [`row_mean`] exactly.
fn batch_row_means(expression: &ExpressionMatrix) -> Vec<f64> {
    let (n, g) = expression.shape();
    if g == 0 {
        return vec![0.0; n];
    }
    let mut sums = vec![0.0; n];
    for gene in 0..g {
        for (acc, &x) in sums.iter_mut().zip(expression.column_slice(gene)) {
            *acc += x;
        }
    }
    let denom = g as f64;
    sums.into_iter().map(|s| s / denom).collect()
}

/// Fitness equal to the mean expression level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProportionalSelection;

impl ProportionalSelection {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionModel for ProportionalSelection {
    fn individual_fitness(&self, expression: &[f64]) -> Result<f64, ModelError> {
        Ok(row_mean(expression))
    }

    fn compute_fitness_batch(&self, expression: &ExpressionMatrix) -> Result<Vec<f64>, ModelError> {
        Ok(batch_row_means(expression))
    }
}

/// Binary fitness: 1.0 when mean expression is at least `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSelection {
    pub threshold: f64,
}

impl ThresholdSelection {
    /// # Errors
    /// `ModelError::Configuration` if `threshold` is NaN.
    pub fn new(threshold: f64) -> Result<Self, ModelError> {
        let model = Self { threshold };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.threshold.is_nan() {
            return Err(ModelError::Configuration("threshold must not be NaN".into()));
        }
        Ok(())
    }

    #[inline]
    fn score(&self, mean: f64) -> f64 {
        if mean >= self.threshold {
            1.0
        } else {
            0.0
        }
    }
}

impl SelectionModel for ThresholdSelection {
    fn individual_fitness(&self, expression: &[f64]) -> Result<f64, ModelError> {
        if expression.is_empty() {
            return Ok(0.0);
        }
        Ok(self.score(row_mean(expression)))
    }

    fn compute_fitness_batch(&self, expression: &ExpressionMatrix) -> Result<Vec<f64>, ModelError> {
        if expression.n_genes() == 0 {
            return Ok(vec![0.0; expression.n_individuals()]);
        }
        Ok(batch_row_means(expression)
            .into_iter()
            .map(|mean| self.score(mean))
            .collect())
    }
}

/// Convert nested rows into a dense matrix, rejecting ragged input.
fn dense_from_rows(rows: &[Vec<f64>], context: &'static str) -> Result<DMatrix<f64>, ModelError> {
    let ncols = rows.first().map_or(0, Vec::len);
    let mut values = Vec::with_capacity(rows.len() * ncols);
    for row in rows {
        if row.len() != ncols {
            return Err(ModelError::shape(context, ncols, row.len()));
        }
        if let Some(bad) = row.iter().find(|v| !v.is_finite()) {
            return Err(ModelError::Configuration(format!(
                "{context} contains non-finite value {bad}"
            )));
        }
        values.extend_from_slice(row);
    }
    Ok(DMatrix::from_row_slice(rows.len(), ncols, &values))
}

fn dense_to_rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

/// Epistatic fitness: the quadratic form `x · W · xᵀ`.
///
/// `W` is a symmetric G×G matrix; `W[j][k]` is the joint contribution of
/// genes `j` and `k`. The diagonal carries each gene's own contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct EpistaticFitness {
    interaction: DMatrix<f64>,
}

impl EpistaticFitness {
    /// Create from a dense interaction matrix.
    ///
    /// # Errors
    /// - `ModelError::ShapeMismatch` if the matrix is not square.
    /// - `ModelError::Configuration` if it is not exactly symmetric or
    ///   contains non-finite values.
    pub fn new(interaction: DMatrix<f64>) -> Result<Self, ModelError> {
        if !interaction.is_square() {
            return Err(ModelError::shape(
                "epistatic interaction matrix",
                interaction.nrows(),
                interaction.ncols(),
            ));
        }
        if interaction.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Configuration(
                "epistatic interaction matrix contains non-finite values".into(),
            ));
        }
        let g = interaction.nrows();
        for j in 0..g {
            for k in (j + 1)..g {
                if interaction[(j, k)] != interaction[(k, j)] {
                    return Err(ModelError::Configuration(format!(
                        "epistatic interaction matrix is not symmetric at ({j}, {k}): {} vs {}",
                        interaction[(j, k)],
                        interaction[(k, j)]
                    )));
                }
            }
        }
        Ok(Self { interaction })
    }

    /// Create from one vector per row.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ModelError> {
        Self::new(dense_from_rows(rows, "epistatic interaction matrix")?)
    }

    /// All-zero interactions over `n_genes` genes.
    pub fn zeros(n_genes: usize) -> Self {
        Self {
            interaction: DMatrix::zeros(n_genes, n_genes),
        }
    }

    pub fn interaction(&self) -> &DMatrix<f64> {
        &self.interaction
    }
}

impl TryFrom<Vec<Vec<f64>>> for EpistaticFitness {
    type Error = ModelError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<EpistaticFitness> for Vec<Vec<f64>> {
    fn from(model: EpistaticFitness) -> Self {
        dense_to_rows(&model.interaction)
    }
}

impl SelectionModel for EpistaticFitness {
    fn individual_fitness(&self, expression: &[f64]) -> Result<f64, ModelError> {
        let g = self.interaction.nrows();
        check_row(g, expression)?;
        let mut total = 0.0;
        for j in 0..g {
            let mut weighted = 0.0;
            for k in 0..g {
                weighted += expression[k] * self.interaction[(k, j)];
            }
            total += weighted * expression[j];
        }
        Ok(total)
    }

    fn gene_count(&self) -> Option<usize> {
        Some(self.interaction.nrows())
    }

    /// `((X · W) ⊙ X)` summed per row, one gene column at a time.
    fn compute_fitness_batch(&self, expression: &ExpressionMatrix) -> Result<Vec<f64>, ModelError> {
        let g = self.interaction.nrows();
        expression.check_genes(g, "epistatic selection input")?;
        let n = expression.n_individuals();

        let mut fitness = vec![0.0; n];
        let mut weighted = vec![0.0; n];
        for j in 0..g {
            weighted.iter_mut().for_each(|w| *w = 0.0);
            for k in 0..g {
                let w_kj = self.interaction[(k, j)];
                for (acc, &x) in weighted.iter_mut().zip(expression.column_slice(k)) {
                    *acc += x * w_kj;
                }
            }
            let x_j = expression.column_slice(j);
            for i in 0..n {
                fitness[i] += weighted[i] * x_j[i];
            }
        }
        Ok(fitness)
    }
}

/// Multi-objective fitness over a G×K weight matrix.
///
/// Column `k` holds the per-gene weights of objective `k`. An individual's
/// fitness is the sum of its K objective scores divided by the sum of all
/// weights; a zero weight sum gives fitness 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct MultiObjectiveSelection {
    weights: DMatrix<f64>,
    weight_sum: f64,
}

impl MultiObjectiveSelection {
    /// Create from a G×K weight matrix.
    ///
    /// # Errors
    /// `ModelError::Configuration` if any weight is non-finite.
    pub fn new(weights: DMatrix<f64>) -> Result<Self, ModelError> {
        if weights.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Configuration(
                "objective weights contain non-finite values".into(),
            ));
        }
        let weight_sum = weights.iter().fold(0.0, |acc, &w| acc + w);
        Ok(Self {
            weights,
            weight_sum,
        })
    }

    /// Create from one row of K weights per gene.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ModelError> {
        Self::new(dense_from_rows(rows, "objective weight matrix")?)
    }

    /// Single objective with one weight per gene.
    pub fn from_weights(weights: &[f64]) -> Result<Self, ModelError> {
        Self::new(DMatrix::from_column_slice(weights.len(), 1, weights))
    }

    /// Number of objectives (K).
    pub fn n_objectives(&self) -> usize {
        self.weights.ncols()
    }

    /// Sum of all weights.
    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    pub fn weights(&self) -> &DMatrix<f64> {
        &self.weights
    }

    /// Weighted score of each objective for one individual.
    pub fn objective_scores(&self, expression: &[f64]) -> Result<Vec<f64>, ModelError> {
        let g = self.weights.nrows();
        check_row(g, expression)?;
        Ok((0..self.n_objectives())
            .map(|k| {
                let mut score = 0.0;
                for j in 0..g {
                    score += expression[j] * self.weights[(j, k)];
                }
                score
            })
            .collect())
    }

    /// N×K matrix of objective scores for the whole population.
    pub fn objective_scores_batch(
        &self,
        expression: &ExpressionMatrix,
    ) -> Result<ExpressionMatrix, ModelError> {
        let g = self.weights.nrows();
        expression.check_genes(g, "multi-objective selection input")?;
        let mut scores = ExpressionMatrix::zeros(expression.n_individuals(), self.n_objectives());
        for k in 0..self.n_objectives() {
            let dest = scores.column_slice_mut(k);
            for j in 0..g {
                let w_jk = self.weights[(j, k)];
                for (acc, &x) in dest.iter_mut().zip(expression.column_slice(j)) {
                    *acc += x * w_jk;
                }
            }
        }
        Ok(scores)
    }

    #[inline]
    fn normalise(&self, combined: f64) -> f64 {
        if self.weight_sum == 0.0 {
            return 0.0;
        }
        combined / self.weight_sum
    }
}

impl TryFrom<Vec<Vec<f64>>> for MultiObjectiveSelection {
    type Error = ModelError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<MultiObjectiveSelection> for Vec<Vec<f64>> {
    fn from(model: MultiObjectiveSelection) -> Self {
        dense_to_rows(&model.weights)
    }
}

impl SelectionModel for MultiObjectiveSelection {
    fn individual_fitness(&self, expression: &[f64]) -> Result<f64, ModelError> {
        let scores = self.objective_scores(expression)?;
        if expression.is_empty() {
            return Ok(0.0);
        }
        Ok(self.normalise(scores.iter().fold(0.0, |acc, &s| acc + s)))
    }

    fn gene_count(&self) -> Option<usize> {
        Some(self.weights.nrows())
    }

    fn compute_fitness_batch(&self, expression: &ExpressionMatrix) -> Result<Vec<f64>, ModelError> {
        let scores = self.objective_scores_batch(expression)?;
        let n = expression.n_individuals();
        if expression.n_genes() == 0 {
            return Ok(vec![0.0; n]);
        }
        let mut combined = vec![0.0; n];
        for k in 0..self.n_objectives() {
            for (acc, &s) in combined.iter_mut().zip(scores.column_slice(k)) {
                *acc += s;
            }
        }
        Ok(combined.into_iter().map(|c| self.normalise(c)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn sample_expression() -> ExpressionMatrix {
        ExpressionMatrix::from_row_major(
            3,
            3,
            &[0.1, 0.7, 1.3, 2.2, 0.0, 5.9, 0.33, 0.66, 0.99],
        )
        .unwrap()
    }

    fn assert_batch_matches_scalar(model: &dyn SelectionModel, expression: &ExpressionMatrix) {
        let batch = model.compute_fitness_batch(expression).unwrap();
        assert_eq!(batch.len(), expression.n_individuals());
        for (i, row) in expression.rows().enumerate() {
            assert_eq!(batch[i], model.individual_fitness(&row).unwrap(), "row {i}");
        }
    }

    fn symmetric_interactions() -> EpistaticFitness {
        EpistaticFitness::from_rows(&[
            vec![1.0, -0.5, 0.25],
            vec![-0.5, 2.0, 0.1],
            vec![0.25, 0.1, -1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_proportional_single_gene() {
        let expr = ExpressionMatrix::from_row_major(1, 1, &[1.0]).unwrap();
        let fitness = ProportionalSelection.compute_fitness_batch(&expr).unwrap();
        assert_eq!(fitness, vec![1.0]);
    }

    #[test]
    fn test_proportional_is_row_mean() {
        let expr = ExpressionMatrix::from_row_major(2, 2, &[1.0, 3.0, 0.0, 4.0]).unwrap();
        let fitness = ProportionalSelection.compute_fitness_batch(&expr).unwrap();
        assert_eq!(fitness, vec![2.0, 2.0]);
    }

    #[test]
    fn test_threshold_all_zero_expression() {
        let expr = ExpressionMatrix::zeros(5, 4);
        let model = ThresholdSelection::new(0.5).unwrap();
        assert_eq!(model.compute_fitness_batch(&expr).unwrap(), vec![0.0; 5]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let expr = ExpressionMatrix::from_row_major(3, 2, &[0.5, 0.5, 0.4, 0.5, 1.0, 0.0]).unwrap();
        let model = ThresholdSelection::new(0.5).unwrap();
        assert_eq!(model.compute_fitness_batch(&expr).unwrap(), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_threshold_rejects_nan() {
        assert!(ThresholdSelection::new(f64::NAN).is_err());
    }

    #[test]
    fn test_zero_genes_gives_zero_fitness_for_every_model() {
        let expr = ExpressionMatrix::zeros(4, 0);
        let models: Vec<Box<dyn SelectionModel>> = vec![
            Box::new(ProportionalSelection),
            Box::new(ThresholdSelection::new(-1.0).unwrap()),
            Box::new(EpistaticFitness::zeros(0)),
            Box::new(MultiObjectiveSelection::from_rows(&[]).unwrap()),
        ];
        for model in &models {
            assert_eq!(model.compute_fitness_batch(&expr).unwrap(), vec![0.0; 4], "{model:?}");
        }
    }

    #[test]
    fn test_epistatic_zero_matrix() {
        let model = EpistaticFitness::zeros(3);
        let fitness = model.compute_fitness_batch(&sample_expression()).unwrap();
        assert_eq!(fitness, vec![0.0; 3]);
    }

    #[test]
    fn test_epistatic_zero_expression() {
        let model = symmetric_interactions();
        let fitness = model.compute_fitness_batch(&ExpressionMatrix::zeros(2, 3)).unwrap();
        assert_eq!(fitness, vec![0.0, 0.0]);
    }

    #[test]
    fn test_epistatic_quadratic_form() {
        let model = EpistaticFitness::from_rows(&[vec![1.0, 2.0], vec![2.0, 3.0]]).unwrap();
        // [1, 2] · W · [1, 2]ᵀ = 1 + 2·2·2 + 3·4 = 21
        assert!(approx_eq(model.individual_fitness(&[1.0, 2.0]).unwrap(), 21.0, 1e-12));
    }

    #[test]
    fn test_epistatic_matches_dense_product() {
        let model = symmetric_interactions();
        let expr = sample_expression();
        let batch = model.compute_fitness_batch(&expr).unwrap();
        let x = expr.as_matrix();
        let xw = x * model.interaction();
        for i in 0..3 {
            let expected: f64 = (0..3).map(|j| xw[(i, j)] * x[(i, j)]).sum();
            assert!(approx_eq(batch[i], expected, 1e-12));
        }
    }

    #[test]
    fn test_epistatic_rejects_asymmetric() {
        let err = EpistaticFitness::from_rows(&[vec![1.0, 2.0], vec![0.0, 1.0]]).unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
    }

    #[test]
    fn test_epistatic_rejects_non_square() {
        let err = EpistaticFitness::new(DMatrix::zeros(2, 3)).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_epistatic_rejects_wrong_gene_count() {
        let err = symmetric_interactions()
            .compute_fitness_batch(&ExpressionMatrix::zeros(2, 4))
            .unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { expected: 3, found: 4, .. }));
    }

    #[test]
    fn test_multi_objective_two_equal_weights() {
        let model = MultiObjectiveSelection::from_weights(&[1.0, 1.0]).unwrap();
        let expr = ExpressionMatrix::from_row_major(1, 2, &[2.0, 4.0]).unwrap();
        assert_eq!(model.compute_fitness_batch(&expr).unwrap(), vec![3.0]);
    }

    #[test]
    fn test_multi_objective_zero_sum_weights() {
        let model = MultiObjectiveSelection::from_weights(&[1.0, -1.0]).unwrap();
        assert_eq!(model.weight_sum(), 0.0);
        // 3 genes against 2 weights
        assert!(model.compute_fitness_batch(&sample_expression()).is_err());

        let expr = ExpressionMatrix::from_row_major(2, 2, &[5.0, 1.0, 0.0, 3.0]).unwrap();
        assert_eq!(model.compute_fitness_batch(&expr).unwrap(), vec![0.0, 0.0]);
        assert_eq!(model.individual_fitness(&[5.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_multi_objective_scores() {
        // Two objectives over two genes
        let model =
            MultiObjectiveSelection::from_rows(&[vec![1.0, 0.0], vec![0.5, 2.0]]).unwrap();
        assert_eq!(model.n_objectives(), 2);
        let expr = ExpressionMatrix::from_row_major(1, 2, &[2.0, 4.0]).unwrap();
        let scores = model.objective_scores_batch(&expr).unwrap();
        assert_eq!(scores.row(0), vec![4.0, 8.0]);
        assert!(approx_eq(model.compute_fitness_batch(&expr).unwrap()[0], 12.0 / 3.5, 1e-12));
    }

    #[test]
    fn test_batch_matches_scalar_for_all_models() {
        let expr = sample_expression();
        assert_batch_matches_scalar(&ProportionalSelection, &expr);
        assert_batch_matches_scalar(&ThresholdSelection::new(1.0).unwrap(), &expr);
        assert_batch_matches_scalar(&symmetric_interactions(), &expr);
        assert_batch_matches_scalar(
            &MultiObjectiveSelection::from_rows(&[
                vec![0.2, 1.0],
                vec![0.7, -0.3],
                vec![1.1, 0.05],
            ])
            .unwrap(),
            &expr,
        );
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let model = symmetric_interactions();
        let json = serde_json::to_string(&model).unwrap();
        let back: EpistaticFitness = serde_json::from_str(&json).unwrap();
        assert_eq!(model, back);

        let asymmetric = "[[1.0, 2.0], [3.0, 1.0]]";
        assert!(serde_json::from_str::<EpistaticFitness>(asymmetric).is_err());
    }
}
