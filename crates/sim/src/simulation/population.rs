//! Population state.
//!
//! A population is a fixed-size set of individuals stored as one N×G
//! expression matrix plus one optional fitness value per individual. The
//! engine replaces both together at the end of a generation, so callers never
//! see a matrix from one generation paired with fitness from another.

use crate::base::ExpressionMatrix;
use crate::errors::ModelError;
use crate::genome::{Gene, Individual};
use crate::storage::FitnessStats;

/// A fixed-size population of individuals.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    /// Expression levels, one row per individual
    expression: ExpressionMatrix,
    /// Fitness per individual; `None` until the first generation is scored
    fitness: Vec<Option<f64>>,
    /// Generation counter
    generation: usize,
}

impl Population {
    /// Create a generation-0 population with no fitness yet.
    pub fn new(expression: ExpressionMatrix) -> Self {
        let n = expression.n_individuals();
        Self {
            expression,
            fitness: vec![None; n],
            generation: 0,
        }
    }

    /// Build from individuals, which must all carry the same number of genes.
    pub fn from_individuals(individuals: &[Individual]) -> Result<Self, ModelError> {
        let rows: Vec<Vec<f64>> = individuals.iter().map(Individual::expression_levels).collect();
        let expression = ExpressionMatrix::from_rows(&rows)?;
        let mut pop = Self::new(expression);
        pop.fitness = individuals.iter().map(Individual::fitness).collect();
        Ok(pop)
    }

    /// Get the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Increment the generation counter.
    pub fn increment_generation(&mut self) {
        self.generation += 1;
    }

    /// Get the number of individuals in the population.
    pub fn size(&self) -> usize {
        self.expression.n_individuals()
    }

    /// Check if population is empty.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of genes per individual.
    pub fn n_genes(&self) -> usize {
        self.expression.n_genes()
    }

    pub fn expression(&self) -> &ExpressionMatrix {
        &self.expression
    }

    pub fn fitness(&self) -> &[Option<f64>] {
        &self.fitness
    }

    /// Overwrite fitness values, one per individual.
    pub fn set_fitness(&mut self, fitness: &[f64]) -> Result<(), ModelError> {
        if fitness.len() != self.size() {
            return Err(ModelError::shape("population fitness", self.size(), fitness.len()));
        }
        self.fitness = fitness.iter().copied().map(Some).collect();
        Ok(())
    }

    /// Replace expression and fitness in one step and advance the generation.
    pub(crate) fn commit(&mut self, expression: ExpressionMatrix, fitness: Vec<f64>) {
        debug_assert_eq!(expression.n_individuals(), fitness.len());
        self.expression = expression;
        self.fitness = fitness.into_iter().map(Some).collect();
        self.generation += 1;
    }

    /// Materialize a single individual.
    pub fn individual(&self, index: usize) -> Option<Individual> {
        if index >= self.size() {
            return None;
        }
        let genes = self
            .expression
            .row(index)
            .into_iter()
            .map(Gene::new)
            .collect();
        let mut individual = Individual::new(genes);
        if let Some(f) = self.fitness[index] {
            individual.set_fitness(f);
        }
        Some(individual)
    }

    /// Materialize every individual in order.
    pub fn individuals(&self) -> Vec<Individual> {
        (0..self.size()).filter_map(|i| self.individual(i)).collect()
    }

    /// Mean fitness over scored individuals, `None` before the first
    /// generation.
    pub fn mean_fitness(&self) -> Option<f64> {
        let scored: Vec<f64> = self.fitness.iter().filter_map(|f| *f).collect();
        if scored.is_empty() {
            return None;
        }
        Some(scored.iter().sum::<f64>() / scored.len() as f64)
    }

    /// Fitness summary across the population.
    pub fn fitness_stats(&self) -> FitnessStats {
        FitnessStats::from_population(self)
    }

    /// Mean over every cell of the expression matrix (0.0 when empty).
    pub fn mean_expression(&self) -> f64 {
        let cells = self.expression.as_matrix();
        if cells.is_empty() {
            return 0.0;
        }
        cells.iter().sum::<f64>() / cells.len() as f64
    }

    /// Per-gene mean across individuals.
    pub fn gene_means(&self) -> Vec<f64> {
        let n = self.size();
        (0..self.n_genes())
            .map(|j| {
                if n == 0 {
                    0.0
                } else {
                    self.expression.column_slice(j).iter().sum::<f64>() / n as f64
                }
            })
            .collect()
    }

    /// Per-gene population variance across individuals.
    pub fn gene_variances(&self) -> Vec<f64> {
        let n = self.size();
        self.gene_means()
            .into_iter()
            .enumerate()
            .map(|(j, mean)| {
                if n == 0 {
                    return 0.0;
                }
                let column = self.expression.column_slice(j);
                column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64
            })
            .collect()
    }
}
