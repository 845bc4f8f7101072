//! Builder pattern for creating simulations.
//!
//! Provides a fluent API for configuring and creating a [`GeneNetwork`] with
//! sensible defaults and validation.

use crate::base::ExpressionMatrix;
pub use crate::errors::BuilderError;
use crate::evolution::{
    ExpressionModel, MutationModel, PointMutation, ProportionalSelection, SelectionModel,
};
use crate::simulation::configs::check_initial_levels;
use crate::simulation::engine::check_model_genes;
use crate::simulation::{Configuration, GeneNetwork, InitializationConfig, Population};

/// Builder for constructing [`GeneNetwork`] instances with a fluent API.
///
/// Population size and an expression model are required. The gene count is
/// required unless the expression model is bound to one (e.g. a regulatory
/// network). Selection defaults to proportional fitness, mutation to none,
/// and the seed to one drawn from OS entropy.
///
/// # Examples
///
/// ```
/// use genevo_sim::evolution::{HillExpression, PointMutation, ThresholdSelection};
/// use genevo_sim::simulation::GeneNetworkBuilder;
///
/// let mut sim = GeneNetworkBuilder::new()
///     .population_size(50)
///     .gene_count(8)
///     .expression(HillExpression::new(2.0, 1.0, 2.0).unwrap())
///     .selection(ThresholdSelection::new(0.5).unwrap())
///     .mutation(PointMutation::new(0.01, 0.1).unwrap())
///     .seed(42)
///     .build()
///     .unwrap();
///
/// sim.run_for(10).unwrap();
/// assert_eq!(sim.generation(), 10);
/// ```
#[derive(Debug, Default)]
pub struct GeneNetworkBuilder {
    // Required parameters
    population_size: Option<usize>,
    gene_count: Option<usize>,
    expression: Option<Box<dyn ExpressionModel>>,

    // Optional, with defaults
    selection: Option<Box<dyn SelectionModel>>,
    mutation: Option<Box<dyn MutationModel>>,
    initialization: InitializationConfig,
    initial_expression: Option<ExpressionMatrix>,
    seed: Option<u64>,
}

impl GeneNetworkBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a full configuration.
    ///
    /// # Errors
    /// Any model in the configuration rejecting its parameters.
    pub fn from_config(config: &Configuration) -> Result<Self, BuilderError> {
        let execution = config.execution;
        let evolution = &config.evolution;
        Ok(Self {
            population_size: Some(execution.population_size),
            gene_count: Some(execution.gene_count),
            expression: Some(evolution.expression.build(execution.gene_count)?),
            selection: Some(evolution.selection.build()?),
            mutation: Some(evolution.mutation.build()?),
            initialization: config.initialization.clone(),
            initial_expression: None,
            seed: execution.seed,
        })
    }

    /// Set the population size (required).
    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = Some(size);
        self
    }

    /// Set the number of genes per individual.
    pub fn gene_count(mut self, genes: usize) -> Self {
        self.gene_count = Some(genes);
        self
    }

    /// Set the expression model (required).
    pub fn expression(mut self, model: impl ExpressionModel + 'static) -> Self {
        self.expression = Some(Box::new(model));
        self
    }

    /// Set the selection model.
    pub fn selection(mut self, model: impl SelectionModel + 'static) -> Self {
        self.selection = Some(Box::new(model));
        self
    }

    /// Set the mutation operator.
    pub fn mutation(mut self, model: impl MutationModel + 'static) -> Self {
        self.mutation = Some(Box::new(model));
        self
    }

    /// Choose how generation 0 is filled.
    pub fn initialization(mut self, init: InitializationConfig) -> Self {
        self.initialization = init;
        self.initial_expression = None;
        self
    }

    /// Start from an explicit N×G matrix.
    pub fn initial_expression(mut self, expression: ExpressionMatrix) -> Self {
        self.initial_expression = Some(expression);
        self
    }

    /// Set the random seed for reproducibility.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build and validate the simulation.
    pub fn build(self) -> Result<GeneNetwork, BuilderError> {
        let population_size = self
            .population_size
            .ok_or(BuilderError::MissingRequired("population_size"))?;
        if population_size == 0 {
            return Err(BuilderError::InvalidParameter(
                "population_size must be > 0".to_string(),
            ));
        }

        let expression = self
            .expression
            .ok_or(BuilderError::MissingRequired("expression"))?;
        let gene_count = self
            .gene_count
            .or_else(|| expression.gene_count())
            .ok_or(BuilderError::MissingRequired("gene_count"))?;

        let selection: Box<dyn SelectionModel> = match self.selection {
            Some(model) => model,
            None => Box::new(ProportionalSelection::new()),
        };
        let mutation: Box<dyn MutationModel> = match self.mutation {
            Some(model) => model,
            None => Box::new(PointMutation::none()),
        };

        // Before initialization: default levels index per-gene kinetics.
        check_model_genes(gene_count, expression.as_ref(), selection.as_ref())?;

        let initial = match self.initial_expression {
            Some(matrix) => {
                matrix.check_shape(population_size, gene_count, "initial expression matrix")?;
                check_initial_levels(&matrix)?;
                matrix
            }
            None => self.initialization.initial_matrix(
                population_size,
                gene_count,
                expression.as_ref(),
            )?,
        };

        let sim = GeneNetwork::new(
            Population::new(initial),
            expression,
            selection,
            mutation,
            self.seed,
        )?;
        Ok(sim)
    }
}
