//! Simulation engine for gene-expression evolution.
//!
//! One generation runs four phases in a fixed order:
//!
//! 1. **Expressing**: the expression model computes a new N×G matrix from
//!    the previous generation's matrix.
//! 2. **Selecting**: the selection model scores every individual on that
//!    fresh matrix.
//! 3. **Mutating**: the mutation model perturbs the fresh matrix in place.
//! 4. **Collecting**: the mutated matrix and the fitness vector replace the
//!    population state together, and the generation counter advances.
//!
//! Fitness therefore describes expression *before* mutation. If any phase
//! fails, the population, generation counter and RNG are left exactly as they
//! were before the step.

use crate::base::ExpressionMatrix;
use crate::errors::{BuilderError, ModelError};
use crate::evolution::{ExpressionModel, MutationModel, SelectionModel};
use crate::simulation::{Configuration, GeneNetworkBuilder, Population};
use crate::storage::Recorder;
use log::{debug, info, trace};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fmt;

/// Phase of the generation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Expressing,
    Selecting,
    Mutating,
    Collecting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Expressing => "expressing",
            Self::Selecting => "selecting",
            Self::Mutating => "mutating",
            Self::Collecting => "collecting",
        };
        f.write_str(name)
    }
}

/// Verify that gene-specific models agree with the population's gene count.
pub(crate) fn check_model_genes(
    n_genes: usize,
    expression_model: &dyn ExpressionModel,
    selection_model: &dyn SelectionModel,
) -> Result<(), ModelError> {
    if let Some(model_genes) = expression_model.gene_count() {
        if model_genes != n_genes {
            return Err(ModelError::shape("expression model gene count", n_genes, model_genes));
        }
    }
    if let Some(model_genes) = selection_model.gene_count() {
        if model_genes != n_genes {
            return Err(ModelError::shape("selection model gene count", n_genes, model_genes));
        }
    }
    Ok(())
}

/// Main simulation engine.
#[derive(Debug)]
pub struct GeneNetwork {
    /// Current population
    population: Population,
    expression_model: Box<dyn ExpressionModel>,
    selection_model: Box<dyn SelectionModel>,
    mutation_model: Box<dyn MutationModel>,
    /// Seed the RNG was created from, if any
    seed: Option<u64>,
    /// Random number generator (Xoshiro256++)
    rng: Xoshiro256PlusPlus,
    phase: Phase,
}

impl GeneNetwork {
    /// Assemble an engine around an initial population.
    ///
    /// # Errors
    /// `ModelError::ShapeMismatch` if a gene-specific model disagrees with the
    /// population's gene count.
    pub(crate) fn new(
        population: Population,
        expression_model: Box<dyn ExpressionModel>,
        selection_model: Box<dyn SelectionModel>,
        mutation_model: Box<dyn MutationModel>,
        seed: Option<u64>,
    ) -> Result<Self, ModelError> {
        let n_genes = population.n_genes();
        check_model_genes(n_genes, expression_model.as_ref(), selection_model.as_ref())?;

        let rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_seed(rand::rng().random()),
        };

        info!(
            "GeneNetwork created: {} individuals x {} genes, seed {}",
            population.size(),
            n_genes,
            seed.map_or_else(|| "from entropy".to_string(), |s| s.to_string())
        );
        debug!(
            "models: expression={:?} selection={:?} mutation={:?}",
            expression_model, selection_model, mutation_model
        );

        Ok(Self {
            population,
            expression_model,
            selection_model,
            mutation_model,
            seed,
            rng,
            phase: Phase::Expressing,
        })
    }

    /// Build an engine from a full configuration.
    pub fn from_config(config: &Configuration) -> Result<Self, BuilderError> {
        GeneNetworkBuilder::from_config(config)?.build()
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Consume the engine, keeping only the population.
    pub fn into_population(self) -> Population {
        self.population
    }

    /// Current expression matrix.
    pub fn expression(&self) -> &ExpressionMatrix {
        self.population.expression()
    }

    /// Fitness from the most recent selection phase.
    pub fn fitness(&self) -> &[Option<f64>] {
        self.population.fitness()
    }

    /// Number of completed generations.
    pub fn generation(&self) -> usize {
        self.population.generation()
    }

    /// The phase the next step starts in. Always `Expressing` between steps.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn expression_model(&self) -> &dyn ExpressionModel {
        self.expression_model.as_ref()
    }

    pub fn selection_model(&self) -> &dyn SelectionModel {
        self.selection_model.as_ref()
    }

    pub fn mutation_model(&self) -> &dyn MutationModel {
        self.mutation_model.as_ref()
    }

    fn enter(&mut self, phase: Phase) {
        trace!("generation {}: {}", self.population.generation() + 1, phase);
        self.phase = phase;
    }

    /// Run the three model phases without touching population state.
    ///
    /// Mutation draws from a copy of the RNG so a failed step does not
    /// advance it.
    fn run_phases(
        &mut self,
    ) -> Result<(ExpressionMatrix, Vec<f64>, Xoshiro256PlusPlus), ModelError> {
        let (n, g) = self.population.expression().shape();

        self.enter(Phase::Expressing);
        let mut expression = self.expression_model.express(self.population.expression())?;
        expression.check_shape(n, g, "expression phase output")?;

        self.enter(Phase::Selecting);
        let fitness = self.selection_model.compute_fitness_batch(&expression)?;
        if fitness.len() != n {
            return Err(ModelError::shape("selection phase output", n, fitness.len()));
        }

        self.enter(Phase::Mutating);
        let mut rng = self.rng.clone();
        self.mutation_model.mutate_batch(&mut expression, &mut rng)?;

        Ok((expression, fitness, rng))
    }

    fn advance(&mut self, recorder: Option<&mut dyn Recorder>) -> Result<(), ModelError> {
        let outcome = self.run_phases();
        let (expression, fitness, rng) = match outcome {
            Ok(parts) => parts,
            Err(e) => {
                self.phase = Phase::Expressing;
                return Err(e);
            }
        };

        self.enter(Phase::Collecting);
        self.rng = rng;
        self.population.commit(expression, fitness);
        self.phase = Phase::Expressing;

        let generation = self.population.generation();
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "generation {}: mean fitness {:.6}, mean expression {:.6}",
                generation,
                self.population.mean_fitness().unwrap_or(0.0),
                self.population.mean_expression()
            );
        }

        if let Some(recorder) = recorder {
            if recorder.should_record(generation) {
                recorder.record(generation, &self.population);
            }
        }
        Ok(())
    }

    /// Advance simulation by one generation.
    pub fn step(&mut self) -> Result<(), ModelError> {
        self.advance(None)
    }

    /// Advance one generation and push the result to `recorder`.
    pub fn step_recorded(&mut self, recorder: &mut dyn Recorder) -> Result<(), ModelError> {
        self.advance(Some(recorder))
    }

    /// Run simulation for a specific number of generations.
    pub fn run_for(&mut self, generations: usize) -> Result<(), ModelError> {
        for _ in 0..generations {
            self.step()?;
        }
        Ok(())
    }

    /// Run for `generations`, pushing each generation the recorder accepts.
    pub fn run_for_recorded(
        &mut self,
        generations: usize,
        recorder: &mut dyn Recorder,
    ) -> Result<(), ModelError> {
        for _ in 0..generations {
            self.step_recorded(&mut *recorder)?;
        }
        Ok(())
    }
}
