//! Push sinks for per-generation data.

use crate::simulation::Population;
use crate::storage::types::{
    FitnessStats, GeneRecord, IndividualRecord, ModelRecord, RecordingStrategy,
};

/// A sink that receives the population at the end of a generation.
///
/// Recorders only ever see a shared borrow of the population and are called
/// synchronously between generations.
pub trait Recorder {
    /// Whether `generation` should be pushed to [`record`](Self::record).
    fn should_record(&self, _generation: usize) -> bool {
        true
    }

    /// Receive the population as it stands after `generation` completed.
    fn record(&mut self, generation: usize, population: &Population);
}

/// Which row types a [`MemoryRecorder`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLevels {
    pub model: bool,
    pub individual: bool,
    pub gene: bool,
}

impl Default for RecordLevels {
    fn default() -> Self {
        Self {
            model: true,
            individual: true,
            gene: true,
        }
    }
}

/// In-memory recorder keeping model, individual and gene rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    strategy: RecordingStrategy,
    levels: RecordLevels,
    model_rows: Vec<ModelRecord>,
    individual_rows: Vec<IndividualRecord>,
    gene_rows: Vec<GeneRecord>,
}

impl MemoryRecorder {
    pub fn new(strategy: RecordingStrategy) -> Self {
        if strategy == RecordingStrategy::None {
            log::warn!("MemoryRecorder created with RecordingStrategy::None; nothing will be kept");
        }
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Restrict which row types are kept.
    pub fn with_levels(mut self, levels: RecordLevels) -> Self {
        self.levels = levels;
        self
    }

    pub fn model_rows(&self) -> &[ModelRecord] {
        &self.model_rows
    }

    pub fn individual_rows(&self) -> &[IndividualRecord] {
        &self.individual_rows
    }

    pub fn gene_rows(&self) -> &[GeneRecord] {
        &self.gene_rows
    }

    /// Generations recorded so far, in order.
    pub fn generations(&self) -> Vec<usize> {
        self.model_rows.iter().map(|r| r.generation).collect()
    }
}

impl Recorder for MemoryRecorder {
    fn should_record(&self, generation: usize) -> bool {
        self.strategy.should_record(generation)
    }

    fn record(&mut self, generation: usize, population: &Population) {
        if self.levels.model {
            self.model_rows.push(ModelRecord {
                generation,
                fitness: FitnessStats::from_population(population),
                mean_expression: population.mean_expression(),
            });
        }

        if self.levels.individual {
            let expression = population.expression();
            for (i, fitness) in population.fitness().iter().enumerate() {
                let row = expression.row(i);
                let (min, max) = min_max(&row);
                self.individual_rows.push(IndividualRecord {
                    generation,
                    individual: i,
                    fitness: *fitness,
                    mean_expression: mean(&row),
                    min_expression: min,
                    max_expression: max,
                });
            }
        }

        if self.levels.gene {
            let expression = population.expression();
            let variances = population.gene_variances();
            for (j, gene_mean) in population.gene_means().into_iter().enumerate() {
                let (min, max) = min_max(&expression.column(j));
                self.gene_rows.push(GeneRecord {
                    generation,
                    gene: j,
                    mean_expression: gene_mean,
                    variance: variances[j],
                    min_expression: min,
                    max_expression: max,
                });
            }
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
