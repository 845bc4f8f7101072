use crate::simulation::Population;
use serde::{Deserialize, Serialize};

/// Recording strategy for deciding which generations reach a recorder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordingStrategy {
    /// Record every N generations.
    EveryN(usize),

    /// Record at specific generations.
    Specific(Vec<usize>),

    /// Record all generations.
    #[default]
    All,

    /// No recording.
    None,
}

impl RecordingStrategy {
    /// Check if generation should be recorded
    pub fn should_record(&self, generation: usize) -> bool {
        match self {
            Self::EveryN(0) => false,
            Self::EveryN(n) => generation % n == 0,
            Self::Specific(gens) => gens.contains(&generation),
            Self::All => true,
            Self::None => false,
        }
    }
}

/// Aggregated fitness statistics for a generation.
///
/// Individuals without a fitness value are skipped; with none scored every
/// field is 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

impl FitnessStats {
    /// Calculate fitness statistics from a population.
    pub fn from_population(pop: &Population) -> Self {
        let values: Vec<f64> = pop.fitness().iter().filter_map(|f| *f).collect();
        Self::from_values(&values)
    }

    /// Calculate statistics over raw values.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = values.iter().map(|&f| (f - mean).powi(2)).sum::<f64>() / n;

        Self {
            mean,
            min,
            max,
            std: variance.sqrt(),
        }
    }
}

/// Population-level aggregate for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub generation: usize,
    pub fitness: FitnessStats,
    pub mean_expression: f64,
}

/// One individual's row for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualRecord {
    pub generation: usize,
    pub individual: usize,
    pub fitness: Option<f64>,
    pub mean_expression: f64,
    pub min_expression: f64,
    pub max_expression: f64,
}

/// One gene's distribution across the population for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneRecord {
    pub generation: usize,
    pub gene: usize,
    pub mean_expression: f64,
    pub variance: f64,
    pub min_expression: f64,
    pub max_expression: f64,
}
