//! Serializable run configuration.
//!
//! A [`Configuration`] fully describes a run: population shape, seed, the
//! three models and how generation 0 is initialised. It round-trips through
//! JSON, and [`GeneNetwork::from_config`](crate::simulation::GeneNetwork::from_config)
//! turns it into a ready engine.

use crate::base::ExpressionMatrix;
use crate::errors::{BuilderError, ModelError};
use crate::evolution::{
    ConstantExpression, EpistaticFitness, ExpressionModel, GeneKinetics, HillExpression,
    LinearExpression, MultiObjectiveSelection, MutationModel, PointMutation,
    ProportionalSelection, RegulatoryExpression, SelectionModel, ThresholdSelection,
};
use crate::network::{RegulatoryEdge, RegulatoryNetwork};
use crate::simulation::engine::check_model_genes;
use serde::{Deserialize, Serialize};

/// The master configuration struct.
/// Can be deserialized from a file to fully reproduce a simulation setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub execution: ExecutionConfig,
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub initialization: InitializationConfig,
}

/// Population shape and seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Number of individuals
    pub population_size: usize,
    /// Number of genes per individual
    pub gene_count: usize,
    /// Optional RNG seed for reproducibility
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ExecutionConfig {
    pub fn new(population_size: usize, gene_count: usize, seed: Option<u64>) -> Self {
        Self {
            population_size,
            gene_count,
            seed,
        }
    }
}

/// Grouped model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub expression: ExpressionConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub mutation: MutationConfig,
}

/// Expression model choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionConfig {
    Constant(ConstantExpression),
    Linear(LinearExpression),
    Hill(HillExpression),
    /// Network-mediated expression over `gene_count` genes.
    Regulatory {
        edges: Vec<RegulatoryEdge>,
        kinetics: GeneKinetics,
    },
}

impl ExpressionConfig {
    /// Validate parameters and build the model for `n_genes` genes.
    pub fn build(&self, n_genes: usize) -> Result<Box<dyn ExpressionModel>, ModelError> {
        let model: Box<dyn ExpressionModel> = match self {
            Self::Constant(m) => {
                m.validate()?;
                Box::new(*m)
            }
            Self::Linear(m) => {
                m.validate()?;
                Box::new(*m)
            }
            Self::Hill(m) => {
                m.validate()?;
                Box::new(*m)
            }
            Self::Regulatory { edges, kinetics } => {
                let network = RegulatoryNetwork::new(n_genes, edges)?;
                Box::new(RegulatoryExpression::new(network, kinetics.clone())?)
            }
        };
        Ok(model)
    }
}

/// Selection model choice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum SelectionConfig {
    #[default]
    Proportional,
    Threshold(ThresholdSelection),
    Epistatic(EpistaticFitness),
    MultiObjective(MultiObjectiveSelection),
}

impl SelectionConfig {
    pub fn build(&self) -> Result<Box<dyn SelectionModel>, ModelError> {
        let model: Box<dyn SelectionModel> = match self {
            Self::Proportional => Box::new(ProportionalSelection::new()),
            Self::Threshold(m) => {
                m.validate()?;
                Box::new(*m)
            }
            // Matrix-backed models are validated on deserialization.
            Self::Epistatic(m) => Box::new(m.clone()),
            Self::MultiObjective(m) => Box::new(m.clone()),
        };
        Ok(model)
    }
}

/// Mutation operator choice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MutationConfig {
    Point(PointMutation),
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self::Point(PointMutation::none())
    }
}

impl MutationConfig {
    pub fn build(&self) -> Result<Box<dyn MutationModel>, ModelError> {
        match self {
            Self::Point(m) => {
                m.validate()?;
                Ok(Box::new(*m))
            }
        }
    }
}

/// How the generation-0 expression matrix is filled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum InitializationConfig {
    /// Each gene starts at the expression model's level for zero input,
    /// floored at 0.
    #[default]
    ModelDefault,
    /// Every cell starts at the same level.
    Uniform(f64),
    /// Explicit N×G rows.
    Matrix(Vec<Vec<f64>>),
}

impl InitializationConfig {
    /// Produce the initial matrix for an `n × g` population.
    pub fn initial_matrix(
        &self,
        n: usize,
        g: usize,
        expression: &dyn ExpressionModel,
    ) -> Result<ExpressionMatrix, BuilderError> {
        let matrix = match self {
            Self::ModelDefault => ExpressionMatrix::zeros(n, g)
                .map_with_gene(|j, _| expression.default_level(j).max(0.0)),
            Self::Uniform(level) => ExpressionMatrix::from_element(n, g, *level),
            Self::Matrix(rows) => {
                let matrix = if rows.is_empty() {
                    ExpressionMatrix::zeros(0, g)
                } else {
                    ExpressionMatrix::from_rows(rows)?
                };
                matrix.check_shape(n, g, "initial expression matrix")?;
                matrix
            }
        };
        check_initial_levels(&matrix)?;
        Ok(matrix)
    }
}

/// Initial levels must be finite and non-negative.
pub(crate) fn check_initial_levels(matrix: &ExpressionMatrix) -> Result<(), BuilderError> {
    if let Some(bad) = matrix
        .as_matrix()
        .iter()
        .find(|v| !v.is_finite() || **v < 0.0)
    {
        return Err(BuilderError::InvalidParameter(format!(
            "initial expression level {bad} must be finite and >= 0.0"
        )));
    }
    Ok(())
}

impl Configuration {
    pub fn new(
        execution: ExecutionConfig,
        evolution: EvolutionConfig,
        initialization: InitializationConfig,
    ) -> Self {
        Self {
            execution,
            evolution,
            initialization,
        }
    }

    /// Check every parameter without building an engine.
    pub fn validate(&self) -> Result<(), BuilderError> {
        let ExecutionConfig {
            population_size,
            gene_count,
            ..
        } = self.execution;
        if population_size == 0 {
            return Err(BuilderError::InvalidParameter(
                "population_size must be > 0".to_string(),
            ));
        }
        let expression = self.evolution.expression.build(gene_count)?;
        let selection = self.evolution.selection.build()?;
        self.evolution.mutation.build()?;
        check_model_genes(gene_count, expression.as_ref(), selection.as_ref())?;
        self.initialization
            .initial_matrix(population_size, gene_count, expression.as_ref())?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, BuilderError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BuilderError::InvalidParameter(format!("configuration JSON: {e}")))
    }

    pub fn from_json(json: &str) -> Result<Self, BuilderError> {
        serde_json::from_str(json)
            .map_err(|e| BuilderError::InvalidParameter(format!("configuration JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::Kinetics;
    use crate::simulation::GeneNetwork;

    fn regulatory_config() -> Configuration {
        Configuration::new(
            ExecutionConfig::new(5, 2, Some(7)),
            EvolutionConfig {
                expression: ExpressionConfig::Regulatory {
                    edges: vec![RegulatoryEdge::new(0, 1, 2.0)],
                    kinetics: GeneKinetics::Shared(Kinetics::Linear(
                        LinearExpression::new(1.0, 0.5).unwrap(),
                    )),
                },
                selection: SelectionConfig::Epistatic(EpistaticFitness::zeros(2)),
                mutation: MutationConfig::Point(PointMutation::new(0.1, 0.2).unwrap()),
            },
            InitializationConfig::Uniform(1.0),
        )
    }

    #[test]
    fn test_json_roundtrip() {
        let config = regulatory_config();
        let json = config.to_json().unwrap();
        let back = Configuration::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_defaults_when_omitted() {
        let json = r#"{
            "execution": { "population_size": 3, "gene_count": 2 },
            "evolution": { "expression": { "Constant": { "level": 1.0 } } }
        }"#;
        let config = Configuration::from_json(json).unwrap();
        assert_eq!(config.execution.seed, None);
        assert_eq!(config.evolution.selection, SelectionConfig::Proportional);
        assert_eq!(config.evolution.mutation, MutationConfig::default());
        assert_eq!(config.initialization, InitializationConfig::ModelDefault);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_invalid_models() {
        let mut config = regulatory_config();
        config.evolution.mutation = MutationConfig::Point(PointMutation {
            rate: 2.0,
            magnitude: 1.0,
        });
        assert!(matches!(
            config.validate(),
            Err(BuilderError::Model(ModelError::Configuration(_)))
        ));

        let mut config = regulatory_config();
        config.evolution.expression = ExpressionConfig::Hill(HillExpression {
            v_max: 1.0,
            k: 0.0,
            n: 2.0,
        });
        assert!(matches!(
            config.validate(),
            Err(BuilderError::Model(ModelError::NumericDomain { .. }))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_population() {
        let mut config = regulatory_config();
        config.execution.population_size = 0;
        assert!(matches!(
            config.validate(),
            Err(BuilderError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_validate_rejects_selection_gene_mismatch() {
        let mut config = regulatory_config();
        config.evolution.selection = SelectionConfig::Epistatic(EpistaticFitness::zeros(3));
        let expected = Err(BuilderError::Model(ModelError::ShapeMismatch {
            context: "selection model gene count",
            expected: 2,
            found: 3,
        }));
        assert_eq!(config.validate(), expected);
        assert_eq!(GeneNetwork::from_config(&config).map(|_| ()), expected);
    }

    #[test]
    fn test_validate_rejects_out_of_range_edge() {
        let mut config = regulatory_config();
        config.evolution.expression = ExpressionConfig::Regulatory {
            edges: vec![RegulatoryEdge::new(0, 5, 1.0)],
            kinetics: GeneKinetics::Shared(Kinetics::Linear(
                LinearExpression::new(1.0, 0.0).unwrap(),
            )),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_asymmetric_interaction_rejected_on_load() {
        let json = r#"{
            "execution": { "population_size": 3, "gene_count": 2 },
            "evolution": {
                "expression": { "Constant": { "level": 1.0 } },
                "selection": { "Epistatic": [[0.0, 1.0], [2.0, 0.0]] }
            }
        }"#;
        assert!(Configuration::from_json(json).is_err());
    }

    #[test]
    fn test_initial_matrix_variants() {
        let model = LinearExpression::new(1.0, -2.0).unwrap();
        let floored = InitializationConfig::ModelDefault
            .initial_matrix(2, 3, &model)
            .unwrap();
        assert_eq!(floored.min_value(), Some(0.0));

        let uniform = InitializationConfig::Uniform(2.5)
            .initial_matrix(2, 3, &model)
            .unwrap();
        assert_eq!(uniform.get(1, 2), Some(2.5));

        assert!(InitializationConfig::Uniform(-1.0)
            .initial_matrix(2, 3, &model)
            .is_err());

        let explicit = InitializationConfig::Matrix(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert!(explicit.initial_matrix(2, 2, &model).is_ok());
        assert!(matches!(
            explicit.initial_matrix(3, 2, &model),
            Err(BuilderError::Model(ModelError::ShapeMismatch { .. }))
        ));
    }
}
