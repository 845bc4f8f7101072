//! Simulation engine and population management.
//!
//! - `GeneNetwork`: the engine that runs generations through the expression,
//!   selection and mutation phases.
//! - `Population`: the N×G expression matrix plus per-individual fitness.
//! - `GeneNetworkBuilder`: fluent builder with defaults and validation.
//! - `Configuration`: serializable description of a full run.
//! - `run_replicates`: independent seeded runs in parallel.

pub mod builder;
pub mod configs;
pub mod engine;
pub mod population;
pub mod replicates;

pub use builder::GeneNetworkBuilder;
pub use configs::{
    Configuration, EvolutionConfig, ExecutionConfig, ExpressionConfig, InitializationConfig,
    MutationConfig, SelectionConfig,
};
pub use engine::{GeneNetwork, Phase};
pub use population::Population;
pub use replicates::run_replicates;
