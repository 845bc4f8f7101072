//! Evolution module providing the three pluggable model families.
//!
//! - **Expression**: kinetics mapping TF input to expression levels
//!   (constant, linear, Hill, network-mediated)
//! - **Selection**: fitness functions over expression profiles
//!   (proportional, threshold, epistatic, multi-objective)
//! - **Mutation**: stochastic perturbation of expression levels (point mutation)

pub mod expression;
pub mod mutation;
pub mod selection;

pub use expression::{
    ConstantExpression, ExpressionModel, GeneKinetics, HillExpression, Kinetics,
    LinearExpression, RegulatoryExpression,
};
pub use mutation::{MutationDraws, MutationModel, PointMutation};
pub use selection::{
    EpistaticFitness, MultiObjectiveSelection, ProportionalSelection, SelectionModel,
    ThresholdSelection,
};
