//! Commonly used imports for convenience.
//!
//! # Example
//!
//! ```
//! use genevo_sim::prelude::*;
//!
//! let mut sim = GeneNetworkBuilder::new()
//!     .population_size(10)
//!     .gene_count(3)
//!     .expression(LinearExpression::new(0.5, 1.0).unwrap())
//!     .seed(7)
//!     .build()
//!     .unwrap();
//! sim.run_for(5).unwrap();
//! ```

pub use crate::base::ExpressionMatrix;
pub use crate::errors::{BuilderError, ModelError};
pub use crate::evolution::{
    ConstantExpression, EpistaticFitness, ExpressionModel, GeneKinetics, HillExpression,
    Kinetics, LinearExpression, MultiObjectiveSelection, MutationModel, PointMutation,
    ProportionalSelection, RegulatoryExpression, SelectionModel, ThresholdSelection,
};
pub use crate::genome::{Gene, Individual};
pub use crate::network::{RegulatoryEdge, RegulatoryNetwork};
pub use crate::simulation::{Configuration, GeneNetwork, GeneNetworkBuilder, Population};
pub use crate::storage::{MemoryRecorder, Recorder, RecordingStrategy};
