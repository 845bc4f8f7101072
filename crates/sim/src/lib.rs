//! # Simulation Crate
//!
//! The `sim` crate evolves gene-expression profiles in a fixed-size
//! population. Each generation computes expression from a kinetics model
//! (optionally driven by a sparse regulatory network), scores fitness from
//! that expression, then applies point mutations to the expression levels.
//!
//! Runs are deterministic for a given seed, and every model's batch form
//! agrees exactly with its per-individual form.

pub mod base;
pub mod errors;
pub mod evolution;
pub mod genome;
pub mod network;
pub mod simulation;
pub mod storage;
pub mod prelude;

pub use base::ExpressionMatrix;
