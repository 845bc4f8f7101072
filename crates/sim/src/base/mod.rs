//! Base numeric types shared by every model.
//!
//! The population's expression state lives in a single `ExpressionMatrix`;
//! genes and individuals are views over its cells and rows.

mod matrix;

pub use matrix::ExpressionMatrix;
