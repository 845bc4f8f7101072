//! Sparse transcription-factor regulatory network.
//!
//! A network is built once from `(regulator, target, weight)` triples and is
//! immutable afterwards. Its only population-level operation is computing the
//! TF input matrix consumed by regulatory expression kinetics.

mod regulatory;

pub use regulatory::{RegulatoryEdge, RegulatoryNetwork};
