//! Genome structures: genes and the individuals that carry them.

mod individual;

pub use individual::{Gene, Individual};
