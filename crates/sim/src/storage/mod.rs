//! Data collection for simulation runs.
//!
//! The engine pushes the population to a [`Recorder`] at the end of each
//! generation. [`MemoryRecorder`] keeps model-level aggregates, per-individual
//! rows and per-gene rows in memory; exporting them is left to the caller.

mod recorder;
pub mod types;

pub use recorder::{MemoryRecorder, RecordLevels, Recorder};
pub use types::{FitnessStats, GeneRecord, IndividualRecord, ModelRecord, RecordingStrategy};
