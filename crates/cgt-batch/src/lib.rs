//! # cgt-batch: Multi-Scenario Generation
//!
//! Composes the generation stages into an explicit [`Pipeline`] and runs
//! scenarios in parallel over a Rayon pool, one seed triple per scenario,
//! emitting per-scenario CSV artifacts and a batch JSON manifest.

pub mod manifest;
pub mod pipeline;
pub mod runner;

pub use manifest::{read_batch_manifest, write_batch_manifest, BatchManifest, ScenarioRecord};
pub use pipeline::{GenerationStep, Pipeline};
pub use runner::{run_batch, BatchConfig, BatchSummary, CaseInputs};
