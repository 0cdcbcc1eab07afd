//! # cgt-scenarios: Scenario Configuration and State
//!
//! Loads and validates the per-case parameter files, derives the
//! per-scenario seed triples, and owns [`ScenarioContext`] - the
//! per-scenario bundle of chronics the dispatch stage consumes.

pub mod context;
pub mod seeds;
pub mod spec;

pub use context::{ResourceGroups, ScenarioContext};
pub use seeds::{derive_seed_triples, SeedTriple};
pub use spec::{CaseConfig, DispatchParams, GeneralParams};
