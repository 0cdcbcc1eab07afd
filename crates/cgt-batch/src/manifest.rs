//! Batch manifest: per-scenario records for downstream tooling.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use cgt_scenarios::SeedTriple;

/// Terminal record of one scenario in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub scenario_id: String,
    pub seeds: SeedTriple,
    /// "ok", "failed" (scenario-scoped dispatch failure), or "error"
    pub status: String,
    /// Failure cause or error message, absent on success
    pub cause: Option<String>,
    /// Reconciliation iterations, when dispatch ran
    pub iterations: Option<usize>,
    pub output: String,
}

impl ScenarioRecord {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Summary of one batch run, written as `batch_manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchManifest {
    pub created_at: DateTime<Utc>,
    pub steps: Vec<String>,
    pub num_scenarios: usize,
    pub success: usize,
    pub failure: usize,
    pub scenarios: Vec<ScenarioRecord>,
}

pub fn write_batch_manifest(path: &Path, manifest: &BatchManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest).context("serializing batch manifest")?;
    fs::write(path, json).with_context(|| format!("writing '{}'", path.display()))?;
    Ok(())
}

pub fn read_batch_manifest(path: &Path) -> Result<BatchManifest> {
    let data = fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing '{}'", path.display()))
}
