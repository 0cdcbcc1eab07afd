//! Per-case parameter files.
//!
//! A case directory carries four JSON parameter files, one per generation
//! stage:
//!
//! - `params.json` - time resolution and global noise settings
//! - `params_load.json` - mesh extent and demand noise presets
//! - `params_res.json` - renewable noise presets and smoothing
//! - `params_opf.json` - dispatch and reconciliation settings
//!
//! Missing files or malformed fields are configuration errors and abort
//! before any series generation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use cgt_ts::{NoiseParams, SynthesisParams};

/// Global generation parameters (`params.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralParams {
    /// Time step in minutes
    pub dt: u32,
    #[serde(default = "default_planned_std")]
    pub planned_std: f64,
    /// Forecast horizon in grid steps
    #[serde(default = "default_forecast_shift")]
    pub forecast_shift_steps: usize,
}

fn default_planned_std() -> f64 {
    0.01
}

fn default_forecast_shift() -> usize {
    1
}

/// Dispatch and reconciliation parameters (`params_opf.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchParams {
    /// Initial loss estimate as a percentage of demand
    #[serde(default = "default_losses_pct")]
    pub losses_pct: f64,
    /// Derating applied to Pmax before dispatch, keeping headroom for the
    /// flow evaluator's slack adjustments
    #[serde(default = "default_pmax_margin")]
    pub pmax_margin: f64,
    /// Derating applied to ramp limits before dispatch
    #[serde(default = "default_ramp_margin")]
    pub ramp_margin: f64,
    /// Reconciliation stops once no generator moves more than this (MW)
    #[serde(default = "default_threshold_stop")]
    pub threshold_stop: f64,
    /// Reconciliation iteration budget
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Generator absorbing the residual in the flow evaluator; defaults to
    /// the largest thermal unit
    #[serde(default)]
    pub slack_name: Option<String>,
    /// LP backend selector
    #[serde(default = "default_solver_name")]
    pub solver_name: String,
}

fn default_losses_pct() -> f64 {
    1.0
}
fn default_pmax_margin() -> f64 {
    0.9
}
fn default_ramp_margin() -> f64 {
    0.95
}
fn default_threshold_stop() -> f64 {
    0.5
}
fn default_max_iter() -> usize {
    100
}
fn default_solver_name() -> String {
    "clarabel".to_string()
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            losses_pct: default_losses_pct(),
            pmax_margin: default_pmax_margin(),
            ramp_margin: default_ramp_margin(),
            threshold_stop: default_threshold_stop(),
            max_iter: default_max_iter(),
            slack_name: None,
            solver_name: default_solver_name(),
        }
    }
}

/// All parameters of one case, assembled from the four parameter files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseConfig {
    pub general: GeneralParams,
    pub noise: NoiseParams,
    pub synthesis: SynthesisParams,
    pub dispatch: DispatchParams,
}

impl CaseConfig {
    /// Load and validate the parameter files of a case directory.
    pub fn load(case_dir: &Path) -> Result<CaseConfig> {
        let general: GeneralParams = read_params(case_dir, "params.json")?;
        let noise: NoiseParams = read_params(case_dir, "params_load.json")?;
        let res_noise: NoiseParams = read_params(case_dir, "params_res.json")?;
        let mut synthesis: SynthesisParams = read_params(case_dir, "params_res.json")?;
        let dispatch: DispatchParams = read_params(case_dir, "params_opf.json")?;

        // demand presets come from params_load.json, renewable presets from
        // params_res.json; merge onto one NoiseParams
        let noise = NoiseParams {
            solar_corr: res_noise.solar_corr,
            long_wind_corr: res_noise.long_wind_corr,
            medium_wind_corr: res_noise.medium_wind_corr,
            short_wind_corr: res_noise.short_wind_corr,
            ..noise
        };
        synthesis.planned_std = general.planned_std;
        synthesis.forecast_shift_steps = general.forecast_shift_steps;

        let config = CaseConfig {
            general,
            noise,
            synthesis,
            dispatch,
        };
        config.validate()?;
        Ok(config)
    }

    /// Range checks; every violation is fatal before generation starts.
    pub fn validate(&self) -> Result<()> {
        if self.general.dt == 0 {
            return Err(anyhow!("dt must be a positive number of minutes"));
        }
        if self.general.planned_std < 0.0 {
            return Err(anyhow!("planned_std cannot be negative"));
        }
        for (name, value) in [
            ("Lx", self.noise.domain_x_km),
            ("Ly", self.noise.domain_y_km),
            ("temperature_corr", self.noise.temperature_corr),
            ("solar_corr", self.noise.solar_corr),
            ("long_wind_corr", self.noise.long_wind_corr),
            ("medium_wind_corr", self.noise.medium_wind_corr),
            ("short_wind_corr", self.noise.short_wind_corr),
        ] {
            if value <= 0.0 {
                return Err(anyhow!("{name} must be positive, got {value}"));
            }
        }
        if !(0.0..=1.0).contains(&self.dispatch.pmax_margin)
            || self.dispatch.pmax_margin == 0.0
        {
            return Err(anyhow!(
                "pmax_margin must be in (0, 1], got {}",
                self.dispatch.pmax_margin
            ));
        }
        if !(0.0..=1.0).contains(&self.dispatch.ramp_margin) || self.dispatch.ramp_margin == 0.0 {
            return Err(anyhow!(
                "ramp_margin must be in (0, 1], got {}",
                self.dispatch.ramp_margin
            ));
        }
        if self.dispatch.threshold_stop <= 0.0 {
            return Err(anyhow!("threshold_stop must be positive"));
        }
        if self.dispatch.max_iter == 0 {
            return Err(anyhow!("max_iter must be at least 1"));
        }
        if self.dispatch.losses_pct < 0.0 {
            return Err(anyhow!("losses_pct cannot be negative"));
        }
        Ok(())
    }
}

fn read_params<T: serde::de::DeserializeOwned>(case_dir: &Path, file: &str) -> Result<T> {
    let path = case_dir.join(file);
    let data = fs::read_to_string(&path)
        .with_context(|| format!("reading parameter file '{}'", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_case(dir: &Path, opf: &str) {
        fs::write(dir.join("params.json"), r#"{"dt": 5, "planned_std": 0.02}"#).unwrap();
        fs::write(
            dir.join("params_load.json"),
            r#"{"Lx": 1000, "Ly": 800, "temperature_corr": 400}"#,
        )
        .unwrap();
        fs::write(
            dir.join("params_res.json"),
            r#"{"solar_corr": 300, "short_wind_corr": 60, "smoothdist": 0.5}"#,
        )
        .unwrap();
        fs::write(dir.join("params_opf.json"), opf).unwrap();
    }

    #[test]
    fn test_load_assembles_sections() {
        let dir = tempdir().unwrap();
        write_case(dir.path(), r#"{"losses_pct": 1.5, "max_iter": 20}"#);
        let config = CaseConfig::load(dir.path()).unwrap();
        assert_eq!(config.general.dt, 5);
        // merged: demand presets from params_load, renewable from params_res
        assert_eq!(config.noise.domain_y_km, 800.0);
        assert_eq!(config.noise.short_wind_corr, 60.0);
        assert_eq!(config.synthesis.smoothdist, 0.5);
        // planned_std propagates from params.json into synthesis
        assert_eq!(config.synthesis.planned_std, 0.02);
        assert_eq!(config.dispatch.max_iter, 20);
        // defaults fill whatever the files omit
        assert_eq!(config.dispatch.pmax_margin, 0.9);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        write_case(dir.path(), "{}");
        fs::remove_file(dir.path().join("params_opf.json")).unwrap();
        let err = CaseConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("params_opf.json"));
    }

    #[test]
    fn test_malformed_field_is_fatal() {
        let dir = tempdir().unwrap();
        write_case(dir.path(), r#"{"max_iter": "lots"}"#);
        assert!(CaseConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let dir = tempdir().unwrap();
        write_case(dir.path(), r#"{"pmax_margin": 1.7}"#);
        assert!(CaseConfig::load(dir.path()).is_err());

        write_case(dir.path(), r#"{"max_iter": 0}"#);
        assert!(CaseConfig::load(dir.path()).is_err());
    }
}
