//! Reference-data importers.
//!
//! Characteristic tables carry one row per node with the columns
//! `name,type,x,y,Pmax[,Pmin,max_ramp_up,max_ramp_down,marginal_cost,V]`.
//! Pattern tables carry shape factors in their last column, one row per
//! pattern sample. The hydro guide-curve table carries one row per month
//! with per-unit reservoir bounds.

use std::path::Path;

use chrono::Datelike;
use serde::Deserialize;

use cgt_core::{CgtError, CgtResult, Megawatts, NodeCharacteristic, NodeKind, PerUnit, TimeGrid};
use cgt_ts::{WeeklyPattern, YearlyPattern};

#[derive(Debug, Deserialize)]
struct CharacteristicRow {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    x: f64,
    y: f64,
    #[serde(rename = "Pmax")]
    pmax: f64,
    #[serde(rename = "Pmin", default)]
    pmin: f64,
    #[serde(rename = "max_ramp_up", default = "unlimited_ramp")]
    ramp_up: f64,
    #[serde(rename = "max_ramp_down", default = "unlimited_ramp")]
    ramp_down: f64,
    #[serde(default)]
    marginal_cost: f64,
    #[serde(rename = "V", default = "nominal_voltage")]
    voltage: f64,
}

fn unlimited_ramp() -> f64 {
    f64::INFINITY
}

fn nominal_voltage() -> f64 {
    1.0
}

const REQUIRED_COLUMNS: [&str; 5] = ["name", "type", "x", "y", "Pmax"];

/// Read a node characteristic table (`loads_charac.csv` /
/// `prods_charac.csv`).
pub fn read_characteristics(path: &Path) -> CgtResult<Vec<NodeCharacteristic>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| CgtError::Config(format!("opening '{}': {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| CgtError::Config(format!("reading headers of '{}': {e}", path.display())))?
        .clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == **c))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(CgtError::Config(format!(
            "'{}' is missing required columns: {}",
            path.display(),
            missing.join(", ")
        )));
    }

    let mut characteristics = Vec::new();
    for (line, record) in reader.deserialize::<CharacteristicRow>().enumerate() {
        let row = record.map_err(|e| {
            CgtError::Config(format!("'{}' row {}: {e}", path.display(), line + 1))
        })?;
        let kind: NodeKind = row.kind.parse().map_err(|e: CgtError| {
            CgtError::Config(format!("'{}' row {} ('{}'): {e}", path.display(), line + 1, row.name))
        })?;
        if row.pmax < row.pmin {
            return Err(CgtError::Config(format!(
                "'{}' row {} ('{}'): Pmax {} below Pmin {}",
                path.display(),
                line + 1,
                row.name,
                row.pmax,
                row.pmin
            )));
        }
        characteristics.push(NodeCharacteristic {
            name: row.name,
            kind,
            x: row.x,
            y: row.y,
            pmax: Megawatts(row.pmax),
            pmin: Megawatts(row.pmin),
            ramp_up: Megawatts(row.ramp_up),
            ramp_down: Megawatts(row.ramp_down),
            marginal_cost: row.marginal_cost,
            voltage_setpoint: PerUnit(row.voltage),
        });
    }
    if characteristics.is_empty() {
        return Err(CgtError::Config(format!(
            "'{}' contains no node rows",
            path.display()
        )));
    }
    Ok(characteristics)
}

/// Shape factors from the last column of a pattern CSV.
fn read_shape_column(path: &Path) -> CgtResult<Vec<f64>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| CgtError::Config(format!("opening '{}': {e}", path.display())))?;
    let headers = reader
        .headers()
        .map_err(|e| CgtError::Config(format!("reading headers of '{}': {e}", path.display())))?;
    if headers.is_empty() {
        return Err(CgtError::Config(format!(
            "'{}' has no columns",
            path.display()
        )));
    }
    let value_idx = headers.len() - 1;

    let mut values = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            CgtError::Config(format!("'{}' row {}: {e}", path.display(), line + 1))
        })?;
        let raw = record.get(value_idx).unwrap_or("");
        let value: f64 = raw.parse().map_err(|_| {
            CgtError::Config(format!(
                "'{}' row {}: '{raw}' is not a number",
                path.display(),
                line + 1
            ))
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Read the weekly demand pattern (`load_weekly_pattern.csv`).
pub fn read_weekly_pattern(path: &Path) -> CgtResult<WeeklyPattern> {
    WeeklyPattern::new(read_shape_column(path)?)
        .map_err(|e| CgtError::Config(format!("'{}': {e}", path.display())))
}

/// Read the yearly solar pattern (`solar_pattern.csv`).
pub fn read_yearly_pattern(path: &Path) -> CgtResult<YearlyPattern> {
    YearlyPattern::new(read_shape_column(path)?)
        .map_err(|e| CgtError::Config(format!("'{}': {e}", path.display())))
}

#[derive(Debug, Deserialize)]
struct GuideCurveRow {
    month: u32,
    pmin_pu: f64,
    pmax_pu: f64,
}

/// Seasonal reservoir bounds for hydro units, one row per month.
#[derive(Debug, Clone)]
pub struct HydroGuideCurve {
    pmin_pu: [f64; 12],
    pmax_pu: [f64; 12],
}

impl HydroGuideCurve {
    /// Fully open bounds, used when a case ships no guide-curve table.
    pub fn unconstrained() -> Self {
        Self {
            pmin_pu: [0.0; 12],
            pmax_pu: [1.0; 12],
        }
    }

    pub fn bounds_for_month(&self, month: u32) -> (f64, f64) {
        let idx = (month.clamp(1, 12) - 1) as usize;
        (self.pmin_pu[idx], self.pmax_pu[idx])
    }

    /// Expand the monthly bounds onto a scenario time grid.
    pub fn expand(&self, grid: &TimeGrid) -> (Vec<f64>, Vec<f64>) {
        let mut pmin = Vec::with_capacity(grid.len());
        let mut pmax = Vec::with_capacity(grid.len());
        for ts in grid.timestamps() {
            let (lo, hi) = self.bounds_for_month(ts.month());
            pmin.push(lo);
            pmax.push(hi);
        }
        (pmin, pmax)
    }
}

/// Read the hydro guide-curve table (`hydro_guide_curves.csv`).
pub fn read_hydro_guide_curve(path: &Path) -> CgtResult<HydroGuideCurve> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| CgtError::Config(format!("opening '{}': {e}", path.display())))?;
    let mut curve = HydroGuideCurve::unconstrained();
    let mut seen = [false; 12];
    for (line, record) in reader.deserialize::<GuideCurveRow>().enumerate() {
        let row = record.map_err(|e| {
            CgtError::Config(format!("'{}' row {}: {e}", path.display(), line + 1))
        })?;
        if !(1..=12).contains(&row.month) {
            return Err(CgtError::Config(format!(
                "'{}' row {}: month {} out of range",
                path.display(),
                line + 1,
                row.month
            )));
        }
        if row.pmin_pu > row.pmax_pu {
            return Err(CgtError::Config(format!(
                "'{}' row {}: pmin_pu {} above pmax_pu {}",
                path.display(),
                line + 1,
                row.pmin_pu,
                row.pmax_pu
            )));
        }
        let idx = (row.month - 1) as usize;
        curve.pmin_pu[idx] = row.pmin_pu;
        curve.pmax_pu[idx] = row.pmax_pu;
        seen[idx] = true;
    }
    if let Some(month0) = seen.iter().position(|s| !s) {
        return Err(CgtError::Config(format!(
            "'{}' is missing month {}",
            path.display(),
            month0 + 1
        )));
    }
    Ok(curve)
}
