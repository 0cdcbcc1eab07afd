//! Deterministic shape tables.
//!
//! Reference patterns are externally supplied tables of shape factors:
//! a weekly table for demand (time-of-week) and a yearly table for solar
//! (time-of-year, zero at night). Both are sampled onto a scenario's
//! [`TimeGrid`] with circular linear interpolation, so any table
//! resolution works against any step size.

use chrono::{DateTime, Datelike, Timelike, Utc};

use cgt_core::{CgtError, CgtResult, TimeGrid};

const MINUTES_PER_WEEK: f64 = 7.0 * 24.0 * 60.0;
const MINUTES_PER_YEAR: f64 = 365.0 * 24.0 * 60.0;

fn validate_shape(values: &[f64], what: &str) -> CgtResult<()> {
    if values.is_empty() {
        return Err(CgtError::Validation(format!("{what} pattern is empty")));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(CgtError::Validation(format!(
            "{what} pattern contains non-finite values"
        )));
    }
    Ok(())
}

/// Circular linear interpolation at fractional index `pos` (in table units).
fn interpolate_circular(values: &[f64], pos: f64) -> f64 {
    let n = values.len();
    let pos = pos.rem_euclid(n as f64);
    let i0 = pos.floor() as usize % n;
    let i1 = (i0 + 1) % n;
    let frac = pos - pos.floor();
    values[i0] * (1.0 - frac) + values[i1] * frac
}

/// Weekly demand shape, anchored on Monday 00:00.
#[derive(Debug, Clone)]
pub struct WeeklyPattern {
    values: Vec<f64>,
}

impl WeeklyPattern {
    pub fn new(values: Vec<f64>) -> CgtResult<Self> {
        validate_shape(&values, "weekly")?;
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Shape factor at a timestamp.
    pub fn shape_at(&self, ts: DateTime<Utc>) -> f64 {
        let minutes = f64::from(ts.weekday().num_days_from_monday()) * 24.0 * 60.0
            + f64::from(ts.hour()) * 60.0
            + f64::from(ts.minute())
            + f64::from(ts.second()) / 60.0;
        let pos = minutes / MINUTES_PER_WEEK * self.values.len() as f64;
        interpolate_circular(&self.values, pos)
    }

    /// Shape factors for every sample of a time grid.
    pub fn sample(&self, grid: &TimeGrid) -> Vec<f64> {
        grid.timestamps().map(|ts| self.shape_at(ts)).collect()
    }
}

/// Yearly production shape (solar), anchored on January 1st 00:00.
///
/// Leap days reuse the December 31st shape rather than extending the table.
#[derive(Debug, Clone)]
pub struct YearlyPattern {
    values: Vec<f64>,
}

impl YearlyPattern {
    pub fn new(values: Vec<f64>) -> CgtResult<Self> {
        validate_shape(&values, "yearly")?;
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn shape_at(&self, ts: DateTime<Utc>) -> f64 {
        let day = f64::from(ts.ordinal0().min(364));
        let minutes = day * 24.0 * 60.0
            + f64::from(ts.hour()) * 60.0
            + f64::from(ts.minute())
            + f64::from(ts.second()) / 60.0;
        let pos = minutes / MINUTES_PER_YEAR * self.values.len() as f64;
        interpolate_circular(&self.values, pos)
    }

    pub fn sample(&self, grid: &TimeGrid) -> Vec<f64> {
        grid.timestamps().map(|ts| self.shape_at(ts)).collect()
    }
}
