//! # cgt-core: Chronics Generation Core Model
//!
//! Fundamental data structures shared by every stage of chronics
//! generation: the time discretization, the static per-node
//! characteristics, dense node × time series storage, and the dispatch
//! result container the reconciliation loop attaches to a scenario.
//!
//! ## Core Data Structures
//!
//! - [`TimeGrid`] - scenario time discretization; every series in a
//!   scenario has exactly `TimeGrid::len()` samples
//! - [`NodeKind`] / [`NodeCharacteristic`] - static node tables (demand
//!   nodes and generators) loaded from the case's characteristic CSVs
//! - [`SeriesTable`] - node × time numeric table
//! - [`DispatchResult`] - per-generator schedule returned by a dispatch
//!   backend, plus aggregated renewable totals and termination status

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub mod error;
pub mod series;
pub mod units;

pub use error::{CgtError, CgtResult};
pub use series::SeriesTable;
pub use units::{Megawatts, PerUnit};

/// Time discretization of one scenario.
///
/// The grid is inclusive of both endpoints: a one-week horizon at a
/// 5-minute step has `7*24*12 + 1` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeGrid {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step_minutes: u32,
}

impl TimeGrid {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step_minutes: u32) -> CgtResult<Self> {
        if step_minutes == 0 {
            return Err(CgtError::Validation("time step must be positive".into()));
        }
        if end < start {
            return Err(CgtError::Validation(format!(
                "end {} is before start {}",
                end, start
            )));
        }
        Ok(Self {
            start,
            end,
            step_minutes,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    /// Number of samples: `floor((end - start) / step) + 1`.
    pub fn len(&self) -> usize {
        let span = (self.end - self.start).num_minutes();
        (span / i64::from(self.step_minutes)) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false // a valid grid always contains at least the start sample
    }

    /// Timestamp of sample `idx` (not bounds-checked against `len`).
    pub fn timestamp(&self, idx: usize) -> DateTime<Utc> {
        self.start + Duration::minutes(idx as i64 * i64::from(self.step_minutes))
    }

    /// All sample timestamps in order.
    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        (0..self.len()).map(|i| self.timestamp(i))
    }

    /// Horizon length in minutes.
    pub fn span_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Kind of a grid node in the characteristic tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Load,
    Solar,
    Wind,
    Thermal,
    Hydro,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Load => "load",
            NodeKind::Solar => "solar",
            NodeKind::Wind => "wind",
            NodeKind::Thermal => "thermal",
            NodeKind::Hydro => "hydro",
        }
    }

    /// Renewable production whose output is capped by a weather-driven ceiling.
    pub fn is_renewable(&self) -> bool {
        matches!(self, NodeKind::Solar | NodeKind::Wind)
    }

    /// Generators the dispatch solver may move between iterations.
    pub fn is_redispatchable(&self) -> bool {
        matches!(self, NodeKind::Thermal | NodeKind::Hydro)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = CgtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "load" => Ok(NodeKind::Load),
            "solar" => Ok(NodeKind::Solar),
            "wind" => Ok(NodeKind::Wind),
            "thermal" => Ok(NodeKind::Thermal),
            "hydro" => Ok(NodeKind::Hydro),
            other => Err(CgtError::Parse(format!("unknown node kind '{other}'"))),
        }
    }
}

/// Static characteristics of one grid node (demand node or generator).
///
/// Correlation scales for the stochastic fields are per-quantity presets in
/// the generation parameters, not per node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCharacteristic {
    pub name: String,
    pub kind: NodeKind,
    /// Location on the synthetic mesh (km)
    pub x: f64,
    pub y: f64,
    /// Maximum active power (installed capacity for renewables, peak demand
    /// scaling for loads)
    pub pmax: Megawatts,
    /// Minimum active power output
    pub pmin: Megawatts,
    /// Maximum upward change between consecutive samples
    pub ramp_up: Megawatts,
    /// Maximum downward change between consecutive samples
    pub ramp_down: Megawatts,
    /// Dispatch cost ($/MWh); zero for loads and renewables
    pub marginal_cost: f64,
    /// Voltage setpoint handed to the flow evaluator
    pub voltage_setpoint: PerUnit,
}

impl NodeCharacteristic {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            x: 0.0,
            y: 0.0,
            pmax: Megawatts(0.0),
            pmin: Megawatts(0.0),
            ramp_up: Megawatts(f64::INFINITY),
            ramp_down: Megawatts(f64::INFINITY),
            marginal_cost: 0.0,
            voltage_setpoint: PerUnit(1.0),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_p_limits(mut self, pmin: f64, pmax: f64) -> Self {
        self.pmin = Megawatts(pmin);
        self.pmax = Megawatts(pmax);
        self
    }

    pub fn with_ramps(mut self, ramp_up: f64, ramp_down: f64) -> Self {
        self.ramp_up = Megawatts(ramp_up);
        self.ramp_down = Megawatts(ramp_down);
        self
    }

    pub fn with_cost(mut self, cost_per_mw: f64) -> Self {
        self.marginal_cost = cost_per_mw;
        self
    }

    pub fn with_voltage(mut self, setpoint_pu: f64) -> Self {
        self.voltage_setpoint = PerUnit(setpoint_pu);
        self
    }
}

/// Select all characteristics of a given kind, preserving table order.
pub fn nodes_of_kind(characteristics: &[NodeCharacteristic], kind: NodeKind) -> Vec<&NodeCharacteristic> {
    characteristics.iter().filter(|c| c.kind == kind).collect()
}

/// Termination status of one dispatch solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStatus {
    Ok,
    Infeasible,
}

/// Output of one dispatch solve.
///
/// `prods` holds one column per redispatchable generator; curtailable
/// renewables are carried as aggregated `agg_solar`/`agg_wind` totals that
/// the reconciliation loop redistributes over the individual nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub prods: SeriesTable,
    pub agg_solar: Vec<f64>,
    pub agg_wind: Vec<f64>,
    pub status: TerminationStatus,
}

impl DispatchResult {
    pub fn infeasible(len: usize) -> Self {
        Self {
            prods: SeriesTable::new(),
            agg_solar: vec![0.0; len],
            agg_wind: vec![0.0; len],
            status: TerminationStatus::Infeasible,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == TerminationStatus::Ok
    }
}
