//! Dispatch solver contract.
//!
//! A [`DispatchRequest`] carries everything one solve needs: total demand,
//! aggregate renewable ceilings, the dispatchable units with their static
//! limits, hydro reservoir bounds, and the optional time-varying per-unit
//! floor/ceiling multipliers the reconciliation loop uses to damp
//! oscillation between iterations.

use std::collections::HashMap;

use thiserror::Error;

use cgt_core::{DispatchResult, NodeCharacteristic, NodeKind};

/// Errors a dispatch backend may raise.
///
/// Solver infeasibility is NOT an error: it is reported through
/// [`cgt_core::TerminationStatus::Infeasible`] so the reconciliation loop
/// decides disposition.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("dispatch request invalid: {0}")]
    Request(String),

    #[error("LP solver error: {0}")]
    Solver(String),
}

/// A generator the dispatch solver may schedule.
#[derive(Debug, Clone)]
pub struct DispatchableUnit {
    pub name: String,
    pub kind: NodeKind,
    pub pmin_mw: f64,
    pub pmax_mw: f64,
    /// Maximum upward move between consecutive samples (MW)
    pub ramp_up_mw: f64,
    pub ramp_down_mw: f64,
    pub cost_per_mw: f64,
}

impl DispatchableUnit {
    /// Redispatchable units (thermal, hydro) from the characteristic table.
    pub fn from_characteristics(characteristics: &[NodeCharacteristic]) -> Vec<DispatchableUnit> {
        characteristics
            .iter()
            .filter(|c| c.kind.is_redispatchable())
            .map(|c| DispatchableUnit {
                name: c.name.clone(),
                kind: c.kind,
                pmin_mw: c.pmin.value(),
                pmax_mw: c.pmax.value(),
                ramp_up_mw: c.ramp_up.value(),
                ramp_down_mw: c.ramp_down.value(),
                cost_per_mw: c.marginal_cost,
            })
            .collect()
    }
}

/// Default slack choice: the largest thermal unit.
pub fn default_slack_name(units: &[DispatchableUnit]) -> Option<String> {
    units
        .iter()
        .filter(|u| u.kind == NodeKind::Thermal)
        .max_by(|a, b| {
            a.pmax_mw
                .partial_cmp(&b.pmax_mw)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|u| u.name.clone())
}

/// Per-timestep reservoir bounds for one hydro unit, in per-unit of Pmax,
/// expanded externally from the seasonal guide curves.
#[derive(Debug, Clone)]
pub struct HydroConstraint {
    pub unit: String,
    pub pmin_pu: Vec<f64>,
    pub pmax_pu: Vec<f64>,
}

/// One dispatch invocation over the full horizon.
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    /// Total demand to balance, losses included (MW)
    pub load: Vec<f64>,
    /// Aggregate solar availability per timestep (MW)
    pub solar_ceiling: Vec<f64>,
    /// Aggregate wind availability per timestep (MW)
    pub wind_ceiling: Vec<f64>,
    pub units: Vec<DispatchableUnit>,
    pub hydro: Vec<HydroConstraint>,
    /// Time-varying lower-bound multipliers per unit (per-unit of Pmax)
    pub floor_pu: HashMap<String, Vec<f64>>,
    /// Time-varying upper-bound multipliers per unit (per-unit of Pmax)
    pub ceiling_pu: HashMap<String, Vec<f64>>,
}

impl DispatchRequest {
    /// Horizon length in samples.
    pub fn len(&self) -> usize {
        self.load.len()
    }

    pub fn is_empty(&self) -> bool {
        self.load.is_empty()
    }

    /// Series-length consistency across every field.
    pub fn validate(&self) -> Result<(), DispatchError> {
        let t_len = self.len();
        if t_len == 0 {
            return Err(DispatchError::Request("empty load series".into()));
        }
        if self.solar_ceiling.len() != t_len || self.wind_ceiling.len() != t_len {
            return Err(DispatchError::Request(format!(
                "renewable ceilings ({}/{}) do not match horizon {t_len}",
                self.solar_ceiling.len(),
                self.wind_ceiling.len()
            )));
        }
        for series in self
            .floor_pu
            .values()
            .chain(self.ceiling_pu.values())
        {
            if series.len() != t_len {
                return Err(DispatchError::Request(format!(
                    "bound multiplier series of length {} does not match horizon {t_len}",
                    series.len()
                )));
            }
        }
        for hydro in &self.hydro {
            if hydro.pmin_pu.len() != t_len || hydro.pmax_pu.len() != t_len {
                return Err(DispatchError::Request(format!(
                    "hydro constraint for '{}' does not match horizon {t_len}",
                    hydro.unit
                )));
            }
        }
        Ok(())
    }
}

/// Contract to an external cost-minimizing dispatch solver.
pub trait DispatchAdapter {
    fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchResult, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units() -> Vec<DispatchableUnit> {
        DispatchableUnit::from_characteristics(&[
            NodeCharacteristic::new("load_1", NodeKind::Load).with_p_limits(0.0, 50.0),
            NodeCharacteristic::new("wind_1", NodeKind::Wind).with_p_limits(0.0, 30.0),
            NodeCharacteristic::new("gen_small", NodeKind::Thermal).with_p_limits(5.0, 80.0),
            NodeCharacteristic::new("gen_big", NodeKind::Thermal).with_p_limits(0.0, 300.0),
            NodeCharacteristic::new("hydro_1", NodeKind::Hydro).with_p_limits(0.0, 120.0),
        ])
    }

    use cgt_core::NodeCharacteristic;

    #[test]
    fn test_units_keep_only_redispatchable() {
        let units = units();
        let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["gen_small", "gen_big", "hydro_1"]);
    }

    #[test]
    fn test_default_slack_is_largest_thermal() {
        assert_eq!(default_slack_name(&units()).unwrap(), "gen_big");
        assert_eq!(default_slack_name(&[]), None);
    }

    #[test]
    fn test_request_validation() {
        let mut request = DispatchRequest {
            load: vec![10.0; 4],
            solar_ceiling: vec![0.0; 4],
            wind_ceiling: vec![0.0; 4],
            units: units(),
            ..Default::default()
        };
        assert!(request.validate().is_ok());

        request.wind_ceiling.pop();
        assert!(request.validate().is_err());

        request.wind_ceiling.push(0.0);
        request.floor_pu.insert("gen_big".into(), vec![0.1; 3]);
        assert!(request.validate().is_err());
    }
}
