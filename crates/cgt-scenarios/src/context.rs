//! Per-scenario chronics bundle.
//!
//! [`ScenarioContext`] is built once per seed triple and owned by exactly
//! one generation run. The reconciliation loop mutates it in two ways only:
//! replacing the attached dispatch result each iteration, and rescaling the
//! renewable ceilings after curtailment.

use serde::{Deserialize, Serialize};

use cgt_core::{CgtError, CgtResult, DispatchResult, NodeCharacteristic, NodeKind, SeriesTable, TimeGrid};

/// Names of the renewable nodes, split by resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceGroups {
    pub solar: Vec<String>,
    pub wind: Vec<String>,
}

impl ResourceGroups {
    pub fn from_characteristics(characteristics: &[NodeCharacteristic]) -> Self {
        let mut groups = ResourceGroups::default();
        for c in characteristics {
            match c.kind {
                NodeKind::Solar => groups.solar.push(c.name.clone()),
                NodeKind::Wind => groups.wind.push(c.name.clone()),
                _ => {}
            }
        }
        groups
    }
}

/// Immutable-per-scenario bundle of chronics consumed by dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioContext {
    pub scenario_id: String,
    pub grid: TimeGrid,
    /// Realized demand, one column per load node
    pub load: SeriesTable,
    /// Renewable production ceilings, one column per node
    pub solar_ceiling: SeriesTable,
    pub wind_ceiling: SeriesTable,
    pub groups: ResourceGroups,
    /// Latest loss estimate, absent until a dispatch has been reconciled
    pub loss: Option<Vec<f64>>,
    dispatch: Option<DispatchResult>,
}

impl ScenarioContext {
    pub fn new(
        scenario_id: impl Into<String>,
        grid: TimeGrid,
        load: SeriesTable,
        solar_ceiling: SeriesTable,
        wind_ceiling: SeriesTable,
        groups: ResourceGroups,
    ) -> CgtResult<Self> {
        let expected = grid.len();
        for (what, table) in [
            ("load", &load),
            ("solar ceiling", &solar_ceiling),
            ("wind ceiling", &wind_ceiling),
        ] {
            if !table.is_empty() && table.len_time() != expected {
                return Err(CgtError::Validation(format!(
                    "{what} table has {} samples, grid expects {expected}",
                    table.len_time()
                )));
            }
        }
        Ok(Self {
            scenario_id: scenario_id.into(),
            grid,
            load,
            solar_ceiling,
            wind_ceiling,
            groups,
            loss: None,
            dispatch: None,
        })
    }

    /// Replace the stored dispatch result; called once per reconciliation
    /// iteration.
    pub fn attach(&mut self, result: DispatchResult) {
        self.dispatch = Some(result);
    }

    pub fn dispatch(&self) -> Option<&DispatchResult> {
        self.dispatch.as_ref()
    }

    /// Immutable copy for result emission.
    pub fn snapshot(&self) -> ScenarioContext {
        self.clone()
    }

    /// Per-timestep total demand across all load nodes.
    pub fn total_load(&self) -> Vec<f64> {
        self.load.total()
    }
}
