//! Physical-flow evaluator contract.
//!
//! The reconciliation loop hands the dispatched per-generator series plus
//! voltage setpoints to an external simulator and gets back the realized
//! per-generator output and the per-timestep network losses. Any concrete
//! simulator satisfying [`FlowEvaluator`] is substitutable; the built-in
//! [`ProportionalLossEvaluator`] models losses as a fixed fraction of
//! demand with the slack generator absorbing the residual.

use std::collections::HashMap;

use cgt_core::{CgtError, CgtResult, SeriesTable};

/// Result of simulating one dispatch over the horizon.
#[derive(Debug, Clone)]
pub struct FlowEvaluation {
    /// Realized per-generator output after the network settles
    pub realized: SeriesTable,
    /// Aggregate losses per timestep (MW)
    pub losses: Vec<f64>,
}

/// Contract to an external physical-flow simulator.
pub trait FlowEvaluator {
    fn evaluate(
        &mut self,
        dispatch: &SeriesTable,
        voltage_setpoints: &HashMap<String, f64>,
    ) -> CgtResult<FlowEvaluation>;
}

/// Loss model: `losses[t] = loss_fraction × demand[t]`, with the slack
/// generator absorbing whatever the dispatched total misses.
#[derive(Debug, Clone)]
pub struct ProportionalLossEvaluator {
    demand: Vec<f64>,
    loss_fraction: f64,
    slack: String,
}

impl ProportionalLossEvaluator {
    pub fn new(demand: Vec<f64>, loss_fraction: f64, slack: impl Into<String>) -> Self {
        Self {
            demand,
            loss_fraction,
            slack: slack.into(),
        }
    }
}

impl FlowEvaluator for ProportionalLossEvaluator {
    fn evaluate(
        &mut self,
        dispatch: &SeriesTable,
        _voltage_setpoints: &HashMap<String, f64>,
    ) -> CgtResult<FlowEvaluation> {
        if dispatch.len_time() != self.demand.len() {
            return Err(CgtError::Validation(format!(
                "dispatch has {} samples, demand has {}",
                dispatch.len_time(),
                self.demand.len()
            )));
        }
        if !dispatch.contains(&self.slack) {
            return Err(CgtError::Validation(format!(
                "slack generator '{}' missing from dispatch",
                self.slack
            )));
        }

        let losses: Vec<f64> = self
            .demand
            .iter()
            .map(|load| self.loss_fraction * load)
            .collect();

        let totals = dispatch.total();
        let mut realized = dispatch.clone();
        let slack_column = realized
            .column_mut(&self.slack)
            .ok_or_else(|| CgtError::Validation("slack column vanished".into()))?;
        for t in 0..self.demand.len() {
            let required = self.demand[t] + losses[t];
            slack_column[t] += required - totals[t];
        }

        Ok(FlowEvaluation { realized, losses })
    }
}
