//! Loss reconciliation: the dispatch/evaluate fixed-point loop.
//!
//! Dispatch balances demand plus an assumed loss series; simulating the
//! resulting setpoints yields the actual losses, which shift the demand the
//! next dispatch must balance. The loop alternates the two until no
//! generator moves more than `threshold_stop` between the dispatched and
//! realized schedules, or the iteration budget runs out.
//!
//! Two rules keep the iteration stable:
//!
//! - a non-regression floor: no redispatchable unit may be pushed below its
//!   previous setpoint plus the smallest observed deviation (one global
//!   scalar, applied uniformly to every unit)
//! - curtailment bookkeeping: whenever the solver takes less renewable
//!   energy than the ceiling offers, node-level series are rescaled
//!   proportionally and the ceiling tightens to the realized total, so
//!   curtailment only ever subtracts

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use cgt_core::{CgtError, CgtResult, SeriesTable};
use cgt_scenarios::ScenarioContext;

use crate::adapter::{DispatchAdapter, DispatchRequest, DispatchableUnit, HydroConstraint};
use crate::evaluator::FlowEvaluator;

/// Loop termination settings.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileParams {
    /// Stop once no generator moves more than this between dispatched and
    /// realized output (MW)
    pub threshold_stop: f64,
    /// Iteration budget; exceeding it fails the scenario
    pub max_iter: usize,
}

impl Default for ReconcileParams {
    fn default() -> Self {
        Self {
            threshold_stop: 0.5,
            max_iter: 100,
        }
    }
}

/// Why a reconciliation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    SolverInfeasible,
    IterationBudgetExceeded,
}

impl FailureCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCause::SolverInfeasible => "solver_infeasible",
            FailureCause::IterationBudgetExceeded => "iteration_budget_exceeded",
        }
    }
}

/// Converged output of the loop.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Final per-generator series, renewables included
    pub prods: SeriesTable,
    /// Final loss series (MW)
    pub loss: Vec<f64>,
    pub iterations: usize,
}

/// Terminal state of one reconciliation run.
///
/// A failed run carries the last known series for diagnostics only; it is
/// never substituted for a converged result.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    Converged(Reconciled),
    Failed {
        cause: FailureCause,
        last_prods: SeriesTable,
        iterations: usize,
    },
}

impl ReconcileOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, ReconcileOutcome::Converged(_))
    }
}

/// Mutable state threaded through the loop iterations.
#[derive(Debug, Clone)]
pub struct ConvergenceState {
    pub iteration: usize,
    /// Signed per-generator × time deviation (realized − dispatched)
    pub deviation: Vec<Vec<f64>>,
    /// Current loss-estimate series (MW)
    pub loss: Vec<f64>,
    /// Current lower-bound floor table, per-unit of Pmax
    pub floor_pu: HashMap<String, Vec<f64>>,
}

/// Inputs the loop starts from, derived from a reference evaluation.
#[derive(Debug, Clone)]
pub struct InitialState {
    /// Observed demand with the reference loss estimate removed (MW)
    pub load_without_loss: Vec<f64>,
    /// Reference per-generator schedule, renewables included
    pub prods: SeriesTable,
    /// Reference loss series (MW)
    pub loss: Vec<f64>,
    /// Reference deviation baseline
    pub deviation: Vec<Vec<f64>>,
}

impl InitialState {
    /// Evaluate the reference schedule once to seed the loop.
    ///
    /// `observed_load` is the total demand the reference dispatch was asked
    /// to serve, losses included; the evaluated losses are subtracted to
    /// recover the load-without-loss baseline.
    pub fn from_reference(
        observed_load: &[f64],
        prods: SeriesTable,
        evaluator: &mut dyn FlowEvaluator,
        voltage_setpoints: &HashMap<String, f64>,
    ) -> CgtResult<InitialState> {
        let evaluation = evaluator.evaluate(&prods, voltage_setpoints)?;
        let deviation = signed_deviation(&evaluation.realized, &prods)?;
        let load_without_loss = observed_load
            .iter()
            .zip(&evaluation.losses)
            .map(|(load, loss)| load - loss)
            .collect();
        Ok(InitialState {
            load_without_loss,
            prods,
            loss: evaluation.losses,
            deviation,
        })
    }
}

/// The reconciliation loop over a dispatch adapter and a flow evaluator.
pub struct LossReconciliation<'a> {
    adapter: &'a dyn DispatchAdapter,
    evaluator: &'a mut dyn FlowEvaluator,
    params: ReconcileParams,
}

impl<'a> LossReconciliation<'a> {
    pub fn new(
        adapter: &'a dyn DispatchAdapter,
        evaluator: &'a mut dyn FlowEvaluator,
        params: ReconcileParams,
    ) -> Self {
        Self {
            adapter,
            evaluator,
            params,
        }
    }

    /// Run the loop to a terminal state.
    ///
    /// Performs at most `max_iter` dispatch invocations (the reference
    /// dispatch that seeded `initial` is the caller's). The context gets
    /// the latest dispatch result attached every iteration and keeps the
    /// final loss series on convergence.
    pub fn run(
        &mut self,
        ctx: &mut ScenarioContext,
        units: &[DispatchableUnit],
        hydro: &[HydroConstraint],
        voltage_setpoints: &HashMap<String, f64>,
        initial: InitialState,
    ) -> CgtResult<ReconcileOutcome> {
        let step_minutes = f64::from(ctx.grid.step_minutes());
        let t_len = ctx.grid.len();
        let mut prods = initial.prods;
        let mut solar_total = total_or_zeros(&ctx.solar_ceiling, t_len);
        let mut wind_total = total_or_zeros(&ctx.wind_ceiling, t_len);
        let mut state = ConvergenceState {
            iteration: 0,
            deviation: initial.deviation,
            loss: initial.loss,
            floor_pu: HashMap::new(),
        };

        loop {
            state.iteration += 1;

            // DISPATCH: balance demand plus the current loss estimate,
            // never forcing a unit below its previous setpoint plus the
            // smallest observed deviation
            let load: Vec<f64> = initial
                .load_without_loss
                .iter()
                .zip(&state.loss)
                .map(|(base, loss)| base + loss)
                .collect();
            let min_deviation = matrix_min(&state.deviation);
            state.floor_pu = non_regression_floor_pu(&prods, units, min_deviation);

            let request = DispatchRequest {
                load,
                solar_ceiling: solar_total.clone(),
                wind_ceiling: wind_total.clone(),
                units: units.to_vec(),
                hydro: hydro.to_vec(),
                floor_pu: state.floor_pu.clone(),
                ceiling_pu: HashMap::new(),
            };
            let result = self
                .adapter
                .dispatch(&request)
                .map_err(|e| CgtError::Solver(e.to_string()))?;
            if !result.is_ok() {
                warn!(
                    scenario = %ctx.scenario_id,
                    iteration = state.iteration,
                    "dispatch infeasible, abandoning scenario"
                );
                return Ok(ReconcileOutcome::Failed {
                    cause: FailureCause::SolverInfeasible,
                    last_prods: prods,
                    iterations: state.iteration,
                });
            }

            for (name, column) in result.prods.iter() {
                if let Some(dst) = prods.column_mut(name) {
                    dst.copy_from_slice(column);
                }
            }

            // ADJUST bookkeeping: redistribute curtailment over the nodes
            // and tighten the ceilings to the realized totals
            let curtailed_mwh = curtailed_energy_mwh(&wind_total, &result.agg_wind, step_minutes);
            if curtailed_mwh > 0.0 {
                info!(
                    scenario = %ctx.scenario_id,
                    iteration = state.iteration,
                    curtailed_mwh,
                    "wind curtailed below ceiling"
                );
            }
            rescale_group(&mut prods, &ctx.groups.wind, &wind_total, &result.agg_wind);
            rescale_group(&mut prods, &ctx.groups.solar, &solar_total, &result.agg_solar);
            wind_total.copy_from_slice(&result.agg_wind);
            solar_total.copy_from_slice(&result.agg_solar);
            ctx.attach(result);

            // EVALUATE: simulate the schedule and measure how far the
            // network pushed every generator from its setpoint
            let evaluation = self.evaluator.evaluate(&prods, voltage_setpoints)?;
            state.deviation = signed_deviation(&evaluation.realized, &prods)?;
            let max_deviation = matrix_max_abs(&state.deviation);
            debug!(
                scenario = %ctx.scenario_id,
                iteration = state.iteration,
                max_deviation,
                "evaluated dispatch"
            );

            if max_deviation <= self.params.threshold_stop {
                info!(
                    scenario = %ctx.scenario_id,
                    iterations = state.iteration,
                    "reconciliation converged"
                );
                ctx.loss = Some(evaluation.losses.clone());
                return Ok(ReconcileOutcome::Converged(Reconciled {
                    prods,
                    loss: evaluation.losses,
                    iterations: state.iteration,
                }));
            }
            if state.iteration >= self.params.max_iter {
                warn!(
                    scenario = %ctx.scenario_id,
                    iterations = state.iteration,
                    max_deviation,
                    "iteration budget exceeded"
                );
                return Ok(ReconcileOutcome::Failed {
                    cause: FailureCause::IterationBudgetExceeded,
                    last_prods: prods,
                    iterations: state.iteration,
                });
            }
            state.loss = evaluation.losses;
        }
    }
}

/// Non-regression floors: `max(previous + min_deviation, pmin) / pmax` per
/// unit per timestep. The deviation scalar is global across all generators
/// and timesteps.
pub fn non_regression_floor_pu(
    prods: &SeriesTable,
    units: &[DispatchableUnit],
    min_deviation: f64,
) -> HashMap<String, Vec<f64>> {
    let mut floors = HashMap::new();
    for unit in units {
        if !(unit.pmax_mw.is_finite() && unit.pmax_mw > 0.0) {
            continue;
        }
        if let Some(previous) = prods.column(&unit.name) {
            let floor = previous
                .iter()
                .map(|p| (p + min_deviation).max(unit.pmin_mw) / unit.pmax_mw)
                .collect();
            floors.insert(unit.name.clone(), floor);
        }
    }
    floors
}

/// Proportional curtailment: scale each node column by
/// `realized_total[t] / ceiling_total[t]`. A zero ceiling skips the rescale
/// (the columns are already zero there), so no NaN can propagate.
fn rescale_group(
    prods: &mut SeriesTable,
    group: &[String],
    ceiling_total: &[f64],
    realized_total: &[f64],
) {
    for name in group {
        if let Some(column) = prods.column_mut(name) {
            for t in 0..column.len() {
                if ceiling_total[t] > 0.0 {
                    column[t] *= realized_total[t] / ceiling_total[t];
                }
            }
        }
    }
}

/// Per-timestep ceiling totals; a table with no columns means zero
/// availability over the whole horizon.
fn total_or_zeros(table: &SeriesTable, t_len: usize) -> Vec<f64> {
    if table.is_empty() {
        vec![0.0; t_len]
    } else {
        table.total()
    }
}

fn curtailed_energy_mwh(ceiling_total: &[f64], realized_total: &[f64], step_minutes: f64) -> f64 {
    let curtailed: f64 = ceiling_total
        .iter()
        .zip(realized_total)
        .map(|(c, r)| c - r)
        .sum();
    curtailed * step_minutes / 60.0
}

fn signed_deviation(realized: &SeriesTable, dispatched: &SeriesTable) -> CgtResult<Vec<Vec<f64>>> {
    if realized.names() != dispatched.names() {
        return Err(CgtError::Validation(
            "evaluator returned a different generator set than dispatched".into(),
        ));
    }
    Ok((0..dispatched.num_columns())
        .map(|i| {
            realized
                .column_at(i)
                .iter()
                .zip(dispatched.column_at(i))
                .map(|(r, d)| r - d)
                .collect()
        })
        .collect())
}

fn matrix_min(matrix: &[Vec<f64>]) -> f64 {
    let min = matrix
        .iter()
        .flatten()
        .fold(f64::INFINITY, |acc, v| acc.min(*v));
    if min.is_finite() {
        min
    } else {
        0.0
    }
}

fn matrix_max_abs(matrix: &[Vec<f64>]) -> f64 {
    matrix
        .iter()
        .flatten()
        .fold(0.0f64, |acc, v| acc.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::DispatchError;
    use crate::evaluator::{FlowEvaluation, ProportionalLossEvaluator};
    use crate::lp::LpDispatch;
    use cgt_core::{DispatchResult, NodeCharacteristic, NodeKind, TerminationStatus, TimeGrid};
    use cgt_scenarios::ResourceGroups;
    use chrono::{Duration, TimeZone, Utc};
    use std::cell::RefCell;

    const T: usize = 4;

    fn grid() -> TimeGrid {
        let start = Utc.with_ymd_and_hms(2050, 1, 3, 0, 0, 0).unwrap();
        TimeGrid::new(start, start + Duration::minutes(5 * (T as i64 - 1)), 5).unwrap()
    }

    fn single_unit() -> Vec<DispatchableUnit> {
        DispatchableUnit::from_characteristics(&[NodeCharacteristic::new(
            "gen_1",
            NodeKind::Thermal,
        )
        .with_p_limits(0.0, 100.0)
        .with_cost(10.0)])
    }

    fn context(load: f64, wind_ceiling: Option<Vec<f64>>) -> ScenarioContext {
        let load_table = SeriesTable::from_columns(
            vec!["load_1".into()],
            vec![vec![load; T]],
        )
        .unwrap();
        let (wind_table, groups) = match wind_ceiling {
            Some(values) => (
                SeriesTable::from_columns(vec!["wind_1".into()], vec![values]).unwrap(),
                ResourceGroups {
                    solar: vec![],
                    wind: vec!["wind_1".into()],
                },
            ),
            None => (SeriesTable::new(), ResourceGroups::default()),
        };
        ScenarioContext::new(
            "Scenario_0",
            grid(),
            load_table,
            SeriesTable::new(),
            wind_table,
            groups,
        )
        .unwrap()
    }

    /// Adapter that records every request and replays fixed setpoints.
    struct RecordingAdapter {
        setpoint: f64,
        infeasible: bool,
        calls: RefCell<usize>,
        floors: RefCell<Vec<HashMap<String, Vec<f64>>>>,
    }

    impl RecordingAdapter {
        fn new(setpoint: f64) -> Self {
            Self {
                setpoint,
                infeasible: false,
                calls: RefCell::new(0),
                floors: RefCell::new(Vec::new()),
            }
        }
    }

    impl DispatchAdapter for RecordingAdapter {
        fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchResult, DispatchError> {
            *self.calls.borrow_mut() += 1;
            self.floors.borrow_mut().push(request.floor_pu.clone());
            if self.infeasible {
                return Ok(DispatchResult::infeasible(request.len()));
            }
            let mut prods = SeriesTable::new();
            for unit in &request.units {
                prods
                    .push_column(unit.name.clone(), vec![self.setpoint; request.len()])
                    .map_err(|e| DispatchError::Request(e.to_string()))?;
            }
            Ok(DispatchResult {
                prods,
                agg_solar: request.solar_ceiling.clone(),
                agg_wind: request.wind_ceiling.clone(),
                status: TerminationStatus::Ok,
            })
        }
    }

    /// Evaluator that realizes dispatch plus a fixed bias on one column.
    struct BiasedEvaluator {
        biased: String,
        bias: f64,
        losses: f64,
    }

    impl FlowEvaluator for BiasedEvaluator {
        fn evaluate(
            &mut self,
            dispatch: &SeriesTable,
            _voltage_setpoints: &HashMap<String, f64>,
        ) -> CgtResult<FlowEvaluation> {
            let mut realized = dispatch.clone();
            if let Some(column) = realized.column_mut(&self.biased) {
                for v in column.iter_mut() {
                    *v += self.bias;
                }
            }
            Ok(FlowEvaluation {
                realized,
                losses: vec![self.losses; dispatch.len_time()],
            })
        }
    }

    fn initial_for(prods: SeriesTable, load: f64) -> InitialState {
        let t_len = prods.len_time();
        let deviation = vec![vec![0.0; t_len]; prods.num_columns()];
        InitialState {
            load_without_loss: vec![load; t_len],
            prods,
            loss: vec![0.0; t_len],
            deviation,
        }
    }

    #[test]
    fn test_constant_load_converges_first_iteration() {
        // single generator, constant load, lossless network: the reference
        // dispatch is already the fixed point
        let adapter = LpDispatch::default();
        let mut evaluator = ProportionalLossEvaluator::new(vec![50.0; T], 0.0, "gen_1");
        let units = single_unit();
        let voltages = HashMap::new();

        let reference = adapter
            .dispatch(&DispatchRequest {
                load: vec![50.0; T],
                solar_ceiling: vec![0.0; T],
                wind_ceiling: vec![0.0; T],
                units: units.clone(),
                ..Default::default()
            })
            .unwrap();
        let initial = InitialState::from_reference(
            &[50.0; T],
            reference.prods.clone(),
            &mut evaluator,
            &voltages,
        )
        .unwrap();

        let mut ctx = context(50.0, None);
        let mut loop_ = LossReconciliation::new(&adapter, &mut evaluator, ReconcileParams::default());
        let outcome = loop_.run(&mut ctx, &units, &[], &voltages, initial).unwrap();

        match outcome {
            ReconcileOutcome::Converged(reconciled) => {
                assert_eq!(reconciled.iterations, 1);
                for v in reconciled.prods.column("gen_1").unwrap() {
                    assert!((v - 50.0).abs() < 1e-3);
                }
                assert!(reconciled.loss.iter().all(|l| l.abs() < 1e-9));
            }
            other => panic!("expected convergence, got {other:?}"),
        }
        assert!(ctx.loss.is_some());
        assert!(ctx.dispatch().is_some());
    }

    #[test]
    fn test_dispatch_call_budget_respected() {
        // a 10 MW bias never falls under the threshold, so the loop must
        // stop on the iteration budget after exactly max_iter dispatches
        let adapter = RecordingAdapter::new(40.0);
        let mut evaluator = BiasedEvaluator {
            biased: "gen_1".into(),
            bias: 10.0,
            losses: 1.0,
        };
        let units = single_unit();
        let voltages = HashMap::new();
        let prods = SeriesTable::from_columns(vec!["gen_1".into()], vec![vec![40.0; T]]).unwrap();

        let mut ctx = context(50.0, None);
        let params = ReconcileParams {
            threshold_stop: 0.5,
            max_iter: 7,
        };
        let mut loop_ = LossReconciliation::new(&adapter, &mut evaluator, params);
        let outcome = loop_
            .run(&mut ctx, &units, &[], &voltages, initial_for(prods, 50.0))
            .unwrap();

        match outcome {
            ReconcileOutcome::Failed { cause, iterations, .. } => {
                assert_eq!(cause, FailureCause::IterationBudgetExceeded);
                assert_eq!(iterations, 7);
            }
            other => panic!("expected budget failure, got {other:?}"),
        }
        assert_eq!(*adapter.calls.borrow(), 7);
    }

    #[test]
    fn test_non_regression_floor_uses_global_min_deviation() {
        let adapter = RecordingAdapter::new(40.0);
        // realized = dispatched - 2 on gen_1: min deviation is -2
        let mut evaluator = BiasedEvaluator {
            biased: "gen_1".into(),
            bias: -2.0,
            losses: 0.0,
        };
        let units = single_unit();
        let voltages = HashMap::new();
        let prods = SeriesTable::from_columns(vec!["gen_1".into()], vec![vec![40.0; T]]).unwrap();

        let mut ctx = context(50.0, None);
        let params = ReconcileParams {
            threshold_stop: 0.5,
            max_iter: 3,
        };
        let mut loop_ = LossReconciliation::new(&adapter, &mut evaluator, params);
        loop_
            .run(&mut ctx, &units, &[], &voltages, initial_for(prods, 50.0))
            .unwrap();

        let floors = adapter.floors.borrow();
        // first dispatch: baseline deviation is zero, floor = prev / pmax
        assert!((floors[0]["gen_1"][0] - 0.40).abs() < 1e-9);
        // second dispatch: prev setpoint 40, min deviation -2 -> 38 / 100
        assert!((floors[1]["gen_1"][0] - 0.38).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_dispatch_fails_scenario() {
        let mut adapter = RecordingAdapter::new(40.0);
        adapter.infeasible = true;
        let mut evaluator = BiasedEvaluator {
            biased: "gen_1".into(),
            bias: 0.0,
            losses: 0.0,
        };
        let units = single_unit();
        let prods = SeriesTable::from_columns(vec!["gen_1".into()], vec![vec![40.0; T]]).unwrap();

        let mut ctx = context(50.0, None);
        let mut loop_ =
            LossReconciliation::new(&adapter, &mut evaluator, ReconcileParams::default());
        let outcome = loop_
            .run(&mut ctx, &units, &[], &HashMap::new(), initial_for(prods, 50.0))
            .unwrap();

        match outcome {
            ReconcileOutcome::Failed { cause, last_prods, iterations } => {
                assert_eq!(cause, FailureCause::SolverInfeasible);
                assert_eq!(iterations, 1);
                // diagnostics carry the last known series
                assert_eq!(last_prods.column("gen_1").unwrap(), &[40.0; T]);
            }
            other => panic!("expected infeasibility failure, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_wind_ceiling_skips_rescale() {
        let adapter = RecordingAdapter::new(50.0);
        let mut evaluator = BiasedEvaluator {
            biased: "gen_1".into(),
            bias: 0.0,
            losses: 0.0,
        };
        let units = single_unit();
        let prods = SeriesTable::from_columns(
            vec!["gen_1".into(), "wind_1".into()],
            vec![vec![50.0; T], vec![0.0; T]],
        )
        .unwrap();

        let mut ctx = context(50.0, Some(vec![0.0; T]));
        let mut loop_ =
            LossReconciliation::new(&adapter, &mut evaluator, ReconcileParams::default());
        let outcome = loop_
            .run(&mut ctx, &units, &[], &HashMap::new(), initial_for(prods, 50.0))
            .unwrap();

        match outcome {
            ReconcileOutcome::Converged(reconciled) => {
                for v in reconciled.prods.column("wind_1").unwrap() {
                    assert_eq!(*v, 0.0);
                    assert!(v.is_finite());
                }
            }
            other => panic!("expected convergence, got {other:?}"),
        }
    }

    #[test]
    fn test_curtailment_rescales_nodes_proportionally() {
        // adapter takes half the offered wind; node series must halve
        struct HalfWindAdapter;
        impl DispatchAdapter for HalfWindAdapter {
            fn dispatch(
                &self,
                request: &DispatchRequest,
            ) -> Result<DispatchResult, DispatchError> {
                let mut prods = SeriesTable::new();
                for unit in &request.units {
                    prods
                        .push_column(unit.name.clone(), vec![30.0; request.len()])
                        .map_err(|e| DispatchError::Request(e.to_string()))?;
                }
                Ok(DispatchResult {
                    prods,
                    agg_solar: request.solar_ceiling.clone(),
                    agg_wind: request.wind_ceiling.iter().map(|v| v / 2.0).collect(),
                    status: TerminationStatus::Ok,
                })
            }
        }

        let adapter = HalfWindAdapter;
        let mut evaluator = BiasedEvaluator {
            biased: "gen_1".into(),
            bias: 0.0,
            losses: 0.0,
        };
        let units = single_unit();
        let prods = SeriesTable::from_columns(
            vec!["gen_1".into(), "wind_1".into()],
            vec![vec![30.0; T], vec![20.0; T]],
        )
        .unwrap();

        let mut ctx = context(50.0, Some(vec![20.0; T]));
        let mut loop_ =
            LossReconciliation::new(&adapter, &mut evaluator, ReconcileParams::default());
        let outcome = loop_
            .run(&mut ctx, &units, &[], &HashMap::new(), initial_for(prods, 50.0))
            .unwrap();

        match outcome {
            ReconcileOutcome::Converged(reconciled) => {
                assert_eq!(reconciled.prods.column("wind_1").unwrap(), &[10.0; T]);
            }
            other => panic!("expected convergence, got {other:?}"),
        }
    }

    #[test]
    fn test_floor_helper_respects_pmin() {
        let units = DispatchableUnit::from_characteristics(&[NodeCharacteristic::new(
            "gen_1",
            NodeKind::Thermal,
        )
        .with_p_limits(20.0, 100.0)]);
        let prods =
            SeriesTable::from_columns(vec!["gen_1".into()], vec![vec![25.0, 80.0]]).unwrap();
        let floors = non_regression_floor_pu(&prods, &units, -10.0);
        let floor = &floors["gen_1"];
        // 25 - 10 = 15 is below pmin, so pmin wins; 80 - 10 = 70 stands
        assert!((floor[0] - 0.20).abs() < 1e-9);
        assert!((floor[1] - 0.70).abs() < 1e-9);
    }
}
