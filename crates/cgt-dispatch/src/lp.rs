//! LP dispatch backend over good_lp.
//!
//! Builds one linear program per request: a power variable per unit per
//! timestep plus aggregate renewable variables bounded by their ceilings,
//! a balance equality per timestep, ramp inequalities between consecutive
//! samples, and a linear cost objective. Solved with the Clarabel
//! interior-point backend.

use good_lp::solvers::clarabel::clarabel;
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable,
};
use tracing::debug;

use cgt_core::{DispatchResult, SeriesTable, TerminationStatus};

use crate::adapter::{DispatchAdapter, DispatchError, DispatchRequest, DispatchableUnit};

/// Substitute for unbounded capacities; keeps the LP well-scaled.
const PMAX_FALLBACK_MW: f64 = 1e6;

/// Cost-minimizing LP dispatch.
#[derive(Debug, Clone)]
pub struct LpDispatch {
    /// Derating applied to every unit's Pmax
    pub pmax_margin: f64,
    /// Derating applied to every unit's ramp limits
    pub ramp_margin: f64,
}

impl Default for LpDispatch {
    fn default() -> Self {
        Self {
            pmax_margin: 1.0,
            ramp_margin: 1.0,
        }
    }
}

impl LpDispatch {
    pub fn new(pmax_margin: f64, ramp_margin: f64) -> Self {
        Self {
            pmax_margin,
            ramp_margin,
        }
    }

    /// Effective bounds of one unit at one timestep, after margins, hydro
    /// guide curves, and reconciliation floor/ceiling multipliers.
    fn bounds(&self, unit: &DispatchableUnit, request: &DispatchRequest, t: usize) -> (f64, f64) {
        let pnom = if unit.pmax_mw.is_finite() {
            unit.pmax_mw
        } else {
            PMAX_FALLBACK_MW
        };
        let mut lo = unit.pmin_mw;
        let mut hi = pnom * self.pmax_margin;

        if let Some(hydro) = request.hydro.iter().find(|h| h.unit == unit.name) {
            lo = lo.max(hydro.pmin_pu[t] * pnom);
            hi = hi.min(hydro.pmax_pu[t] * pnom);
        }
        if let Some(floor) = request.floor_pu.get(&unit.name) {
            lo = lo.max(floor[t] * pnom);
        }
        if let Some(ceiling) = request.ceiling_pu.get(&unit.name) {
            hi = hi.min(ceiling[t] * pnom);
        }
        (lo, hi)
    }
}

impl DispatchAdapter for LpDispatch {
    fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchResult, DispatchError> {
        request.validate()?;
        let t_len = request.len();

        let mut vars = variables!();

        // unit power variables; inverted bounds mean the floor rule or the
        // guide curves left no feasible band, which is an infeasibility
        // signal, not a programming error
        let mut p: Vec<Vec<Variable>> = Vec::with_capacity(request.units.len());
        for unit in &request.units {
            let mut row = Vec::with_capacity(t_len);
            for t in 0..t_len {
                let (lo, hi) = self.bounds(unit, request, t);
                if lo > hi + 1e-9 {
                    debug!(unit = %unit.name, t, lo, hi, "inverted bounds");
                    return Ok(DispatchResult::infeasible(t_len));
                }
                row.push(vars.add(variable().min(lo).max(hi)));
            }
            p.push(row);
        }

        let agg_solar: Vec<Variable> = (0..t_len)
            .map(|t| vars.add(variable().min(0.0).max(request.solar_ceiling[t].max(0.0))))
            .collect();
        let agg_wind: Vec<Variable> = (0..t_len)
            .map(|t| vars.add(variable().min(0.0).max(request.wind_ceiling[t].max(0.0))))
            .collect();

        // aggregate feasibility pre-check, per timestep
        for t in 0..t_len {
            let mut lo_sum = 0.0;
            let mut hi_sum = request.solar_ceiling[t].max(0.0) + request.wind_ceiling[t].max(0.0);
            for unit in &request.units {
                let (lo, hi) = self.bounds(unit, request, t);
                lo_sum += lo;
                hi_sum += hi;
            }
            if request.load[t] < lo_sum - 1e-6 || request.load[t] > hi_sum + 1e-6 {
                debug!(t, load = request.load[t], lo_sum, hi_sum, "unbalanceable timestep");
                return Ok(DispatchResult::infeasible(t_len));
            }
        }

        let mut objective = Expression::from(0.0);
        for (unit, row) in request.units.iter().zip(&p) {
            for v in row {
                objective += unit.cost_per_mw * *v;
            }
        }

        let mut model = vars.minimise(objective).using(clarabel);

        // power balance at every timestep
        for t in 0..t_len {
            let mut balance = Expression::from(0.0);
            for row in &p {
                balance += row[t];
            }
            balance += agg_solar[t];
            balance += agg_wind[t];
            model = model.with(constraint!(balance == request.load[t]));
        }

        // ramp limits between consecutive samples
        for (unit, row) in request.units.iter().zip(&p) {
            let up = unit.ramp_up_mw * self.ramp_margin;
            let down = unit.ramp_down_mw * self.ramp_margin;
            for t in 1..t_len {
                if up.is_finite() {
                    model = model.with(constraint!(row[t] - row[t - 1] <= up));
                }
                if down.is_finite() {
                    model = model.with(constraint!(row[t - 1] - row[t] <= down));
                }
            }
        }

        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => return Ok(DispatchResult::infeasible(t_len)),
            Err(err) => return Err(DispatchError::Solver(format!("{err:?}"))),
        };

        let mut prods = SeriesTable::new();
        for (unit, row) in request.units.iter().zip(&p) {
            prods
                .push_column(
                    unit.name.clone(),
                    row.iter().map(|v| solution.value(*v)).collect(),
                )
                .map_err(|e| DispatchError::Request(e.to_string()))?;
        }
        Ok(DispatchResult {
            prods,
            agg_solar: agg_solar.iter().map(|v| solution.value(*v)).collect(),
            agg_wind: agg_wind.iter().map(|v| solution.value(*v)).collect(),
            status: TerminationStatus::Ok,
        })
    }
}
