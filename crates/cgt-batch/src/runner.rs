//! Batch scenario generation.
//!
//! Scenarios are independent given their seed triples, so the batch fans
//! out over a Rayon pool sharing only the read-only case inputs. A failure
//! is recorded in the scenario's manifest entry and never disturbs
//! siblings.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use cgt_core::{NodeCharacteristic, NodeKind, SeriesTable, TimeGrid};
use cgt_dispatch::{
    default_slack_name, DispatchAdapter, DispatchRequest, DispatchableUnit, HydroConstraint,
    InitialState, LossReconciliation, LpDispatch, ProportionalLossEvaluator, ReconcileOutcome,
    ReconcileParams,
};
use cgt_io::{write_loss_csv, write_series_csv, HydroGuideCurve};
use cgt_scenarios::{derive_seed_triples, CaseConfig, ResourceGroups, ScenarioContext, SeedTriple};
use cgt_ts::{NoiseGenerator, PowerSeries, Quantity, SeriesSynthesizer, WeeklyPattern, YearlyPattern};

use crate::manifest::{write_batch_manifest, BatchManifest, ScenarioRecord};
use crate::pipeline::{GenerationStep, Pipeline};

/// Amplitude of the per-scenario cost perturbation applied before dispatch.
const COST_NOISE_AMPLITUDE: f64 = 0.01;

/// Read-only case inputs shared by every scenario worker.
pub struct CaseInputs {
    pub characteristics: Vec<NodeCharacteristic>,
    pub weekly: WeeklyPattern,
    pub yearly: YearlyPattern,
    pub hydro_curve: HydroGuideCurve,
    pub config: CaseConfig,
}

/// One batch invocation.
pub struct BatchConfig {
    pub inputs: CaseInputs,
    pub grid: TimeGrid,
    pub output_root: PathBuf,
    pub n_scenarios: usize,
    pub load_seed: Option<u64>,
    pub res_seed: Option<u64>,
    pub dispatch_seed: Option<u64>,
    /// Worker threads; 0 auto-detects the CPU count
    pub threads: usize,
    pub pipeline: Pipeline,
}

/// Summary returned after the run so clients can log success/failure
/// counts and the manifest location.
pub struct BatchSummary {
    pub success: usize,
    pub failure: usize,
    pub manifest_path: PathBuf,
    pub scenarios: Vec<ScenarioRecord>,
}

pub fn run_batch(config: &BatchConfig) -> Result<BatchSummary> {
    if config.n_scenarios == 0 {
        return Err(anyhow!("batch needs at least one scenario"));
    }
    fs::create_dir_all(&config.output_root).with_context(|| {
        format!(
            "creating batch output root '{}'",
            config.output_root.display()
        )
    })?;

    let thread_count = if config.threads == 0 {
        num_cpus::get()
    } else {
        config.threads
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .context("building Rayon thread pool for scenario generation")?;

    let triples = derive_seed_triples(
        config.n_scenarios,
        config.load_seed,
        config.res_seed,
        config.dispatch_seed,
    );

    let records: Vec<ScenarioRecord> = pool.install(|| {
        triples
            .par_iter()
            .enumerate()
            .map(|(index, seeds)| run_scenario(index, *seeds, config))
            .collect()
    });

    let success = records.iter().filter(|r| r.is_ok()).count();
    let failure = records.len() - success;
    info!(success, failure, "batch complete");

    let manifest = BatchManifest {
        created_at: Utc::now(),
        steps: config
            .pipeline
            .steps()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
        num_scenarios: records.len(),
        success,
        failure,
        scenarios: records.clone(),
    };
    let manifest_path = config.output_root.join("batch_manifest.json");
    write_batch_manifest(&manifest_path, &manifest)?;

    Ok(BatchSummary {
        success,
        failure,
        manifest_path,
        scenarios: records,
    })
}

enum ScenarioStatus {
    Ok { iterations: Option<usize> },
    Failed { cause: String, iterations: usize },
}

fn run_scenario(index: usize, seeds: SeedTriple, config: &BatchConfig) -> ScenarioRecord {
    let scenario_id = format!("Scenario_{index}");
    let scenario_dir = config.output_root.join(&scenario_id);
    info!(scenario = %scenario_id, "generating");

    match generate_scenario(&scenario_id, &scenario_dir, seeds, config) {
        Ok(ScenarioStatus::Ok { iterations }) => ScenarioRecord {
            scenario_id,
            seeds,
            status: "ok".into(),
            cause: None,
            iterations,
            output: scenario_dir.display().to_string(),
        },
        Ok(ScenarioStatus::Failed { cause, iterations }) => ScenarioRecord {
            scenario_id,
            seeds,
            status: "failed".into(),
            cause: Some(cause),
            iterations: Some(iterations),
            output: scenario_dir.display().to_string(),
        },
        Err(err) => {
            warn!(scenario = %scenario_id, error = %err, "scenario errored");
            ScenarioRecord {
                scenario_id,
                seeds,
                status: "error".into(),
                cause: Some(err.to_string()),
                iterations: None,
                output: scenario_dir.display().to_string(),
            }
        }
    }
}

fn generate_scenario(
    scenario_id: &str,
    scenario_dir: &Path,
    seeds: SeedTriple,
    config: &BatchConfig,
) -> Result<ScenarioStatus> {
    fs::create_dir_all(scenario_dir)
        .with_context(|| format!("creating '{}'", scenario_dir.display()))?;
    let grid = &config.grid;
    let inputs = &config.inputs;
    let case = &inputs.config;
    let pipeline = &config.pipeline;

    let mut load = None;
    if pipeline.contains(GenerationStep::Load) {
        let mut noise = NoiseGenerator::from_seed(seeds.load);
        let temperature = noise.generate(
            grid.len(),
            grid.step_minutes(),
            &case.noise,
            Quantity::Temperature,
        );
        let mut synth = SeriesSynthesizer::new(case.synthesis.clone(), seeds.load);
        let series =
            synth.synthesize_load(grid, &inputs.characteristics, &inputs.weekly, &temperature)?;
        write_series_csv(&scenario_dir.join("load_p.csv"), grid, &series.realized)?;
        write_series_csv(
            &scenario_dir.join("load_p_forecasted.csv"),
            grid,
            &series.forecast,
        )?;
        load = Some(series);
    }

    let mut solar = None;
    let mut wind = None;
    if pipeline.contains(GenerationStep::Renewable) {
        let mut noise = NoiseGenerator::from_seed(seeds.res);
        let solar_field = noise.generate(grid.len(), grid.step_minutes(), &case.noise, Quantity::Solar);
        let long = noise.generate(grid.len(), grid.step_minutes(), &case.noise, Quantity::WindLong);
        let medium = noise.generate(
            grid.len(),
            grid.step_minutes(),
            &case.noise,
            Quantity::WindMedium,
        );
        let short = noise.generate(
            grid.len(),
            grid.step_minutes(),
            &case.noise,
            Quantity::WindShort,
        );
        let mut synth = SeriesSynthesizer::new(case.synthesis.clone(), seeds.res);
        let solar_series =
            synth.synthesize_solar(grid, &inputs.characteristics, &inputs.yearly, &solar_field)?;
        let wind_series =
            synth.synthesize_wind(grid, &inputs.characteristics, &long, &medium, &short)?;
        write_series_csv(&scenario_dir.join("solar_p.csv"), grid, &solar_series.realized)?;
        write_series_csv(
            &scenario_dir.join("solar_p_forecasted.csv"),
            grid,
            &solar_series.forecast,
        )?;
        write_series_csv(&scenario_dir.join("wind_p.csv"), grid, &wind_series.realized)?;
        write_series_csv(
            &scenario_dir.join("wind_p_forecasted.csv"),
            grid,
            &wind_series.forecast,
        )?;
        solar = Some(solar_series);
        wind = Some(wind_series);
    }

    if pipeline.contains(GenerationStep::Loss) && !pipeline.contains(GenerationStep::Dispatch) {
        let load = load
            .as_ref()
            .ok_or_else(|| anyhow!("loss step ran without demand chronics"))?;
        let losses: Vec<f64> = load
            .realized
            .total()
            .iter()
            .map(|v| v * case.dispatch.losses_pct / 100.0)
            .collect();
        write_loss_csv(&scenario_dir.join("loss_p.csv"), grid, &losses)?;
    }

    if pipeline.contains(GenerationStep::Dispatch) {
        let load = load.ok_or_else(|| anyhow!("dispatch ran without demand chronics"))?;
        let solar = solar.ok_or_else(|| anyhow!("dispatch ran without solar chronics"))?;
        let wind = wind.ok_or_else(|| anyhow!("dispatch ran without wind chronics"))?;
        return reconcile_dispatch(scenario_id, scenario_dir, seeds, config, &load, &solar, &wind);
    }

    Ok(ScenarioStatus::Ok { iterations: None })
}

fn reconcile_dispatch(
    scenario_id: &str,
    scenario_dir: &Path,
    seeds: SeedTriple,
    config: &BatchConfig,
    load: &PowerSeries,
    solar: &PowerSeries,
    wind: &PowerSeries,
) -> Result<ScenarioStatus> {
    let grid = &config.grid;
    let inputs = &config.inputs;
    let dispatch_params = &inputs.config.dispatch;

    let mut units = DispatchableUnit::from_characteristics(&inputs.characteristics);
    if units.is_empty() {
        return Err(anyhow!("case has no redispatchable generators"));
    }
    // small multiplicative cost noise breaks merit-order ties between units
    // sharing a marginal cost, keeping the schedule unique per scenario
    let mut cost_rng = StdRng::seed_from_u64(seeds.dispatch);
    for unit in &mut units {
        unit.cost_per_mw *= 1.0 + COST_NOISE_AMPLITUDE * cost_rng.gen::<f64>();
    }
    let slack = dispatch_params
        .slack_name
        .clone()
        .or_else(|| default_slack_name(&units))
        .ok_or_else(|| anyhow!("no thermal unit available as slack"))?;
    if !units.iter().any(|u| u.name == slack) {
        return Err(anyhow!("slack generator '{slack}' is not a dispatchable unit"));
    }

    let hydro: Vec<HydroConstraint> = inputs
        .characteristics
        .iter()
        .filter(|c| c.kind == NodeKind::Hydro)
        .map(|c| {
            let (pmin_pu, pmax_pu) = inputs.hydro_curve.expand(grid);
            HydroConstraint {
                unit: c.name.clone(),
                pmin_pu,
                pmax_pu,
            }
        })
        .collect();
    let voltage_setpoints: HashMap<String, f64> = inputs
        .characteristics
        .iter()
        .map(|c| (c.name.clone(), c.voltage_setpoint.value()))
        .collect();

    let total_load = load.realized.total();
    let loss_fraction = dispatch_params.losses_pct / 100.0;
    let adapter = LpDispatch::new(dispatch_params.pmax_margin, dispatch_params.ramp_margin);
    let mut evaluator =
        ProportionalLossEvaluator::new(total_load.clone(), loss_fraction, slack.clone());

    let groups = ResourceGroups::from_characteristics(&inputs.characteristics);
    let mut ctx = ScenarioContext::new(
        scenario_id,
        *grid,
        load.realized.clone(),
        solar.realized.clone(),
        wind.realized.clone(),
        groups,
    )?;

    // reference dispatch: demand inflated by the flat loss estimate
    let observed_load: Vec<f64> = total_load.iter().map(|v| v * (1.0 + loss_fraction)).collect();
    let reference = adapter
        .dispatch(&DispatchRequest {
            load: observed_load.clone(),
            solar_ceiling: aggregate(&solar.realized, grid.len()),
            wind_ceiling: aggregate(&wind.realized, grid.len()),
            units: units.clone(),
            hydro: hydro.clone(),
            ..Default::default()
        })
        .map_err(|e| anyhow!("reference dispatch: {e}"))?;
    if !reference.is_ok() {
        return Ok(ScenarioStatus::Failed {
            cause: "solver_infeasible".into(),
            iterations: 0,
        });
    }

    // full reference schedule: dispatched units plus renewable node series
    let mut prods = reference.prods.clone();
    for (name, column) in solar.realized.iter().chain(wind.realized.iter()) {
        prods.push_column(name.to_string(), column.to_vec())?;
    }
    let initial = InitialState::from_reference(
        &observed_load,
        prods,
        &mut evaluator,
        &voltage_setpoints,
    )?;

    let params = ReconcileParams {
        threshold_stop: dispatch_params.threshold_stop,
        max_iter: dispatch_params.max_iter,
    };
    let mut reconciliation = LossReconciliation::new(&adapter, &mut evaluator, params);
    let outcome = reconciliation.run(&mut ctx, &units, &hydro, &voltage_setpoints, initial)?;

    match outcome {
        ReconcileOutcome::Converged(reconciled) => {
            write_series_csv(&scenario_dir.join("prod_p.csv"), grid, &reconciled.prods)?;
            write_loss_csv(&scenario_dir.join("loss_p.csv"), grid, &reconciled.loss)?;
            Ok(ScenarioStatus::Ok {
                iterations: Some(reconciled.iterations),
            })
        }
        ReconcileOutcome::Failed {
            cause,
            last_prods,
            iterations,
        } => {
            // diagnostics only; an unconverged schedule is never emitted as
            // a final artifact
            write_series_csv(
                &scenario_dir.join("prod_p_diagnostic.csv"),
                grid,
                &last_prods,
            )?;
            Ok(ScenarioStatus::Failed {
                cause: cause.as_str().into(),
                iterations,
            })
        }
    }
}

fn aggregate(table: &SeriesTable, t_len: usize) -> Vec<f64> {
    if table.is_empty() {
        vec![0.0; t_len]
    } else {
        table.total()
    }
}
