//! `cgt` - chronics generation from the command line.
//!
//! A case directory supplies the parameter files, characteristic tables,
//! and pattern tables; `cgt generate` synthesizes the requested scenarios
//! into an output directory, `cgt validate` checks the inputs without
//! generating anything.

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use cgt_batch::{run_batch, BatchConfig, CaseInputs, Pipeline};
use cgt_core::TimeGrid;
use cgt_io::{
    read_characteristics, read_hydro_guide_curve, read_weekly_pattern, read_yearly_pattern,
    HydroGuideCurve,
};
use cgt_scenarios::CaseConfig;

#[derive(Parser)]
#[command(name = "cgt", version, about = "Chronics generation toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate chronics for a case
    Generate {
        /// Case directory with parameter files and characteristic tables
        #[arg(long)]
        input_dir: PathBuf,
        /// Where per-scenario artifacts are written
        #[arg(long)]
        output_dir: PathBuf,
        /// First day of the horizon (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Horizon length in weeks
        #[arg(long, default_value_t = 1)]
        weeks: u32,
        /// Number of scenarios to generate
        #[arg(long, default_value_t = 1)]
        scenarios: usize,
        /// Base seed for demand noise
        #[arg(long)]
        seed_load: Option<u64>,
        /// Base seed for renewable noise
        #[arg(long)]
        seed_res: Option<u64>,
        /// Base seed for dispatch
        #[arg(long)]
        seed_disp: Option<u64>,
        /// Worker threads (0 = auto-detect)
        #[arg(long, default_value_t = 0)]
        threads: usize,
        /// Comma-separated generation steps
        #[arg(long, default_value = "load,renewable,dispatch")]
        steps: String,
    },
    /// Validate case inputs without generating
    Validate {
        #[arg(long)]
        input_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Generate {
            input_dir,
            output_dir,
            start,
            weeks,
            scenarios,
            seed_load,
            seed_res,
            seed_disp,
            threads,
            steps,
        } => {
            let inputs = load_case(&input_dir)?;
            let grid = build_grid(&start, weeks, inputs.config.general.dt)?;
            let pipeline = Pipeline::parse(&steps)?;
            let config = BatchConfig {
                inputs,
                grid,
                output_root: output_dir,
                n_scenarios: scenarios,
                load_seed: seed_load,
                res_seed: seed_res,
                dispatch_seed: seed_disp,
                threads,
                pipeline,
            };
            let summary = run_batch(&config)?;
            println!(
                "{} scenario(s) ok, {} failed; manifest at {}",
                summary.success,
                summary.failure,
                summary.manifest_path.display()
            );
            if summary.success == 0 {
                return Err(anyhow!("every scenario failed"));
            }
            Ok(())
        }
        Commands::Validate { input_dir } => {
            let inputs = load_case(&input_dir)?;
            println!(
                "case ok: {} nodes, weekly pattern with {} samples, yearly pattern with {} samples",
                inputs.characteristics.len(),
                inputs.weekly.len(),
                inputs.yearly.len()
            );
            Ok(())
        }
    }
}

/// Load every case input; any missing or malformed piece aborts here,
/// before generation starts.
fn load_case(input_dir: &Path) -> Result<CaseInputs> {
    let config = CaseConfig::load(input_dir)?;

    let mut characteristics = read_characteristics(&input_dir.join("loads_charac.csv"))
        .context("loading demand characteristics")?;
    characteristics.extend(
        read_characteristics(&input_dir.join("prods_charac.csv"))
            .context("loading production characteristics")?,
    );

    let weekly = read_weekly_pattern(&input_dir.join("load_weekly_pattern.csv"))?;
    let yearly = read_yearly_pattern(&input_dir.join("solar_pattern.csv"))?;

    let guide_path = input_dir.join("hydro_guide_curves.csv");
    let hydro_curve = if guide_path.exists() {
        read_hydro_guide_curve(&guide_path)?
    } else {
        HydroGuideCurve::unconstrained()
    };

    info!(
        nodes = characteristics.len(),
        "case inputs loaded from {}",
        input_dir.display()
    );
    Ok(CaseInputs {
        characteristics,
        weekly,
        yearly,
        hydro_curve,
        config,
    })
}

fn build_grid(start: &str, weeks: u32, dt_minutes: u32) -> Result<TimeGrid> {
    let date = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("parsing start date '{start}'; use YYYY-MM-DD"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("building midnight timestamp for '{start}'"))?;
    let start = Utc
        .from_local_datetime(&midnight)
        .single()
        .ok_or_else(|| anyhow!("ambiguous start timestamp"))?;
    let end = start + Duration::weeks(i64::from(weeks));
    Ok(TimeGrid::new(start, end, dt_minutes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_args_parse() {
        let cli = Cli::try_parse_from([
            "cgt",
            "generate",
            "--input-dir",
            "case",
            "--output-dir",
            "out",
            "--start",
            "2050-01-03",
            "--scenarios",
            "4",
            "--seed-load",
            "1",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                scenarios,
                seed_load,
                weeks,
                steps,
                ..
            } => {
                assert_eq!(scenarios, 4);
                assert_eq!(seed_load, Some(1));
                assert_eq!(weeks, 1);
                assert_eq!(steps, "load,renewable,dispatch");
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_build_grid() {
        let grid = build_grid("2050-01-03", 1, 5).unwrap();
        assert_eq!(grid.len(), 7 * 24 * 12 + 1);
        assert!(build_grid("not-a-date", 1, 5).is_err());
    }
}
