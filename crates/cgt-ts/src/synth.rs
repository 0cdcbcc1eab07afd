//! Series synthesis: noise fields + patterns + capacities → chronics.
//!
//! For each power type the synthesizer builds a per-node base series from
//! the deterministic pattern and the interpolated noise field, then derives
//! the two emitted variants:
//!
//! - forecast: the base series shifted forward by the forecast horizon,
//!   with no measurement noise
//! - realized: the unshifted base series plus independent Gaussian
//!   measurement noise scaled by `planned_std × Pmax`
//!
//! Realized load is clipped to ≥ 0; realized and forecast renewable output
//! is clipped to `[0, Pmax]`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cgt_core::{CgtResult, NodeCharacteristic, NodeKind, SeriesTable, TimeGrid};

use crate::noise::NoiseField;
use crate::pattern::{WeeklyPattern, YearlyPattern};

/// Amplitudes and shaping constants for the synthesis step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisParams {
    /// Std-dev of the measurement noise injected into realized series,
    /// as a fraction of each node's Pmax
    #[serde(default = "default_planned_std")]
    pub planned_std: f64,
    /// Smoothing-kernel parameter; adds uniform jitter in
    /// `[0, smoothdist / 1000]` pu to renewable signals
    #[serde(default = "default_smoothdist")]
    pub smoothdist: f64,
    /// Forecast horizon expressed in grid steps
    #[serde(default = "default_forecast_shift")]
    pub forecast_shift_steps: usize,
    /// Thermosensitive demand amplitude
    #[serde(default = "default_std_temperature")]
    pub std_temperature_noise: f64,
    /// Solar noise amplitude around the clear-sky level
    #[serde(default = "default_std_solar")]
    pub std_solar_noise: f64,
    /// Clear-sky base level multiplying the yearly solar shape
    #[serde(default = "default_solar_base")]
    pub solar_base_level: f64,
    #[serde(default = "default_std_long_wind")]
    pub std_long_wind_noise: f64,
    #[serde(default = "default_std_medium_wind")]
    pub std_medium_wind_noise: f64,
    #[serde(default = "default_std_short_wind")]
    pub std_short_wind_noise: f64,
    /// Output level of the exponential wind shaping at zero noise,
    /// as a fraction of Pmax
    #[serde(default = "default_wind_scale")]
    pub wind_scale: f64,
    /// Exponent applied to the combined wind signal
    #[serde(default = "default_wind_shaping")]
    pub wind_shaping: f64,
}

fn default_planned_std() -> f64 {
    0.01
}
fn default_smoothdist() -> f64 {
    1.0
}
fn default_forecast_shift() -> usize {
    1
}
fn default_std_temperature() -> f64 {
    0.06
}
fn default_std_solar() -> f64 {
    0.25
}
fn default_solar_base() -> f64 {
    0.75
}
fn default_std_long_wind() -> f64 {
    0.3
}
fn default_std_medium_wind() -> f64 {
    0.25
}
fn default_std_short_wind() -> f64 {
    0.15
}
fn default_wind_scale() -> f64 {
    0.1
}
fn default_wind_shaping() -> f64 {
    4.0
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            planned_std: default_planned_std(),
            smoothdist: default_smoothdist(),
            forecast_shift_steps: default_forecast_shift(),
            std_temperature_noise: default_std_temperature(),
            std_solar_noise: default_std_solar(),
            solar_base_level: default_solar_base(),
            std_long_wind_noise: default_std_long_wind(),
            std_medium_wind_noise: default_std_medium_wind(),
            std_short_wind_noise: default_std_short_wind(),
            wind_scale: default_wind_scale(),
            wind_shaping: default_wind_shaping(),
        }
    }
}

/// Realized/forecast pair for one power type.
#[derive(Debug, Clone)]
pub struct PowerSeries {
    pub realized: SeriesTable,
    pub forecast: SeriesTable,
}

/// Builds realized and forecast chronics for one scenario.
pub struct SeriesSynthesizer {
    params: SynthesisParams,
    rng: StdRng,
}

impl SeriesSynthesizer {
    /// The seed drives only the per-sample measurement noise and smoothing
    /// jitter; field-level randomness comes from the noise generator.
    pub fn new(params: SynthesisParams, seed: u64) -> Self {
        Self {
            params,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Demand chronics for every load node.
    pub fn synthesize_load(
        &mut self,
        grid: &TimeGrid,
        characteristics: &[NodeCharacteristic],
        weekly: &WeeklyPattern,
        temperature: &NoiseField,
    ) -> CgtResult<PowerSeries> {
        let shape = weekly.sample(grid);
        let mut realized = SeriesTable::new();
        let mut forecast = SeriesTable::new();

        for node in characteristics.iter().filter(|c| c.kind == NodeKind::Load) {
            let pmax = node.pmax.value();
            let signal = temperature.series_at(node.x, node.y, grid.len());
            let base: Vec<f64> = shape
                .iter()
                .zip(&signal)
                .map(|(s, temp)| pmax * s * (1.0 + self.params.std_temperature_noise * temp))
                .collect();

            forecast.push_column(node.name.clone(), self.shift_forward(&base))?;
            let noisy = self.add_measurement_noise(&base, pmax);
            realized.push_column(
                node.name.clone(),
                noisy.into_iter().map(|v| v.max(0.0)).collect(),
            )?;
        }
        debug!(nodes = realized.num_columns(), "synthesized load chronics");
        Ok(PowerSeries { realized, forecast })
    }

    /// Solar chronics for every solar node.
    pub fn synthesize_solar(
        &mut self,
        grid: &TimeGrid,
        characteristics: &[NodeCharacteristic],
        yearly: &YearlyPattern,
        solar_noise: &NoiseField,
    ) -> CgtResult<PowerSeries> {
        let shape = yearly.sample(grid);
        let mut realized = SeriesTable::new();
        let mut forecast = SeriesTable::new();

        for node in characteristics.iter().filter(|c| c.kind == NodeKind::Solar) {
            let pmax = node.pmax.value();
            let signal = solar_noise.series_at(node.x, node.y, grid.len());
            let base: Vec<f64> = shape
                .iter()
                .zip(&signal)
                .map(|(s, noise)| {
                    let level =
                        s * (self.params.solar_base_level + self.params.std_solar_noise * noise);
                    pmax * (level + self.smoothing_jitter())
                })
                .collect();

            forecast.push_column(
                node.name.clone(),
                clamp_to(self.shift_forward(&base), pmax),
            )?;
            let noisy = self.add_measurement_noise(&base, pmax);
            realized.push_column(node.name.clone(), clamp_to(noisy, pmax))?;
        }
        debug!(nodes = realized.num_columns(), "synthesized solar chronics");
        Ok(PowerSeries { realized, forecast })
    }

    /// Wind chronics for every wind node, combining the three wind regimes.
    pub fn synthesize_wind(
        &mut self,
        grid: &TimeGrid,
        characteristics: &[NodeCharacteristic],
        long: &NoiseField,
        medium: &NoiseField,
        short: &NoiseField,
    ) -> CgtResult<PowerSeries> {
        let mut realized = SeriesTable::new();
        let mut forecast = SeriesTable::new();

        for node in characteristics.iter().filter(|c| c.kind == NodeKind::Wind) {
            let pmax = node.pmax.value();
            let len = grid.len();
            let sl = long.series_at(node.x, node.y, len);
            let sm = medium.series_at(node.x, node.y, len);
            let ss = short.series_at(node.x, node.y, len);
            let base: Vec<f64> = (0..len)
                .map(|t| {
                    let combined = self.params.std_long_wind_noise * sl[t]
                        + self.params.std_medium_wind_noise * sm[t]
                        + self.params.std_short_wind_noise * ss[t];
                    pmax * self.params.wind_scale * (self.params.wind_shaping * combined).exp()
                        + pmax * self.smoothing_jitter()
                })
                .collect();

            forecast.push_column(
                node.name.clone(),
                clamp_to(self.shift_forward(&base), pmax),
            )?;
            let noisy = self.add_measurement_noise(&base, pmax);
            realized.push_column(node.name.clone(), clamp_to(noisy, pmax))?;
        }
        debug!(nodes = realized.num_columns(), "synthesized wind chronics");
        Ok(PowerSeries { realized, forecast })
    }

    /// Day-ahead view: `forecast[t] = base[t + shift]`, clamped at the end
    /// of the horizon.
    fn shift_forward(&self, base: &[f64]) -> Vec<f64> {
        let last = base.len().saturating_sub(1);
        (0..base.len())
            .map(|t| base[(t + self.params.forecast_shift_steps).min(last)])
            .collect()
    }

    fn add_measurement_noise(&mut self, base: &[f64], pmax: f64) -> Vec<f64> {
        let std = self.params.planned_std * pmax;
        base.iter()
            .map(|v| {
                let eps: f64 = self.rng.sample(StandardNormal);
                v + eps * std
            })
            .collect()
    }

    fn smoothing_jitter(&mut self) -> f64 {
        self.rng.gen::<f64>() * self.params.smoothdist / 1000.0
    }
}

fn clamp_to(values: Vec<f64>, pmax: f64) -> Vec<f64> {
    values.into_iter().map(|v| v.clamp(0.0, pmax)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{NoiseGenerator, NoiseParams, Quantity};
    use chrono::{Duration, TimeZone, Utc};
    use cgt_core::NodeCharacteristic;

    fn week_grid() -> TimeGrid {
        // 2050-01-03 is a Monday
        let start = Utc.with_ymd_and_hms(2050, 1, 3, 0, 0, 0).unwrap();
        TimeGrid::new(start, start + Duration::days(7), 5).unwrap()
    }

    fn load_nodes() -> Vec<NodeCharacteristic> {
        vec![
            NodeCharacteristic::new("load_1", NodeKind::Load)
                .at(100.0, 200.0)
                .with_p_limits(0.0, 80.0),
            NodeCharacteristic::new("load_2", NodeKind::Load)
                .at(700.0, 500.0)
                .with_p_limits(0.0, 120.0),
        ]
    }

    /// Weekday/weekend shape: flat 1.0 Monday-Friday, 0.6 on the weekend.
    fn weekday_heavy_pattern() -> WeeklyPattern {
        let mut values = vec![1.0; 7 * 24];
        for v in values.iter_mut().skip(5 * 24) {
            *v = 0.6;
        }
        WeeklyPattern::new(values).unwrap()
    }

    fn temperature_field(grid: &TimeGrid, seed: u64) -> NoiseField {
        NoiseGenerator::from_seed(seed).generate(
            grid.len(),
            grid.step_minutes(),
            &NoiseParams::default(),
            Quantity::Temperature,
        )
    }

    #[test]
    fn test_series_lengths_match_grid() {
        let grid = week_grid();
        let field = temperature_field(&grid, 1);
        let mut synth = SeriesSynthesizer::new(SynthesisParams::default(), 1);
        let series = synth
            .synthesize_load(&grid, &load_nodes(), &weekday_heavy_pattern(), &field)
            .unwrap();
        assert_eq!(series.realized.len_time(), grid.len());
        assert_eq!(series.forecast.len_time(), grid.len());
        assert_eq!(series.realized.num_columns(), 2);
    }

    #[test]
    fn test_realized_load_non_negative() {
        let grid = week_grid();
        let field = temperature_field(&grid, 5);
        let mut params = SynthesisParams::default();
        params.planned_std = 0.5; // exaggerate the noise to stress the clip
        let mut synth = SeriesSynthesizer::new(params, 5);
        let series = synth
            .synthesize_load(&grid, &load_nodes(), &weekday_heavy_pattern(), &field)
            .unwrap();
        for (_, column) in series.realized.iter() {
            assert!(column.iter().all(|v| *v >= 0.0));
        }
    }

    #[test]
    fn test_weekday_average_exceeds_weekend_average() {
        let grid = week_grid();
        let field = temperature_field(&grid, 1);
        let mut synth = SeriesSynthesizer::new(SynthesisParams::default(), 1);
        let series = synth
            .synthesize_load(&grid, &load_nodes(), &weekday_heavy_pattern(), &field)
            .unwrap();

        let total = series.realized.total();
        let steps_per_day = 24 * 12;
        let weekday: f64 =
            total[..5 * steps_per_day].iter().sum::<f64>() / (5 * steps_per_day) as f64;
        let weekend: f64 = total[5 * steps_per_day..7 * steps_per_day].iter().sum::<f64>()
            / (2 * steps_per_day) as f64;
        assert!(
            weekday > weekend,
            "weekday avg {weekday} should exceed weekend avg {weekend}"
        );
    }

    #[test]
    fn test_forecast_is_shifted_base_without_noise() {
        let grid = week_grid();
        let field = temperature_field(&grid, 9);
        let mut params = SynthesisParams::default();
        params.planned_std = 0.0;
        params.forecast_shift_steps = 3;
        let mut synth = SeriesSynthesizer::new(params, 9);
        let series = synth
            .synthesize_load(&grid, &load_nodes(), &weekday_heavy_pattern(), &field)
            .unwrap();

        let realized = series.realized.column("load_1").unwrap();
        let forecast = series.forecast.column("load_1").unwrap();
        // with zero measurement noise, realized == base, so the forecast is
        // the base advanced by three steps
        for t in 0..realized.len() - 3 {
            assert!((forecast[t] - realized[t + 3]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_renewables_clipped_to_pmax() {
        let grid = week_grid();
        let nodes = vec![
            NodeCharacteristic::new("wind_1", NodeKind::Wind)
                .at(50.0, 50.0)
                .with_p_limits(0.0, 40.0),
            NodeCharacteristic::new("solar_1", NodeKind::Solar)
                .at(60.0, 70.0)
                .with_p_limits(0.0, 30.0),
        ];
        let mut gen = NoiseGenerator::from_seed(4);
        let np = NoiseParams::default();
        let long = gen.generate(grid.len(), 5, &np, Quantity::WindLong);
        let medium = gen.generate(grid.len(), 5, &np, Quantity::WindMedium);
        let short = gen.generate(grid.len(), 5, &np, Quantity::WindShort);
        let solar = gen.generate(grid.len(), 5, &np, Quantity::Solar);

        let mut synth = SeriesSynthesizer::new(SynthesisParams::default(), 4);
        let wind = synth
            .synthesize_wind(&grid, &nodes, &long, &medium, &short)
            .unwrap();
        let yearly = YearlyPattern::new(vec![0.8; 365 * 24]).unwrap();
        let solar = synth
            .synthesize_solar(&grid, &nodes, &yearly, &solar)
            .unwrap();

        for v in wind.realized.column("wind_1").unwrap() {
            assert!((0.0..=40.0).contains(v));
        }
        for v in solar.realized.column("solar_1").unwrap() {
            assert!((0.0..=30.0).contains(v));
        }
        // only matching kinds are synthesized
        assert_eq!(wind.realized.num_columns(), 1);
        assert_eq!(solar.realized.num_columns(), 1);
    }

    #[test]
    fn test_same_seed_reproduces_series() {
        let grid = week_grid();
        let field = temperature_field(&grid, 2);
        let run = |seed| {
            let mut synth = SeriesSynthesizer::new(SynthesisParams::default(), seed);
            synth
                .synthesize_load(&grid, &load_nodes(), &weekday_heavy_pattern(), &field)
                .unwrap()
        };
        let a = run(17);
        let b = run(17);
        assert_eq!(a.realized.column("load_1"), b.realized.column("load_1"));
        let c = run(18);
        assert_ne!(a.realized.column("load_1"), c.realized.column("load_1"));
    }
}
