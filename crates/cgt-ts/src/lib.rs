//! # cgt-ts: Stochastic Time Series Synthesis
//!
//! Turns static node characteristics into realized and forecast power
//! chronics. Three layers:
//!
//! - [`noise`] - spatially/temporally correlated Gaussian fields, one per
//!   physical quantity (temperature proxy, solar irradiance, wind at three
//!   scales)
//! - [`pattern`] - deterministic weekly/yearly shape tables
//! - [`synth`] - the synthesizer combining patterns, noise fields, and
//!   per-node capacities into node × time series
//!
//! All stochastic output is reproducible: the same seed and parameters
//! always produce the same series.

pub mod noise;
pub mod pattern;
pub mod synth;

pub use noise::{NoiseField, NoiseGenerator, NoiseParams, Quantity};
pub use pattern::{WeeklyPattern, YearlyPattern};
pub use synth::{PowerSeries, SeriesSynthesizer, SynthesisParams};
