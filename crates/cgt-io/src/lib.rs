//! # cgt-io: Case Input and Artifact Output
//!
//! Reads the externally supplied reference data of a case (node
//! characteristic tables, weekly/yearly pattern tables, hydro guide
//! curves) and writes the emitted chronics as per-scenario CSV artifacts.
//!
//! Malformed or incomplete inputs surface as
//! [`cgt_core::CgtError::Config`] and abort before any series generation.

pub mod exporters;
pub mod importers;

pub use exporters::{write_loss_csv, write_series_csv};
pub use importers::{
    read_characteristics, read_hydro_guide_curve, read_weekly_pattern, read_yearly_pattern,
    HydroGuideCurve,
};
