//! Chronic exporters.
//!
//! Every emitted artifact is a CSV with a leading `datetime` column aligned
//! to the scenario's time grid, one data column per node or generator.

use std::fs;
use std::path::Path;

use cgt_core::{CgtError, CgtResult, SeriesTable, TimeGrid};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write one node × time table (`load_p.csv`, `wind_p_forecasted.csv`, ...).
pub fn write_series_csv(path: &Path, grid: &TimeGrid, table: &SeriesTable) -> CgtResult<()> {
    if !table.is_empty() && table.len_time() != grid.len() {
        return Err(CgtError::Validation(format!(
            "table has {} samples, grid expects {}",
            table.len_time(),
            grid.len()
        )));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| CgtError::Other(format!("creating '{}': {e}", path.display())))?;

    let mut header = vec!["datetime".to_string()];
    header.extend(table.names().iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| CgtError::Other(e.to_string()))?;

    for (t, ts) in grid.timestamps().enumerate() {
        let mut record = vec![ts.format(DATETIME_FORMAT).to_string()];
        for i in 0..table.num_columns() {
            record.push(format!("{:.2}", table.column_at(i)[t]));
        }
        writer
            .write_record(&record)
            .map_err(|e| CgtError::Other(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the aggregate loss series (`loss_p.csv`).
pub fn write_loss_csv(path: &Path, grid: &TimeGrid, losses: &[f64]) -> CgtResult<()> {
    let table = SeriesTable::from_columns(vec!["loss_p".to_string()], vec![losses.to_vec()])?;
    write_series_csv(path, grid, &table)
}
