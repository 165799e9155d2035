// Report CSVs produced by the analyze stage.
use crate::model::{ReportError, SummaryStat, VolatilityStat};
use std::fs;
use std::path::Path;

fn ensure_parent(path: &str) -> Result<(), ReportError> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes the per-symbol return/volume summary.
pub fn write_summary_csv(path: &str, stats: &[SummaryStat]) -> Result<(), ReportError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for stat in stats {
        writer.serialize(stat)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the per-symbol latest rolling volatility. A symbol without enough
/// history gets an empty field.
pub fn write_volatility_csv(path: &str, stats: &[VolatilityStat]) -> Result<(), ReportError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for stat in stats {
        writer.serialize(stat)?;
    }
    writer.flush()?;
    Ok(())
}
