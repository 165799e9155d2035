// Raw CSV leg between the fetch and load stages.
use crate::model::{PriceBar, ReportError};
use std::fs;
use std::path::Path;

/// Writes the raw price CSV, creating the parent directory if needed.
pub fn write_raw_csv(path: &str, bars: &[PriceBar]) -> Result<(), ReportError> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the raw price CSV back. An empty file is a stage failure, matching
/// the loader contract.
pub fn read_raw_csv(path: &str) -> Result<Vec<PriceBar>, ReportError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();
    for record in reader.deserialize() {
        let bar: PriceBar = record?;
        bars.push(bar);
    }
    if bars.is_empty() {
        return Err(ReportError::EmptyInput(path.to_string()));
    }
    Ok(bars)
}
