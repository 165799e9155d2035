// Core structs: PriceBar, SummaryStat, VolatilityStat + error types
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily price observation for a single ticker.
///
/// At most one bar exists per `(date, symbol)` pair; the loader enforces
/// this with the table's composite primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: i64,
}

/// Per-symbol daily-return summary, one row of `reports/summary.csv`.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStat {
    pub symbol: String,
    /// Number of valid daily returns (bars minus the first, which has none).
    pub obs: usize,
    /// None below one valid return; serializes as an empty field.
    pub mean_daily_return: Option<f64>,
    /// None below two valid returns.
    pub std_daily_return: Option<f64>,
    pub avg_volume: f64,
}

/// Latest annualized rolling volatility, one row of `reports/volatility.csv`.
#[derive(Debug, Clone, Serialize)]
pub struct VolatilityStat {
    pub symbol: String,
    /// None when the series is shorter than the rolling window.
    pub ann_vol_20d: Option<f64>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),
    #[error("no usable bars returned for {0}")]
    NoData(String),
    #[error("unexpected response shape: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("chart rendering failed: {0}")]
    Chart(String),
    #[error("input CSV is empty: {0}")]
    EmptyInput(String),
}

/// Stage-level failure surfaced to the orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch stage failed: {0}")]
    Fetch(String),
    #[error("load stage failed: {0}")]
    Load(String),
    #[error("analyze stage failed: {0}")]
    Analyze(String),
}
