mod analyzer;
mod chart;
mod config;
mod csvio;
mod model;
mod normalizer;
mod provider;
mod report;
mod storage;

use chrono::{Duration, Utc};
use config::{AppConfig, load_config};
use model::{PipelineError, PriceBar};
use normalizer::normalize_bars;
use provider::{MarketDataProvider, YahooProvider};
use std::path::Path;
use std::time::Instant;
use storage::SqliteStorage;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            std::process::exit(1);
        }
    };

    let stage = std::env::args().nth(1).unwrap_or_else(|| "all".to_string());
    let outcome = match stage.as_str() {
        "fetch" => run_fetch(&config).await,
        "load" => run_load(&config),
        "analyze" => run_analyze(&config),
        "all" => run_all(&config).await,
        other => {
            error!("Unknown stage '{}' (expected fetch, load, analyze or all)", other);
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Runs fetch -> load -> analyze, stopping at the first failure.
async fn run_all(config: &AppConfig) -> Result<(), PipelineError> {
    let started = Instant::now();
    info!("Starting full pipeline...");

    run_fetch(config).await?;
    run_load(config)?;
    run_analyze(config)?;

    info!(
        "Pipeline complete in {:.1}s (db: {}, reports: {})",
        started.elapsed().as_secs_f64(),
        config.db_path,
        config.reports_dir
    );
    Ok(())
}

/// Fetch stage: download bars per ticker, normalize, write the raw CSV.
/// A failing ticker is logged and skipped; the stage fails only when no
/// ticker yields data.
async fn run_fetch(config: &AppConfig) -> Result<(), PipelineError> {
    let provider = YahooProvider::new().map_err(|e| PipelineError::Fetch(e.to_string()))?;

    let end = Utc::now().date_naive();
    let start = end - Duration::days(config.lookback_days);
    info!(
        "Fetching {} tickers, {} to {}",
        config.tickers.len(),
        start,
        end
    );

    let mut all_bars: Vec<PriceBar> = Vec::new();
    let mut fetched_symbols = 0usize;

    for ticker in &config.tickers {
        match provider.fetch_daily(ticker, start, end).await {
            Ok(raw) => {
                let bars = normalize_bars(ticker, raw);
                if bars.is_empty() {
                    warn!("{}: no usable bars after normalization, skipping", ticker);
                    continue;
                }
                info!("{}: {} bars", ticker, bars.len());
                all_bars.extend(bars);
                fetched_symbols += 1;
            }
            Err(e) => {
                warn!("{}: fetch failed, skipping ({})", ticker, e);
            }
        }
    }

    if all_bars.is_empty() {
        return Err(PipelineError::Fetch(
            "no data was successfully fetched for any ticker".to_string(),
        ));
    }

    csvio::write_raw_csv(&config.raw_csv_path, &all_bars)
        .map_err(|e| PipelineError::Fetch(e.to_string()))?;

    let min_date = all_bars.iter().map(|b| b.date).min().unwrap_or_default();
    let max_date = all_bars.iter().map(|b| b.date).max().unwrap_or_default();
    info!(
        "Fetch complete: {} rows, {} symbols, {} to {} -> {}",
        all_bars.len(),
        fetched_symbols,
        min_date,
        max_date,
        config.raw_csv_path
    );
    Ok(())
}

/// Load stage: read the raw CSV and upsert it into SQLite.
fn run_load(config: &AppConfig) -> Result<(), PipelineError> {
    if !Path::new(&config.raw_csv_path).exists() {
        return Err(PipelineError::Load(format!(
            "input file not found: {}",
            config.raw_csv_path
        )));
    }

    let bars =
        csvio::read_raw_csv(&config.raw_csv_path).map_err(|e| PipelineError::Load(e.to_string()))?;
    info!("Read {} rows from {}", bars.len(), config.raw_csv_path);

    let mut storage =
        SqliteStorage::new(&config.db_path).map_err(|e| PipelineError::Load(e.to_string()))?;
    let loaded = storage
        .upsert_bars(&bars)
        .map_err(|e| PipelineError::Load(e.to_string()))?;

    info!("Load complete: {} rows upserted into {}", loaded, config.db_path);
    Ok(())
}

/// Analyze stage: compute per-symbol summaries and volatility, write the
/// report CSVs and the example chart.
fn run_analyze(config: &AppConfig) -> Result<(), PipelineError> {
    if !Path::new(&config.db_path).exists() {
        return Err(PipelineError::Analyze(format!(
            "database not found: {}",
            config.db_path
        )));
    }

    let storage =
        SqliteStorage::new(&config.db_path).map_err(|e| PipelineError::Analyze(e.to_string()))?;
    let bars = storage
        .load_all_bars()
        .map_err(|e| PipelineError::Analyze(e.to_string()))?;
    if bars.is_empty() {
        return Err(PipelineError::Analyze(format!(
            "no rows in {}",
            config.db_path
        )));
    }

    let grouped = group_by_symbol(bars);
    info!(
        "Loaded {} symbols from {}",
        grouped.len(),
        config.db_path
    );

    let summaries: Vec<_> = grouped
        .iter()
        .map(|(symbol, bars)| analyzer::summarize(symbol, bars))
        .collect();
    let volatilities: Vec<_> = grouped
        .iter()
        .map(|(symbol, bars)| {
            analyzer::latest_volatility(
                symbol,
                bars,
                config.volatility_window,
                config.trading_days_per_year,
            )
        })
        .collect();

    let summary_path = config.summary_csv_path();
    report::write_summary_csv(&summary_path, &summaries)
        .map_err(|e| PipelineError::Analyze(e.to_string()))?;
    info!("Wrote {}", summary_path);

    let volatility_path = config.volatility_csv_path();
    report::write_volatility_csv(&volatility_path, &volatilities)
        .map_err(|e| PipelineError::Analyze(e.to_string()))?;
    info!("Wrote {}", volatility_path);

    // Chart the alphabetically-first symbol; groups come back sorted.
    let (symbol, series) = &grouped[0];
    let chart_path = config.chart_path();
    chart::render_adj_close_chart(&chart_path, symbol, series)
        .map_err(|e| PipelineError::Analyze(e.to_string()))?;
    info!("Wrote chart for {} to {}", symbol, chart_path);

    Ok(())
}

/// Splits bars already ordered by (symbol, date) into per-symbol runs.
fn group_by_symbol(bars: Vec<PriceBar>) -> Vec<(String, Vec<PriceBar>)> {
    let mut grouped: Vec<(String, Vec<PriceBar>)> = Vec::new();
    for bar in bars {
        match grouped.last_mut() {
            Some((symbol, series)) if *symbol == bar.symbol => series.push(bar),
            _ => grouped.push((bar.symbol.clone(), vec![bar])),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(symbol: &str, day: u32) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            symbol: symbol.to_string(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            adj_close: 1.0,
            volume: 1,
        }
    }

    #[test]
    fn groups_sorted_bars_into_symbol_runs() {
        let bars = vec![bar("AAPL", 1), bar("AAPL", 2), bar("MSFT", 1)];
        let grouped = group_by_symbol(bars);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, "AAPL");
        assert_eq!(grouped[0].1.len(), 2);
        assert_eq!(grouped[1].0, "MSFT");
    }
}
