use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tickers: Vec<String>,
    pub lookback_days: i64,
    pub raw_csv_path: String,
    pub db_path: String,
    pub reports_dir: String,
    pub volatility_window: usize,
    pub trading_days_per_year: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tickers: [
                "AAPL", "MSFT", "GOOGL", "AMZN", "META", "JPM", "V", "PG", "XOM", "NVDA",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            lookback_days: 365,
            raw_csv_path: "data/prices_raw.csv".to_string(),
            db_path: "db/marketdata.db".to_string(),
            reports_dir: "reports".to_string(),
            volatility_window: 20,
            trading_days_per_year: 252,
        }
    }
}

impl AppConfig {
    pub fn summary_csv_path(&self) -> String {
        format!("{}/summary.csv", self.reports_dir)
    }

    pub fn volatility_csv_path(&self) -> String {
        format!("{}/volatility.csv", self.reports_dir)
    }

    pub fn chart_path(&self) -> String {
        format!("{}/charts/adj_close_example.png", self.reports_dir)
    }
}

/// Loads `config.json` if present, otherwise falls back to the defaults.
pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
