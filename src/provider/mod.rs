pub mod yahoo;

use crate::model::{FetchError, PriceBar};
use async_trait::async_trait;
use chrono::NaiveDate;

pub use yahoo::YahooProvider;

/// A source of daily OHLCV bars.
#[async_trait]
pub trait MarketDataProvider {
    /// Fetches daily bars for one symbol over `[start, end]`, inclusive.
    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, FetchError>;
}
