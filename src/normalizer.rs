use crate::model::PriceBar;
use tracing::warn;

/// Cleans freshly fetched bars for one symbol before they hit the raw CSV.
///
/// Drops bars without a usable close or adjusted close, sorts by date and
/// collapses duplicate dates (the later fetch wins).
pub fn normalize_bars(symbol: &str, mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    let before = bars.len();
    bars.retain(|bar| bar.close.is_finite() && bar.adj_close.is_finite());
    if bars.len() < before {
        warn!(
            "{}: dropped {} bar(s) with missing close",
            symbol,
            before - bars.len()
        );
    }

    bars.sort_by_key(|bar| bar.date);

    let mut normalized: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match normalized.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => normalized.push(bar),
        }
    }
    normalized
}
