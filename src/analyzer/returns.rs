use crate::model::{PriceBar, SummaryStat};

/// Day-over-day percent change of adjusted close for one symbol's bars,
/// which must already be sorted by date. The first element is None.
pub fn daily_returns(bars: &[PriceBar]) -> Vec<Option<f64>> {
    let mut returns = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            returns.push(None);
        } else {
            let prev = bars[i - 1].adj_close;
            returns.push(Some(bar.adj_close / prev - 1.0));
        }
    }
    returns
}

/// Sample (n-1) standard deviation. NaN below two observations.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Per-symbol return summary: observation count, mean and sample std of
/// daily returns, plus average volume over all bars.
pub fn summarize(symbol: &str, bars: &[PriceBar]) -> SummaryStat {
    let returns = daily_returns(bars);
    let valid: Vec<f64> = returns.iter().filter_map(|r| *r).collect();

    let mean = if valid.is_empty() {
        None
    } else {
        Some(valid.iter().sum::<f64>() / valid.len() as f64)
    };
    let std = if valid.len() < 2 {
        None
    } else {
        Some(sample_std(&valid))
    };

    let avg_volume = if bars.is_empty() {
        f64::NAN
    } else {
        bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64
    };

    SummaryStat {
        symbol: symbol.to_string(),
        obs: valid.len(),
        mean_daily_return: mean,
        std_daily_return: std,
        avg_volume,
    }
}
