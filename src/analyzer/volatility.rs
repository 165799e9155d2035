use crate::analyzer::returns::{daily_returns, sample_std};
use crate::model::{PriceBar, VolatilityStat};

/// Rolling annualized volatility over a return series.
///
/// Each output element is the sample std of the trailing `window` returns,
/// scaled by sqrt(trading_days_per_year). Windows touching a missing return
/// (the first element of every series) are None, so the first defined value
/// sits at index `window`.
pub fn rolling_volatility(
    returns: &[Option<f64>],
    window: usize,
    trading_days_per_year: usize,
) -> Vec<Option<f64>> {
    let annualize = (trading_days_per_year as f64).sqrt();
    let mut out = Vec::with_capacity(returns.len());

    for i in 0..returns.len() {
        if window == 0 || i + 1 < window {
            out.push(None);
            continue;
        }
        let tail = &returns[i + 1 - window..=i];
        let values: Option<Vec<f64>> = tail.iter().copied().collect();
        out.push(values.map(|v| sample_std(&v) * annualize));
    }
    out
}

/// Latest defined rolling volatility for one symbol's bars (sorted by date).
pub fn latest_volatility(
    symbol: &str,
    bars: &[PriceBar],
    window: usize,
    trading_days_per_year: usize,
) -> VolatilityStat {
    let returns = daily_returns(bars);
    let rolling = rolling_volatility(&returns, window, trading_days_per_year);
    VolatilityStat {
        symbol: symbol.to_string(),
        ann_vol_20d: rolling.into_iter().rev().flatten().next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars_from(adj_closes: &[f64]) -> Vec<PriceBar> {
        adj_closes
            .iter()
            .enumerate()
            .map(|(i, &adj_close)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Days::new(i as u64),
                symbol: "X".to_string(),
                open: adj_close,
                high: adj_close,
                low: adj_close,
                close: adj_close,
                adj_close,
                volume: 1,
            })
            .collect()
    }

    #[test]
    fn rolling_window_matches_direct_recomputation() {
        // 0.8% daily drift with alternating noise; window of 3.
        let returns: Vec<Option<f64>> = vec![
            None,
            Some(0.010),
            Some(-0.005),
            Some(0.008),
            Some(0.002),
            Some(-0.012),
        ];
        let rolling = rolling_volatility(&returns, 3, 252);

        assert_eq!(rolling.len(), 6);
        // Indices 0..=2 touch the leading None.
        assert!(rolling[0].is_none());
        assert!(rolling[1].is_none());
        assert!(rolling[2].is_none());

        let direct = |w: &[f64]| sample_std(w) * (252.0f64).sqrt();
        assert!((rolling[3].unwrap() - direct(&[0.010, -0.005, 0.008])).abs() < 1e-12);
        assert!((rolling[4].unwrap() - direct(&[-0.005, 0.008, 0.002])).abs() < 1e-12);
        assert!((rolling[5].unwrap() - direct(&[0.008, 0.002, -0.012])).abs() < 1e-12);
    }

    #[test]
    fn latest_volatility_takes_last_defined_window() {
        let bars = bars_from(&[100.0, 101.0, 99.0, 99.5, 100.2, 101.1]);
        let stat = latest_volatility("X", &bars, 3, 252);

        let returns = daily_returns(&bars);
        let rolling = rolling_volatility(&returns, 3, 252);
        assert_eq!(stat.ann_vol_20d, *rolling.last().unwrap());
        assert!(stat.ann_vol_20d.is_some());
    }

    #[test]
    fn short_series_has_no_volatility() {
        let bars = bars_from(&[100.0, 101.0, 99.0]);
        let stat = latest_volatility("X", &bars, 20, 252);
        assert!(stat.ann_vol_20d.is_none());
    }
}
