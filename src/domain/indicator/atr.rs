//! Average True Range with running moving average smoothing.
//!
//! TR[0] is undefined (no previous close). Seed ATR[n] with the mean of
//! TR[1..=n], then ATR[i] = ATR[i-1] * (n-1)/n + TR[i]/n.
//! Warmup: the first n bars are invalid.

use crate::domain::ohlcv::Bar;

pub fn calc_true_range(bars: &[Bar]) -> Vec<Option<f64>> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| (i > 0).then(|| bar.true_range(bars[i - 1].close)))
        .collect()
}

pub fn calc_atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; bars.len()];
    }

    let tr_values = calc_true_range(bars);
    let n = period as f64;
    let mut results: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut seed_sum = 0.0;

    for (i, tr) in tr_values.iter().enumerate() {
        let Some(tr) = *tr else {
            results.push(None);
            continue;
        };

        let atr = if i < period {
            seed_sum += tr;
            None
        } else if i == period {
            seed_sum += tr;
            Some(seed_sum / n)
        } else {
            results[i - 1].map(|prev| prev * (n - 1.0) / n + tr / n)
        };
        results.push(atr);
    }

    results
}
