//! Moving averages and MACD.
//!
//! SMA: mean of the trailing `window` values; lookback `window - 1`.
//! EMA: `ema[t] = ema[t-1] + alpha * (x[t] - ema[t-1])`, `alpha = 2 / (span + 1)`,
//! seeded from the first finite observation. The recurrence starts at the seed but
//! values are reported only from `seed + span - 1` on.
//! MACD: `ema(fast) - ema(slow)`, signal = EMA of MACD, histogram = MACD - signal.

/// Simple moving average. Values before the window fills are NaN.
pub fn sma(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }

    for end in window..=n {
        result[end - 1] = window_mean(&values[end - window..end]);
    }
    result
}

/// Mean of a slice, summed relative to its first element.
///
/// A constant slice averages to exactly that constant.
pub(crate) fn window_mean(window: &[f64]) -> f64 {
    let pivot = window[0];
    let shifted: f64 = window.iter().map(|v| v - pivot).sum();
    pivot + shifted / window.len() as f64
}

/// Exponential moving average over a series that may start with NaN.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if span == 0 {
        return result;
    }

    let Some(seed) = values.iter().position(|v| v.is_finite()) else {
        return result;
    };

    let alpha = 2.0 / (span as f64 + 1.0);
    let first_reported = seed + span - 1;
    let mut prev = values[seed];
    if first_reported == seed {
        result[seed] = prev;
    }

    for i in (seed + 1)..n {
        if !values[i].is_finite() {
            // Gaps after the seed taint everything that follows.
            return result;
        }
        let value = prev + alpha * (values[i] - prev);
        if i >= first_reported {
            result[i] = value;
        }
        prev = value;
    }
    result
}

/// MACD line, signal line and histogram.
#[derive(Debug, Clone)]
pub struct Macd {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_span: usize) -> Macd {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);
    let line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema(&line, signal_span);
    let histogram = line.iter().zip(&signal).map(|(m, s)| m - s).collect();

    Macd {
        line,
        signal,
        histogram,
    }
}
