//! True range, ATR and Bollinger bands.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|); the first candle
//! has no previous close and uses high-low.
//! ATR: rolling mean of true range over `period`; lookback `period - 1`.

use super::moving_average::{sma, window_mean};
use crate::{Ohlc, OhlcExt};

pub fn true_range<T: Ohlc>(candles: &[T]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(candles.len());
    for (i, candle) in candles.iter().enumerate() {
        if i == 0 {
            tr.push(candle.range());
            continue;
        }
        let prev_close = candles[i - 1].close();
        let h = candle.high();
        let l = candle.low();
        tr.push((h - l).max((h - prev_close).abs()).max((l - prev_close).abs()));
    }
    tr
}

pub fn atr<T: Ohlc>(candles: &[T], period: usize) -> Vec<f64> {
    sma(&true_range(candles), period)
}

/// Bollinger bands around an SMA, using the sample standard deviation.
#[derive(Debug, Clone)]
pub struct Bands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger(closes: &[f64], period: usize, width: f64) -> Bands {
    let n = closes.len();
    let middle = sma(closes, period);
    let mut upper = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];

    if period >= 2 && n >= period {
        for end in period..=n {
            let window = &closes[end - period..end];
            let mean = window_mean(window);
            let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
            let sd = var.sqrt();
            upper[end - 1] = middle[end - 1] + width * sd;
            lower[end - 1] = middle[end - 1] - width * sd;
        }
    }

    Bands {
        upper,
        middle,
        lower,
    }
}
