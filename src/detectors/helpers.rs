//! Common helper functions shared by the structure, pattern and zone detectors.

use serde::Serialize;

use crate::{Ohlc, OhlcExt};

// ============================================================
// THRESHOLDS
// ============================================================

/// Pin bar wick is very long: wick > body * SHADOW_VERYLONG_FACTOR
pub const SHADOW_VERYLONG_FACTOR: f64 = 2.0;

// ============================================================
// SWING POINTS
// ============================================================

/// A confirmed local extremum
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
}

/// Centered strict extrema over an odd `window`.
///
/// A point at `i` qualifies when `better(value[i], value[j])` holds for every other `j`
/// within `window / 2` candles on each side. The last `window / 2` candles never confirm.
fn swing_points<T, F, B>(candles: &[T], window: usize, value: F, better: B) -> Vec<SwingPoint>
where
    T: Ohlc,
    F: Fn(&T) -> f64,
    B: Fn(f64, f64) -> bool,
{
    let half = window / 2;
    let n = candles.len();
    if half == 0 || n < 2 * half + 1 {
        return Vec::new();
    }

    (half..n - half)
        .filter_map(|i| {
            let price = value(&candles[i]);
            let confirmed = (i - half..=i + half)
                .filter(|&j| j != i)
                .all(|j| better(price, value(&candles[j])));
            confirmed.then_some(SwingPoint { index: i, price })
        })
        .collect()
}

/// Confirmed swing highs, oldest first
pub fn swing_highs<T: Ohlc>(candles: &[T], window: usize) -> Vec<SwingPoint> {
    swing_points(candles, window, |c| c.high(), |a, b| a > b)
}

/// Confirmed swing lows, oldest first
pub fn swing_lows<T: Ohlc>(candles: &[T], window: usize) -> Vec<SwingPoint> {
    swing_points(candles, window, |c| c.low(), |a, b| a < b)
}

// ============================================================
// CANDLE GEOMETRY
// ============================================================

/// Check if a wick is very long relative to the body
#[inline]
pub fn is_shadow_verylong(shadow: f64, body: f64, factor: f64) -> bool {
    shadow > body * factor
}

/// Check if a wick is shorter than the body
#[inline]
pub fn is_shadow_short(shadow: f64, body: f64) -> bool {
    shadow < body
}

/// Range is above the series average
#[inline]
pub fn is_range_long<T: Ohlc>(candle: &T, mean_range: f64) -> bool {
    candle.range() > mean_range
}

/// Highest high and lowest low of a window; `None` for an empty window.
pub fn window_extremes<T: Ohlc>(candles: &[T]) -> Option<(f64, f64)> {
    if candles.is_empty() {
        return None;
    }
    let high = candles.iter().map(|c| c.high()).fold(f64::NEG_INFINITY, f64::max);
    let low = candles.iter().map(|c| c.low()).fold(f64::INFINITY, f64::min);
    Some((high, low))
}
