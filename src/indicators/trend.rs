//! Trend strength and ADX.
//!
//! Trend strength: `|sma_short - sma_long| / sma_long * 100`, NaN when the long
//! average is undefined or zero.
//!
//! ADX (Wilder):
//! 1. +DM / -DM from consecutive highs and lows
//! 2. Wilder-smooth +DM, -DM and true range (alpha = 1/period)
//! 3. +DI = 100 * +DM / TR, -DI = 100 * -DM / TR
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = Wilder-smoothed DX
//!
//! Lookback: DI at `period`, ADX at `2 * period - 1`.

use super::volatility::true_range;
use crate::Ohlc;

pub fn trend_strength(short: &[f64], long: &[f64]) -> Vec<f64> {
    short
        .iter()
        .zip(long)
        .map(|(&s, &l)| {
            if !s.is_finite() || !l.is_finite() || l == 0.0 {
                f64::NAN
            } else {
                (s - l).abs() / l.abs() * 100.0
            }
        })
        .collect()
}

/// Wilder smoothing. Seed: mean of the first `period` finite values.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }
    let Some(start) = values.iter().position(|v| v.is_finite()) else {
        return result;
    };
    let seed_end = start + period;
    if seed_end > n || values[start..seed_end].iter().any(|v| !v.is_finite()) {
        return result;
    }

    let mut prev = values[start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = prev;
    let alpha = 1.0 / period as f64;
    for i in seed_end..n {
        if !values[i].is_finite() {
            return result;
        }
        prev += alpha * (values[i] - prev);
        result[i] = prev;
    }
    result
}

/// ADX with its directional indicators.
#[derive(Debug, Clone)]
pub struct Adx {
    pub adx: Vec<f64>,
    pub di_plus: Vec<f64>,
    pub di_minus: Vec<f64>,
}

pub fn adx<T: Ohlc>(candles: &[T], period: usize) -> Adx {
    let n = candles.len();
    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];

    for i in 1..n {
        let up = candles[i].high() - candles[i - 1].high();
        let down = candles[i - 1].low() - candles[i].low();
        plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
        minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
    }

    // TR[0] has no previous close; keep it out so all three series align.
    let mut tr = true_range(candles);
    if let Some(first) = tr.first_mut() {
        *first = f64::NAN;
    }

    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);

    let mut di_plus = vec![f64::NAN; n];
    let mut di_minus = vec![f64::NAN; n];
    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        if !smooth_tr[i].is_finite() || smooth_tr[i] == 0.0 {
            continue;
        }
        let p = 100.0 * smooth_plus[i] / smooth_tr[i];
        let m = 100.0 * smooth_minus[i] / smooth_tr[i];
        di_plus[i] = p;
        di_minus[i] = m;
        dx[i] = if p + m == 0.0 {
            0.0
        } else {
            100.0 * (p - m).abs() / (p + m)
        };
    }

    Adx {
        adx: wilder_smooth(&dx, period),
        di_plus,
        di_minus,
    }
}
