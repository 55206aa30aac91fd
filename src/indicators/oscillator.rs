//! Relative Strength Index (RSI), Wilder smoothing.
//!
//! Gains and losses are the positive and negative close-to-close deltas. Both are
//! seeded with their mean over the first `period` deltas, then smoothed with
//! `avg += (x - avg) / period`. RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period (the first delta exists at index 1).
//! Edge case: avg_loss == 0 -> RSI = 100, including a series with no movement at all.

use super::trend::wilder_smooth;

pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period + 1 {
        return result;
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            (delta.max(0.0), (-delta).max(0.0))
        })
        .unzip();
    let avg_gain = wilder_smooth(&gains, period);
    let avg_loss = wilder_smooth(&losses, period);

    // deltas[k] belongs to candle k + 1
    for k in period - 1..gains.len() {
        if avg_gain[k].is_finite() && avg_loss[k].is_finite() {
            result[k + 1] = compute_rsi(avg_gain[k], avg_loss[k]);
        }
    }
    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains() {
        let result = rsi(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0], 3);
        assert!(result[2].is_nan());
        assert_eq!(result[3], 100.0);
        assert_eq!(result[5], 100.0);
    }

    #[test]
    fn rsi_all_losses() {
        let result = rsi(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0], 3);
        assert_eq!(result[3], 0.0);
    }

    #[test]
    fn rsi_flat_window_is_100() {
        let result = rsi(&[1.1; 20], 14);
        assert_eq!(result[14], 100.0);
        assert_eq!(result[19], 100.0);
    }

    #[test]
    fn rsi_gains_and_flats_is_100() {
        let result = rsi(&[1.0, 1.0, 2.0, 2.0, 3.0], 4);
        assert_eq!(result[4], 100.0);
    }

    #[test]
    fn rsi_mixed() {
        // Changes: +0.34, -0.25, -0.48, +0.72 ; period 3 seeds at index 3 from the first three
        let closes = [44.0, 44.34, 44.09, 43.61, 44.33];
        let result = rsi(&closes, 3);
        let expected = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert_approx(result[3], expected, 1e-9);
        // index 4: avg = (2 * seed + x) / 3
        let gain = (2.0 * 0.34 / 3.0 + 0.72) / 3.0;
        let loss = (2.0 * 0.73 / 3.0) / 3.0;
        assert_approx(result[4], 100.0 - 100.0 / (1.0 + gain / loss), 1e-9);
    }

    #[test]
    fn rsi_remembers_losses_outside_the_window() {
        // 14 alternating +1/-1 deltas, then 14 deltas of +0.5
        let mut closes = vec![100.0];
        for i in 0..14 {
            let step = if i % 2 == 0 { 1.0 } else { -1.0 };
            closes.push(closes[i] + step);
        }
        for i in 14..28 {
            closes.push(closes[i] + 0.5);
        }
        let result = rsi(&closes, 14);

        // Seed: 7 gains and 7 losses of 1 -> both averages 0.5
        assert_approx(result[14], 50.0, 1e-9);

        // Gains stay at 0.5; losses decay by 13/14 per step
        let loss = 0.5 * (13.0_f64 / 14.0).powi(14);
        let expected = 100.0 - 100.0 / (1.0 + 0.5 / loss);
        assert_approx(result[28], expected, 1e-9);
        assert_approx(result[28], 73.8369584, 1e-6);
        assert!(result[28] < 100.0);
    }
}
