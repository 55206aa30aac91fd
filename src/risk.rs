//! ATR-based risk brackets.
//!
//! Long: stop = entry - stop_multiple * ATR, target = entry + target_multiple * ATR.
//! Short mirrors it. Reward:risk is taken from the bracket distances, so it only
//! depends on the two multiples; it is 0 when the stop distance is 0.

use serde::Serialize;

/// Stop-loss and take-profit on both sides of an entry price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskLevels {
    pub entry: f64,
    pub stop_loss_long: f64,
    pub take_profit_long: f64,
    pub stop_loss_short: f64,
    pub take_profit_short: f64,
    pub rr_long: f64,
    pub rr_short: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskCalculator {
    pub stop_multiple: f64,
    pub target_multiple: f64,
}

impl Default for RiskCalculator {
    fn default() -> Self {
        Self::new(1.5, 3.0)
    }
}

impl RiskCalculator {
    pub fn new(stop_multiple: f64, target_multiple: f64) -> Self {
        Self {
            stop_multiple,
            target_multiple,
        }
    }

    /// Brackets around `entry`. An undefined ATR counts as 0.
    pub fn compute(&self, entry: f64, atr: f64) -> RiskLevels {
        let atr = if atr.is_finite() { atr.abs() } else { 0.0 };
        let stop = self.stop_multiple * atr;
        let target = self.target_multiple * atr;
        let rr = ratio(target, stop);

        RiskLevels {
            entry,
            stop_loss_long: entry - stop,
            take_profit_long: entry + target,
            stop_loss_short: entry + stop,
            take_profit_short: entry - target,
            rr_long: rr,
            rr_short: rr,
        }
    }
}

/// `|target - entry| / |entry - stop|` for arbitrary price levels; 0 when stop == entry.
pub fn reward_risk(entry: f64, stop: f64, target: f64) -> f64 {
    ratio((target - entry).abs(), (entry - stop).abs())
}

#[inline]
fn ratio(reward: f64, risk: f64) -> f64 {
    if risk == 0.0 || !risk.is_finite() {
        0.0
    } else {
        reward / risk
    }
}
