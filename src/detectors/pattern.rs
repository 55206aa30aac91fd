//! Reversal patterns on the latest candle: pin bar and engulfing.
//!
//! Pin bar: one wick longer than `wick_factor` x body, the opposite wick shorter than
//! the body, and a range above the series mean range. Direction follows close vs open.
//! Engulfing: the latest body is larger than the previous one and the candle colour
//! reverses. Pin bars take precedence.

use serde::Serialize;
use tracing::trace;

use super::helpers::{is_range_long, is_shadow_short, is_shadow_verylong};
use super::Detector;
use crate::{indicators::AugmentedSeries, params::EngineParams, Direction, Ohlc, OhlcExt};

/// Candle pattern found on the latest candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PatternLabel {
    BullishPinBar,
    BearishPinBar,
    BullishEngulfing,
    BearishEngulfing,
    NoPattern,
}

impl PatternLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternLabel::BullishPinBar => "Bullish pin bar",
            PatternLabel::BearishPinBar => "Bearish pin bar",
            PatternLabel::BullishEngulfing => "Bullish engulfing",
            PatternLabel::BearishEngulfing => "Bearish engulfing",
            PatternLabel::NoPattern => "None",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            PatternLabel::BullishPinBar | PatternLabel::BullishEngulfing => Direction::Bullish,
            PatternLabel::BearishPinBar | PatternLabel::BearishEngulfing => Direction::Bearish,
            PatternLabel::NoPattern => Direction::Neutral,
        }
    }
}

impl std::fmt::Display for PatternLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pin bar and engulfing detector
#[derive(Debug, Clone, Copy)]
pub struct PatternDetector {
    pub wick_factor: f64,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(&EngineParams::default())
    }
}

impl PatternDetector {
    pub fn new(params: &EngineParams) -> Self {
        Self {
            wick_factor: params.pin_bar_wick_factor,
        }
    }

    pub fn detect<T: Ohlc>(&self, series: &AugmentedSeries<'_, T>) -> PatternLabel {
        let candles = series.candles();
        let Some((latest, rest)) = candles.split_last() else {
            return PatternLabel::NoPattern;
        };

        let label = self
            .pin_bar(latest, series.mean_range())
            .or_else(|| rest.last().and_then(|prev| engulfing(prev, latest)))
            .unwrap_or(PatternLabel::NoPattern);
        trace!(detector = self.name(), pattern = %label, "pattern");
        label
    }

    fn pin_bar<T: Ohlc>(&self, candle: &T, mean_range: f64) -> Option<PatternLabel> {
        if !is_range_long(candle, mean_range) {
            return None;
        }
        let body = candle.body();
        let upper = candle.upper_wick();
        let lower = candle.lower_wick();

        let hammer = is_shadow_verylong(lower, body, self.wick_factor) && is_shadow_short(upper, body);
        let star = is_shadow_verylong(upper, body, self.wick_factor) && is_shadow_short(lower, body);
        if !(hammer || star) {
            return None;
        }

        Some(if candle.close() > candle.open() {
            PatternLabel::BullishPinBar
        } else {
            PatternLabel::BearishPinBar
        })
    }
}

fn engulfing<T: Ohlc>(prev: &T, latest: &T) -> Option<PatternLabel> {
    if latest.body() <= prev.body() {
        return None;
    }
    if prev.is_bearish() && latest.is_bullish() {
        Some(PatternLabel::BullishEngulfing)
    } else if prev.is_bullish() && latest.is_bearish() {
        Some(PatternLabel::BearishEngulfing)
    } else {
        None
    }
}

impl Detector for PatternDetector {
    type Output = PatternLabel;

    fn name(&self) -> &'static str {
        "pattern"
    }

    fn min_candles(&self) -> usize {
        2
    }

    fn detect<T: Ohlc>(&self, series: &AugmentedSeries<'_, T>) -> PatternLabel {
        PatternDetector::detect(self, series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorEngine;
    use crate::Candle;
    use chrono::{Duration, TimeZone, Utc};

    /// Quiet candles of range 1.0 followed by `tail`.
    fn series_with(tail: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut candles: Vec<Candle> = (0..20)
            .map(|i| Candle::new(t + Duration::hours(i), 100.0, 100.5, 99.5, 100.2))
            .collect();
        for (k, &(o, h, l, c)) in tail.iter().enumerate() {
            candles.push(Candle::new(t + Duration::hours(20 + k as i64), o, h, l, c));
        }
        candles
    }

    fn detect(candles: &[Candle]) -> PatternLabel {
        let series = IndicatorEngine::default().compute(candles);
        PatternDetector::default().detect(&series)
    }

    #[test]
    fn hammer_is_bullish_pin_bar() {
        // body 0.5, lower wick 3.0, upper wick 0.1
        let candles = series_with(&[(100.0, 100.6, 97.0, 100.5)]);
        assert_eq!(detect(&candles), PatternLabel::BullishPinBar);
    }

    #[test]
    fn shooting_star_closing_down_is_bearish() {
        let candles = series_with(&[(100.5, 104.0, 99.9, 100.0)]);
        assert_eq!(detect(&candles), PatternLabel::BearishPinBar);
    }

    #[test]
    fn small_pin_bar_is_ignored() {
        // shape of a pin bar but range below the series mean
        let candles = series_with(&[(100.0, 100.05, 99.7, 100.04)]);
        assert_eq!(detect(&candles), PatternLabel::NoPattern);
    }

    #[test]
    fn bullish_engulfing() {
        let candles = series_with(&[(100.4, 100.5, 99.9, 100.0), (99.9, 101.0, 99.8, 100.9)]);
        assert_eq!(detect(&candles), PatternLabel::BullishEngulfing);
    }

    #[test]
    fn bearish_engulfing() {
        let candles = series_with(&[(100.0, 100.5, 99.9, 100.4), (100.5, 100.6, 99.3, 99.4)]);
        assert_eq!(detect(&candles), PatternLabel::BearishEngulfing);
    }

    #[test]
    fn same_colour_is_not_engulfing() {
        let candles = series_with(&[(100.0, 100.5, 99.9, 100.4), (100.4, 101.5, 100.3, 101.4)]);
        assert_eq!(detect(&candles), PatternLabel::NoPattern);
    }

    #[test]
    fn empty_series_has_no_pattern() {
        let candles: Vec<Candle> = vec![];
        assert_eq!(detect(&candles), PatternLabel::NoPattern);
    }

    #[test]
    fn wick_factor_comes_from_params() {
        // lower wick 1.5 x body: a pin bar only below the default factor
        let candles = series_with(&[(100.0, 101.05, 98.5, 101.0)]);
        let series = IndicatorEngine::default().compute(&candles);
        assert_eq!(PatternDetector::default().detect(&series), PatternLabel::NoPattern);

        let params = EngineParams {
            pin_bar_wick_factor: 1.2,
            ..EngineParams::default()
        };
        let detector = PatternDetector::new(&params);
        assert_eq!(detector.wick_factor, 1.2);
        assert_eq!(detector.detect(&series), PatternLabel::BullishPinBar);
    }

    #[test]
    fn pattern_directions() {
        assert_eq!(PatternLabel::BullishEngulfing.direction(), Direction::Bullish);
        assert_eq!(PatternLabel::BearishPinBar.direction(), Direction::Bearish);
        assert_eq!(PatternLabel::NoPattern.direction(), Direction::Neutral);
    }
}
