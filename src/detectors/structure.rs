//! Market structure from confirmed swing points.
//!
//! Compares the two most recent swing highs and the two most recent swing lows:
//! higher high + higher low is Bullish, lower high + lower low is Bearish, anything
//! else is Consolidating. Fewer than two of either kind is Unknown.

use serde::Serialize;
use tracing::trace;

use super::helpers::{swing_highs, swing_lows, SwingPoint};
use super::Detector;
use crate::{indicators::AugmentedSeries, Direction, Ohlc, Period};

/// Market structure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StructureLabel {
    Bullish,
    Bearish,
    Consolidating,
    Unknown,
}

impl StructureLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            StructureLabel::Bullish => "Bullish",
            StructureLabel::Bearish => "Bearish",
            StructureLabel::Consolidating => "Consolidating",
            StructureLabel::Unknown => "Unknown",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            StructureLabel::Bullish => Direction::Bullish,
            StructureLabel::Bearish => Direction::Bearish,
            StructureLabel::Consolidating | StructureLabel::Unknown => Direction::Neutral,
        }
    }
}

impl std::fmt::Display for StructureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Swing-structure classifier
#[derive(Debug, Clone, Copy)]
pub struct StructureDetector {
    /// Odd window over which a swing point must be the strict extremum
    pub swing_window: usize,
}

impl Default for StructureDetector {
    fn default() -> Self {
        Self { swing_window: 5 }
    }
}

impl StructureDetector {
    pub fn new(swing_window: Period) -> Self {
        Self {
            swing_window: swing_window.get(),
        }
    }

    /// Confirmed swing highs and lows, oldest first
    pub fn swings<T: Ohlc>(&self, candles: &[T]) -> (Vec<SwingPoint>, Vec<SwingPoint>) {
        (
            swing_highs(candles, self.swing_window),
            swing_lows(candles, self.swing_window),
        )
    }

    pub fn classify<T: Ohlc>(&self, series: &AugmentedSeries<'_, T>) -> StructureLabel {
        let (highs, lows) = self.swings(series.candles());
        let label = label_from_swings(&highs, &lows);
        trace!(
            detector = self.name(),
            highs = highs.len(),
            lows = lows.len(),
            structure = %label,
            "structure"
        );
        label
    }
}

fn label_from_swings(highs: &[SwingPoint], lows: &[SwingPoint]) -> StructureLabel {
    let (Some(last_highs), Some(last_lows)) = (last_two(highs), last_two(lows)) else {
        return StructureLabel::Unknown;
    };
    let [prev_high, high] = last_highs;
    let [prev_low, low] = last_lows;

    if high.price > prev_high.price && low.price > prev_low.price {
        StructureLabel::Bullish
    } else if high.price < prev_high.price && low.price < prev_low.price {
        StructureLabel::Bearish
    } else {
        StructureLabel::Consolidating
    }
}

fn last_two(points: &[SwingPoint]) -> Option<[SwingPoint; 2]> {
    match points {
        [.., a, b] => Some([*a, *b]),
        _ => None,
    }
}

impl Detector for StructureDetector {
    type Output = StructureLabel;

    fn name(&self) -> &'static str {
        "structure"
    }

    /// Two swings of the same kind must be more than `window / 2` candles apart,
    /// and the newest needs `window / 2` candles after it.
    fn min_candles(&self) -> usize {
        3 * (self.swing_window / 2) + 2
    }

    fn detect<T: Ohlc>(&self, series: &AugmentedSeries<'_, T>) -> StructureLabel {
        self.classify(series)
    }
}
