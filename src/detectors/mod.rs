//! Detectors reading the augmented series
//!
//! Every detector borrows the [`AugmentedSeries`] immutably and reports what it finds.
//! Absence is a value (`Unknown`, `NoPattern`, `None`), never an error.
//!
//! # Detectors
//!
//! - **Structure**: swing highs/lows, Bullish / Bearish / Consolidating / Unknown
//! - **Pattern**: pin bar and engulfing on the latest candle
//! - **Zones**: order block, liquidity zone, fair value gap

pub mod helpers;
pub mod pattern;
pub mod structure;
pub mod zones;

use crate::{indicators::AugmentedSeries, Ohlc};

/// Common interface of all detectors
pub trait Detector {
    type Output;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Fewest candles on which the detector can report anything but absence
    fn min_candles(&self) -> usize;

    fn detect<T: Ohlc>(&self, series: &AugmentedSeries<'_, T>) -> Self::Output;
}

// Re-export all detectors for convenience
pub use helpers::SwingPoint;
pub use pattern::{PatternDetector, PatternLabel};
pub use structure::{StructureDetector, StructureLabel};
pub use zones::{
    FairValueGap, FairValueGapDetector, LiquidityDetector, LiquiditySide, LiquidityZone,
    OrderBlock, OrderBlockDetector, ZoneDetector, ZoneReport,
};
