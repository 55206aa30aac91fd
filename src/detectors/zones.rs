//! Price zones: order blocks, liquidity zones and fair value gaps.
//!
//! Each sub-detector looks at the tail of the series and reports `None` when its
//! preconditions are unmet. The three flags are independent and may all fire at once.

use std::fmt;

use serde::Serialize;
use tracing::trace;

use super::helpers::{swing_highs, swing_lows};
use super::Detector;
use crate::{indicators::AugmentedSeries, params::EngineParams, Direction, Ohlc, OhlcExt};

// ============================================================
// ZONE FLAGS
// ============================================================

/// Quiet candle right before a strong move
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderBlock {
    pub index: usize,
    /// Close of the quiet candle
    pub price: f64,
    pub bias: Direction,
}

impl fmt::Display for OrderBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} order block @ {:.5}", bias_name(self.bias), self.price)
    }
}

/// Side of the current price on which resting orders are presumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiquiditySide {
    Above,
    Below,
}

/// Price sitting close to the latest swing extreme
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LiquidityZone {
    pub side: LiquiditySide,
    pub price: f64,
}

impl fmt::Display for LiquidityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            LiquiditySide::Above => "above",
            LiquiditySide::Below => "below",
        };
        write!(f, "Liquidity {side} @ {:.5}", self.price)
    }
}

/// Three-candle imbalance. `index` is the third candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FairValueGap {
    pub index: usize,
    pub low: f64,
    pub high: f64,
    pub bias: Direction,
}

impl fmt::Display for FairValueGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} FVG [{:.5}, {:.5}]",
            bias_name(self.bias),
            self.low,
            self.high
        )
    }
}

fn bias_name(bias: Direction) -> &'static str {
    match bias {
        Direction::Bullish => "Bullish",
        Direction::Bearish => "Bearish",
        Direction::Neutral => "Neutral",
    }
}

/// All zone flags for the latest candle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ZoneReport {
    pub order_block: Option<OrderBlock>,
    pub liquidity: Option<LiquidityZone>,
    pub fair_value_gap: Option<FairValueGap>,
}

impl ZoneReport {
    /// An order block with the same bias, or liquidity on the supporting side.
    pub fn corroborates(&self, direction: Direction) -> bool {
        let order_block = self.order_block.is_some_and(|ob| ob.bias == direction);
        let liquidity = self.liquidity.is_some_and(|lz| match direction {
            Direction::Bullish => lz.side == LiquiditySide::Below,
            Direction::Bearish => lz.side == LiquiditySide::Above,
            Direction::Neutral => false,
        });
        order_block || liquidity
    }
}

// ============================================================
// ORDER BLOCK
// ============================================================

#[derive(Debug, Clone, Copy)]
pub struct OrderBlockDetector {
    pub lookback: usize,
    /// Quiet candle: range < range_factor * mean range
    pub range_factor: f64,
}

impl Default for OrderBlockDetector {
    fn default() -> Self {
        Self {
            lookback: 10,
            range_factor: 0.5,
        }
    }
}

impl Detector for OrderBlockDetector {
    type Output = Option<OrderBlock>;

    fn name(&self) -> &'static str {
        "order_block"
    }

    fn min_candles(&self) -> usize {
        2
    }

    fn detect<T: Ohlc>(&self, series: &AugmentedSeries<'_, T>) -> Option<OrderBlock> {
        let candles = series.candles();
        let n = candles.len();
        let mean = series.mean_range();
        if n < self.min_candles() || mean <= 0.0 {
            return None;
        }

        let start = n.saturating_sub(self.lookback);
        (start..n - 1).rev().find_map(|i| {
            let quiet = candles[i].range() < self.range_factor * mean;
            let move_ = candles[i + 1].close() - candles[i].close();
            if !quiet || move_.abs() <= mean {
                return None;
            }
            Some(OrderBlock {
                index: i,
                price: candles[i].close(),
                bias: if move_ > 0.0 {
                    Direction::Bullish
                } else {
                    Direction::Bearish
                },
            })
        })
    }
}

// ============================================================
// LIQUIDITY ZONE
// ============================================================

#[derive(Debug, Clone, Copy)]
pub struct LiquidityDetector {
    pub swing_window: usize,
    /// Distance from the extreme, as a fraction of the swing range
    pub fraction: f64,
}

impl Default for LiquidityDetector {
    fn default() -> Self {
        Self {
            swing_window: 5,
            fraction: 0.2,
        }
    }
}

impl Detector for LiquidityDetector {
    type Output = Option<LiquidityZone>;

    fn name(&self) -> &'static str {
        "liquidity"
    }

    fn min_candles(&self) -> usize {
        self.swing_window
    }

    fn detect<T: Ohlc>(&self, series: &AugmentedSeries<'_, T>) -> Option<LiquidityZone> {
        let candles = series.candles();
        let close = candles.last()?.close();
        let high = swing_highs(candles, self.swing_window).last()?.price;
        let low = swing_lows(candles, self.swing_window).last()?.price;

        let range = high - low;
        if range <= 0.0 {
            return None;
        }
        let band = self.fraction * range;

        if high - close <= band {
            Some(LiquidityZone {
                side: LiquiditySide::Above,
                price: high,
            })
        } else if close - low <= band {
            Some(LiquidityZone {
                side: LiquiditySide::Below,
                price: low,
            })
        } else {
            None
        }
    }
}

// ============================================================
// FAIR VALUE GAP
// ============================================================

#[derive(Debug, Clone, Copy)]
pub struct FairValueGapDetector {
    pub lookback: usize,
    /// Gap must exceed factor * mean range
    pub factor: f64,
}

impl Default for FairValueGapDetector {
    fn default() -> Self {
        Self {
            lookback: 10,
            factor: 1.5,
        }
    }
}

impl Detector for FairValueGapDetector {
    type Output = Option<FairValueGap>;

    fn name(&self) -> &'static str {
        "fair_value_gap"
    }

    fn min_candles(&self) -> usize {
        3
    }

    fn detect<T: Ohlc>(&self, series: &AugmentedSeries<'_, T>) -> Option<FairValueGap> {
        let candles = series.candles();
        let n = candles.len();
        if n < self.min_candles() {
            return None;
        }
        let threshold = self.factor * series.mean_range();

        let start = n.saturating_sub(self.lookback).max(2);
        (start..n).rev().find_map(|i| {
            let first = &candles[i - 2];
            let third = &candles[i];
            if third.low() - first.high() > threshold {
                Some(FairValueGap {
                    index: i,
                    low: first.high(),
                    high: third.low(),
                    bias: Direction::Bullish,
                })
            } else if first.low() - third.high() > threshold {
                Some(FairValueGap {
                    index: i,
                    low: third.high(),
                    high: first.low(),
                    bias: Direction::Bearish,
                })
            } else {
                None
            }
        })
    }
}

// ============================================================
// ZONE DETECTOR
// ============================================================

/// Runs the three zone sub-detectors
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneDetector {
    pub order_block: OrderBlockDetector,
    pub liquidity: LiquidityDetector,
    pub fair_value_gap: FairValueGapDetector,
}

impl ZoneDetector {
    pub fn new(params: &EngineParams) -> Self {
        let lookback = params.zone_lookback.get();
        Self {
            order_block: OrderBlockDetector {
                lookback,
                range_factor: params.order_block_range_factor,
            },
            liquidity: LiquidityDetector {
                swing_window: params.swing_window.get(),
                fraction: params.liquidity_fraction.get(),
            },
            fair_value_gap: FairValueGapDetector {
                lookback,
                factor: params.fvg_factor,
            },
        }
    }
}

impl Detector for ZoneDetector {
    type Output = ZoneReport;

    fn name(&self) -> &'static str {
        "zones"
    }

    fn min_candles(&self) -> usize {
        self.order_block
            .min_candles()
            .max(self.liquidity.min_candles())
            .max(self.fair_value_gap.min_candles())
    }

    fn detect<T: Ohlc>(&self, series: &AugmentedSeries<'_, T>) -> ZoneReport {
        let report = ZoneReport {
            order_block: self.order_block.detect(series),
            liquidity: self.liquidity.detect(series),
            fair_value_gap: self.fair_value_gap.detect(series),
        };
        trace!(
            detector = self.name(),
            order_block = report.order_block.is_some(),
            liquidity = report.liquidity.is_some(),
            fair_value_gap = report.fair_value_gap.is_some(),
            "zones"
        );
        report
    }
}
