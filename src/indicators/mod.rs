//! Indicator engine and the augmented series it produces.
//!
//! Indicators are pure functions: candle history in, one value per candle out, with
//! leading `NaN` until the lookback window fills. They are computed once per
//! evaluation into an immutable [`AugmentedSeries`] that every detector reads by
//! shared reference.

pub mod moving_average;
pub mod oscillator;
pub mod trend;
pub mod volatility;

use std::collections::BTreeMap;

use tracing::trace;

use crate::{params::EngineParams, Ohlc, OhlcExt};

/// Column names of the augmented series
pub mod columns {
    pub const SMA_SHORT: &str = "sma_short";
    pub const SMA_LONG: &str = "sma_long";
    pub const EMA_FAST: &str = "ema_fast";
    pub const EMA_SLOW: &str = "ema_slow";
    pub const MACD: &str = "macd";
    pub const MACD_SIGNAL: &str = "macd_signal";
    pub const MACD_HISTOGRAM: &str = "macd_histogram";
    pub const RSI: &str = "rsi";
    pub const TRUE_RANGE: &str = "true_range";
    pub const ATR: &str = "atr";
    pub const BB_UPPER: &str = "bb_upper";
    pub const BB_MIDDLE: &str = "bb_middle";
    pub const BB_LOWER: &str = "bb_lower";
    pub const TREND_STRENGTH: &str = "trend_strength";
    pub const ADX: &str = "adx";
    pub const DI_PLUS: &str = "di_plus";
    pub const DI_MINUS: &str = "di_minus";
}

// ============================================================
// AUGMENTED SERIES
// ============================================================

/// Candles plus derived columns aligned index-for-index.
///
/// Built once by [`IndicatorEngine::compute`]; there is no way to modify it afterwards.
#[derive(Debug, Clone)]
pub struct AugmentedSeries<'a, T: Ohlc> {
    candles: &'a [T],
    columns: BTreeMap<&'static str, Vec<f64>>,
    mean_range: f64,
}

impl<'a, T: Ohlc> AugmentedSeries<'a, T> {
    fn new(candles: &'a [T]) -> Self {
        let mean_range = if candles.is_empty() {
            0.0
        } else {
            candles.iter().map(|c| c.range()).sum::<f64>() / candles.len() as f64
        };
        Self {
            candles,
            columns: BTreeMap::new(),
            mean_range,
        }
    }

    fn with_column(mut self, name: &'static str, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), self.candles.len(), "column {name} misaligned");
        self.columns.insert(name, values);
        self
    }

    #[inline]
    pub fn candles(&self) -> &'a [T] {
        self.candles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Index of the most recent candle
    #[inline]
    pub fn latest_index(&self) -> Option<usize> {
        self.candles.len().checked_sub(1)
    }

    /// Mean of `high - low` over the whole series
    #[inline]
    pub fn mean_range(&self) -> f64 {
        self.mean_range
    }

    /// Full column, including undefined (NaN) entries.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// Defined value of a column at an index; `None` when missing or still warming up.
    pub fn value(&self, name: &str, index: usize) -> Option<f64> {
        self.columns
            .get(name)
            .and_then(|v| v.get(index).copied())
            .filter(|v| v.is_finite())
    }

    /// Column names in sorted order
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.keys().copied()
    }
}

// ============================================================
// INDICATOR SET
// ============================================================

/// Indicators the fusion rules read at a single index. Undefined values are NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSet {
    pub sma_short: f64,
    pub sma_long: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub atr: f64,
    pub trend_strength: f64,
    pub adx: f64,
}

impl IndicatorSet {
    pub fn at<T: Ohlc>(series: &AugmentedSeries<'_, T>, index: usize) -> Self {
        let get = |name| series.value(name, index).unwrap_or(f64::NAN);
        Self {
            sma_short: get(columns::SMA_SHORT),
            sma_long: get(columns::SMA_LONG),
            rsi: get(columns::RSI),
            macd: get(columns::MACD),
            macd_signal: get(columns::MACD_SIGNAL),
            macd_histogram: get(columns::MACD_HISTOGRAM),
            atr: get(columns::ATR),
            trend_strength: get(columns::TREND_STRENGTH),
            adx: get(columns::ADX),
        }
    }

    /// Name of the first value a decision cannot do without that is undefined.
    pub fn first_undefined(&self) -> Option<&'static str> {
        [
            (columns::SMA_SHORT, self.sma_short),
            (columns::SMA_LONG, self.sma_long),
            (columns::TREND_STRENGTH, self.trend_strength),
            (columns::RSI, self.rsi),
            (columns::MACD, self.macd),
            (columns::MACD_SIGNAL, self.macd_signal),
            (columns::ATR, self.atr),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}

// ============================================================
// INDICATOR ENGINE
// ============================================================

/// Window lengths for every indicator
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
    pub bb_period: usize,
    pub bb_width: f64,
    pub adx_period: usize,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(&EngineParams::default())
    }
}

impl IndicatorEngine {
    pub fn new(params: &EngineParams) -> Self {
        Self {
            sma_short: params.sma_short.get(),
            sma_long: params.sma_long.get(),
            rsi_period: params.rsi_period.get(),
            macd_fast: params.macd_fast.get(),
            macd_slow: params.macd_slow.get(),
            macd_signal: params.macd_signal.get(),
            atr_period: params.atr_period.get(),
            bb_period: params.bb_period.get(),
            bb_width: params.bb_width,
            adx_period: params.adx_period.get(),
        }
    }

    pub fn compute<'a, T: Ohlc>(&self, candles: &'a [T]) -> AugmentedSeries<'a, T> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close()).collect();

        let sma_short = moving_average::sma(&closes, self.sma_short);
        let sma_long = moving_average::sma(&closes, self.sma_long);
        let strength = trend::trend_strength(&sma_short, &sma_long);
        let macd = moving_average::macd(&closes, self.macd_fast, self.macd_slow, self.macd_signal);
        let bands = volatility::bollinger(&closes, self.bb_period, self.bb_width);
        let adx = trend::adx(candles, self.adx_period);

        let series = AugmentedSeries::new(candles)
            .with_column(columns::SMA_SHORT, sma_short)
            .with_column(columns::SMA_LONG, sma_long)
            .with_column(columns::TREND_STRENGTH, strength)
            .with_column(columns::EMA_FAST, moving_average::ema(&closes, self.macd_fast))
            .with_column(columns::EMA_SLOW, moving_average::ema(&closes, self.macd_slow))
            .with_column(columns::MACD, macd.line)
            .with_column(columns::MACD_SIGNAL, macd.signal)
            .with_column(columns::MACD_HISTOGRAM, macd.histogram)
            .with_column(columns::RSI, oscillator::rsi(&closes, self.rsi_period))
            .with_column(columns::TRUE_RANGE, volatility::true_range(candles))
            .with_column(columns::ATR, volatility::atr(candles, self.atr_period))
            .with_column(columns::BB_UPPER, bands.upper)
            .with_column(columns::BB_MIDDLE, bands.middle)
            .with_column(columns::BB_LOWER, bands.lower)
            .with_column(columns::ADX, adx.adx)
            .with_column(columns::DI_PLUS, adx.di_plus)
            .with_column(columns::DI_MINUS, adx.di_minus);

        trace!(
            candles = series.len(),
            mean_range = series.mean_range(),
            "indicators computed"
        );
        series
    }
}

// ============================================================
// TEST HELPERS
// ============================================================

/// Create synthetic candles from close prices for testing.
///
/// open = prev_close (or close for the first candle),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0, hourly timestamps.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::Candle> {
    use chrono::{Duration, TimeZone, Utc};
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            crate::Candle::new(
                start + Duration::hours(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
