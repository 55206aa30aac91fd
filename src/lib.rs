//! # sigfuse - deterministic trading signal fusion
//!
//! Turns a time-ordered candle series for one instrument into a single BUY/SELL/HOLD
//! decision with a confidence score, ATR-based risk brackets and a reproducible
//! narrative. Indicators, market structure, candle patterns, price zones and the
//! trading session are computed independently and fused by an ordered rule table.
//!
//! ## Quick Start
//!
//! ```rust
//! use sigfuse::prelude::*;
//!
//! // Define your candle type
//! struct Bar { o: f64, h: f64, l: f64, c: f64 }
//!
//! impl Ohlc for Bar {
//!     fn open(&self) -> f64 { self.o }
//!     fn high(&self) -> f64 { self.h }
//!     fn low(&self) -> f64 { self.l }
//!     fn close(&self) -> f64 { self.c }
//! }
//!
//! // Create engine with default parameters
//! let engine = EngineBuilder::new().build().unwrap();
//!
//! // Too little history always degrades to HOLD
//! let bars: Vec<Bar> = vec![];
//! let result = engine.analyze(&bars);
//! assert_eq!(result.signal, Signal::Hold);
//! assert!(!result.analysis.is_empty());
//! ```

pub mod detectors;
pub mod fusion;
pub mod indicators;
pub mod params;
pub mod risk;
pub mod session;
pub mod validate;

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::{
            Detector, FairValueGap, LiquiditySide, LiquidityZone, OrderBlock, PatternDetector,
            PatternLabel, StructureDetector, StructureLabel, SwingPoint, ZoneDetector, ZoneReport,
        },
        // Parallel
        evaluate_parallel,
        // Fusion
        fusion::{Evidence, SignalFusion},
        // Indicators
        indicators::{AugmentedSeries, IndicatorEngine, IndicatorSet},
        // Parameters
        params::{EngineParams, ParamMeta, ParamType},
        rank_by_strength,
        risk::{RiskCalculator, RiskLevels},
        session::{SessionClassifier, SessionLabel},
        validate::SeriesValidator,
        // Types
        Candle,
        Direction,
        EngineBuilder,
        InstrumentSignal,
        // Core traits
        Ohlc,
        OhlcExt,
        OrderIntent,
        Period,
        Ratio,
        Result,
        Signal,
        // Errors
        SignalError,
        // Engine
        SignalEngine,
        SignalResult,
    };
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, SignalError>;

/// Errors that can occur while configuring the engine or evaluating a series
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {need} candles, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: &'static str },

    #[error("Invalid timestamp at index {index}: {reason}")]
    InvalidTimestamp { index: usize, reason: &'static str },

    #[error("Undefined indicator: {name} has no value at the latest candle")]
    UndefinedIndicator { name: &'static str },
}

impl SignalError {
    /// True for errors caused by the supplied series rather than the configuration.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            SignalError::InsufficientData { .. }
                | SignalError::InvalidCandle { .. }
                | SignalError::InvalidTimestamp { .. }
                | SignalError::UndefinedIndicator { .. }
        )
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(SignalError::InvalidValue("Ratio cannot be NaN or infinite"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(SignalError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(SignalError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// CANDLE TRAITS
// ============================================================

/// Core candle trait. Prices are midpoints; volume is not used by the engine.
pub trait Ohlc {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl<T: Ohlc + ?Sized> Ohlc for &T {
    fn open(&self) -> f64 {
        (**self).open()
    }

    fn high(&self) -> f64 {
        (**self).high()
    }

    fn low(&self) -> f64 {
        (**self).low()
    }

    fn close(&self) -> f64 {
        (**self).close()
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        (**self).timestamp()
    }
}

/// Extension trait with computed candle geometry
pub trait OhlcExt: Ohlc {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_wick(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_wick(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Validate candle consistency. The index in the error is filled in by the caller.
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) {
            return Err(SignalError::InvalidCandle {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) {
            return Err(SignalError::InvalidCandle {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        if self.high() < self.low() {
            return Err(SignalError::InvalidCandle {
                index: 0,
                reason: "high < low",
            });
        }
        Ok(())
    }
}

impl<T: Ohlc + ?Sized> OhlcExt for T {}

/// Plain candle as delivered by a data source adapter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
        }
    }
}

impl Ohlc for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.time)
    }
}

// ============================================================
// DIRECTIONS AND SIGNALS
// ============================================================

/// Directional bias reported by detectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// Final trading decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }

    /// +1 for BUY, -1 for SELL, 0 for HOLD
    pub fn sign(self) -> i64 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// SIGNAL RESULT
// ============================================================

/// The single output of an evaluation. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalResult {
    pub signal: Signal,
    /// Trend strength in percent (0 when undefined)
    pub strength: f64,
    /// Latest close, the reference price of the risk bracket
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward: f64,
    /// 0.0..=1.0, always 0 for HOLD
    pub confidence: f64,
    /// Name of the fusion rule that produced the decision
    pub rule: &'static str,
    pub analysis: String,
    pub recommendation: String,
}

impl SignalResult {
    /// HOLD result for a series that failed validation.
    pub fn rejected(error: &SignalError) -> Self {
        let reason = match error {
            SignalError::InsufficientData { .. } => "insufficient data",
            SignalError::InvalidCandle { .. } | SignalError::InvalidTimestamp { .. } => {
                "invalid series"
            }
            _ => "series rejected",
        };
        Self {
            signal: Signal::Hold,
            strength: 0.0,
            entry: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            risk_reward: 0.0,
            confidence: 0.0,
            rule: fusion::REJECTED_RULE,
            analysis: error.to_string(),
            recommendation: format!("{} - {reason}, no trade", Signal::Hold),
        }
    }

    #[inline]
    pub fn is_actionable(&self) -> bool {
        self.signal != Signal::Hold
    }

    /// Order description for an execution adapter; `None` for HOLD.
    ///
    /// Units are signed: positive buys, negative sells.
    pub fn order_intent(&self, instrument: &str, units: u32) -> Option<OrderIntent> {
        if !self.is_actionable() {
            return None;
        }
        Some(OrderIntent {
            instrument: instrument.to_string(),
            units: self.signal.sign() * i64::from(units),
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
        })
    }
}

/// Market order request derived from a directional [`SignalResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub instrument: String,
    pub units: i64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

// ============================================================
// SIGNAL ENGINE
// ============================================================

/// The full pipeline: validation, indicators, detectors, risk and fusion.
///
/// Holds only configuration, so one engine can serve any number of threads.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    params: params::EngineParams,
    validator: validate::SeriesValidator,
    indicators: indicators::IndicatorEngine,
    structure: detectors::StructureDetector,
    patterns: detectors::PatternDetector,
    zones: detectors::ZoneDetector,
    sessions: session::SessionClassifier,
    risk: risk::RiskCalculator,
    fusion: fusion::SignalFusion,
}

impl SignalEngine {
    fn from_params(params: params::EngineParams) -> Self {
        Self {
            validator: validate::SeriesValidator::new(params.min_candles),
            indicators: indicators::IndicatorEngine::new(&params),
            structure: detectors::StructureDetector::new(params.swing_window),
            patterns: detectors::PatternDetector::new(&params),
            zones: detectors::ZoneDetector::new(&params),
            sessions: session::SessionClassifier::new(&params),
            risk: risk::RiskCalculator::new(params.stop_atr_multiple, params.target_atr_multiple),
            fusion: fusion::SignalFusion::new(&params),
            params,
        }
    }

    #[inline]
    pub fn params(&self) -> &params::EngineParams {
        &self.params
    }

    /// Validate and compute every indicator column.
    ///
    /// This is the read-only view chart renderers consume.
    pub fn augment<'a, T: Ohlc>(
        &self,
        candles: &'a [T],
    ) -> Result<indicators::AugmentedSeries<'a, T>> {
        self.validator.validate(candles)?;
        Ok(self.indicators.compute(candles))
    }

    /// Run every detector over an augmented series.
    pub fn evidence<T: Ohlc>(&self, series: &indicators::AugmentedSeries<'_, T>) -> fusion::Evidence {
        fusion::Evidence::gather(
            series,
            &self.structure,
            &self.patterns,
            &self.zones,
            &self.sessions,
            &self.risk,
            self.params.breakout_lookback.get(),
        )
    }

    /// Evaluate a series, surfacing validation failures as errors.
    pub fn try_analyze<T: Ohlc>(&self, candles: &[T]) -> Result<SignalResult> {
        let series = self.augment(candles)?;
        let evidence = self.evidence(&series);
        Ok(self.fusion.decide(&evidence))
    }

    /// Evaluate a series. Never fails: invalid or short input yields HOLD.
    pub fn analyze<T: Ohlc>(&self, candles: &[T]) -> SignalResult {
        match self.try_analyze(candles) {
            Ok(result) => result,
            Err(error) => {
                debug!(error = %error, candles = candles.len(), "series rejected");
                SignalResult::rejected(&error)
            }
        }
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating SignalEngine instances
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    params: params::EngineParams,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all parameters
    pub fn params(mut self, params: params::EngineParams) -> Self {
        self.params = params;
        self
    }

    /// Minimum series length before any evaluation
    pub fn min_candles(mut self, min_candles: usize) -> Self {
        self.params.min_candles = Period::new_const(min_candles);
        self
    }

    /// Short and long moving average windows
    pub fn sma_windows(mut self, short: usize, long: usize) -> Self {
        self.params.sma_short = Period::new_const(short);
        self.params.sma_long = Period::new_const(long);
        self
    }

    /// Stop-loss and take-profit distances in ATRs
    pub fn risk_multiples(mut self, stop: f64, target: f64) -> Self {
        self.params.stop_atr_multiple = stop;
        self.params.target_atr_multiple = target;
        self
    }

    /// Build the engine, rejecting malformed parameters
    pub fn build(self) -> Result<SignalEngine> {
        self.params.validate()?;
        debug!(
            min_candles = self.params.min_candles.get(),
            sma_short = self.params.sma_short.get(),
            sma_long = self.params.sma_long.get(),
            "signal engine built"
        );
        Ok(SignalEngine::from_params(self.params))
    }
}

// ============================================================
// PARALLEL EVALUATION
// ============================================================

use rayon::prelude::*;

/// Result of evaluating a single instrument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentSignal {
    pub symbol: String,
    pub result: SignalResult,
}

/// Evaluate many instruments in parallel. Output order follows input order.
pub fn evaluate_parallel<'a, T, I>(engine: &SignalEngine, instruments: I) -> Vec<InstrumentSignal>
where
    T: Ohlc + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    instruments
        .into_par_iter()
        .map(|(symbol, candles)| InstrumentSignal {
            symbol: symbol.to_string(),
            result: engine.analyze(candles),
        })
        .collect()
}

/// Sort by trend strength, strongest first; ties by symbol.
pub fn rank_by_strength(signals: &mut [InstrumentSignal]) {
    signals.sort_by(|a, b| {
        b.result
            .strength
            .total_cmp(&a.result.strength)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}

// ============================================================
// TESTS
// ============================================================
