//! Engine parameters
//!
//! Every tunable constant of the pipeline lives in [`EngineParams`], a flat set of
//! named values supplied once at construction. This module provides:
//! - Defaults for every parameter
//! - Metadata (name, default, range, description) for documentation and tuning
//! - Construction from a name -> value map, with range checks
//! - Eager validation of cross-parameter constraints
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use sigfuse::params::EngineParams;
//!
//! let mut overrides = HashMap::new();
//! overrides.insert("sma_short", 20.0);
//! overrides.insert("sma_long", 100.0);
//!
//! let params = EngineParams::from_map(&overrides).unwrap();
//! assert_eq!(params.sma_long.get(), 100);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{detectors::helpers::SHADOW_VERYLONG_FACTOR, Period, Ratio, Result, SignalError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value (0.0..=1.0)
  Ratio,
  /// Period value (positive integer)
  Period,
  /// Positive real factor (multipliers, thresholds, hours of day)
  Factor,
}

/// Metadata for a single engine parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "sma_short")
  pub name: &'static str,
  /// Parameter type
  pub param_type: ParamType,
  /// Default value
  pub default: f64,
  /// Accepted range: (min, max)
  pub range: (f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn factor(
    name: &'static str,
    default: f64,
    range: (f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Factor, default, range, description }
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    if !value.is_finite() {
      return Err(SignalError::InvalidValue("parameter must be finite"));
    }
    let (min, max) = self.range;
    if value < min || value > max {
      return Err(SignalError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio | ParamType::Factor => Ok(()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(SignalError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETER TABLE
// ============================================================

static PARAM_META: &[ParamMeta] = &[
  ParamMeta::period("min_candles", 200.0, (1.0, 100_000.0), "Minimum series length before evaluation"),
  ParamMeta::period("sma_short", 50.0, (1.0, 10_000.0), "Short simple moving average window"),
  ParamMeta::period("sma_long", 200.0, (2.0, 10_000.0), "Long simple moving average window"),
  ParamMeta::period("rsi_period", 14.0, (1.0, 1_000.0), "RSI averaging window"),
  ParamMeta::period("macd_fast", 12.0, (1.0, 1_000.0), "MACD fast EMA span"),
  ParamMeta::period("macd_slow", 26.0, (2.0, 1_000.0), "MACD slow EMA span"),
  ParamMeta::period("macd_signal", 9.0, (1.0, 1_000.0), "MACD signal EMA span"),
  ParamMeta::period("atr_period", 14.0, (1.0, 1_000.0), "ATR rolling window"),
  ParamMeta::period("bb_period", 20.0, (2.0, 1_000.0), "Bollinger band window"),
  ParamMeta::factor("bb_width", 2.0, (0.1, 10.0), "Bollinger band width in standard deviations"),
  ParamMeta::period("adx_period", 14.0, (1.0, 1_000.0), "ADX Wilder smoothing period"),
  ParamMeta::period("swing_window", 5.0, (3.0, 101.0), "Odd window confirming a swing point"),
  ParamMeta::period("zone_lookback", 10.0, (3.0, 1_000.0), "Candles scanned by zone detectors"),
  ParamMeta::factor("order_block_range_factor", 0.5, (0.01, 1.0), "Order block candle range vs mean range"),
  ParamMeta::ratio("liquidity_fraction", 0.2, (0.01, 0.5), "Distance to swing extremum as share of local range"),
  ParamMeta::factor("fvg_factor", 1.5, (0.1, 10.0), "Fair value gap size vs mean range"),
  ParamMeta::factor("pin_bar_wick_factor", SHADOW_VERYLONG_FACTOR, (1.0, 10.0), "Pin bar wick length vs body"),
  ParamMeta::period("breakout_lookback", 20.0, (1.0, 1_000.0), "Candles forming breakout resistance/support"),
  ParamMeta::factor("rsi_overbought", 70.0, (50.0, 100.0), "RSI above this is overbought"),
  ParamMeta::factor("rsi_oversold", 30.0, (0.0, 50.0), "RSI below this is oversold"),
  ParamMeta::factor("adx_threshold", 25.0, (0.0, 100.0), "ADX level confirming a strong trend"),
  ParamMeta::factor("strong_trend", 1.0, (0.0, 100.0), "Trend strength (%) confirming a strong trend"),
  ParamMeta::factor("stop_atr_multiple", 1.5, (0.01, 100.0), "Stop-loss distance in ATRs"),
  ParamMeta::factor("target_atr_multiple", 3.0, (0.01, 100.0), "Take-profit distance in ATRs"),
  ParamMeta::factor("london_open", 8.0, (0.0, 24.0), "London session start (UTC hour)"),
  ParamMeta::factor("london_close", 11.0, (0.0, 24.0), "London session end (UTC hour)"),
  ParamMeta::factor("new_york_open", 13.0, (0.0, 24.0), "New York session start (UTC hour)"),
  ParamMeta::factor("new_york_close", 16.0, (0.0, 24.0), "New York session end (UTC hour)"),
  ParamMeta::ratio("confidence_base", 0.5, (0.0, 1.0), "Confidence of any directional call"),
  ParamMeta::ratio("confidence_aligned", 0.7, (0.0, 1.0), "Confidence when momentum aligns"),
  ParamMeta::ratio("confidence_corroborated", 0.85, (0.0, 1.0), "Confidence with zone and trend confirmation"),
];

// ============================================================
// ENGINE PARAMETERS
// ============================================================

/// All tunable constants of the engine.
///
/// Deserializable from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
  pub min_candles: Period,
  pub sma_short: Period,
  pub sma_long: Period,
  pub rsi_period: Period,
  pub macd_fast: Period,
  pub macd_slow: Period,
  pub macd_signal: Period,
  pub atr_period: Period,
  pub bb_period: Period,
  pub bb_width: f64,
  pub adx_period: Period,
  pub swing_window: Period,
  pub zone_lookback: Period,
  pub order_block_range_factor: f64,
  pub liquidity_fraction: Ratio,
  pub fvg_factor: f64,
  pub pin_bar_wick_factor: f64,
  pub breakout_lookback: Period,
  pub rsi_overbought: f64,
  pub rsi_oversold: f64,
  pub adx_threshold: f64,
  pub strong_trend: f64,
  pub stop_atr_multiple: f64,
  pub target_atr_multiple: f64,
  pub london_open: f64,
  pub london_close: f64,
  pub new_york_open: f64,
  pub new_york_close: f64,
  pub confidence_base: Ratio,
  pub confidence_aligned: Ratio,
  pub confidence_corroborated: Ratio,
}

impl Default for EngineParams {
  fn default() -> Self {
    Self {
      min_candles: Period::new_const(200),
      sma_short: Period::new_const(50),
      sma_long: Period::new_const(200),
      rsi_period: Period::new_const(14),
      macd_fast: Period::new_const(12),
      macd_slow: Period::new_const(26),
      macd_signal: Period::new_const(9),
      atr_period: Period::new_const(14),
      bb_period: Period::new_const(20),
      bb_width: 2.0,
      adx_period: Period::new_const(14),
      swing_window: Period::new_const(5),
      zone_lookback: Period::new_const(10),
      order_block_range_factor: 0.5,
      liquidity_fraction: Ratio::new_const(0.2),
      fvg_factor: 1.5,
      pin_bar_wick_factor: SHADOW_VERYLONG_FACTOR,
      breakout_lookback: Period::new_const(20),
      rsi_overbought: 70.0,
      rsi_oversold: 30.0,
      adx_threshold: 25.0,
      strong_trend: 1.0,
      stop_atr_multiple: 1.5,
      target_atr_multiple: 3.0,
      london_open: 8.0,
      london_close: 11.0,
      new_york_open: 13.0,
      new_york_close: 16.0,
      confidence_base: Ratio::new_const(0.5),
      confidence_aligned: Ratio::new_const(0.7),
      confidence_corroborated: Ratio::new_const(0.85),
    }
  }
}

impl EngineParams {
  /// Returns metadata for all configurable parameters
  pub fn param_meta() -> &'static [ParamMeta] {
    PARAM_META
  }

  /// Creates parameters from a name -> value map.
  ///
  /// Missing parameters use their default values; unknown names are rejected.
  pub fn from_map(params: &HashMap<&str, f64>) -> Result<Self> {
    let mut out = Self::default();
    // Sorted so the first reported error does not depend on map iteration order.
    let mut keys: Vec<&&str> = params.keys().collect();
    keys.sort();
    for key in keys {
      let meta = PARAM_META
        .iter()
        .find(|m| m.name == *key)
        .ok_or_else(|| SignalError::InvalidConfig(format!("unknown parameter '{key}'")))?;
      meta.validate(params[*key])?;
    }

    let period = |key: &str, default: Period| get_period(params, key, default.get());
    let ratio = |key: &str, default: Ratio| get_ratio(params, key, default.get());
    let factor = |key: &str, default: f64| params.get(key).copied().unwrap_or(default);

    out.min_candles = period("min_candles", out.min_candles)?;
    out.sma_short = period("sma_short", out.sma_short)?;
    out.sma_long = period("sma_long", out.sma_long)?;
    out.rsi_period = period("rsi_period", out.rsi_period)?;
    out.macd_fast = period("macd_fast", out.macd_fast)?;
    out.macd_slow = period("macd_slow", out.macd_slow)?;
    out.macd_signal = period("macd_signal", out.macd_signal)?;
    out.atr_period = period("atr_period", out.atr_period)?;
    out.bb_period = period("bb_period", out.bb_period)?;
    out.bb_width = factor("bb_width", out.bb_width);
    out.adx_period = period("adx_period", out.adx_period)?;
    out.swing_window = period("swing_window", out.swing_window)?;
    out.zone_lookback = period("zone_lookback", out.zone_lookback)?;
    out.order_block_range_factor = factor("order_block_range_factor", out.order_block_range_factor);
    out.liquidity_fraction = ratio("liquidity_fraction", out.liquidity_fraction)?;
    out.fvg_factor = factor("fvg_factor", out.fvg_factor);
    out.pin_bar_wick_factor = factor("pin_bar_wick_factor", out.pin_bar_wick_factor);
    out.breakout_lookback = period("breakout_lookback", out.breakout_lookback)?;
    out.rsi_overbought = factor("rsi_overbought", out.rsi_overbought);
    out.rsi_oversold = factor("rsi_oversold", out.rsi_oversold);
    out.adx_threshold = factor("adx_threshold", out.adx_threshold);
    out.strong_trend = factor("strong_trend", out.strong_trend);
    out.stop_atr_multiple = factor("stop_atr_multiple", out.stop_atr_multiple);
    out.target_atr_multiple = factor("target_atr_multiple", out.target_atr_multiple);
    out.london_open = factor("london_open", out.london_open);
    out.london_close = factor("london_close", out.london_close);
    out.new_york_open = factor("new_york_open", out.new_york_open);
    out.new_york_close = factor("new_york_close", out.new_york_close);
    out.confidence_base = ratio("confidence_base", out.confidence_base)?;
    out.confidence_aligned = ratio("confidence_aligned", out.confidence_aligned)?;
    out.confidence_corroborated = ratio("confidence_corroborated", out.confidence_corroborated)?;

    out.validate()?;
    Ok(out)
  }

  /// Every parameter as a `(name, value)` pair, in table order.
  pub fn named_values(&self) -> Vec<(&'static str, f64)> {
    vec![
      ("min_candles", self.min_candles.get() as f64),
      ("sma_short", self.sma_short.get() as f64),
      ("sma_long", self.sma_long.get() as f64),
      ("rsi_period", self.rsi_period.get() as f64),
      ("macd_fast", self.macd_fast.get() as f64),
      ("macd_slow", self.macd_slow.get() as f64),
      ("macd_signal", self.macd_signal.get() as f64),
      ("atr_period", self.atr_period.get() as f64),
      ("bb_period", self.bb_period.get() as f64),
      ("bb_width", self.bb_width),
      ("adx_period", self.adx_period.get() as f64),
      ("swing_window", self.swing_window.get() as f64),
      ("zone_lookback", self.zone_lookback.get() as f64),
      ("order_block_range_factor", self.order_block_range_factor),
      ("liquidity_fraction", self.liquidity_fraction.get()),
      ("fvg_factor", self.fvg_factor),
      ("pin_bar_wick_factor", self.pin_bar_wick_factor),
      ("breakout_lookback", self.breakout_lookback.get() as f64),
      ("rsi_overbought", self.rsi_overbought),
      ("rsi_oversold", self.rsi_oversold),
      ("adx_threshold", self.adx_threshold),
      ("strong_trend", self.strong_trend),
      ("stop_atr_multiple", self.stop_atr_multiple),
      ("target_atr_multiple", self.target_atr_multiple),
      ("london_open", self.london_open),
      ("london_close", self.london_close),
      ("new_york_open", self.new_york_open),
      ("new_york_close", self.new_york_close),
      ("confidence_base", self.confidence_base.get()),
      ("confidence_aligned", self.confidence_aligned.get()),
      ("confidence_corroborated", self.confidence_corroborated.get()),
    ]
  }

  /// Check single-value ranges and cross-parameter constraints.
  ///
  /// Called by `EngineBuilder::build`, so a malformed configuration never reaches
  /// evaluation.
  pub fn validate(&self) -> Result<()> {
    for (name, value) in self.named_values() {
      if let Some(meta) = PARAM_META.iter().find(|m| m.name == name) {
        meta.validate(value)?;
      }
    }

    if self.sma_short >= self.sma_long {
      return Err(SignalError::InvalidConfig(format!(
        "sma_short ({}) must be shorter than sma_long ({})",
        self.sma_short.get(),
        self.sma_long.get()
      )));
    }
    if self.macd_fast >= self.macd_slow {
      return Err(SignalError::InvalidConfig(format!(
        "macd_fast ({}) must be shorter than macd_slow ({})",
        self.macd_fast.get(),
        self.macd_slow.get()
      )));
    }
    let swing = self.swing_window.get();
    if swing < 3 || swing % 2 == 0 {
      return Err(SignalError::InvalidConfig(format!(
        "swing_window must be odd and >= 3, got {swing}"
      )));
    }
    if self.zone_lookback.get() < 3 {
      return Err(SignalError::InvalidConfig("zone_lookback must be >= 3".into()));
    }
    if self.rsi_oversold >= self.rsi_overbought {
      return Err(SignalError::InvalidConfig(
        "rsi_oversold must be below rsi_overbought".into(),
      ));
    }
    if self.london_open >= self.london_close || self.new_york_open >= self.new_york_close {
      return Err(SignalError::InvalidConfig("session open must precede close".into()));
    }
    if self.confidence_base > self.confidence_aligned
      || self.confidence_aligned > self.confidence_corroborated
    {
      return Err(SignalError::InvalidConfig(
        "confidence tiers must be non-decreasing (base <= aligned <= corroborated)".into(),
      ));
    }
    Ok(())
  }
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  if !(value >= 1.0) || value.fract() != 0.0 {
    return Err(SignalError::InvalidValue("Period must be a positive integer"));
  }
  Period::new(value as usize)
}

// ============================================================
// TESTS
// ============================================================
