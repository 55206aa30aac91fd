//! Signal fusion: an ordered table of named rules, first match wins.
//!
//! | # | rule                  | outcome |
//! |---|-----------------------|---------|
//! | 1 | `rejected`            | HOLD, series failed validation (see [`SignalResult::rejected`]) |
//! | 2 | `undefined_indicator` | HOLD, a required indicator has no value at the latest candle |
//! | 3 | `confluence_buy`      | BUY: bullish structure or pattern, golden cross, RSI <= overbought, MACD bullish cross |
//! | 4 | `confluence_sell`     | SELL: the mirror image |
//! | 5 | `breakout_buy`        | BUY: close above resistance, RSI > 50 |
//! | 6 | `breakout_sell`       | SELL: close below support, RSI < 50 |
//! | 7 | `advisory_hold`       | HOLD with a bias taken from the MACD histogram sign |
//!
//! Confidence for BUY/SELL starts at the base tier, rises to the aligned tier when the
//! histogram sign and the RSI side of 50 agree with the direction, and to the top tier
//! when a zone also corroborates and the trend gate passes. HOLD is always 0.

use tracing::debug;

use crate::{
    detectors::{
        helpers::window_extremes, Detector, PatternDetector, PatternLabel, StructureDetector,
        StructureLabel, ZoneDetector, ZoneReport,
    },
    indicators::{AugmentedSeries, IndicatorSet},
    params::EngineParams,
    risk::{RiskCalculator, RiskLevels},
    session::{SessionClassifier, SessionLabel},
    Direction, Ohlc, Result, Signal, SignalError, SignalResult,
};

pub const REJECTED_RULE: &str = "rejected";
pub const UNDEFINED_INDICATOR_RULE: &str = "undefined_indicator";
pub const ADVISORY_RULE: &str = "advisory_hold";

const RSI_MIDLINE: f64 = 50.0;

// ============================================================
// EVIDENCE
// ============================================================

/// Everything the rules look at, gathered from one augmented series.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub latest: IndicatorSet,
    pub previous: IndicatorSet,
    pub structure: StructureLabel,
    pub pattern: PatternLabel,
    pub zones: ZoneReport,
    pub session: SessionLabel,
    pub close: f64,
    pub previous_close: f64,
    /// Highest high of the candles before the latest one
    pub resistance: Option<f64>,
    /// Lowest low of the candles before the latest one
    pub support: Option<f64>,
    pub risk: RiskLevels,
}

impl Evidence {
    pub fn gather<T: Ohlc>(
        series: &AugmentedSeries<'_, T>,
        structure: &StructureDetector,
        patterns: &PatternDetector,
        zones: &ZoneDetector,
        sessions: &SessionClassifier,
        risk: &RiskCalculator,
        breakout_lookback: usize,
    ) -> Self {
        let candles = series.candles();
        let last = series.latest_index().unwrap_or(0);
        let latest = IndicatorSet::at(series, last);
        let previous = match last.checked_sub(1) {
            Some(prev) => IndicatorSet::at(series, prev),
            None => IndicatorSet::at(series, usize::MAX),
        };

        let close = candles.last().map_or(f64::NAN, |c| c.close());
        let previous_close = last
            .checked_sub(1)
            .and_then(|i| candles.get(i))
            .map_or(f64::NAN, |c| c.close());

        // The window must be full; the latest candle is never part of it.
        let (resistance, support) = match last.checked_sub(breakout_lookback) {
            Some(start) if breakout_lookback > 0 => window_extremes(&candles[start..last]).unzip(),
            _ => (None, None),
        };

        Self {
            latest,
            previous,
            structure: structure.classify(series),
            pattern: patterns.detect(series),
            zones: zones.detect(series),
            session: sessions.classify(candles.last().and_then(|c| c.timestamp())),
            close,
            previous_close,
            resistance,
            support,
            risk: risk.compute(close, latest.atr),
        }
    }

    /// Error naming the first required indicator that is undefined at the latest candle.
    pub fn require_defined(&self) -> Result<()> {
        match self.latest.first_undefined() {
            Some(name) => Err(SignalError::UndefinedIndicator { name }),
            None => Ok(()),
        }
    }

    /// Short average crossed above the long one between the previous and latest candle
    pub fn golden_cross(&self) -> bool {
        self.previous.sma_short < self.previous.sma_long
            && self.latest.sma_short > self.latest.sma_long
    }

    pub fn death_cross(&self) -> bool {
        self.previous.sma_short > self.previous.sma_long
            && self.latest.sma_short < self.latest.sma_long
    }

    pub fn macd_bullish_cross(&self) -> bool {
        self.previous.macd < self.previous.macd_signal && self.latest.macd > self.latest.macd_signal
    }

    pub fn macd_bearish_cross(&self) -> bool {
        self.previous.macd > self.previous.macd_signal && self.latest.macd < self.latest.macd_signal
    }

    /// Percentage change of the latest close; `None` without a usable previous close.
    pub fn change_pct(&self) -> Option<f64> {
        let change = (self.close - self.previous_close) / self.previous_close * 100.0;
        (self.previous_close != 0.0 && change.is_finite()).then_some(change)
    }

    fn macd_state(&self) -> &'static str {
        let (macd, signal) = (self.latest.macd, self.latest.macd_signal);
        if !macd.is_finite() || !signal.is_finite() {
            "undefined"
        } else if self.macd_bullish_cross() {
            "bullish cross"
        } else if self.macd_bearish_cross() {
            "bearish cross"
        } else if macd > signal {
            "above signal"
        } else if macd < signal {
            "below signal"
        } else {
            "on signal"
        }
    }

    /// Deterministic narrative of every input to the decision.
    pub fn analysis(&self) -> String {
        let zone = |flag: Option<String>| flag.unwrap_or_else(|| "None".to_string());
        format!(
            "Structure: {} | Trend: {} | Pattern: {} | Order block: {} | Liquidity: {} | \
             FVG: {} | Session: {} | RSI: {} | MACD: {} | Change: {}",
            self.structure,
            fmt_value(self.latest.trend_strength, 2, "%"),
            self.pattern,
            zone(self.zones.order_block.map(|z| z.to_string())),
            zone(self.zones.liquidity.map(|z| z.to_string())),
            zone(self.zones.fair_value_gap.map(|z| z.to_string())),
            self.session,
            fmt_value(self.latest.rsi, 2, ""),
            self.macd_state(),
            self.change_pct()
                .map_or_else(|| "n/a".to_string(), |c| format!("{c:+.2}%")),
        )
    }
}

fn fmt_value(value: f64, decimals: usize, suffix: &str) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}{suffix}")
    } else {
        "n/a".to_string()
    }
}

// ============================================================
// RULES
// ============================================================

/// Thresholds used by the rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub adx_threshold: f64,
    pub strong_trend: f64,
    pub confidence_base: f64,
    pub confidence_aligned: f64,
    pub confidence_corroborated: f64,
}

impl FusionParams {
    pub fn new(params: &EngineParams) -> Self {
        Self {
            rsi_overbought: params.rsi_overbought,
            rsi_oversold: params.rsi_oversold,
            adx_threshold: params.adx_threshold,
            strong_trend: params.strong_trend,
            confidence_base: params.confidence_base.get(),
            confidence_aligned: params.confidence_aligned.get(),
            confidence_corroborated: params.confidence_corroborated.get(),
        }
    }
}

/// Outcome of a matching rule
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub signal: Signal,
    pub reason: String,
}

impl Verdict {
    fn new(signal: Signal, reason: impl Into<String>) -> Self {
        Self {
            signal,
            reason: reason.into(),
        }
    }
}

/// A named predicate; `None` means the rule does not apply.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub evaluate: fn(&Evidence, &FusionParams) -> Option<Verdict>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

static RULES: &[Rule] = &[
    Rule {
        name: UNDEFINED_INDICATOR_RULE,
        evaluate: undefined_indicator,
    },
    Rule {
        name: "confluence_buy",
        evaluate: confluence_buy,
    },
    Rule {
        name: "confluence_sell",
        evaluate: confluence_sell,
    },
    Rule {
        name: "breakout_buy",
        evaluate: breakout_buy,
    },
    Rule {
        name: "breakout_sell",
        evaluate: breakout_sell,
    },
    Rule {
        name: ADVISORY_RULE,
        evaluate: advisory,
    },
];

fn undefined_indicator(e: &Evidence, _: &FusionParams) -> Option<Verdict> {
    let Err(error) = e.require_defined() else {
        return None;
    };
    Some(Verdict::new(Signal::Hold, format!("{error}, no trade")))
}

fn confluence_buy(e: &Evidence, p: &FusionParams) -> Option<Verdict> {
    let setup = e.structure == StructureLabel::Bullish || e.pattern.direction().is_bullish();
    (setup && e.golden_cross() && e.latest.rsi <= p.rsi_overbought && e.macd_bullish_cross())
        .then(|| {
            let reason = format!(
                "bullish confluence ({} structure, {} pattern), golden cross and MACD cross",
                e.structure, e.pattern
            );
            Verdict::new(Signal::Buy, reason)
        })
}

fn confluence_sell(e: &Evidence, p: &FusionParams) -> Option<Verdict> {
    let setup = e.structure == StructureLabel::Bearish || e.pattern.direction().is_bearish();
    (setup && e.death_cross() && e.latest.rsi >= p.rsi_oversold && e.macd_bearish_cross())
        .then(|| {
            let reason = format!(
                "bearish confluence ({} structure, {} pattern), death cross and MACD cross",
                e.structure, e.pattern
            );
            Verdict::new(Signal::Sell, reason)
        })
}

fn breakout_buy(e: &Evidence, _: &FusionParams) -> Option<Verdict> {
    let resistance = e.resistance?;
    (e.close > resistance && e.latest.rsi > RSI_MIDLINE)
        .then(|| Verdict::new(Signal::Buy, format!("breakout above {resistance:.5}")))
}

fn breakout_sell(e: &Evidence, _: &FusionParams) -> Option<Verdict> {
    let support = e.support?;
    (e.close < support && e.latest.rsi < RSI_MIDLINE)
        .then(|| Verdict::new(Signal::Sell, format!("breakdown below {support:.5}")))
}

fn advisory(e: &Evidence, _: &FusionParams) -> Option<Verdict> {
    let histogram = e.latest.macd_histogram;
    let reason = if histogram > 0.0 {
        "prepare for potential BUY"
    } else if histogram < 0.0 {
        "prepare for potential SELL"
    } else {
        "no clear bias"
    };
    Some(Verdict::new(Signal::Hold, reason))
}

// ============================================================
// SIGNAL FUSION
// ============================================================

#[derive(Debug, Clone, Copy)]
pub struct SignalFusion {
    params: FusionParams,
}

impl Default for SignalFusion {
    fn default() -> Self {
        Self::new(&EngineParams::default())
    }
}

impl SignalFusion {
    pub fn new(params: &EngineParams) -> Self {
        Self {
            params: FusionParams::new(params),
        }
    }

    /// Rules in evaluation order, after the upstream `rejected` check
    pub fn rules() -> &'static [Rule] {
        RULES
    }

    /// First matching rule and its verdict
    pub fn evaluate(&self, evidence: &Evidence) -> (&'static str, Verdict) {
        RULES
            .iter()
            .find_map(|rule| (rule.evaluate)(evidence, &self.params).map(|v| (rule.name, v)))
            .unwrap_or_else(|| (ADVISORY_RULE, Verdict::new(Signal::Hold, "no clear bias")))
    }

    pub fn decide(&self, evidence: &Evidence) -> SignalResult {
        let (rule, verdict) = self.evaluate(evidence);
        let confidence = self.confidence(verdict.signal, evidence);

        let risk = &evidence.risk;
        let (stop_loss, take_profit, risk_reward) = match verdict.signal {
            Signal::Sell => (risk.stop_loss_short, risk.take_profit_short, risk.rr_short),
            Signal::Buy | Signal::Hold => (risk.stop_loss_long, risk.take_profit_long, risk.rr_long),
        };
        let strength = if evidence.latest.trend_strength.is_finite() {
            evidence.latest.trend_strength
        } else {
            0.0
        };

        debug!(
            rule,
            signal = %verdict.signal,
            confidence,
            strength,
            "signal decided"
        );

        SignalResult {
            signal: verdict.signal,
            strength,
            entry: evidence.close,
            stop_loss,
            take_profit,
            risk_reward,
            confidence,
            rule,
            analysis: evidence.analysis(),
            recommendation: format!("{} - {}", verdict.signal, verdict.reason),
        }
    }

    /// Confidence tier of a decision
    pub fn confidence(&self, signal: Signal, evidence: &Evidence) -> f64 {
        let direction = match signal {
            Signal::Buy => Direction::Bullish,
            Signal::Sell => Direction::Bearish,
            Signal::Hold => return 0.0,
        };
        let p = &self.params;
        if !momentum_aligned(direction, &evidence.latest) {
            return p.confidence_base;
        }
        if evidence.zones.corroborates(direction) && self.trend_gate(&evidence.latest) {
            p.confidence_corroborated
        } else {
            p.confidence_aligned
        }
    }

    /// ADX or trend strength confirms a strong trend
    pub fn trend_gate(&self, latest: &IndicatorSet) -> bool {
        latest.adx >= self.params.adx_threshold || latest.trend_strength >= self.params.strong_trend
    }
}

fn momentum_aligned(direction: Direction, latest: &IndicatorSet) -> bool {
    match direction {
        Direction::Bullish => latest.macd_histogram > 0.0 && latest.rsi > RSI_MIDLINE,
        Direction::Bearish => latest.macd_histogram < 0.0 && latest.rsi < RSI_MIDLINE,
        Direction::Neutral => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{LiquiditySide, LiquidityZone, OrderBlock};

    fn flat_set() -> IndicatorSet {
        IndicatorSet {
            sma_short: 1.1,
            sma_long: 1.1,
            rsi: 50.0,
            macd: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            atr: 0.001,
            trend_strength: 0.0,
            adx: 10.0,
        }
    }

    fn neutral() -> Evidence {
        Evidence {
            latest: flat_set(),
            previous: flat_set(),
            structure: StructureLabel::Consolidating,
            pattern: PatternLabel::NoPattern,
            zones: ZoneReport::default(),
            session: SessionLabel::Unknown,
            close: 1.1,
            previous_close: 1.1,
            resistance: Some(1.2),
            support: Some(1.0),
            risk: RiskCalculator::default().compute(1.1, 0.001),
        }
    }

    fn bullish_confluence() -> Evidence {
        let mut e = neutral();
        e.structure = StructureLabel::Bullish;
        e.previous.sma_short = 1.099;
        e.latest.sma_short = 1.101;
        e.previous.macd = -0.0001;
        e.latest.macd = 0.0002;
        e.latest.macd_signal = 0.0001;
        e.latest.macd_histogram = 0.0001;
        e.latest.rsi = 60.0;
        e
    }

    fn bearish_confluence() -> Evidence {
        let mut e = neutral();
        e.pattern = PatternLabel::BearishEngulfing;
        e.previous.sma_short = 1.101;
        e.latest.sma_short = 1.099;
        e.previous.macd = 0.0001;
        e.latest.macd = -0.0002;
        e.latest.macd_signal = -0.0001;
        e.latest.macd_histogram = -0.0001;
        e.latest.rsi = 40.0;
        e
    }

    fn decide(e: &Evidence) -> SignalResult {
        SignalFusion::default().decide(e)
    }

    #[test]
    fn rule_table_order() {
        let names: Vec<_> = SignalFusion::rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            [
                "undefined_indicator",
                "confluence_buy",
                "confluence_sell",
                "breakout_buy",
                "breakout_sell",
                "advisory_hold"
            ]
        );
    }

    #[test]
    fn confluence_buy_uses_long_bracket() {
        let result = decide(&bullish_confluence());
        assert_eq!(result.signal, Signal::Buy);
        assert_eq!(result.rule, "confluence_buy");
        assert_eq!(result.confidence, 0.7);
        assert_eq!(result.stop_loss, result_risk().stop_loss_long);
        assert_eq!(result.take_profit, result_risk().take_profit_long);
        assert_eq!(result.risk_reward, 2.0);
        assert!(result.recommendation.starts_with("BUY - bullish confluence"));
    }

    fn result_risk() -> RiskLevels {
        RiskCalculator::default().compute(1.1, 0.001)
    }

    #[test]
    fn rsi_at_overbought_still_buys() {
        let mut e = bullish_confluence();
        e.latest.rsi = 70.0;
        assert_eq!(decide(&e).signal, Signal::Buy);
        e.latest.rsi = 70.01;
        assert_eq!(decide(&e).rule, ADVISORY_RULE);
    }

    #[test]
    fn confluence_sell_from_pattern() {
        let result = decide(&bearish_confluence());
        assert_eq!(result.signal, Signal::Sell);
        assert_eq!(result.rule, "confluence_sell");
        assert_eq!(result.stop_loss, result_risk().stop_loss_short);
        assert_eq!(result.take_profit, result_risk().take_profit_short);
    }

    #[test]
    fn rsi_at_oversold_still_sells() {
        let mut e = bearish_confluence();
        e.latest.rsi = 30.0;
        assert_eq!(decide(&e).signal, Signal::Sell);
        // aligned momentum, no corroboration
        assert_eq!(decide(&e).confidence, 0.7);
        e.latest.rsi = 29.99;
        assert_eq!(decide(&e).signal, Signal::Hold);
    }

    #[test]
    fn confluence_needs_structure_or_pattern() {
        let mut e = bullish_confluence();
        e.structure = StructureLabel::Consolidating;
        assert_eq!(decide(&e).signal, Signal::Hold);
        e.pattern = PatternLabel::BullishPinBar;
        assert_eq!(decide(&e).signal, Signal::Buy);
    }

    #[test]
    fn confluence_needs_both_crosses() {
        let mut e = bullish_confluence();
        e.previous.macd = 0.0001;
        assert_eq!(decide(&e).rule, ADVISORY_RULE);

        let mut e = bullish_confluence();
        e.previous.sma_short = 1.1;
        assert_eq!(decide(&e).rule, ADVISORY_RULE);
    }

    #[test]
    fn breakout_buy_above_resistance() {
        let mut e = neutral();
        e.close = 1.21;
        e.latest.rsi = 55.0;
        let result = decide(&e);
        assert_eq!(result.rule, "breakout_buy");
        assert_eq!(result.signal, Signal::Buy);
        // histogram 0: momentum not aligned
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn breakout_requires_rsi_beyond_midline() {
        let mut e = neutral();
        e.close = 1.21;
        e.latest.rsi = 50.0;
        assert_eq!(decide(&e).signal, Signal::Hold);
    }

    #[test]
    fn breakout_sell_below_support() {
        let mut e = neutral();
        e.close = 0.99;
        e.latest.rsi = 45.0;
        let result = decide(&e);
        assert_eq!(result.rule, "breakout_sell");
        assert_eq!(result.signal, Signal::Sell);
    }

    #[test]
    fn no_breakout_without_window() {
        let mut e = neutral();
        e.close = 1.5;
        e.latest.rsi = 80.0;
        e.resistance = None;
        assert_eq!(decide(&e).rule, ADVISORY_RULE);
    }

    #[test]
    fn confluence_precedes_breakout() {
        let mut e = bullish_confluence();
        e.close = 1.25;
        assert_eq!(decide(&e).rule, "confluence_buy");
    }

    #[test]
    fn advisory_follows_histogram() {
        let mut e = neutral();
        e.latest.macd_histogram = 0.0002;
        let result = decide(&e);
        assert_eq!(result.signal, Signal::Hold);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.recommendation, "HOLD - prepare for potential BUY");

        e.latest.macd_histogram = -0.0002;
        assert_eq!(decide(&e).recommendation, "HOLD - prepare for potential SELL");

        e.latest.macd_histogram = 0.0;
        assert_eq!(decide(&e).recommendation, "HOLD - no clear bias");

        e.latest.macd_histogram = f64::NAN;
        assert_eq!(decide(&e).recommendation, "HOLD - no clear bias");
    }

    #[test]
    fn undefined_indicator_holds() {
        let mut e = bullish_confluence();
        e.latest.sma_long = f64::NAN;
        let result = decide(&e);
        assert_eq!(result.signal, Signal::Hold);
        assert_eq!(result.rule, UNDEFINED_INDICATOR_RULE);
        assert_eq!(result.confidence, 0.0);
        assert!(result.recommendation.contains("sma_long"));
        assert_eq!(
            e.require_defined(),
            Err(SignalError::UndefinedIndicator { name: "sma_long" })
        );
    }

    #[test]
    fn corroborated_confidence_needs_zone_and_trend() {
        let mut e = bullish_confluence();
        e.zones.order_block = Some(OrderBlock {
            index: 0,
            price: 1.09,
            bias: Direction::Bullish,
        });
        // zone without trend gate
        assert_eq!(decide(&e).confidence, 0.7);

        e.latest.adx = 25.0;
        assert_eq!(decide(&e).confidence, 0.85);

        e.latest.adx = 10.0;
        e.latest.trend_strength = 1.0;
        assert_eq!(decide(&e).confidence, 0.85);
    }

    #[test]
    fn opposite_liquidity_does_not_corroborate() {
        let mut e = bullish_confluence();
        e.latest.adx = 40.0;
        e.zones.liquidity = Some(LiquidityZone {
            side: LiquiditySide::Above,
            price: 1.2,
        });
        assert_eq!(decide(&e).confidence, 0.7);
        e.zones.liquidity = Some(LiquidityZone {
            side: LiquiditySide::Below,
            price: 1.0,
        });
        assert_eq!(decide(&e).confidence, 0.85);
    }

    #[test]
    fn unaligned_momentum_is_base_confidence() {
        let mut e = bullish_confluence();
        e.latest.rsi = 45.0;
        let result = decide(&e);
        assert_eq!(result.signal, Signal::Buy);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn analysis_is_deterministic() {
        let mut e = bullish_confluence();
        e.close = 1.111;
        e.session = SessionLabel::London;
        let first = decide(&e);
        assert_eq!(first, decide(&e));
        assert_eq!(
            first.analysis,
            "Structure: Bullish | Trend: 0.00% | Pattern: None | Order block: None | \
             Liquidity: None | FVG: None | Session: London | RSI: 60.00 | MACD: bullish cross | \
             Change: +1.00%"
        );
    }

    #[test]
    fn change_needs_previous_close() {
        let mut e = neutral();
        e.previous_close = 0.0;
        assert_eq!(e.change_pct(), None);
        assert!(e.analysis().ends_with("Change: n/a"));
    }
}
