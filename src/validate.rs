//! Series validation
//!
//! Every later stage assumes a filled lookback window and finite prices, so the
//! series is checked once up front and rejected as a whole.

use crate::{Ohlc, OhlcExt, Period, Result, SignalError};

/// Checks history length, candle consistency and timestamp order.
#[derive(Debug, Clone)]
pub struct SeriesValidator {
    pub min_len: Period,
}

impl SeriesValidator {
    pub fn new(min_len: Period) -> Self {
        Self { min_len }
    }

    /// Ok when the series can be evaluated, otherwise the first problem found.
    ///
    /// Missing timestamps are tolerated; present ones must strictly increase.
    pub fn validate<T: Ohlc>(&self, candles: &[T]) -> Result<()> {
        let need = self.min_len.get();
        if candles.len() < need {
            return Err(SignalError::InsufficientData {
                need,
                got: candles.len(),
            });
        }

        for (index, candle) in candles.iter().enumerate() {
            candle.validate().map_err(|e| match e {
                SignalError::InvalidCandle { reason, .. } => {
                    SignalError::InvalidCandle { index, reason }
                }
                other => other,
            })?;
        }

        for (index, pair) in candles.windows(2).enumerate() {
            if let (Some(prev), Some(curr)) = (pair[0].timestamp(), pair[1].timestamp()) {
                if curr == prev {
                    return Err(SignalError::InvalidTimestamp {
                        index: index + 1,
                        reason: "duplicate timestamp",
                    });
                }
                if curr < prev {
                    return Err(SignalError::InvalidTimestamp {
                        index: index + 1,
                        reason: "timestamps out of order",
                    });
                }
            }
        }

        Ok(())
    }
}
