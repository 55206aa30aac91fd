//! Trading session (killzone) lookup.
//!
//! Pure time-of-day check against two half-open UTC windows. Windows are configured
//! in fractional hours and compared at minute resolution.

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use crate::params::EngineParams;

/// Session containing a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionLabel {
    London,
    NewYork,
    OffSession,
    Unknown,
}

impl SessionLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionLabel::London => "London",
            SessionLabel::NewYork => "New York",
            SessionLabel::OffSession => "Off-session",
            SessionLabel::Unknown => "Unknown",
        }
    }

    #[inline]
    pub fn is_killzone(self) -> bool {
        matches!(self, SessionLabel::London | SessionLabel::NewYork)
    }
}

impl std::fmt::Display for SessionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[open, close)` in minutes after midnight UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    open: u32,
    close: u32,
}

impl Window {
    fn from_hours(open: f64, close: f64) -> Self {
        Self {
            open: to_minutes(open),
            close: to_minutes(close),
        }
    }

    #[inline]
    fn contains(self, minute: u32) -> bool {
        self.open <= minute && minute < self.close
    }
}

fn to_minutes(hours: f64) -> u32 {
    (hours.clamp(0.0, 24.0) * 60.0).round() as u32
}

#[derive(Debug, Clone, Copy)]
pub struct SessionClassifier {
    london: Window,
    new_york: Window,
}

impl Default for SessionClassifier {
    fn default() -> Self {
        Self::new(&EngineParams::default())
    }
}

impl SessionClassifier {
    pub fn new(params: &EngineParams) -> Self {
        Self {
            london: Window::from_hours(params.london_open, params.london_close),
            new_york: Window::from_hours(params.new_york_open, params.new_york_close),
        }
    }

    pub fn classify(&self, timestamp: Option<DateTime<Utc>>) -> SessionLabel {
        let Some(ts) = timestamp else {
            return SessionLabel::Unknown;
        };
        let minute = ts.hour() * 60 + ts.minute();
        if self.london.contains(minute) {
            SessionLabel::London
        } else if self.new_york.contains(minute) {
            SessionLabel::NewYork
        } else {
            SessionLabel::OffSession
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 2, 14, hour, minute, 0).unwrap())
    }

    #[test]
    fn london_window_is_half_open() {
        let sessions = SessionClassifier::default();
        assert_eq!(sessions.classify(at(7, 59)), SessionLabel::OffSession);
        assert_eq!(sessions.classify(at(8, 0)), SessionLabel::London);
        assert_eq!(sessions.classify(at(10, 59)), SessionLabel::London);
        assert_eq!(sessions.classify(at(11, 0)), SessionLabel::OffSession);
    }

    #[test]
    fn new_york_window() {
        let sessions = SessionClassifier::default();
        assert_eq!(sessions.classify(at(13, 0)), SessionLabel::NewYork);
        assert_eq!(sessions.classify(at(15, 30)), SessionLabel::NewYork);
        assert_eq!(sessions.classify(at(16, 0)), SessionLabel::OffSession);
        assert_eq!(sessions.classify(at(23, 59)), SessionLabel::OffSession);
    }

    #[test]
    fn missing_timestamp_is_unknown() {
        assert_eq!(SessionClassifier::default().classify(None), SessionLabel::Unknown);
    }

    #[test]
    fn fractional_hours() {
        let params = EngineParams {
            london_open: 7.5,
            ..EngineParams::default()
        };
        let sessions = SessionClassifier::new(&params);
        assert_eq!(sessions.classify(at(7, 30)), SessionLabel::London);
        assert_eq!(sessions.classify(at(7, 29)), SessionLabel::OffSession);
    }

    #[test]
    fn killzones() {
        assert!(SessionLabel::London.is_killzone());
        assert!(!SessionLabel::Unknown.is_killzone());
        assert_eq!(SessionLabel::NewYork.to_string(), "New York");
    }
}
