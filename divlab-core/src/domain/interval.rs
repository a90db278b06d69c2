//! Bar interval and lookback period, spelled the way the chart API expects.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    #[error("unknown bar interval '{0}' (valid: 1m 2m 5m 15m 30m 60m 90m 1h 1d)")]
    UnknownInterval(String),
    #[error("unknown lookback period '{0}' (valid: 1d 5d 1mo 3mo 6mo 1y 2y 5y 10y ytd max)")]
    UnknownPeriod(String),
}

/// Bar interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    M1,
    M2,
    M5,
    #[default]
    M15,
    M30,
    M60,
    M90,
    H1,
    D1,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M2 => "2m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::M60 => "60m",
            Interval::M90 => "90m",
            Interval::H1 => "1h",
            Interval::D1 => "1d",
        }
    }

    /// Wall-clock length of one bar.
    pub fn duration(&self) -> Duration {
        match self {
            Interval::M1 => Duration::minutes(1),
            Interval::M2 => Duration::minutes(2),
            Interval::M5 => Duration::minutes(5),
            Interval::M15 => Duration::minutes(15),
            Interval::M30 => Duration::minutes(30),
            Interval::M60 | Interval::H1 => Duration::hours(1),
            Interval::M90 => Duration::minutes(90),
            Interval::D1 => Duration::days(1),
        }
    }

    /// Number of bars in a 365-day year. Crypto trades around the clock,
    /// so annualisation uses calendar time rather than trading sessions.
    pub fn periods_per_year(&self) -> f64 {
        let year_secs = Duration::days(365).num_seconds() as f64;
        year_secs / self.duration().num_seconds() as f64
    }
}

impl FromStr for Interval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Interval::M1),
            "2m" => Ok(Interval::M2),
            "5m" => Ok(Interval::M5),
            "15m" => Ok(Interval::M15),
            "30m" => Ok(Interval::M30),
            "60m" => Ok(Interval::M60),
            "90m" => Ok(Interval::M90),
            "1h" => Ok(Interval::H1),
            "1d" => Ok(Interval::D1),
            other => Err(IntervalError::UnknownInterval(other.to_string())),
        }
    }
}

impl TryFrom<String> for Interval {
    type Error = IntervalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookback window ending now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    D1,
    D5,
    #[default]
    Mo1,
    Mo3,
    Mo6,
    Y1,
    Y2,
    Y5,
    Y10,
    Ytd,
    Max,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::D1 => "1d",
            Period::D5 => "5d",
            Period::Mo1 => "1mo",
            Period::Mo3 => "3mo",
            Period::Mo6 => "6mo",
            Period::Y1 => "1y",
            Period::Y2 => "2y",
            Period::Y5 => "5y",
            Period::Y10 => "10y",
            Period::Ytd => "ytd",
            Period::Max => "max",
        }
    }

    /// Approximate span, used by the synthetic provider to size its output.
    /// `Ytd` and `Max` fall back to one year.
    pub fn approx_duration(&self) -> Duration {
        match self {
            Period::D1 => Duration::days(1),
            Period::D5 => Duration::days(5),
            Period::Mo1 => Duration::days(30),
            Period::Mo3 => Duration::days(91),
            Period::Mo6 => Duration::days(182),
            Period::Y1 | Period::Ytd | Period::Max => Duration::days(365),
            Period::Y2 => Duration::days(730),
            Period::Y5 => Duration::days(1825),
            Period::Y10 => Duration::days(3650),
        }
    }
}

impl FromStr for Period {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1d" => Ok(Period::D1),
            "5d" => Ok(Period::D5),
            "1mo" => Ok(Period::Mo1),
            "3mo" => Ok(Period::Mo3),
            "6mo" => Ok(Period::Mo6),
            "1y" => Ok(Period::Y1),
            "2y" => Ok(Period::Y2),
            "5y" => Ok(Period::Y5),
            "10y" => Ok(Period::Y10),
            "ytd" => Ok(Period::Ytd),
            "max" => Ok(Period::Max),
            other => Err(IntervalError::UnknownPeriod(other.to_string())),
        }
    }
}

impl TryFrom<String> for Period {
    type Error = IntervalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
