//! Labeled chart landmarks
//!
//! Detectors report pivots by bar index; [`to_landmarks`] turns them into
//! `{ time, price, label }` points for chart annotation.

use std::fmt::Write;

use chrono::{
    format::{Item, StrftimeItems},
    DateTime, FixedOffset,
};
use serde::{Deserialize, Serialize};

use crate::{series::OhlcvSeries, PatternError, PatternMatch, Result};

// ============================================================
// ROLES
// ============================================================

/// Structural role of a pivot within a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    FirstBottom,
    SecondBottom,
    FirstTop,
    SecondTop,
    Neckline,
    Breakout,
    Breakdown,
    LeftShoulder,
    Head,
    RightShoulder,
    SupportLow,
    ResistanceHigh,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::FirstBottom => "First Bottom",
            Self::SecondBottom => "Second Bottom",
            Self::FirstTop => "First Top",
            Self::SecondTop => "Second Top",
            Self::Neckline => "Neckline",
            Self::Breakout => "Breakout",
            Self::Breakdown => "Breakdown",
            Self::LeftShoulder => "Left Shoulder",
            Self::Head => "Head",
            Self::RightShoulder => "Right Shoulder",
            Self::SupportLow => "Support Low",
            Self::ResistanceHigh => "Resistance High",
        }
    }

    /// True for the closing bar that confirms a pattern
    pub fn is_confirmation(self) -> bool {
        matches!(self, Self::Breakout | Self::Breakdown)
    }
}

// ============================================================
// TIME FORMAT
// ============================================================

pub const DEFAULT_TIME_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

/// How landmark timestamps are rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeFormat {
    /// Offset from UTC in seconds, e.g. 19800 for IST
    pub utc_offset_secs: i32,
    /// strftime-style pattern
    pub pattern: String,
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self {
            utc_offset_secs: 0,
            pattern: DEFAULT_TIME_PATTERN.to_string(),
        }
    }
}

impl TimeFormat {
    pub fn validate(&self) -> Result<()> {
        if FixedOffset::east_opt(self.utc_offset_secs).is_none() {
            return Err(PatternError::InvalidConfig(format!(
                "utc offset {}s out of range",
                self.utc_offset_secs
            )));
        }
        if self.pattern.is_empty() {
            return Err(PatternError::InvalidConfig(
                "empty time pattern".to_string(),
            ));
        }
        if StrftimeItems::new(&self.pattern).any(|item| matches!(item, Item::Error)) {
            return Err(PatternError::InvalidConfig(format!(
                "invalid time pattern {:?}",
                self.pattern
            )));
        }
        Ok(())
    }

    /// Format epoch seconds. Falls back to the raw number when the timestamp
    /// or offset cannot be represented.
    pub fn format(&self, timestamp: i64) -> String {
        let (Some(offset), Some(utc)) = (
            FixedOffset::east_opt(self.utc_offset_secs),
            DateTime::from_timestamp(timestamp, 0),
        ) else {
            return timestamp.to_string();
        };

        let mut out = String::new();
        match write!(out, "{}", utc.with_timezone(&offset).format(&self.pattern)) {
            Ok(()) => out,
            Err(_) => timestamp.to_string(),
        }
    }
}

// ============================================================
// LANDMARK
// ============================================================

/// One labeled point of a detected pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Landmark {
    pub time: String,
    pub price: f64,
    pub label: &'static str,
    #[serde(skip)]
    pub index: usize,
    #[serde(skip)]
    pub timestamp: i64,
}

/// Convert a match into landmarks ordered by bar index.
///
/// The sort is stable, so pivots sharing a bar keep their role order.
pub fn to_landmarks(
    pattern: &PatternMatch,
    series: &OhlcvSeries,
    format: &TimeFormat,
) -> Vec<Landmark> {
    let timestamps = series.timestamps();
    let mut pivots = pattern.pivots.clone();
    pivots.sort_by_key(|p| p.index);

    pivots
        .into_iter()
        .filter_map(|p| {
            let timestamp = *timestamps.get(p.index)?;
            Some(Landmark {
                time: format.format(timestamp),
                price: p.price,
                label: p.role.label(),
                index: p.index,
                timestamp,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_utc() {
        let fmt = TimeFormat::default();
        assert_eq!(fmt.format(0), "1970-01-01 00:00:00");
        assert_eq!(fmt.format(1_700_000_000), "2023-11-14 22:13:20");
    }

    #[test]
    fn test_offset_format() {
        let fmt = TimeFormat {
            utc_offset_secs: 19_800,
            pattern: "%d/%m/%Y, %H:%M".to_string(),
        };
        assert_eq!(fmt.format(0), "01/01/1970, 05:30");
        assert!(fmt.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_timestamp_falls_back() {
        let fmt = TimeFormat::default();
        assert_eq!(fmt.format(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let bad_offset = TimeFormat {
            utc_offset_secs: 90_000,
            ..TimeFormat::default()
        };
        assert!(bad_offset.validate().is_err());

        let empty = TimeFormat {
            pattern: String::new(),
            ..TimeFormat::default()
        };
        assert!(empty.validate().is_err());

        let broken = TimeFormat {
            pattern: "%Y-%".to_string(),
            ..TimeFormat::default()
        };
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::FirstBottom.label(), "First Bottom");
        assert_eq!(Role::ResistanceHigh.label(), "Resistance High");
        assert!(Role::Breakdown.is_confirmation());
        assert!(!Role::Neckline.is_confirmation());
    }
}
