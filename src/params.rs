//! Tolerance profiles and parameter metadata
//!
//! Every detector is tuned by a [`ToleranceProfile`]. The three named
//! [`Sensitivity`] levels resolve to a fixed table; custom profiles can be built
//! from a parameter map, which enables:
//! - Grid search over tolerance settings
//! - Parameter documentation
//!
//! # Example
//!
//! ```rust
//! use chartpat::params::{Sensitivity, ToleranceProfile};
//!
//! let profile = ToleranceProfile::for_sensitivity(Sensitivity::Moderate);
//! assert_eq!(profile.min_separation.get(), 5);
//!
//! for param in ToleranceProfile::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//! ```

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{PatternError, Period, Ratio, Result};

// ============================================================
// SENSITIVITY
// ============================================================

/// Named detection sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Strict,
    Moderate,
    Loose,
}

impl Sensitivity {
    pub const ALL: [Sensitivity; 3] = [Self::Strict, Self::Moderate, Self::Loose];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Moderate => "moderate",
            Self::Loose => "loose",
        }
    }

    /// Human-readable description for selection lists
    pub fn description(self) -> &'static str {
        match self {
            Self::Strict => "Strict (High Confidence)",
            Self::Moderate => "Moderate (Balanced)",
            Self::Loose => "Loose (More Patterns)",
        }
    }

    #[inline]
    pub fn profile(self) -> ToleranceProfile {
        ToleranceProfile::for_sensitivity(self)
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sensitivity {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(Self::Strict),
            "moderate" => Ok(Self::Moderate),
            "loose" => Ok(Self::Loose),
            other => Err(PatternError::UnknownSensitivity(other.to_string())),
        }
    }
}

// ============================================================
// TOLERANCE PROFILE
// ============================================================

/// Thresholds shared by all detectors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceProfile {
    /// Allowed fractional deviation between two compared prices
    pub price_tolerance: Ratio,
    /// Minimum bar distance between two compared swing points
    pub min_separation: Period,
    /// Fractional margin a neckline/resistance must clear
    pub neckline_offset: Ratio,
    /// Swing window half-width for detectors whose depth scales with sensitivity
    pub pivot_depth: Period,
}

impl ToleranceProfile {
    pub const STRICT: Self = Self::from_const(0.02, 10, 0.001, 3);
    pub const MODERATE: Self = Self::from_const(0.05, 5, 0.003, 2);
    pub const LOOSE: Self = Self::from_const(0.08, 3, 0.005, 1);

    const fn from_const(
        price_tolerance: f64,
        min_separation: usize,
        neckline_offset: f64,
        pivot_depth: usize,
    ) -> Self {
        Self {
            price_tolerance: Ratio::new_const(price_tolerance),
            min_separation: Period::new_const(min_separation),
            neckline_offset: Ratio::new_const(neckline_offset),
            pivot_depth: Period::new_const(pivot_depth),
        }
    }

    pub const fn for_sensitivity(sensitivity: Sensitivity) -> Self {
        match sensitivity {
            Sensitivity::Strict => Self::STRICT,
            Sensitivity::Moderate => Self::MODERATE,
            Sensitivity::Loose => Self::LOOSE,
        }
    }

    /// Returns metadata for all configurable parameters
    pub fn param_meta() -> &'static [ParamMeta] {
        static META: [ParamMeta; 4] = [
            ParamMeta::ratio(
                "price_tolerance",
                0.05,
                (0.01, 0.10, 0.01),
                "Max relative difference between paired swing prices",
            ),
            ParamMeta::period(
                "min_separation",
                5.0,
                (2.0, 20.0, 1.0),
                "Min bars between paired swing points",
            ),
            ParamMeta::ratio(
                "neckline_offset",
                0.003,
                (0.0, 0.01, 0.001),
                "Margin a neckline or resistance must clear",
            ),
            ParamMeta::period(
                "pivot_depth",
                2.0,
                (1.0, 5.0, 1.0),
                "Swing window half-width for double bottom/top",
            ),
        ];
        &META
    }

    /// Creates a profile from a parameter map
    ///
    /// Missing parameters use the moderate defaults.
    pub fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        for meta in Self::param_meta() {
            if let Some(value) = params.get(meta.name) {
                meta.validate(*value)?;
            }
        }
        let defaults = Self::MODERATE;
        Ok(Self {
            price_tolerance: get_ratio(params, "price_tolerance", defaults.price_tolerance.get())?,
            min_separation: get_period(params, "min_separation", defaults.min_separation.get())?,
            neckline_offset: get_ratio(params, "neckline_offset", defaults.neckline_offset.get())?,
            pivot_depth: get_period(params, "pivot_depth", defaults.pivot_depth.get())?,
        })
    }
}

impl Default for ToleranceProfile {
    fn default() -> Self {
        Self::MODERATE
    }
}

impl From<Sensitivity> for ToleranceProfile {
    fn from(sensitivity: Sensitivity) -> Self {
        Self::for_sensitivity(sensitivity)
    }
}

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
}

/// Metadata for a single profile parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
    pub name: &'static str,
    pub param_type: ParamType,
    pub default: f64,
    /// Range for sweeps: (min, max, step)
    pub range: (f64, f64, f64),
    pub description: &'static str,
}

impl ParamMeta {
    pub const fn ratio(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Ratio,
            default,
            range,
            description,
        }
    }

    pub const fn period(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Period,
            default,
            range,
            description,
        }
    }

    /// Generate all values for grid search
    pub fn generate_grid(&self) -> Vec<f64> {
        let (min, max, step) = self.range;
        let steps = ((max - min) / step + f64::EPSILON * 10.0).floor() as usize;
        (0..=steps).map(|i| min + step * i as f64).collect()
    }

    /// Validate a value for this parameter
    pub fn validate(&self, value: f64) -> Result<()> {
        let (min, max, _) = self.range;
        if value.is_nan() || value < min || value > max {
            return Err(PatternError::OutOfRange {
                field: self.name,
                value,
                min,
                max,
            });
        }
        if self.param_type == ParamType::Period && value.fract() != 0.0 {
            return Err(PatternError::InvalidValue(
                "Period must be a positive integer",
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
    Period::new(value as usize)
}

// ============================================================
// TESTS
// ============================================================
