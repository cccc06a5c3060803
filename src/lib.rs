//! # chartpat - chart formation detector
//!
//! Detects double bottoms, double tops, head-and-shoulders and ascending
//! triangles in an OHLCV series and reports each match as labeled
//! `(time, price)` landmarks for chart annotation.
//!
//! ## Quick Start
//!
//! ```rust
//! use chartpat::prelude::*;
//!
//! let series = OhlcvSeries::new(
//!     vec![1_700_000_000, 1_700_000_060, 1_700_000_120],
//!     vec![100.0, 101.0, 102.0],
//!     vec![101.0, 102.0, 103.0],
//!     vec![99.0, 100.0, 101.0],
//!     vec![100.5, 101.5, 102.5],
//!     None,
//! )
//! .unwrap();
//!
//! let engine = EngineBuilder::new().build().unwrap();
//!
//! // Too short for any pattern: an empty list, not an error
//! let landmarks = engine.detect(PatternKind::DoubleBottom, Sensitivity::Moderate, &series);
//! assert!(landmarks.is_empty());
//! ```

pub mod detectors;
pub mod landmark;
pub mod params;
pub mod series;
pub mod trace;

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::*,
        // Output
        landmark::{Landmark, Role, TimeFormat},
        // Parameters
        params::{ParamMeta, ParamType, Sensitivity, ToleranceProfile},
        // Parallel
        scan_parallel,
        // Input
        series::{Bar, OhlcvSeries, OHLCV},
        // Diagnostics
        trace::{DetectionTrace, RejectReason},
        // Engine
        detect_pattern,
        BuiltinDetector,
        DetectionRequest,
        Direction,
        EngineBuilder,
        EngineConfig,
        PatternDetector,
        PatternEngine,
        PatternKind,
        PatternMatch,
        Pivot,
        ScanError,
        ScanResult,
        // Core types
        PatternError,
        Period,
        Ratio,
        Result,
    };
}

use std::{fmt, str::FromStr};

use landmark::{to_landmarks, Landmark, Role, TimeFormat};
use params::{Sensitivity, ToleranceProfile};
use series::OhlcvSeries;
use trace::DetectionTrace;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors from construction, parsing, validation and configuration.
/// Detection itself never fails.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
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

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidOHLCV { index: usize, reason: &'static str },

    #[error("Array `{field}` has {got} elements, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Bar {index} has no timestamp")]
    MissingTimestamp { index: usize },

    #[error("Unknown sensitivity: {0:?}")]
    UnknownSensitivity(String),

    #[error("Unknown pattern type: {0:?}")]
    UnknownPattern(String),
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
            return Err(PatternError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
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

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Bar count (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
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

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// PATTERN KIND
// ============================================================

/// Chart pattern selection
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    #[default]
    DoubleBottom,
    DoubleTop,
    HeadShoulders,
    #[serde(rename = "triangle")]
    AscendingTriangle,
}

impl PatternKind {
    pub const ALL: [PatternKind; 4] = [
        Self::DoubleBottom,
        Self::DoubleTop,
        Self::HeadShoulders,
        Self::AscendingTriangle,
    ];

    /// Position in [`PatternKind::ALL`]
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DoubleBottom => "double-bottom",
            Self::DoubleTop => "double-top",
            Self::HeadShoulders => "head-shoulders",
            Self::AscendingTriangle => "triangle",
        }
    }

    /// Display title for result headings
    pub fn title(self) -> &'static str {
        match self {
            Self::DoubleBottom => "Double Bottom",
            Self::DoubleTop => "Double Top",
            Self::HeadShoulders => "Head & Shoulders",
            Self::AscendingTriangle => "Triangle (Ascending)",
        }
    }

    /// Parse a pattern label, falling back to [`PatternKind::DoubleBottom`]
    /// for anything unrecognized.
    ///
    /// Use [`str::parse`] instead when unknown labels should be rejected.
    pub fn from_label_or_default(label: &str) -> Self {
        label.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "unknown pattern type {:?}, using {}",
                label,
                PatternKind::default()
            );
            PatternKind::default()
        })
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternKind {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PatternError::UnknownPattern(s.to_string()))
    }
}

// ============================================================
// PATTERN MATCH - detector output, by bar index
// ============================================================

/// Direction a confirmed pattern points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

/// A structural point of a match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub index: usize,
    pub price: f64,
    pub role: Role,
}

impl Pivot {
    #[inline]
    pub fn new(index: usize, price: f64, role: Role) -> Self {
        Self { index, price, role }
    }
}

/// Result of pattern detection. Pivots are in role order, which is not
/// necessarily index order (a head-and-shoulders neckline sits between the
/// shoulders but is listed after them).
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub kind: PatternKind,
    pub direction: Direction,
    pub pivots: Vec<Pivot>,
}

impl PatternMatch {
    pub fn start_index(&self) -> usize {
        self.pivots.iter().map(|p| p.index).min().unwrap_or(0)
    }

    /// Index of the confirming close
    pub fn end_index(&self) -> usize {
        self.pivots.iter().map(|p| p.index).max().unwrap_or(0)
    }

    pub fn pivot(&self, role: Role) -> Option<&Pivot> {
        self.pivots.iter().find(|p| p.role == role)
    }
}

// ============================================================
// PATTERN DETECTOR TRAIT
// ============================================================

/// A chart pattern detector.
///
/// `detect` returns at most one match, the first qualifying candidate in scan
/// order. It must return `None` (never panic) for series shorter than
/// `min_bars`.
pub trait PatternDetector: Send + Sync {
    fn kind(&self) -> PatternKind;
    fn min_bars(&self) -> usize;
    fn detect(
        &self,
        series: &OhlcvSeries,
        profile: &ToleranceProfile,
        trace: &mut DetectionTrace,
    ) -> Option<PatternMatch>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect(
                &self,
                series: &OhlcvSeries,
                profile: &ToleranceProfile,
                trace: &mut DetectionTrace,
            ) -> Option<PatternMatch> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, series, profile, trace)),*
                }
            }

            #[inline]
            pub fn kind(&self) -> PatternKind {
                match self {
                    $(Self::$variant(d) => PatternDetector::kind(d)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::min_bars(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    DoubleBottom(DoubleBottomDetector),
    DoubleTop(DoubleTopDetector),
    HeadShoulders(HeadShouldersDetector),
    AscendingTriangle(AscendingTriangleDetector),
}

impl BuiltinDetector {
    /// Default detector for a pattern kind
    pub fn for_kind(kind: PatternKind) -> Self {
        match kind {
            PatternKind::DoubleBottom => Self::DoubleBottom(Default::default()),
            PatternKind::DoubleTop => Self::DoubleTop(Default::default()),
            PatternKind::HeadShoulders => Self::HeadShoulders(Default::default()),
            PatternKind::AscendingTriangle => Self::AscendingTriangle(Default::default()),
        }
    }
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub time_format: TimeFormat,
    /// Check bars in [`PatternEngine::detect_checked`]
    pub validate_data: bool,
}

/// One detection call's inputs
#[derive(Debug, Clone, Copy)]
pub struct DetectionRequest<'a> {
    pub kind: PatternKind,
    pub sensitivity: Sensitivity,
    pub series: &'a OhlcvSeries,
}

/// Pattern detection orchestrator.
///
/// Holds no per-series state: every call resolves its own tolerance profile
/// and swing points, so one engine can serve many threads.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    /// One slot per kind, ordered like [`PatternKind::ALL`]
    detectors: [BuiltinDetector; 4],
    config: EngineConfig,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self {
            detectors: PatternKind::ALL.map(BuiltinDetector::for_kind),
            config: EngineConfig::default(),
        }
    }
}

impl PatternEngine {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Detector registered for `kind`
    pub fn detector(&self, kind: PatternKind) -> &BuiltinDetector {
        &self.detectors[kind.index()]
    }

    // ===========================================
    // LOW-LEVEL: index-based matches
    // ===========================================

    /// Run a detector with an explicit profile, recording into `trace`.
    pub fn detect_match(
        &self,
        kind: PatternKind,
        profile: &ToleranceProfile,
        series: &OhlcvSeries,
        trace: &mut DetectionTrace,
    ) -> Option<PatternMatch> {
        self.detector(kind).detect(series, profile, trace)
    }

    /// Landmarks for a match, ordered by bar index
    pub fn landmarks(&self, pattern: &PatternMatch, series: &OhlcvSeries) -> Vec<Landmark> {
        to_landmarks(pattern, series, &self.config.time_format)
    }

    // ===========================================
    // HIGH-LEVEL: landmark lists
    // ===========================================

    /// Detect `kind` at a named sensitivity. An empty list means no pattern
    /// was found, including when the series is too short.
    pub fn detect(
        &self,
        kind: PatternKind,
        sensitivity: Sensitivity,
        series: &OhlcvSeries,
    ) -> Vec<Landmark> {
        self.detect_with_profile(kind, &sensitivity.profile(), series)
    }

    /// Detect with a custom tolerance profile
    pub fn detect_with_profile(
        &self,
        kind: PatternKind,
        profile: &ToleranceProfile,
        series: &OhlcvSeries,
    ) -> Vec<Landmark> {
        let mut trace = DetectionTrace::new(kind);
        self.run(kind, profile, series, &mut trace)
    }

    /// Detect and also return the diagnostic trace, including every
    /// rejected candidate.
    pub fn detect_traced(
        &self,
        kind: PatternKind,
        sensitivity: Sensitivity,
        series: &OhlcvSeries,
    ) -> (Vec<Landmark>, DetectionTrace) {
        let mut trace = DetectionTrace::new(kind).with_rejections();
        let landmarks = self.run(kind, &sensitivity.profile(), series, &mut trace);
        (landmarks, trace)
    }

    /// Strict variant of [`detect`](Self::detect): reports a too-short series
    /// as [`PatternError::InsufficientData`] and, when `validate_data` is set,
    /// rejects malformed bars.
    pub fn detect_checked(
        &self,
        kind: PatternKind,
        sensitivity: Sensitivity,
        series: &OhlcvSeries,
    ) -> Result<Vec<Landmark>> {
        if self.config.validate_data {
            series.validate()?;
        }
        let mut trace = DetectionTrace::new(kind);
        let landmarks = self.run(kind, &sensitivity.profile(), series, &mut trace);
        match trace.insufficient_data {
            Some(short) => Err(PatternError::InsufficientData {
                need: short.need,
                got: short.got,
            }),
            None => Ok(landmarks),
        }
    }

    pub fn detect_request(&self, request: &DetectionRequest<'_>) -> Vec<Landmark> {
        self.detect(request.kind, request.sensitivity, request.series)
    }

    fn run(
        &self,
        kind: PatternKind,
        profile: &ToleranceProfile,
        series: &OhlcvSeries,
        trace: &mut DetectionTrace,
    ) -> Vec<Landmark> {
        self.detect_match(kind, profile, series, trace)
            .map(|m| self.landmarks(&m, series))
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        self.config.time_format.validate()?;
        for d in &self.detectors {
            d.validate_config()?;
        }
        Ok(())
    }
}

/// Detect with a default engine (UTC timestamps, no data validation)
pub fn detect_pattern(
    kind: PatternKind,
    sensitivity: Sensitivity,
    series: &OhlcvSeries,
) -> Vec<Landmark> {
    PatternEngine::default().detect(kind, sensitivity, series)
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    engine: PatternEngine,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.engine.config = config;
        self
    }

    pub fn time_format(mut self, format: TimeFormat) -> Self {
        self.engine.config.time_format = format;
        self
    }

    pub fn utc_offset_secs(mut self, offset: i32) -> Self {
        self.engine.config.time_format.utc_offset_secs = offset;
        self
    }

    pub fn time_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.engine.config.time_format.pattern = pattern.into();
        self
    }

    /// Enable/disable data validation in `detect_checked`
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.engine.config.validate_data = enable;
        self
    }

    /// Replace the detector for the detector's pattern kind
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        let index = detector.kind().index();
        self.engine.detectors[index] = detector;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<PatternEngine> {
        self.engine.validate()?;
        Ok(self.engine)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of scanning a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub kind: PatternKind,
    pub landmarks: Vec<Landmark>,
}

/// Error from scanning a single instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: PatternError,
}

/// Run independent detection requests in parallel.
///
/// Each request goes through [`PatternEngine::detect_checked`]; too-short or
/// (with `validate_data`) malformed series come back as [`ScanError`]s.
pub fn scan_parallel<'a, I>(engine: &PatternEngine, requests: I) -> (Vec<ScanResult>, Vec<ScanError>)
where
    I: IntoParallelIterator<Item = (&'a str, DetectionRequest<'a>)>,
{
    let results: Vec<_> = requests
        .into_par_iter()
        .map(|(symbol, request)| {
            engine
                .detect_checked(request.kind, request.sensitivity, request.series)
                .map(|landmarks| ScanResult {
                    symbol: symbol.to_string(),
                    kind: request.kind,
                    landmarks,
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
