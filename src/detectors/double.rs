//! Double bottom and double top
//!
//! Both patterns are the same search run on opposite sides of the series: two
//! near-equal swing extremes, an opposite swing between them forming the
//! neckline, and a later close through that neckline. [`PivotPairScanner`]
//! implements the search once; a [`PairStrategy`] record picks the side,
//! direction and labels.

use super::{
    helpers::{first_close_beyond, most_extreme, relative_diff, Breach},
    swing::{SwingPoints, SwingSide},
};
use crate::{
    landmark::Role, params::ToleranceProfile, series::OhlcvSeries, trace::DetectionTrace,
    trace::RejectReason, Direction, PatternDetector, PatternKind, PatternMatch, Pivot,
};

impl_with_defaults!(DoubleBottomDetector, DoubleTopDetector);

/// Bars required before a double bottom/top is considered
pub const DOUBLE_MIN_BARS: usize = 20;

// ============================================================
// STRATEGY
// ============================================================

/// Per-pattern configuration of the pivot-pair scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairStrategy {
    pub kind: PatternKind,
    pub direction: Direction,
    /// Swing side carrying the two paired extremes
    pub extremes: SwingSide,
    /// Labels for first extreme, neckline, second extreme, confirmation
    pub roles: [Role; 4],
}

impl PairStrategy {
    pub const DOUBLE_BOTTOM: Self = Self {
        kind: PatternKind::DoubleBottom,
        direction: Direction::Bullish,
        extremes: SwingSide::Lows,
        roles: [
            Role::FirstBottom,
            Role::Neckline,
            Role::SecondBottom,
            Role::Breakout,
        ],
    };

    pub const DOUBLE_TOP: Self = Self {
        kind: PatternKind::DoubleTop,
        direction: Direction::Bearish,
        extremes: SwingSide::Highs,
        roles: [
            Role::FirstTop,
            Role::Neckline,
            Role::SecondTop,
            Role::Breakdown,
        ],
    };

    /// Side the neckline is taken from
    #[inline]
    pub fn neckline_side(&self) -> SwingSide {
        self.extremes.opposite()
    }

    /// The neckline must sit beyond both extremes by `offset`: above the higher
    /// bottom, or below the lower top.
    pub fn neckline_clears(&self, neckline: f64, p1: f64, p2: f64, offset: f64) -> bool {
        match self.extremes {
            SwingSide::Lows => neckline >= p1.max(p2) * (1.0 + offset),
            SwingSide::Highs => neckline <= p1.min(p2) * (1.0 - offset),
        }
    }

    #[inline]
    pub fn breach(&self) -> Breach {
        match self.extremes {
            SwingSide::Lows => Breach::Above,
            SwingSide::Highs => Breach::Below,
        }
    }
}

// ============================================================
// SCANNER
// ============================================================

/// Exhaustive pair search over swing extremes; the first confirmed pair wins.
#[derive(Debug, Clone)]
pub struct PivotPairScanner {
    pub strategy: PairStrategy,
}

impl PivotPairScanner {
    pub const fn new(strategy: PairStrategy) -> Self {
        Self { strategy }
    }

    pub fn scan(
        &self,
        series: &OhlcvSeries,
        profile: &ToleranceProfile,
        trace: &mut DetectionTrace,
    ) -> Option<PatternMatch> {
        if !trace.require_bars(DOUBLE_MIN_BARS, series.len()) {
            return None;
        }

        let strategy = &self.strategy;
        let swings = SwingPoints::from_series(series, profile.pivot_depth.get());
        trace.record_swings(&swings);

        let pivots = swings.side(strategy.extremes);
        let neck_pivots = swings.side(strategy.neckline_side());
        let prices = strategy.extremes.prices(series);
        let neck_prices = strategy.neckline_side().prices(series);
        let closes = series.closes();

        let min_separation = profile.min_separation.get();
        let tolerance = profile.price_tolerance.get();
        let offset = profile.neckline_offset.get();

        for (i, &idx1) in pivots.iter().enumerate() {
            for &idx2 in &pivots[i + 1..] {
                trace.examine();

                if idx2 - idx1 < min_separation {
                    trace.reject(idx1, idx2, RejectReason::TooClose);
                    continue;
                }

                let (p1, p2) = (prices[idx1], prices[idx2]);
                if relative_diff(p1, p2) > tolerance {
                    trace.reject(idx1, idx2, RejectReason::PriceMismatch);
                    continue;
                }

                let between = neck_pivots
                    .iter()
                    .copied()
                    .filter(|&k| k > idx1 && k < idx2);
                let Some(neck_idx) = most_extreme(between, neck_prices, strategy.neckline_side())
                else {
                    trace.reject(idx1, idx2, RejectReason::NoNecklineCandidate);
                    continue;
                };

                let neckline = neck_prices[neck_idx];
                if !strategy.neckline_clears(neckline, p1, p2, offset) {
                    trace.reject(idx1, idx2, RejectReason::NecklineTooShallow);
                    continue;
                }

                let Some(confirm_idx) =
                    first_close_beyond(closes, idx2 + 1, neckline, strategy.breach())
                else {
                    trace.reject(idx1, idx2, RejectReason::NoConfirmation);
                    continue;
                };

                tracing::debug!(
                    "[{}] candidate {} @ {}, neckline {} @ {}, {} @ {}, confirmed {} @ {}",
                    strategy.kind,
                    idx1,
                    p1,
                    neck_idx,
                    neckline,
                    idx2,
                    p2,
                    confirm_idx,
                    closes[confirm_idx]
                );
                trace.confirm(confirm_idx);

                let [first, neck, second, confirm] = strategy.roles;
                return Some(PatternMatch {
                    kind: strategy.kind,
                    direction: strategy.direction,
                    pivots: vec![
                        Pivot::new(idx1, p1, first),
                        Pivot::new(neck_idx, neckline, neck),
                        Pivot::new(idx2, p2, second),
                        Pivot::new(confirm_idx, closes[confirm_idx], confirm),
                    ],
                });
            }
        }

        None
    }
}

// ============================================================
// DOUBLE BOTTOM
// ============================================================

/// Two near-equal swing lows, neckline at the highest swing high between them,
/// confirmed by a close above the neckline.
#[derive(Debug, Clone)]
pub struct DoubleBottomDetector {
    scanner: PivotPairScanner,
}

impl Default for DoubleBottomDetector {
    fn default() -> Self {
        Self {
            scanner: PivotPairScanner::new(PairStrategy::DOUBLE_BOTTOM),
        }
    }
}

impl PatternDetector for DoubleBottomDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::DoubleBottom
    }

    fn min_bars(&self) -> usize {
        DOUBLE_MIN_BARS
    }

    fn detect(
        &self,
        series: &OhlcvSeries,
        profile: &ToleranceProfile,
        trace: &mut DetectionTrace,
    ) -> Option<PatternMatch> {
        self.scanner.scan(series, profile, trace)
    }
}

// ============================================================
// DOUBLE TOP
// ============================================================

/// Two near-equal swing highs, neckline at the lowest swing low between them,
/// confirmed by a close below the neckline.
#[derive(Debug, Clone)]
pub struct DoubleTopDetector {
    scanner: PivotPairScanner,
}

impl Default for DoubleTopDetector {
    fn default() -> Self {
        Self {
            scanner: PivotPairScanner::new(PairStrategy::DOUBLE_TOP),
        }
    }
}

impl PatternDetector for DoubleTopDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::DoubleTop
    }

    fn min_bars(&self) -> usize {
        DOUBLE_MIN_BARS
    }

    fn detect(
        &self,
        series: &OhlcvSeries,
        profile: &ToleranceProfile,
        trace: &mut DetectionTrace,
    ) -> Option<PatternMatch> {
        self.scanner.scan(series, profile, trace)
    }
}
