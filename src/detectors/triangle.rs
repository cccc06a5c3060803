//! Ascending triangle
//!
//! Only the most recent swing window is evaluated. Earlier triangles that have
//! been pushed out of the window by newer swings are not searched for.

use super::{
    helpers::{first_close_beyond, relative_diff, tail, Breach},
    swing::SwingPoints,
};
use crate::{
    landmark::Role, params::ToleranceProfile, series::OhlcvSeries, trace::DetectionTrace,
    trace::RejectReason, Direction, PatternDetector, PatternError, PatternKind, PatternMatch,
    Period, Pivot, Result,
};

impl_with_defaults!(AscendingTriangleDetector);

/// Rising swing lows under a flat run of swing highs, confirmed by a close
/// above the resistance plus `neckline_offset`.
#[derive(Debug, Clone)]
pub struct AscendingTriangleDetector {
    /// Swing window half-width. Independent of sensitivity.
    pub depth: Period,
    /// How many of the latest swing lows/highs form the window
    pub recent: Period,
    pub min_bars: usize,
}

impl Default for AscendingTriangleDetector {
    fn default() -> Self {
        Self {
            depth: Period::new_const(2),
            recent: Period::new_const(3),
            min_bars: 20,
        }
    }
}

impl PatternDetector for AscendingTriangleDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::AscendingTriangle
    }

    fn min_bars(&self) -> usize {
        self.min_bars
    }

    fn detect(
        &self,
        series: &OhlcvSeries,
        profile: &ToleranceProfile,
        trace: &mut DetectionTrace,
    ) -> Option<PatternMatch> {
        if !trace.require_bars(self.min_bars, series.len()) {
            return None;
        }

        let swings = SwingPoints::from_series(series, self.depth.get());
        trace.record_swings(&swings);

        if swings.lows.len() < 2 || swings.highs.len() < 2 {
            trace.reject(0, series.len().saturating_sub(1), RejectReason::TooFewSwings);
            return None;
        }

        let (h, l, c) = (series.highs(), series.lows(), series.closes());
        let lows = tail(&swings.lows, self.recent.get());
        let highs = tail(&swings.highs, self.recent.get());
        let first = lows[0].min(highs[0]);
        let last = lows[lows.len() - 1].max(highs[highs.len() - 1]);
        trace.examine();

        if lows.windows(2).any(|w| l[w[1]] <= l[w[0]]) {
            trace.reject(first, last, RejectReason::LowsNotAscending);
            return None;
        }

        let resistance = h[highs[highs.len() - 1]];
        if relative_diff(h[highs[0]], resistance) > profile.price_tolerance.get() {
            trace.reject(first, last, RejectReason::HighsNotFlat);
            return None;
        }

        // swing indices are ascending, so the last high is the latest one
        let level = resistance * (1.0 + profile.neckline_offset.get());
        let Some(breakout) = first_close_beyond(c, highs[highs.len() - 1] + 1, level, Breach::Above)
        else {
            trace.reject(first, last, RejectReason::NoConfirmation);
            return None;
        };

        tracing::debug!(
            "[{}] support lows {:?}, resistance {} from highs {:?}, breakout {} @ {}",
            PatternKind::AscendingTriangle,
            lows,
            resistance,
            highs,
            breakout,
            c[breakout]
        );
        trace.confirm(breakout);

        let pivots = lows
            .iter()
            .map(|&i| Pivot::new(i, l[i], Role::SupportLow))
            .chain(highs.iter().map(|&i| Pivot::new(i, h[i], Role::ResistanceHigh)))
            .chain(std::iter::once(Pivot::new(breakout, c[breakout], Role::Breakout)))
            .collect();

        Some(PatternMatch {
            kind: PatternKind::AscendingTriangle,
            direction: Direction::Bullish,
            pivots,
        })
    }

    fn validate_config(&self) -> Result<()> {
        if self.recent.get() < 2 {
            return Err(PatternError::InvalidConfig(
                "triangle window needs at least 2 swings per side".to_string(),
            ));
        }
        if self.min_bars < 2 * self.depth.get() + 1 {
            return Err(PatternError::InvalidConfig(format!(
                "min_bars {} cannot hold a swing window of depth {}",
                self.min_bars,
                self.depth.get()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_from(path: &[f64]) -> OhlcvSeries {
        OhlcvSeries::new(
            (0..path.len() as i64).map(|i| i * 900).collect(),
            path.to_vec(),
            path.iter().map(|p| p + 1.0).collect(),
            path.iter().map(|p| p - 1.0).collect(),
            path.to_vec(),
            None,
        )
        .unwrap()
    }

    fn triangle_path() -> Vec<f64> {
        vec![
            105.0, 107.0, 109.0, 107.0, 104.0, 101.0, 104.0, 107.0, 109.0, 107.0, 105.0, 104.0,
            106.0, 108.0, 109.0, 108.0, 107.0, 108.0, 110.0, 112.0, 114.0, 116.0, 117.0,
        ]
    }

    #[test]
    fn test_ascending_triangle() {
        let series = series_from(&triangle_path());
        let mut trace = DetectionTrace::default();
        let m = AscendingTriangleDetector::with_defaults()
            .detect(&series, &ToleranceProfile::MODERATE, &mut trace)
            .unwrap();

        let got: Vec<(usize, Role)> = m.pivots.iter().map(|p| (p.index, p.role)).collect();
        assert_eq!(
            got,
            vec![
                (5, Role::SupportLow),
                (11, Role::SupportLow),
                (16, Role::SupportLow),
                (2, Role::ResistanceHigh),
                (8, Role::ResistanceHigh),
                (14, Role::ResistanceHigh),
                (19, Role::Breakout),
            ]
        );
        assert_eq!(m.direction, Direction::Bullish);
    }

    #[test]
    fn test_falling_lows_fail() {
        let mut path = triangle_path();
        path[16] = 102.0;
        path[15] = 105.0;
        path[17] = 105.0;
        let series = series_from(&path);
        let mut trace = DetectionTrace::default();
        assert!(AscendingTriangleDetector::with_defaults()
            .detect(&series, &ToleranceProfile::LOOSE, &mut trace)
            .is_none());
        assert_eq!(trace.count(RejectReason::LowsNotAscending), 1);
    }

    #[test]
    fn test_sloped_highs_fail() {
        let mut path = triangle_path();
        // last peak 20% above the first
        path[13] = 125.0;
        path[14] = 131.0;
        path[15] = 120.0;
        let series = series_from(&path);
        let mut trace = DetectionTrace::default();
        assert!(AscendingTriangleDetector::with_defaults()
            .detect(&series, &ToleranceProfile::LOOSE, &mut trace)
            .is_none());
        assert_eq!(trace.count(RejectReason::HighsNotFlat), 1);
    }

    #[test]
    fn test_breakout_needs_offset() {
        let mut path = triangle_path();
        path.truncate(18);
        path.extend([109.5, 110.1, 110.2, 110.3, 110.4]);
        let series = series_from(&path);
        let detector = AscendingTriangleDetector::with_defaults();

        // resistance 110: strict needs > 110.11, moderate > 110.33, loose > 110.55
        let breakout = |profile: &ToleranceProfile| {
            let mut trace = DetectionTrace::default();
            detector
                .detect(&series, profile, &mut trace)
                .and_then(|m| m.pivot(Role::Breakout).map(|p| p.index))
        };
        assert_eq!(breakout(&ToleranceProfile::STRICT), Some(20));
        assert_eq!(breakout(&ToleranceProfile::MODERATE), Some(22));

        let mut trace = DetectionTrace::default();
        assert!(detector
            .detect(&series, &ToleranceProfile::LOOSE, &mut trace)
            .is_none());
        assert_eq!(trace.count(RejectReason::NoConfirmation), 1);
    }

    #[test]
    fn test_too_few_swings() {
        let path: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let series = series_from(&path);
        let mut trace = DetectionTrace::default();
        assert!(AscendingTriangleDetector::with_defaults()
            .detect(&series, &ToleranceProfile::LOOSE, &mut trace)
            .is_none());
        assert_eq!(trace.count(RejectReason::TooFewSwings), 1);
    }

    #[test]
    fn test_validate_config() {
        let bad = AscendingTriangleDetector {
            recent: Period::new(1).unwrap(),
            ..Default::default()
        };
        assert!(bad.validate_config().is_err());
        assert!(AscendingTriangleDetector::default().validate_config().is_ok());

        let no_minimum = AscendingTriangleDetector {
            min_bars: 0,
            ..Default::default()
        };
        assert!(no_minimum.validate_config().is_err());
        let smallest = AscendingTriangleDetector {
            min_bars: 5,
            ..Default::default()
        };
        assert!(smallest.validate_config().is_ok());
    }

    #[test]
    fn test_empty_series_without_minimum() {
        let detector = AscendingTriangleDetector {
            min_bars: 0,
            ..Default::default()
        };
        let series = series_from(&[]);
        let mut trace = DetectionTrace::default();
        assert!(detector
            .detect(&series, &ToleranceProfile::MODERATE, &mut trace)
            .is_none());
        assert_eq!(trace.count(RejectReason::TooFewSwings), 1);
    }
}
