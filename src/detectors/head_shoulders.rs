//! Head-and-shoulders top

use super::{
    helpers::{first_close_beyond, most_extreme, relative_diff, Breach},
    swing::{SwingPoints, SwingSide},
};
use crate::{
    landmark::Role, params::ToleranceProfile, series::OhlcvSeries, trace::DetectionTrace,
    trace::RejectReason, Direction, PatternDetector, PatternError, PatternKind, PatternMatch,
    Period, Pivot, Result,
};

impl_with_defaults!(HeadShouldersDetector);

/// Three consecutive swing highs with the middle one highest and the outer two
/// near-equal. The neckline is the lowest low of any bar from the left to the
/// right shoulder; a close below it confirms.
#[derive(Debug, Clone)]
pub struct HeadShouldersDetector {
    /// Swing window half-width. Independent of sensitivity.
    pub depth: Period,
    pub min_bars: usize,
}

impl Default for HeadShouldersDetector {
    fn default() -> Self {
        Self {
            depth: Period::new_const(3),
            min_bars: 30,
        }
    }
}

impl PatternDetector for HeadShouldersDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::HeadShoulders
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

        let (h, l, c) = (series.highs(), series.lows(), series.closes());
        let tolerance = profile.price_tolerance.get();

        for triple in swings.highs.windows(3) {
            let &[ls, head, rs] = triple else {
                continue;
            };
            trace.examine();

            let (left, top, right) = (h[ls], h[head], h[rs]);
            if top <= left || top <= right {
                trace.reject(ls, rs, RejectReason::HeadNotHighest);
                continue;
            }

            if relative_diff(left, right) > tolerance {
                trace.reject(ls, rs, RejectReason::PriceMismatch);
                continue;
            }

            // ls..=rs is never empty, so a minimum always exists
            let neck_idx = most_extreme(ls..=rs, l, SwingSide::Lows)?;
            let neckline = l[neck_idx];

            let Some(breakdown) = first_close_beyond(c, rs + 1, neckline, Breach::Below) else {
                trace.reject(ls, rs, RejectReason::NoConfirmation);
                continue;
            };

            tracing::debug!(
                "[{}] shoulders {} @ {} / {} @ {}, head {} @ {}, neckline {} @ {}, breakdown {} @ {}",
                PatternKind::HeadShoulders,
                ls,
                left,
                rs,
                right,
                head,
                top,
                neck_idx,
                neckline,
                breakdown,
                c[breakdown]
            );
            trace.confirm(breakdown);

            return Some(PatternMatch {
                kind: PatternKind::HeadShoulders,
                direction: Direction::Bearish,
                pivots: vec![
                    Pivot::new(ls, left, Role::LeftShoulder),
                    Pivot::new(head, top, Role::Head),
                    Pivot::new(rs, right, Role::RightShoulder),
                    Pivot::new(neck_idx, neckline, Role::Neckline),
                    Pivot::new(breakdown, c[breakdown], Role::Breakdown),
                ],
            });
        }

        None
    }

    fn validate_config(&self) -> Result<()> {
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
