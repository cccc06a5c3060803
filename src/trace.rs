//! Diagnostic trace of a single detection call
//!
//! A [`DetectionTrace`] is threaded through a detector and records what it saw:
//! the swing points, how many candidates were examined and how many were turned
//! down for each reason. The per-candidate [`Rejection`] list grows with the
//! number of candidate pairs, so it is only kept after
//! [`DetectionTrace::with_rejections`]. Detection results stay identical either
//! way.

use crate::{detectors::swing::SwingPoints, PatternKind};

/// Why a candidate was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Paired swing points closer than `min_separation`
    TooClose,
    /// Paired prices differ by more than `price_tolerance`
    PriceMismatch,
    /// No opposite swing point between the pair
    NoNecklineCandidate,
    /// Neckline does not clear the paired prices by `neckline_offset`
    NecklineTooShallow,
    /// No close crossed the neckline/resistance afterwards
    NoConfirmation,
    /// Middle peak not strictly above both shoulders
    HeadNotHighest,
    /// Recent swing lows not strictly rising
    LowsNotAscending,
    /// Recent swing highs not within `price_tolerance`
    HighsNotFlat,
    /// Fewer swing points than the pattern needs
    TooFewSwings,
}

impl RejectReason {
    pub const COUNT: usize = 9;
}

/// A rejected candidate, identified by the first and last bar it spans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub first: usize,
    pub last: usize,
    pub reason: RejectReason,
}

/// Series was shorter than the detector's minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientData {
    pub need: usize,
    pub got: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionTrace {
    pub kind: Option<PatternKind>,
    pub swings: SwingPoints,
    pub candidates_examined: usize,
    /// Every rejected candidate. Empty unless built with `with_rejections`.
    pub rejections: Vec<Rejection>,
    rejected_by_reason: [usize; RejectReason::COUNT],
    keep_rejections: bool,
    pub insufficient_data: Option<InsufficientData>,
    /// Bar index of the confirming close, when a pattern matched
    pub confirmed_at: Option<usize>,
}

impl DetectionTrace {
    pub fn new(kind: PatternKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Also keep one [`Rejection`] per rejected candidate
    pub fn with_rejections(mut self) -> Self {
        self.keep_rejections = true;
        self
    }

    /// Returns false, and records why, when `got` bars are fewer than `need`
    pub(crate) fn require_bars(&mut self, need: usize, got: usize) -> bool {
        if got >= need {
            return true;
        }
        tracing::debug!(
            "[{}] insufficient data: need {} bars, got {}",
            self.label(),
            need,
            got
        );
        self.insufficient_data = Some(InsufficientData { need, got });
        false
    }

    pub(crate) fn record_swings(&mut self, swings: &SwingPoints) {
        tracing::debug!(
            "[{}] swing highs {:?}, swing lows {:?} (depth {})",
            self.label(),
            swings.highs,
            swings.lows,
            swings.depth
        );
        self.swings = swings.clone();
    }

    #[inline]
    pub(crate) fn examine(&mut self) {
        self.candidates_examined += 1;
    }

    pub(crate) fn reject(&mut self, first: usize, last: usize, reason: RejectReason) {
        tracing::trace!(
            "[{}] candidate {}..={} rejected: {:?}",
            self.label(),
            first,
            last,
            reason
        );
        self.rejected_by_reason[reason as usize] += 1;
        if self.keep_rejections {
            self.rejections.push(Rejection {
                first,
                last,
                reason,
            });
        }
    }

    pub(crate) fn confirm(&mut self, index: usize) {
        self.confirmed_at = Some(index);
    }

    /// Number of rejections with the given reason
    pub fn count(&self, reason: RejectReason) -> usize {
        self.rejected_by_reason[reason as usize]
    }

    pub fn matched(&self) -> bool {
        self.confirmed_at.is_some()
    }

    fn label(&self) -> &'static str {
        self.kind.map_or("detector", PatternKind::as_str)
    }
}
