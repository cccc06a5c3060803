//! Swing point (pivot) extraction

use crate::series::OhlcvSeries;

/// Which swing list a detector reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingSide {
    Highs,
    Lows,
}

impl SwingSide {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Self::Highs => Self::Lows,
            Self::Lows => Self::Highs,
        }
    }

    /// Price array this side is measured on
    #[inline]
    pub fn prices(self, series: &OhlcvSeries) -> &[f64] {
        match self {
            Self::Highs => series.highs(),
            Self::Lows => series.lows(),
        }
    }

    /// True if `a` is strictly further out than `b` on this side
    #[inline]
    pub fn beats(self, a: f64, b: f64) -> bool {
        match self {
            Self::Highs => a > b,
            Self::Lows => a < b,
        }
    }
}

/// Swing highs and lows of a series, as strictly increasing bar indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwingPoints {
    pub depth: usize,
    pub highs: Vec<usize>,
    pub lows: Vec<usize>,
}

impl SwingPoints {
    /// Scan for local extrema over `depth` bars on each side.
    ///
    /// A bar is a swing high unless some neighbour within `depth` has a
    /// strictly greater high, so ties qualify. Swing lows mirror this on `low`.
    /// Bars closer than `depth` to either end are never pivots.
    pub fn extract(high: &[f64], low: &[f64], depth: usize) -> Self {
        let len = high.len().min(low.len());
        let mut swings = Self {
            depth,
            highs: Vec::new(),
            lows: Vec::new(),
        };
        if len < 2 * depth + 1 {
            return swings;
        }

        for i in depth..len - depth {
            let mut is_high = true;
            let mut is_low = true;
            for d in 1..=depth {
                if high[i] < high[i - d] || high[i] < high[i + d] {
                    is_high = false;
                }
                if low[i] > low[i - d] || low[i] > low[i + d] {
                    is_low = false;
                }
            }
            if is_high {
                swings.highs.push(i);
            }
            if is_low {
                swings.lows.push(i);
            }
        }

        swings
    }

    #[inline]
    pub fn from_series(series: &OhlcvSeries, depth: usize) -> Self {
        Self::extract(series.highs(), series.lows(), depth)
    }

    #[inline]
    pub fn side(&self, side: SwingSide) -> &[usize] {
        match side {
            SwingSide::Highs => &self.highs,
            SwingSide::Lows => &self.lows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_peak_and_trough() {
        let high = [1.0, 2.0, 5.0, 2.0, 1.0, 0.5, 1.0];
        let low = [0.5, 1.5, 4.0, 1.5, 0.5, 0.1, 0.5];
        let swings = SwingPoints::extract(&high, &low, 1);
        assert_eq!(swings.highs, vec![2]);
        assert_eq!(swings.lows, vec![5]);
    }

    #[test]
    fn test_ties_count_as_swings() {
        let high = [1.0, 3.0, 3.0, 1.0, 1.0];
        let low = [0.0; 5];
        let swings = SwingPoints::extract(&high, &low, 1);
        assert_eq!(swings.highs, vec![1, 2]);
        // flat lows: every interior bar qualifies
        assert_eq!(swings.lows, vec![1, 2, 3]);
    }

    #[test]
    fn test_depth_window() {
        // Bar 3 is a depth-1 peak but bar 1 beats it within two bars
        let high = [1.0, 6.0, 2.0, 3.0, 2.0, 1.0, 0.0];
        let low = high.map(|h| h - 0.5);
        assert!(SwingPoints::extract(&high, &low, 1).highs.contains(&3));
        assert!(!SwingPoints::extract(&high, &low, 2).highs.contains(&3));
    }

    #[test]
    fn test_short_series_is_empty() {
        let high = [1.0, 2.0, 1.0, 2.0];
        let swings = SwingPoints::extract(&high, &high, 2);
        assert!(swings.highs.is_empty());
        assert!(swings.lows.is_empty());
        assert_eq!(swings.depth, 2);

        let empty = SwingPoints::extract(&[], &[], 1);
        assert_eq!(empty, SwingPoints { depth: 1, ..Default::default() });
    }

    #[test]
    fn test_indices_strictly_increasing() {
        let high: Vec<f64> = (0..60).map(|i| ((i as f64) * 0.7).sin() * 10.0 + 100.0).collect();
        let low: Vec<f64> = high.iter().map(|h| h - 2.0).collect();
        let swings = SwingPoints::extract(&high, &low, 2);
        assert!(!swings.highs.is_empty());
        assert!(swings.highs.windows(2).all(|w| w[0] < w[1]));
        assert!(swings.lows.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_side_helpers() {
        assert_eq!(SwingSide::Highs.opposite(), SwingSide::Lows);
        assert!(SwingSide::Highs.beats(2.0, 1.0));
        assert!(SwingSide::Lows.beats(1.0, 2.0));
        assert!(!SwingSide::Lows.beats(1.0, 1.0));
    }
}
