//! Common helpers shared by the chart pattern detectors

use super::swing::SwingSide;

/// Direction a confirming close must cross a level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breach {
    Above,
    Below,
}

/// Relative difference of two prices against their mean
#[inline]
pub fn relative_diff(a: f64, b: f64) -> f64 {
    (a - b).abs() / ((a + b) / 2.0)
}

/// First bar at or after `from` whose close strictly crosses `level`
pub fn first_close_beyond(closes: &[f64], from: usize, level: f64, breach: Breach) -> Option<usize> {
    closes
        .iter()
        .enumerate()
        .skip(from)
        .find(|&(_, &c)| match breach {
            Breach::Above => c > level,
            Breach::Below => c < level,
        })
        .map(|(i, _)| i)
}

/// Index whose price is furthest out on `side` (highest for highs, lowest for
/// lows). The earliest index wins ties.
pub fn most_extreme<I>(indices: I, prices: &[f64], side: SwingSide) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    indices.into_iter().fold(None, |best, i| match best {
        Some(b) if !side.beats(prices[i], prices[b]) => Some(b),
        _ => Some(i),
    })
}

/// Last `n` elements of a slice (all of it when shorter)
#[inline]
pub fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_diff() {
        assert_eq!(relative_diff(100.0, 100.0), 0.0);
        assert!((relative_diff(99.0, 101.0) - 0.02).abs() < 1e-12);
        assert_eq!(relative_diff(101.0, 99.0), relative_diff(99.0, 101.0));
    }

    #[test]
    fn test_first_close_beyond() {
        let closes = [1.0, 5.0, 2.0, 6.0, 0.5];
        assert_eq!(first_close_beyond(&closes, 0, 4.0, Breach::Above), Some(1));
        assert_eq!(first_close_beyond(&closes, 2, 4.0, Breach::Above), Some(3));
        assert_eq!(first_close_beyond(&closes, 2, 1.0, Breach::Below), Some(4));
        // strict crossing
        assert_eq!(first_close_beyond(&closes, 0, 6.0, Breach::Above), None);
        assert_eq!(first_close_beyond(&closes, 10, 0.0, Breach::Above), None);
    }

    #[test]
    fn test_most_extreme_first_wins() {
        let prices = [3.0, 7.0, 7.0, 1.0, 1.0];
        assert_eq!(most_extreme([0, 1, 2], &prices, SwingSide::Highs), Some(1));
        assert_eq!(most_extreme(0..5, &prices, SwingSide::Lows), Some(3));
        assert_eq!(most_extreme(std::iter::empty(), &prices, SwingSide::Lows), None);
    }

    #[test]
    fn test_tail() {
        let v = [1, 2, 3, 4, 5];
        assert_eq!(tail(&v, 3), &[3, 4, 5]);
        assert_eq!(tail(&v[..2], 3), &[1, 2]);
    }
}
