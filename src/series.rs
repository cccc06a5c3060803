//! OHLCV input model
//!
//! Detectors read a series as five index-aligned arrays (`t`, `o`, `h`, `l`, `c`)
//! plus an optional volume array. [`OhlcvSeries`] owns those arrays and is the
//! shape callers deserialize from their chart-data feed.

use serde::Deserialize;

use crate::{PatternError, Result};

// ============================================================
// OHLCV TRAIT
// ============================================================

/// Core OHLCV data trait, for callers that keep their own bar type
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    fn volume(&self) -> Option<f64> {
        None
    }

    /// Unix epoch seconds
    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// A single bar borrowed out of an [`OhlcvSeries`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub t: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: Option<f64>,
}

impl OHLCV for Bar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn volume(&self) -> Option<f64> {
        self.v
    }

    fn timestamp(&self) -> Option<i64> {
        Some(self.t)
    }
}

impl Bar {
    /// Validate OHLC consistency of a single bar
    fn validate(&self) -> std::result::Result<(), &'static str> {
        let prices = [self.o, self.h, self.l, self.c];
        if prices.iter().any(|p| p.is_nan()) {
            return Err("NaN in OHLC");
        }
        if prices.iter().any(|p| p.is_infinite()) {
            return Err("Infinite value in OHLC");
        }
        if self.h < self.l {
            return Err("high < low");
        }
        if self.h < self.o.max(self.c) {
            return Err("high below open/close");
        }
        if self.l > self.o.min(self.c) {
            return Err("low above open/close");
        }
        Ok(())
    }
}

// ============================================================
// SERIES
// ============================================================

/// Index-aligned OHLCV arrays for a single instrument and timeframe
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct OhlcvSeries {
    t: Vec<i64>,
    o: Vec<f64>,
    h: Vec<f64>,
    l: Vec<f64>,
    c: Vec<f64>,
    v: Option<Vec<f64>>,
}

#[derive(Deserialize)]
struct RawSeries {
    t: Vec<i64>,
    o: Vec<f64>,
    h: Vec<f64>,
    l: Vec<f64>,
    c: Vec<f64>,
    #[serde(default)]
    v: Option<Vec<f64>>,
}

impl TryFrom<RawSeries> for OhlcvSeries {
    type Error = PatternError;

    fn try_from(raw: RawSeries) -> Result<Self> {
        OhlcvSeries::new(raw.t, raw.o, raw.h, raw.l, raw.c, raw.v)
    }
}

impl OhlcvSeries {
    /// Create a series, checking that every array has the same length
    pub fn new(
        t: Vec<i64>,
        o: Vec<f64>,
        h: Vec<f64>,
        l: Vec<f64>,
        c: Vec<f64>,
        v: Option<Vec<f64>>,
    ) -> Result<Self> {
        let expected = t.len();
        let lengths = [
            ("o", o.len()),
            ("h", h.len()),
            ("l", l.len()),
            ("c", c.len()),
            ("v", v.as_ref().map_or(expected, Vec::len)),
        ];
        if let Some((field, got)) = lengths.into_iter().find(|(_, len)| *len != expected) {
            return Err(PatternError::LengthMismatch {
                field,
                expected,
                got,
            });
        }
        Ok(Self { t, o, h, l, c, v })
    }

    /// Build a series from any bar type. Every bar must carry a timestamp.
    pub fn from_bars<T: OHLCV>(bars: &[T]) -> Result<Self> {
        let n = bars.len();
        let mut t = Vec::with_capacity(n);
        let mut o = Vec::with_capacity(n);
        let mut h = Vec::with_capacity(n);
        let mut l = Vec::with_capacity(n);
        let mut c = Vec::with_capacity(n);
        let mut v = Vec::with_capacity(n);
        let mut has_volume = true;

        for (index, bar) in bars.iter().enumerate() {
            t.push(
                bar.timestamp()
                    .ok_or(PatternError::MissingTimestamp { index })?,
            );
            o.push(bar.open());
            h.push(bar.high());
            l.push(bar.low());
            c.push(bar.close());
            match bar.volume() {
                Some(vol) => v.push(vol),
                None => has_volume = false,
            }
        }

        Self::new(t, o, h, l, c, has_volume.then_some(v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.t.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    #[inline]
    pub fn timestamps(&self) -> &[i64] {
        &self.t
    }

    #[inline]
    pub fn opens(&self) -> &[f64] {
        &self.o
    }

    #[inline]
    pub fn highs(&self) -> &[f64] {
        &self.h
    }

    #[inline]
    pub fn lows(&self) -> &[f64] {
        &self.l
    }

    #[inline]
    pub fn closes(&self) -> &[f64] {
        &self.c
    }

    #[inline]
    pub fn volumes(&self) -> Option<&[f64]> {
        self.v.as_deref()
    }

    /// Bar at `index`, or `None` past the end
    pub fn bar(&self, index: usize) -> Option<Bar> {
        Some(Bar {
            t: *self.t.get(index)?,
            o: self.o[index],
            h: self.h[index],
            l: self.l[index],
            c: self.c[index],
            v: self.v.as_ref().map(|v| v[index]),
        })
    }

    pub fn bars(&self) -> impl Iterator<Item = Bar> + '_ {
        (0..self.len()).filter_map(|i| self.bar(i))
    }

    /// Opt-in data checks: finite prices, consistent OHLC, ascending timestamps.
    /// Detection never calls this on its own.
    pub fn validate(&self) -> Result<()> {
        for (index, bar) in self.bars().enumerate() {
            bar.validate()
                .map_err(|reason| PatternError::InvalidOHLCV { index, reason })?;
        }
        if let Some(index) = self.t.windows(2).position(|w| w[1] <= w[0]) {
            return Err(PatternError::InvalidOHLCV {
                index: index + 1,
                reason: "timestamps not strictly ascending",
            });
        }
        Ok(())
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Candle {
        ts: Option<i64>,
        price: f64,
    }

    impl OHLCV for Candle {
        fn open(&self) -> f64 {
            self.price
        }

        fn high(&self) -> f64 {
            self.price + 1.0
        }

        fn low(&self) -> f64 {
            self.price - 1.0
        }

        fn close(&self) -> f64 {
            self.price
        }

        fn timestamp(&self) -> Option<i64> {
            self.ts
        }
    }

    fn flat(n: usize) -> OhlcvSeries {
        OhlcvSeries::new(
            (0..n as i64).map(|i| 1_700_000_000 + i * 60).collect(),
            vec![100.0; n],
            vec![101.0; n],
            vec![99.0; n],
            vec![100.0; n],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_length_mismatch() {
        let err = OhlcvSeries::new(
            vec![1, 2, 3],
            vec![1.0; 3],
            vec![1.0; 2],
            vec![1.0; 3],
            vec![1.0; 3],
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PatternError::LengthMismatch {
                field: "h",
                expected: 3,
                got: 2
            }
        ));
    }

    #[test]
    fn test_volume_length_checked() {
        let err = OhlcvSeries::new(
            vec![1, 2],
            vec![1.0; 2],
            vec![1.0; 2],
            vec![1.0; 2],
            vec![1.0; 2],
            Some(vec![5.0]),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_from_bars() {
        let candles: Vec<Candle> = (0..4)
            .map(|i| Candle {
                ts: Some(i * 60),
                price: 10.0 + i as f64,
            })
            .collect();
        let series = OhlcvSeries::from_bars(&candles).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.highs()[2], 13.0);
        assert!(series.volumes().is_none());
    }

    #[test]
    fn test_from_bars_missing_timestamp() {
        let candles = vec![
            Candle {
                ts: Some(0),
                price: 1.0,
            },
            Candle {
                ts: None,
                price: 1.0,
            },
        ];
        let err = OhlcvSeries::from_bars(&candles).unwrap_err();
        assert!(matches!(err, PatternError::MissingTimestamp { index: 1 }));
    }

    #[test]
    fn test_validate() {
        assert!(flat(5).validate().is_ok());

        let bad = OhlcvSeries::new(
            vec![1, 2],
            vec![1.0, 1.0],
            vec![2.0, 0.5],
            vec![0.5, 1.0],
            vec![1.0, 1.0],
            None,
        )
        .unwrap();
        assert!(matches!(
            bad.validate(),
            Err(PatternError::InvalidOHLCV { index: 1, .. })
        ));

        let unordered = OhlcvSeries::new(
            vec![2, 1],
            vec![1.0; 2],
            vec![2.0; 2],
            vec![0.5; 2],
            vec![1.0; 2],
            None,
        )
        .unwrap();
        assert!(unordered.validate().is_err());
    }

    #[test]
    fn test_bar_access() {
        let series = flat(3);
        let bar = series.bar(1).unwrap();
        assert_eq!(bar.timestamp(), Some(1_700_000_060));
        assert!(series.bar(3).is_none());
        assert_eq!(series.bars().count(), 3);
    }
}
