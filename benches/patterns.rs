//! Benchmarks for chart pattern detection.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chartpat::prelude::*;

/// Generate a deterministic oscillating series
fn generate_series(n: usize) -> OhlcvSeries {
  let mut t = Vec::with_capacity(n);
  let mut o = Vec::with_capacity(n);
  let mut h = Vec::with_capacity(n);
  let mut l = Vec::with_capacity(n);
  let mut c = Vec::with_capacity(n);
  let mut price = 100.0;

  for i in 0..n {
    let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
    let wave = (i as f64 / 6.0).sin() * 1.5;
    let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

    let open = price;
    let close = (price + change + wave).max(1.0);
    t.push(1_700_000_000 + i as i64 * 60);
    o.push(open);
    h.push(open.max(close) + volatility * 0.5);
    l.push(open.min(close) - volatility * 0.5);
    c.push(close);
    price = close;
  }

  OhlcvSeries::new(t, o, h, l, c, None).unwrap()
}

fn bench_each_pattern(c: &mut Criterion) {
  let series = generate_series(1000);
  let engine = EngineBuilder::new().build().unwrap();

  for kind in PatternKind::ALL {
    c.bench_function(&format!("detect_{}_1000_bars", kind), |b| {
      b.iter(|| {
        let _ = black_box(engine.detect(kind, Sensitivity::Moderate, black_box(&series)));
      })
    });
  }
}

fn bench_scaling(c: &mut Criterion) {
  let engine = EngineBuilder::new().build().unwrap();

  let mut group = c.benchmark_group("scaling");

  for size in [100, 500, 1000, 5000].iter() {
    let series = generate_series(*size);

    group.bench_with_input(BenchmarkId::new("double_bottom", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(engine.detect(
          PatternKind::DoubleBottom,
          Sensitivity::Loose,
          black_box(&series),
        ));
      })
    });
  }

  group.finish();
}

fn bench_swing_extraction(c: &mut Criterion) {
  let series = generate_series(1000);

  c.bench_function("swing_points_depth_3_1000_bars", |b| {
    b.iter(|| {
      let _ = black_box(SwingPoints::from_series(black_box(&series), 3));
    })
  });
}

fn bench_parallel_scan(c: &mut Criterion) {
  let series: Vec<OhlcvSeries> = (0..4).map(|i| generate_series(1000 + i * 10)).collect();

  let engine = EngineBuilder::new().build().unwrap();

  let requests: Vec<(&str, DetectionRequest)> = ["SYM1", "SYM2", "SYM3", "SYM4"]
    .into_iter()
    .zip(&series)
    .flat_map(|(symbol, series)| {
      PatternKind::ALL.map(|kind| {
        (symbol, DetectionRequest { kind, sensitivity: Sensitivity::Moderate, series })
      })
    })
    .collect();

  c.bench_function("parallel_scan_4_instruments_all_patterns", |b| {
    b.iter(|| {
      let _ = black_box(scan_parallel(black_box(&engine), black_box(requests.clone())));
    })
  });
}

criterion_group!(
  benches,
  bench_each_pattern,
  bench_scaling,
  bench_swing_extraction,
  bench_parallel_scan,
);

criterion_main!(benches);
