//! Benchmarks for the signal engine.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sigfuse::prelude::*;

/// Simple test bar structure
#[derive(Debug, Clone, Copy)]
struct TestBar {
  o: f64,
  h: f64,
  l: f64,
  c: f64,
}

impl Ohlc for TestBar {
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
}

/// Generate realistic bars
fn generate_bars(n: usize) -> Vec<TestBar> {
  let mut bars = Vec::with_capacity(n);
  let mut price = 1.1;

  for i in 0..n {
    let change = (((i * 7 + 13) % 100) as f64 / 50.0 - 1.0) * 0.001; // Deterministic "random"
    let volatility = 0.002 + ((i * 3) % 10) as f64 * 0.0002;

    let o = price;
    let c = price + change;
    let h = o.max(c) + volatility * 0.5;
    let l = o.min(c) - volatility * 0.5;

    bars.push(TestBar { o, h, l, c });
    price = c;
  }

  bars
}

fn bench_analyze(c: &mut Criterion) {
  let bars = generate_bars(250);
  let engine = EngineBuilder::new().build().unwrap();

  c.bench_function("analyze_250_bars", |b| {
    b.iter(|| {
      let _ = black_box(engine.analyze(black_box(&bars)));
    })
  });
}

fn bench_indicators(c: &mut Criterion) {
  let bars = generate_bars(1000);
  let indicators = IndicatorEngine::default();

  c.bench_function("indicators_1000_bars", |b| {
    b.iter(|| {
      let _ = black_box(indicators.compute(black_box(&bars)));
    })
  });
}

fn bench_detectors(c: &mut Criterion) {
  let bars = generate_bars(1000);
  let series = IndicatorEngine::default().compute(&bars);
  let structure = StructureDetector::default();
  let zones = ZoneDetector::default();

  c.bench_function("structure_1000_bars", |b| {
    b.iter(|| {
      let _ = black_box(structure.classify(black_box(&series)));
    })
  });

  c.bench_function("zones_1000_bars", |b| {
    b.iter(|| {
      let _ = black_box(zones.detect(black_box(&series)));
    })
  });
}

fn bench_scaling(c: &mut Criterion) {
  let engine = EngineBuilder::new().build().unwrap();

  let mut group = c.benchmark_group("scaling");

  for size in [250, 1000, 5000, 10000].iter() {
    let bars = generate_bars(*size);

    group.bench_with_input(BenchmarkId::new("analyze", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(engine.analyze(black_box(&bars)));
      })
    });
  }

  group.finish();
}

fn bench_parallel_evaluation(c: &mut Criterion) {
  let bars1 = generate_bars(500);
  let bars2 = generate_bars(500);
  let bars3 = generate_bars(500);
  let bars4 = generate_bars(500);

  let engine = EngineBuilder::new().build().unwrap();

  let instruments: Vec<(&str, &[TestBar])> =
    vec![("EUR_USD", &bars1), ("GBP_USD", &bars2), ("USD_JPY", &bars3), ("AUD_USD", &bars4)];

  c.bench_function("parallel_evaluate_4_instruments", |b| {
    b.iter(|| {
      let _ = black_box(evaluate_parallel(black_box(&engine), black_box(instruments.clone())));
    })
  });
}

criterion_group!(
  benches,
  bench_analyze,
  bench_indicators,
  bench_detectors,
  bench_scaling,
  bench_parallel_evaluation,
);

criterion_main!(benches);
