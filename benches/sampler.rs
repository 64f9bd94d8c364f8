#[macro_use]
extern crate criterion;

use buddhabrot::orbit::{Orbit, Point};
use buddhabrot::{Config, RenderSession, Viewport};
use criterion::{black_box, Criterion};
use num::Complex;

fn evaluate_orbits(c: &mut Criterion) {
    let viewport = Viewport::from_config(&Config::default()).unwrap();
    let escape_radius2 = viewport.escape_radius2();
    let mut orbit = Orbit::with_capacity(50_000);
    c.bench_function("evaluate interior seed", move |b| {
        let seed = Point::seed(Complex::new(-0.1, 0.1));
        b.iter(|| orbit.evaluate(black_box(&seed), 50_000, escape_radius2))
    });

    let viewport = Viewport::from_config(&Config::default()).unwrap();
    let mut orbit = Orbit::with_capacity(50_000);
    c.bench_function("contribution of a long orbit", move |b| {
        orbit.evaluate(&Point::seed(Complex::new(-0.75, 0.1)), 50_000, viewport.escape_radius2());
        b.iter(|| orbit.contribution(black_box(&viewport)))
    });
}

fn step_session(c: &mut Criterion) {
    let config = Config {
        width: 120,
        height: 160,
        ensemble_size: 4,
        ..Config::default()
    };
    let mut session = RenderSession::bootstrap(config, 1).unwrap();
    c.bench_function("ensemble step", move |b| b.iter(|| session.step()));
}

criterion_group!(benches, evaluate_orbits, step_session);
criterion_main!(benches);
