//! # Host Solver Benchmark
//!
//! Measures one full step of the host mirror at a few grid sizes, with and
//! without the viscous stage.
//!
//! Run with: `cargo bench --bench cpu_step`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{UVec2, Vec2};
use liquid_ether::cpu::HostSimulation;
use liquid_ether::{EtherConfig, ForceInput};

fn bench_step(c: &mut Criterion) {
    let force = ForceInput {
        force: Vec2::new(0.5, 0.25),
        center: Vec2::ZERO,
        scale: Vec2::splat(8.0),
    };

    let mut group = c.benchmark_group("host_step");
    for container in [UVec2::new(160, 120), UVec2::new(320, 240)] {
        for viscous in [false, true] {
            let config = EtherConfig::default()
                .with_viscosity(viscous.then_some(30.0))
                .with_iterations(16, 16);
            let label = if viscous { "viscous" } else { "inviscid" };
            let id = BenchmarkId::new(label, format!("{}x{}", container.x, container.y));

            group.bench_with_input(id, &config, |b, config| {
                let mut sim = HostSimulation::new(config, container);
                b.iter(|| sim.step(config, &force));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
