//! Criterion benchmarks: one step of each solver at its default scale.

use criterion::{Criterion, criterion_group, criterion_main};
use evacuation_lib::macroscopic::{DensityEngine, MacroParams};
use evacuation_lib::mesoscopic::{LatticeEngine, MesoParams};
use evacuation_lib::microscopic::{MicroParams, SocialForceEngine};
use evacuation_lib::scenario::{BuildingLayout, InitialCluster, Scenario, Wall};

fn bench_scenario() -> Scenario {
    let mut scenario = Scenario::from_layout(BuildingLayout {
        walls: vec![
            Wall([0.0, 0.0], [20.0, 0.0]),
            Wall([0.0, 0.0], [0.0, 20.0]),
            Wall([0.0, 20.0], [20.0, 20.0]),
            Wall([20.0, 0.0], [20.0, 20.0]),
        ],
        exits: vec![[10.0, 0.0], [0.0, 10.0]],
        initial_positions: vec![InitialCluster {
            x: 10.0,
            y: 12.0,
            count: 200,
        }],
    });
    scenario.num_agents = 200;
    scenario
}

fn social_force_step(c: &mut Criterion) {
    let scenario = bench_scenario();
    let params = MicroParams {
        num_agents: 200,
        time_steps: 1,
        ..Default::default()
    };
    c.bench_function("social_force_step_200_agents", |b| {
        let mut engine = SocialForceEngine::new(&scenario, params).unwrap();
        b.iter(|| engine.step());
    });
}

fn lattice_step(c: &mut Criterion) {
    let scenario = bench_scenario();
    let params = MesoParams {
        grid_size: 50,
        time_steps: 1,
        ..Default::default()
    };
    c.bench_function("lattice_step_50x50", |b| {
        let mut engine = LatticeEngine::new(&scenario, params).unwrap();
        b.iter(|| engine.step());
    });
}

fn density_step(c: &mut Criterion) {
    let scenario = bench_scenario();
    let params = MacroParams {
        grid_resolution: 100,
        time_steps: 1,
        ..Default::default()
    };
    c.bench_function("density_step_100x100", |b| {
        let mut engine = DensityEngine::new(&scenario, params).unwrap();
        let mut t = 0;
        b.iter(|| {
            engine.step(t);
            t += 1;
        });
    });
}

criterion_group!(benches, social_force_step, lattice_step, density_step);
criterion_main!(benches);
