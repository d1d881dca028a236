#[cfg(test)]
mod units {
    use crate::config::{EngineConfig, ResourceLimits};
    use crate::macroscopic::{DensityEngine, MacroParams, simulate};
    use crate::scenario::{BuildingLayout, Hazard, HazardKind, InitialCluster, Scenario, Wall};

    /// Stable explicit parameters: n = 32 over 20 m gives dx = 0.625 and
    /// 4·D·dt/dx² ≈ 0.51.
    fn stable_params(time_steps: usize) -> MacroParams {
        MacroParams {
            grid_resolution: 32,
            time_steps,
            ..Default::default()
        }
    }

    fn walled_box(exits: Vec<[f64; 2]>, clusters: Vec<InitialCluster>) -> Scenario {
        Scenario::from_layout(BuildingLayout {
            walls: vec![
                Wall([0.0, 0.0], [20.0, 0.0]),
                Wall([0.0, 0.0], [0.0, 20.0]),
                Wall([0.0, 20.0], [20.0, 20.0]),
                Wall([20.0, 0.0], [20.0, 20.0]),
            ],
            exits,
            initial_positions: clusters,
        })
    }

    #[test]
    fn initial_density_scales_with_cell_area() {
        let scenario = walled_box(
            vec![[10.0, 0.0]],
            vec![InitialCluster {
                x: 10.0,
                y: 10.0,
                count: 50,
            }],
        );
        let engine = DensityEngine::new(&scenario, stable_params(10)).unwrap();
        let dx = engine.raster().dx();
        let expected = 50.0 / (dx * dx);
        assert!((engine.density().get(16, 16) - expected).abs() < 1e-9);
    }

    #[test]
    fn default_initial_condition_is_a_central_hump() {
        let scenario = walled_box(vec![[10.0, 0.0]], vec![]);
        let engine = DensityEngine::new(&scenario, stable_params(10)).unwrap();
        let n = 32;
        // Center holds the hump, corners hold nothing
        assert!(engine.density().get(n / 2, n / 2) > 0.0);
        assert_eq!(engine.density().get(2, 2), 0.0);
    }

    #[test]
    fn velocity_field_is_unit_and_points_toward_the_exit() {
        let scenario = walled_box(vec![[10.0, 0.0]], vec![]);
        let engine = DensityEngine::new(&scenario, stable_params(10)).unwrap();
        let (vx, vy) = engine.velocity();
        // Above the exit the flow must head downward (negative y)
        let (ex, _) = engine.raster().exit_cells[0];
        let v = (vx.get(ex, 10), vy.get(ex, 10));
        assert!(v.1 < 0.0, "flow above the exit points {:?}", v);
        let magnitude = (v.0 * v.0 + v.1 * v.1).sqrt();
        assert!((magnitude - 1.0).abs() < 1e-9);
        // Walls carry no flow
        for (x, y) in engine.raster().wall_mask.iter_set() {
            assert_eq!(vx.get(x, y), 0.0);
            assert_eq!(vy.get(x, y), 0.0);
        }
    }

    #[test]
    fn fire_spreads_then_freezes() {
        let mut scenario = walled_box(vec![[10.0, 0.0]], vec![]);
        scenario.hazards.push(Hazard {
            position: [5.0, 5.0],
            kind: HazardKind::Fire,
            radius: 2.0,
            intensity: 0.9,
        });
        let params = stable_params(20);
        let mut engine = DensityEngine::new(&scenario, params).unwrap();
        let initial_fire = engine.fire().sum();

        for t in 0..10 {
            engine.step(t);
        }
        let grown = engine.fire().sum();
        assert!(grown > initial_fire, "fire did not spread in the first half");

        // Past the midpoint the field freezes
        for t in 10..20 {
            engine.step(t);
        }
        assert!((engine.fire().sum() - grown).abs() < 1e-9);

        // Bounded and zero on walls
        assert!(engine.fire().max() <= 1.0);
        for (x, y) in engine.raster().wall_mask.iter_set() {
            assert_eq!(engine.fire().get(x, y), 0.0);
        }
    }

    #[test]
    fn density_stays_non_negative_and_walls_stay_empty() {
        let scenario = walled_box(
            vec![[10.0, 0.0]],
            vec![InitialCluster {
                x: 10.0,
                y: 6.0,
                count: 80,
            }],
        );
        let mut engine = DensityEngine::new(&scenario, stable_params(40)).unwrap();
        for t in 0..40 {
            engine.step(t);
            for i in 0..engine.density().data().len() {
                assert!(engine.density().data()[i] >= 0.0, "negative density at step {}", t);
            }
            for (x, y) in engine.raster().wall_mask.iter_set() {
                assert_eq!(engine.density().get(x, y), 0.0);
            }
        }
    }

    #[test]
    fn evacuation_sink_drains_mass() {
        let scenario = walled_box(
            vec![[10.0, 0.0]],
            vec![InitialCluster {
                x: 10.0,
                y: 4.0,
                count: 60,
            }],
        );
        let mut engine = DensityEngine::new(&scenario, stable_params(60)).unwrap();
        let initial_mass = engine.density().sum();
        let mut total_evacuated = 0.0;
        for t in 0..60 {
            total_evacuated += engine.step(t);
        }
        assert!(total_evacuated > 0.0, "nothing ever reached the exit sink");
        assert!(engine.density().sum() < initial_mass);
    }

    #[test]
    fn resource_safeguard_serves_capped_mock() {
        let scenario = walled_box(vec![[10.0, 0.0]], vec![]);
        let config = EngineConfig {
            limits: ResourceLimits {
                max_grid_resolution: 200,
                max_time_steps: 150,
            },
            ..Default::default()
        };
        let params = MacroParams {
            grid_resolution: 400,
            time_steps: 500,
            ..Default::default()
        };
        let outcome = simulate(&scenario, params, &config).unwrap();
        assert!(outcome.mock_data);
        assert_eq!(outcome.grid_resolution, 200);
        assert_eq!(outcome.density.unwrap().len(), 150);
        assert!(
            outcome
                .warnings
                .iter()
                .any(|w| w.contains("resource limits exceeded"))
        );
    }

    #[test]
    fn run_emits_the_full_series() {
        let scenario = walled_box(vec![[10.0, 0.0]], vec![]);
        let outcome = simulate(&scenario, stable_params(15), &EngineConfig::default()).unwrap();
        assert!(!outcome.mock_data);
        assert_eq!(outcome.density.as_ref().unwrap().len(), 15);
        assert_eq!(outcome.fire.as_ref().unwrap().len(), 15);
        assert_eq!(outcome.evacuated_count.as_ref().unwrap().len(), 15);
    }

    #[test]
    fn cancellation_truncates_the_series() {
        let scenario = walled_box(vec![[10.0, 0.0]], vec![]);
        let mut engine = DensityEngine::new(&scenario, stable_params(50)).unwrap();
        engine.stop();
        let outcome = engine.run().unwrap();
        assert!(outcome.truncated);
        assert_eq!(outcome.density.unwrap().len(), 0);
    }

    #[test]
    fn structural_hazards_rasterize_without_coupling() {
        let mut scenario = walled_box(vec![[10.0, 0.0]], vec![]);
        scenario.hazards.push(Hazard {
            position: [15.0, 15.0],
            kind: HazardKind::Structural,
            radius: 2.0,
            intensity: 1.0,
        });
        let engine = DensityEngine::new(&scenario, stable_params(10)).unwrap();
        assert!(engine.structural().sum() > 0.0);
        // No structural hazard means no fire either
        assert_eq!(engine.fire().sum(), 0.0);
    }
}
