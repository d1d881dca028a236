#[cfg(test)]
mod units {
    use crate::config::EngineConfig;
    use crate::mesoscopic::{LatticeEngine, MesoParams, simulate};
    use crate::scenario::{BuildingLayout, Hazard, HazardKind, InitialCluster, Scenario, Wall};

    fn walled_box(exits: Vec<[f64; 2]>) -> Scenario {
        Scenario::from_layout(BuildingLayout {
            walls: vec![
                Wall([0.0, 0.0], [20.0, 0.0]),
                Wall([0.0, 0.0], [0.0, 20.0]),
                Wall([0.0, 20.0], [20.0, 20.0]),
                Wall([20.0, 0.0], [20.0, 20.0]),
            ],
            exits,
            initial_positions: vec![InitialCluster {
                x: 10.0,
                y: 10.0,
                count: 40,
            }],
        })
    }

    #[test]
    fn initial_density_matches_the_seeded_clusters() {
        let scenario = walled_box(vec![[10.0, 0.0]]);
        let params = MesoParams {
            grid_size: 40,
            time_steps: 10,
            ..Default::default()
        };
        let engine = LatticeEngine::new(&scenario, params).unwrap();
        let rho = engine.density();
        // All 40 agents sit in the mapped cluster cell
        assert!((rho.sum() - 40.0).abs() < 1e-9);
        assert!((rho.get(20, 20) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn moments_of_a_uniform_distribution_have_zero_velocity() {
        let scenario = walled_box(vec![[10.0, 0.0]]);
        let engine = LatticeEngine::new(&scenario, MesoParams {
            grid_size: 30,
            time_steps: 5,
            ..Default::default()
        })
        .unwrap();
        let (rho, u, v) = engine.moments();
        // Equal mass in all eight directions cancels exactly
        for i in 0..rho.data().len() {
            if rho.data()[i] > 1e-5 {
                assert!(u.data()[i].abs() < 1e-12);
                assert!(v.data()[i].abs() < 1e-12);
            }
        }
    }

    #[test]
    fn collision_preserves_total_mass_before_streaming_losses() {
        // A hazard-free, attraction-free interior check: one step of pure
        // collision keeps the channel sum constant cell by cell. Use a huge
        // box so no mass reaches a wall in one step.
        let scenario = Scenario::from_layout(BuildingLayout {
            walls: vec![],
            exits: vec![[0.0, 0.0]],
            initial_positions: vec![InitialCluster {
                x: 15.0,
                y: 15.0,
                count: 16,
            }],
        });
        let params = MesoParams {
            grid_size: 40,
            time_steps: 5,
            ..Default::default()
        };
        let mut engine = LatticeEngine::new(&scenario, params).unwrap();
        let before = engine.density().sum();
        engine.step();
        let after = engine.density().sum();
        // The exit sits in a far corner; its attraction injection at the
        // cluster is tiny, and nothing streams off-grid from the center
        assert!(
            (after - before).abs() < 0.5,
            "mass jumped {} -> {}",
            before,
            after
        );
    }

    #[test]
    fn streaming_moves_mass_and_walls_absorb_it() {
        let scenario = walled_box(vec![[10.0, 0.0]]);
        let params = MesoParams {
            grid_size: 40,
            time_steps: 60,
            ..Default::default()
        };
        let mut engine = LatticeEngine::new(&scenario, params).unwrap();
        let initial = engine.density().sum();
        for _ in 0..60 {
            engine.step();
        }
        let remaining = engine.density().sum();
        assert!(
            remaining < initial,
            "no mass was absorbed: {} -> {}",
            initial,
            remaining
        );
        assert!(remaining >= 0.0);
    }

    #[test]
    fn density_stays_non_negative_and_walls_stay_empty() {
        let mut scenario = walled_box(vec![[10.0, 0.0], [0.0, 10.0]]);
        scenario.hazards.push(Hazard {
            position: [13.0, 13.0],
            kind: HazardKind::Fire,
            radius: 2.0,
            intensity: 0.8,
        });
        let params = MesoParams {
            grid_size: 30,
            time_steps: 40,
            ..Default::default()
        };
        let mut engine = LatticeEngine::new(&scenario, params).unwrap();
        for step in 0..40 {
            engine.step();
            let rho = engine.density();
            for i in 0..rho.data().len() {
                assert!(
                    rho.data()[i] >= 0.0,
                    "negative density at step {}, cell {}",
                    step,
                    i
                );
            }
            for (x, y) in engine.raster().wall_mask.iter_set() {
                assert_eq!(
                    rho.get(x, y),
                    0.0,
                    "wall cell ({}, {}) holds mass at step {}",
                    x,
                    y,
                    step
                );
            }
        }
    }

    #[test]
    fn run_emits_the_full_series() {
        let scenario = walled_box(vec![[10.0, 0.0]]);
        let params = MesoParams {
            grid_size: 25,
            time_steps: 12,
            ..Default::default()
        };
        let outcome = simulate(&scenario, params, &EngineConfig::default()).unwrap();
        assert!(!outcome.mock_data);
        assert_eq!(outcome.density.as_ref().unwrap().len(), 12);
        assert_eq!(outcome.velocity_x.as_ref().unwrap().len(), 12);
        assert_eq!(outcome.total_occupancy.as_ref().unwrap().len(), 12);
        assert_eq!(outcome.grid_resolution, 25);
    }

    #[test]
    fn cancellation_truncates_the_series() {
        let scenario = walled_box(vec![[10.0, 0.0]]);
        let params = MesoParams {
            grid_size: 20,
            time_steps: 50,
            ..Default::default()
        };
        let mut engine = LatticeEngine::new(&scenario, params).unwrap();
        engine.stop();
        let outcome = engine.run().unwrap();
        assert!(outcome.truncated);
        assert_eq!(outcome.density.unwrap().len(), 0);
    }

    #[test]
    fn mock_dispatch_respects_the_config_switch() {
        let scenario = walled_box(vec![[10.0, 0.0]]);
        let config = EngineConfig {
            mock: true,
            ..Default::default()
        };
        let outcome = simulate(&scenario, MesoParams::default(), &config).unwrap();
        assert!(outcome.mock_data);
        assert_eq!(outcome.density.unwrap().len(), 100);
    }

    #[test]
    fn rejects_degenerate_grids() {
        let scenario = walled_box(vec![[10.0, 0.0]]);
        let params = MesoParams {
            grid_size: 1,
            ..Default::default()
        };
        assert!(simulate(&scenario, params, &EngineConfig::default()).is_err());
    }
}
