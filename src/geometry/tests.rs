#[cfg(test)]
mod units {
    use crate::geometry::rasterize;
    use crate::scenario::{BuildingLayout, Hazard, HazardKind, InitialCluster, Scenario, Wall};

    fn box_scenario() -> Scenario {
        Scenario::from_layout(BuildingLayout {
            walls: vec![
                Wall([0.0, 0.0], [20.0, 0.0]),
                Wall([0.0, 0.0], [0.0, 20.0]),
                Wall([0.0, 20.0], [20.0, 20.0]),
                Wall([20.0, 0.0], [20.0, 20.0]),
            ],
            exits: vec![[10.0, 0.0]],
            initial_positions: vec![InitialCluster {
                x: 10.0,
                y: 10.0,
                count: 50,
            }],
        })
    }

    #[test]
    fn walls_are_traced_along_the_boundary() {
        let raster = rasterize(&box_scenario(), 40, 20.0).unwrap();
        // Bottom wall runs across y = 0, except where the exit punches through
        let mut bottom_walls = 0;
        for x in 0..40 {
            if raster.wall_mask.get(x, 0) {
                bottom_walls += 1;
            }
        }
        assert!(
            bottom_walls >= 35,
            "expected nearly the whole bottom row walled, got {}",
            bottom_walls
        );
        // Corners are walls
        assert!(raster.wall_mask.get(0, 0) || raster.exit_mask.get(0, 0));
        assert!(raster.wall_mask.get(39, 39));
    }

    #[test]
    fn diagonal_wall_marks_every_crossed_cell() {
        let scenario = Scenario::from_layout(BuildingLayout {
            walls: vec![Wall([0.0, 0.0], [20.0, 20.0])],
            exits: vec![[1.0, 19.0]],
            initial_positions: vec![],
        });
        let raster = rasterize(&scenario, 20, 20.0).unwrap();
        // A perfect diagonal marks the full diagonal run
        let mut marked = 0;
        for i in 0..20 {
            if raster.wall_mask.get(i, i) {
                marked += 1;
            }
        }
        assert!(marked >= 18, "diagonal only marked {} cells", marked);
    }

    #[test]
    fn exit_cell_is_never_a_wall() {
        let raster = rasterize(&box_scenario(), 50, 20.0).unwrap();
        for y in 0..50 {
            for x in 0..50 {
                assert!(
                    !(raster.wall_mask.get(x, y) && raster.exit_mask.get(x, y)),
                    "cell ({}, {}) is both wall and exit",
                    x,
                    y
                );
            }
        }
        // The exit itself sits on the bottom wall line and must be open
        let (ex, ey) = raster.exit_cells[0];
        assert_eq!((ex, ey), (25, 0));
        assert!(raster.exit_mask.get(ex, ey));
        assert!(!raster.wall_mask.get(ex, ey));
    }

    #[test]
    fn hazard_disc_decays_linearly_and_adds_up() {
        let mut scenario = box_scenario();
        scenario.hazards.push(Hazard {
            position: [10.0, 10.0],
            kind: HazardKind::Fire,
            radius: 4.0,
            intensity: 1.0,
        });
        scenario.hazards.push(Hazard {
            position: [10.0, 10.0],
            kind: HazardKind::Fire,
            radius: 4.0,
            intensity: 0.5,
        });
        let raster = rasterize(&scenario, 50, 20.0).unwrap();
        let fire = raster.hazard_field(HazardKind::Fire).unwrap();

        // Peak at the center: both discs contribute their full intensity
        let center = fire.get(25, 25);
        assert!(
            (center - 1.5).abs() < 1e-9,
            "center intensity {} != 1.5",
            center
        );

        // Intensity decays with distance
        let off_center = fire.get(30, 25);
        assert!(off_center > 0.0 && off_center < center);

        // Outside the grid radius (10 cells) the field is zero
        assert_eq!(fire.get(25 + 12, 25), 0.0);
    }

    #[test]
    fn unknown_hazards_do_not_touch_the_fire_field() {
        let mut scenario = box_scenario();
        scenario.hazards.push(Hazard {
            position: [5.0, 5.0],
            kind: HazardKind::Generic,
            radius: 2.0,
            intensity: 0.9,
        });
        let raster = rasterize(&scenario, 50, 20.0).unwrap();
        assert!(raster.hazard_field(HazardKind::Fire).is_none());
        assert!(raster.hazard_field(HazardKind::Generic).is_some());
        // The aggregate still sees it
        assert!(raster.hazard_total().sum() > 0.0);
    }

    #[test]
    fn exit_distance_is_zero_at_exits_and_infinite_on_walls() {
        let raster = rasterize(&box_scenario(), 40, 20.0).unwrap();
        let (ex, ey) = raster.exit_cells[0];
        assert_eq!(raster.exit_distance.get(ex, ey), 0.0);
        // A wall cell is unreachable
        assert!(raster.exit_distance.get(0, 10).is_infinite());
        // An interior cell has a finite distance that grows away from the exit
        let near = raster.exit_distance.get(ex, 5);
        let far = raster.exit_distance.get(ex, 30);
        assert!(near.is_finite() && far.is_finite());
        assert!(far > near);
    }

    #[test]
    fn exit_distance_routes_around_walls() {
        // A horizontal barrier at y = 10 spanning x in [0, 16]: cells behind it
        // must take the detour through the gap on the right
        let scenario = Scenario::from_layout(BuildingLayout {
            walls: vec![Wall([0.0, 10.0], [16.0, 10.0])],
            exits: vec![[8.0, 2.0]],
            initial_positions: vec![],
        });
        let raster = rasterize(&scenario, 40, 20.0).unwrap();

        let direct = raster.exit_distance.get(16, 10); // below the barrier
        let behind = raster.exit_distance.get(16, 30); // above the barrier
        assert!(direct.is_finite() && behind.is_finite());

        // Straight-line distance from (16, 30) to the exit cell (16, 4) is 26
        // cells; the geodesic must be strictly longer than that because of the
        // detour around x = 32
        assert!(
            behind > 28.0,
            "geodesic distance {} did not route around the barrier",
            behind
        );
    }

    #[test]
    fn rejects_scenarios_without_exits() {
        let scenario = Scenario::from_layout(BuildingLayout {
            walls: vec![Wall([0.0, 0.0], [20.0, 0.0])],
            exits: vec![],
            initial_positions: vec![],
        });
        assert!(rasterize(&scenario, 40, 20.0).is_err());
    }

    #[test]
    fn rasterization_is_idempotent_for_fixed_inputs() {
        let scenario = box_scenario();
        let a = rasterize(&scenario, 50, 20.0).unwrap();
        let b = rasterize(&scenario, 50, 20.0).unwrap();
        assert_eq!(a.wall_mask, b.wall_mask);
        assert_eq!(a.exit_mask, b.exit_mask);
        assert_eq!(a.exit_distance, b.exit_distance);
    }

    #[test]
    fn zero_length_wall_marks_a_single_cell() {
        let scenario = Scenario::from_layout(BuildingLayout {
            walls: vec![Wall([5.0, 5.0], [5.0, 5.0])],
            exits: vec![[1.0, 1.0]],
            initial_positions: vec![],
        });
        let raster = rasterize(&scenario, 20, 20.0).unwrap();
        assert!(raster.wall_mask.get(5, 5));
        assert_eq!(raster.wall_mask.count(), 1);
    }
}
