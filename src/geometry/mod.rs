//! # Geometry Module - Scenario Rasterizer
//!
//! This module turns a floor plan into the shared grid artifacts consumed by
//! every solver: the wall mask, the exit mask, one scalar hazard field per
//! hazard kind, and the exit-distance potential. Centralizing rasterization
//! here guarantees that the microscopic, mesoscopic, macroscopic, and
//! reinforcement-learning components all see identical wall, exit, and hazard
//! discretizations for a given scenario and resolution.
//!
//! ## Grid artifacts
//!
//! - **Wall mask**: every cell crossed by a wall segment, traced with an
//!   integer line algorithm including both endpoints. Exit cells punch
//!   through walls: a cell is never both wall and exit.
//! - **Exit mask**: each exit's mapped cell plus a disc of radius
//!   `max(1, round(0.5·N/W))` cells.
//! - **Hazard fields**: per hazard kind, additive discs
//!   `intensity · (1 − d/r)` for cells within the grid radius.
//! - **Exit distance**: wall-aware distance to the nearest exit, computed by
//!   a multi-source scan with 8-connectivity (unit and √2 edge weights).
//!   Wall cells hold `+∞`.
//!
//! ## Submodules
//!
//! - [`tests`]: unit tests for line tracing, hazard discs, and the
//!   distance scan

// Unit tests
pub mod tests;

use crate::error::SimError;
use crate::field::{Field, Mask, world_to_grid};
use crate::scenario::{HazardKind, Scenario};
use log::debug;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BinaryHeap;

/// Shared grid artifacts built once per run from a scenario.
///
/// The raster is owned by the enclosing solver for the duration of a run and
/// is read-only to its stepping code.
#[derive(Debug, Clone)]
pub struct Raster {
    n: usize,
    world: f64,
    /// Cells crossed by wall segments (exit cells excluded).
    pub wall_mask: Mask,
    /// Cells within the capture disc of an exit.
    pub exit_mask: Mask,
    /// Mapped center cell of each exit, in scenario order.
    pub exit_cells: Vec<(usize, usize)>,
    /// One additive intensity field per hazard kind present in the scenario.
    pub hazard_fields: BTreeMap<HazardKind, Field>,
    /// Wall-aware distance to the nearest exit, `+∞` on walls.
    pub exit_distance: Field,
}

impl Raster {
    /// Grid resolution (cells per side).
    pub fn n(&self) -> usize {
        self.n
    }

    /// World side length in meters.
    pub fn world(&self) -> f64 {
        self.world
    }

    /// Cell size in meters.
    pub fn dx(&self) -> f64 {
        self.world / self.n as f64
    }

    /// Intensity field for one hazard kind, or `None` when the scenario has
    /// no hazard of that kind.
    pub fn hazard_field(&self, kind: HazardKind) -> Option<&Field> {
        self.hazard_fields.get(&kind)
    }

    /// Sum of all hazard fields regardless of kind.
    pub fn hazard_total(&self) -> Field {
        let mut total = Field::zeros(self.n);
        for field in self.hazard_fields.values() {
            for (dst, &src) in total.data_mut().iter_mut().zip(field.data().iter()) {
                *dst += src;
            }
        }
        total
    }
}

/// Rasterizes a scenario onto an `n × n` grid over a `world × world` meter
/// domain.
///
/// Validates the scenario first so that structural problems surface before
/// any allocation.
pub fn rasterize(scenario: &Scenario, n: usize, world: f64) -> Result<Raster, SimError> {
    if n < 2 {
        return Err(SimError::InvalidParameters(format!(
            "grid resolution must be at least 2, got {}",
            n
        )));
    }
    scenario.validate()?;

    let mut wall_mask = Mask::new(n);
    for wall in &scenario.building_layout.walls {
        if wall.length() == 0.0 {
            // Degenerate segment: a single cell
            let x = world_to_grid(wall.0[0], n, world);
            let y = world_to_grid(wall.0[1], n, world);
            wall_mask.set(x, y, true);
            continue;
        }
        let x0 = world_to_grid(wall.0[0], n, world) as isize;
        let y0 = world_to_grid(wall.0[1], n, world) as isize;
        let x1 = world_to_grid(wall.1[0], n, world) as isize;
        let y1 = world_to_grid(wall.1[1], n, world) as isize;
        trace_line(&mut wall_mask, x0, y0, x1, y1);
    }

    let mut exit_mask = Mask::new(n);
    let mut exit_cells = Vec::with_capacity(scenario.building_layout.exits.len());
    let exit_radius = ((0.5 * n as f64 / world).round() as usize).max(1);
    for exit in &scenario.building_layout.exits {
        let ex = world_to_grid(exit[0], n, world);
        let ey = world_to_grid(exit[1], n, world);
        exit_cells.push((ex, ey));
        mark_disc(&mut exit_mask, ex, ey, exit_radius);
    }

    // Exits are doorways: a cell is at most one of wall or exit
    for y in 0..n {
        for x in 0..n {
            if exit_mask.get(x, y) {
                wall_mask.set(x, y, false);
            }
        }
    }

    let mut hazard_fields: BTreeMap<HazardKind, Field> = BTreeMap::new();
    for hazard in &scenario.hazards {
        let field = hazard_fields
            .entry(hazard.kind)
            .or_insert_with(|| Field::zeros(n));
        let cx = world_to_grid(hazard.position[0], n, world) as f64;
        let cy = world_to_grid(hazard.position[1], n, world) as f64;
        let r_grid = (hazard.radius * n as f64 / world).round();
        if r_grid < 1.0 {
            continue;
        }
        for y in 0..n {
            for x in 0..n {
                let d = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
                if d < r_grid {
                    field.add(x, y, hazard.intensity * (1.0 - d / r_grid));
                }
            }
        }
    }
    for field in hazard_fields.values_mut() {
        field.map_inplace(|v| v.max(0.0));
    }

    let exit_distance = exit_distance_scan(&wall_mask, &exit_mask);

    debug!(
        "rasterized scenario '{}' at n={}: {} wall cells, {} exit cells, {} hazard kinds",
        scenario.name,
        n,
        wall_mask.count(),
        exit_mask.count(),
        hazard_fields.len()
    );

    Ok(Raster {
        n,
        world,
        wall_mask,
        exit_mask,
        exit_cells,
        hazard_fields,
        exit_distance,
    })
}

/// Marks every cell crossed by the line from `(x0, y0)` to `(x1, y1)`,
/// both endpoints included.
fn trace_line(mask: &mut Mask, x0: isize, y0: isize, x1: isize, y1: isize) {
    let n = mask.n() as isize;
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        if x >= 0 && x < n && y >= 0 && y < n {
            mask.set(x as usize, y as usize, true);
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

/// Marks all cells within `radius` cells of `(cx, cy)`, inclusive, so that
/// an exit on the domain boundary always reaches at least one interior cell.
fn mark_disc(mask: &mut Mask, cx: usize, cy: usize, radius: usize) {
    let n = mask.n() as isize;
    let r = radius as isize;
    let (cx, cy) = (cx as isize, cy as isize);
    for y in (cy - r).max(0)..(cy + r + 1).min(n) {
        for x in (cx - r).max(0)..(cx + r + 1).min(n) {
            let d2 = (x - cx).pow(2) + (y - cy).pow(2);
            if d2 <= r * r {
                mask.set(x as usize, y as usize, true);
            }
        }
    }
}

#[derive(PartialEq)]
struct ScanNode {
    dist: f64,
    x: usize,
    y: usize,
}

impl Eq for ScanNode {}

impl Ord for ScanNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on distance
        other.dist.total_cmp(&self.dist)
    }
}

impl PartialOrd for ScanNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Multi-source distance scan from all exit cells over non-wall cells with
/// 8-connectivity (edge weights 1 and √2). Wall cells and unreachable cells
/// hold `+∞`.
fn exit_distance_scan(wall_mask: &Mask, exit_mask: &Mask) -> Field {
    let n = wall_mask.n();
    let mut distance = Field::zeros(n);
    distance.map_inplace(|_| f64::INFINITY);

    let mut heap = BinaryHeap::new();
    for (x, y) in exit_mask.iter_set() {
        distance.set(x, y, 0.0);
        heap.push(ScanNode { dist: 0.0, x, y });
    }

    const SQRT2: f64 = std::f64::consts::SQRT_2;
    let neighbors: [(isize, isize, f64); 8] = [
        (1, 0, 1.0),
        (-1, 0, 1.0),
        (0, 1, 1.0),
        (0, -1, 1.0),
        (1, 1, SQRT2),
        (1, -1, SQRT2),
        (-1, 1, SQRT2),
        (-1, -1, SQRT2),
    ];

    while let Some(ScanNode { dist, x, y }) = heap.pop() {
        if dist > distance.get(x, y) {
            continue;
        }
        for &(dx, dy, weight) in &neighbors {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || ny < 0 || nx >= n as isize || ny >= n as isize {
                continue;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            if wall_mask.get(nx, ny) {
                continue;
            }
            let candidate = dist + weight;
            if candidate < distance.get(nx, ny) {
                distance.set(nx, ny, candidate);
                heap.push(ScanNode {
                    dist: candidate,
                    x: nx,
                    y: ny,
                });
            }
        }
    }

    // Walls stay unreachable even if a segment endpoint touched an exit disc
    for (x, y) in wall_mask.iter_set() {
        distance.set(x, y, f64::INFINITY);
    }

    distance
}
