//! Diffusion-limited aggregation on a fixed lattice
//!
//! Walkers spawn on a ring just outside the cluster, random-walk one
//! lattice step at a time (clamped to the grid) and stick with
//! probability `stickiness` when any of their 8 neighbours is occupied.
//! A walker that drifts too far out is respawned. Occupied cells are
//! never cleared.

use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DlaParams {
    pub cols: usize,
    pub rows: usize,
    /// Walker passes per frame = floor(particle_speed · 50)
    pub particle_speed: f64,
    /// Probability of sticking on contact, in [0, 1]
    pub stickiness: f64,
    pub walkers: usize,
    /// Growth stops once this many cells are occupied
    pub target_particles: usize,
    /// Spawn ring radius = max growth radius + spawn_margin
    pub spawn_margin: f64,
    /// Respawn beyond max growth radius + escape_margin
    pub escape_margin: f64,
    /// Growth stops once the radius reaches half the grid minus this
    pub edge_margin: f64,
}

impl Default for DlaParams {
    fn default() -> Self {
        Self {
            cols: 300,
            rows: 300,
            particle_speed: 2.0,
            stickiness: 1.0,
            walkers: 100,
            target_particles: 8000,
            spawn_margin: 20.0,
            escape_margin: 50.0,
            edge_margin: 10.0,
        }
    }
}

/// Half-width of the square seed cluster
const SEED_HALF_WIDTH: i64 = 2;

/// Growth radius credited to the seed cluster
const SEED_RADIUS: f64 = 5.0;

/// A cell that became occupied during a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StuckCell {
    pub x: usize,
    pub y: usize,
    pub distance: f64,
    /// Occupied count right after this cell stuck
    pub order: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Walker {
    x: i64,
    y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WalkOutcome {
    Wandered,
    Respawned,
    Stuck(StuckCell),
}

/// Occupancy grid, cluster bookkeeping and the live walkers
#[derive(Debug, Clone)]
pub struct DlaGrower<R> {
    params: DlaParams,
    cols: usize,
    rows: usize,
    /// Column-major occupancy, index = x * rows + y
    grid: Vec<bool>,
    walkers: Vec<Walker>,
    count: usize,
    max_radius: f64,
    rng: R,
}

impl<R: Rng> DlaGrower<R> {
    pub fn new(params: DlaParams, rng: R) -> Self {
        let cols = params.cols.max(1);
        let rows = params.rows.max(1);
        let mut grower = Self {
            params,
            cols,
            rows,
            grid: vec![false; cols * rows],
            walkers: Vec::with_capacity(params.walkers),
            count: 0,
            max_radius: SEED_RADIUS,
            rng,
        };

        let (cx, cy) = grower.center();
        for dx in -SEED_HALF_WIDTH..=SEED_HALF_WIDTH {
            for dy in -SEED_HALF_WIDTH..=SEED_HALF_WIDTH {
                if let Some(idx) = grower.index(cx + dx, cy + dy) {
                    if !grower.grid[idx] {
                        grower.grid[idx] = true;
                        grower.count += 1;
                    }
                }
            }
        }

        for _ in 0..params.walkers {
            let walker = grower.spawn();
            grower.walkers.push(walker);
        }
        tracing::debug!(cols, rows, seeded = grower.count, "DLA grid initialised");
        grower
    }

    fn center(&self) -> (i64, i64) {
        ((self.cols / 2) as i64, (self.rows / 2) as i64)
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.cols as i64 || y >= self.rows as i64 {
            return None;
        }
        Some(x as usize * self.rows + y as usize)
    }

    fn clamp(&self, x: i64, y: i64) -> (i64, i64) {
        (x.clamp(0, self.cols as i64 - 1), y.clamp(0, self.rows as i64 - 1))
    }

    fn distance_from_center(&self, x: i64, y: i64) -> f64 {
        let (cx, cy) = self.center();
        (((x - cx).pow(2) + (y - cy).pow(2)) as f64).sqrt()
    }

    /// New walker at a random angle on the spawn ring
    fn spawn(&mut self) -> Walker {
        let (cx, cy) = self.center();
        let radius = self.max_radius + self.params.spawn_margin;
        let angle = self.rng.gen::<f64>() * std::f64::consts::TAU;
        let x = (cx as f64 + angle.cos() * radius).floor() as i64;
        let y = (cy as f64 + angle.sin() * radius).floor() as i64;
        let (x, y) = self.clamp(x, y);
        Walker { x, y }
    }

    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.index(x as i64, y as i64).map(|i| self.grid[i]).unwrap_or(false)
    }

    fn has_neighbor(&self, x: i64, y: i64) -> bool {
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if let Some(idx) = self.index(x + dx, y + dy) {
                    if self.grid[idx] {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn walk(&mut self, i: usize) -> WalkOutcome {
        let Walker { x, y } = self.walkers[i];
        let dx = self.rng.gen_range(-1..=1);
        let dy = self.rng.gen_range(-1..=1);
        let (x, y) = self.clamp(x + dx, y + dy);
        self.walkers[i] = Walker { x, y };

        let distance = self.distance_from_center(x, y);
        if distance > self.max_radius + self.params.escape_margin {
            self.walkers[i] = self.spawn();
            return WalkOutcome::Respawned;
        }

        if self.has_neighbor(x, y) && self.rng.gen::<f64>() < self.params.stickiness {
            if let Some(idx) = self.index(x, y) {
                if !self.grid[idx] {
                    self.grid[idx] = true;
                    self.count += 1;
                    self.max_radius = self.max_radius.max(distance);
                    self.walkers[i] = self.spawn();
                    return WalkOutcome::Stuck(StuckCell {
                        x: x as usize,
                        y: y as usize,
                        distance,
                        order: self.count,
                    });
                }
            }
        }
        WalkOutcome::Wandered
    }

    /// Move every walker once, in order. Earlier walkers win contested cells.
    pub fn step(&mut self) -> Vec<StuckCell> {
        let mut stuck = Vec::new();
        for i in 0..self.walkers.len() {
            if let WalkOutcome::Stuck(cell) = self.walk(i) {
                stuck.push(cell);
            }
        }
        stuck
    }

    /// One display frame worth of passes; stops early once finished
    pub fn frame(&mut self) -> Vec<StuckCell> {
        let passes = (self.params.particle_speed * 50.0).floor().max(0.0) as usize;
        let mut stuck = Vec::new();
        for _ in 0..passes {
            if self.is_finished() {
                break;
            }
            stuck.extend(self.step());
        }
        stuck
    }

    pub fn is_finished(&self) -> bool {
        let half_extent = self.cols.min(self.rows) as f64 / 2.0;
        self.count >= self.params.target_particles || self.max_radius >= half_extent - self.params.edge_margin
    }

    pub fn occupied_count(&self) -> usize {
        self.count
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Occupied cells as (x, y) pairs
    pub fn occupied_cells(&self) -> Vec<(usize, usize)> {
        self.grid
            .iter()
            .enumerate()
            .filter(|(_, &occupied)| occupied)
            .map(|(i, _)| (i / self.rows, i % self.rows))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small(stickiness: f64, target: usize) -> DlaGrower<StdRng> {
        let params = DlaParams {
            cols: 80,
            rows: 80,
            stickiness,
            target_particles: target,
            ..DlaParams::default()
        };
        DlaGrower::new(params, StdRng::seed_from_u64(1234))
    }

    #[test]
    fn test_seed_cluster() {
        let grower = small(1.0, 8000);
        assert_eq!(grower.occupied_count(), 25);
        assert!(grower.is_occupied(40, 40));
        assert!(grower.is_occupied(38, 42));
        assert!(!grower.is_occupied(37, 40));
        assert_eq!(grower.occupied_cells().len(), 25);
    }

    #[test]
    fn test_occupancy_is_monotonic() {
        let mut grower = small(1.0, 8000);
        let mut previous = grower.occupied_cells();
        for _ in 0..20 {
            let events = grower.frame();
            let current = grower.occupied_cells();
            assert!(previous.iter().all(|cell| current.contains(cell)));
            assert_eq!(current.len(), previous.len() + events.len());
            assert_eq!(current.len(), grower.occupied_count());
            previous = current;
        }
    }

    #[test]
    fn test_stuck_cells_touch_cluster() {
        let mut grower = small(1.0, 8000);
        for _ in 0..200 {
            let before = grower.clone();
            for cell in grower.step() {
                assert!(!before.is_occupied(cell.x, cell.y));
                assert!(grower.is_occupied(cell.x, cell.y));
                let touching = (-1i64..=1).any(|dx| {
                    (-1i64..=1).any(|dy| {
                        let nx = cell.x as i64 + dx;
                        let ny = cell.y as i64 + dy;
                        (dx, dy) != (0, 0) && nx >= 0 && ny >= 0 && grower.is_occupied(nx as usize, ny as usize)
                    })
                });
                assert!(touching);
            }
        }
    }

    #[test]
    fn test_zero_stickiness_never_grows() {
        let mut grower = small(0.0, 8000);
        for _ in 0..10 {
            assert!(grower.frame().is_empty());
        }
        assert_eq!(grower.occupied_count(), 25);
    }

    #[test]
    fn test_target_count_halts_growth() {
        let mut grower = small(1.0, 40);
        for _ in 0..5_000 {
            if grower.is_finished() {
                break;
            }
            grower.frame();
        }
        assert!(grower.is_finished());
        let count = grower.occupied_count();
        assert!(grower.frame().is_empty());
        assert_eq!(grower.occupied_count(), count);
    }

    #[test]
    fn test_walkers_stay_on_grid() {
        let mut grower = DlaGrower::new(
            DlaParams { cols: 12, rows: 9, ..DlaParams::default() },
            StdRng::seed_from_u64(9),
        );
        for _ in 0..50 {
            grower.step();
            for w in &grower.walkers {
                assert!(w.x >= 0 && w.x < 12 && w.y >= 0 && w.y < 9);
            }
        }
    }
}
