//! Gray-Scott reaction-diffusion on a toroidal grid
//!
//! - A (inhibitor) starts at 1 everywhere, B (activator) at 0 apart from
//!   a noisy centre square and a few solid patches
//! - Each sub-step writes every cell into the back buffers, then the
//!   buffers are swapped, so observers only ever see settled grids
//! - Values are clamped to [0, 1]

use rand::Rng;
use serde::Serialize;

pub const DIFFUSION_A: f64 = 1.0;
pub const DIFFUSION_B: f64 = 0.5;
pub const DEFAULT_FEED: f64 = 0.055;
pub const DEFAULT_KILL: f64 = 0.062;
pub const SUBSTEPS_PER_FRAME: usize = 5;

/// Half-width of the noisy centre seed
const CENTER_SEED: i64 = 20;
/// Half-width of each solid random patch
const PATCH_HALF_WIDTH: i64 = 5;
const PATCH_COUNT: usize = 5;

const WEIGHT_CENTER: f64 = -1.0;
const WEIGHT_ORTHOGONAL: f64 = 0.2;
const WEIGHT_DIAGONAL: f64 = 0.05;

/// Both concentration grids, row-major, index = y * width + x
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarPair {
    pub width: usize,
    pub height: usize,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct GrayScott {
    width: usize,
    height: usize,
    feed: f64,
    kill: f64,
    a: Vec<f64>,
    b: Vec<f64>,
    next_a: Vec<f64>,
    next_b: Vec<f64>,
}

impl GrayScott {
    /// Uniform A = 1, B = 0 with no seeding
    pub fn new(width: usize, height: usize, feed: f64, kill: f64) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let cells = width * height;
        Self {
            width,
            height,
            feed,
            kill,
            a: vec![1.0; cells],
            b: vec![0.0; cells],
            next_a: vec![1.0; cells],
            next_b: vec![0.0; cells],
        }
    }

    /// New grid with the standard B seeding drawn from `rng`
    pub fn seeded<R: Rng + ?Sized>(width: usize, height: usize, feed: f64, kill: f64, rng: &mut R) -> Self {
        let mut sim = Self::new(width, height, feed, kill);
        sim.seed(rng);
        sim
    }

    /// Scatter B: coin-flip cells in the centre square plus solid patches
    pub fn seed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let cx = (self.width / 2) as i64;
        let cy = (self.height / 2) as i64;
        for x in cx - CENTER_SEED..cx + CENTER_SEED {
            for y in cy - CENTER_SEED..cy + CENTER_SEED {
                if let Some(idx) = self.index_checked(x, y) {
                    if rng.gen::<f64>() > 0.5 {
                        self.b[idx] = 1.0;
                    }
                }
            }
        }

        for _ in 0..PATCH_COUNT {
            let rx = rng.gen_range(0..self.width) as i64;
            let ry = rng.gen_range(0..self.height) as i64;
            for dx in -PATCH_HALF_WIDTH..=PATCH_HALF_WIDTH {
                for dy in -PATCH_HALF_WIDTH..=PATCH_HALF_WIDTH {
                    if let Some(idx) = self.index_checked(rx + dx, ry + dy) {
                        self.b[idx] = 1.0;
                    }
                }
            }
        }
    }

    fn index_checked(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Set a single cell, e.g. for hand-placed seeds
    pub fn set(&mut self, x: usize, y: usize, a: f64, b: f64) {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            self.a[idx] = a.clamp(0.0, 1.0);
            self.b[idx] = b.clamp(0.0, 1.0);
        }
    }

    /// Nine-point Laplacian with wrap-around neighbours
    fn laplacian(&self, grid: &[f64], x: usize, y: usize) -> f64 {
        let (w, h) = (self.width, self.height);
        let left = (x + w - 1) % w;
        let right = (x + 1) % w;
        let up = (y + h - 1) % h;
        let down = (y + 1) % h;
        let at = |cx: usize, cy: usize| grid[cy * w + cx];

        at(x, y) * WEIGHT_CENTER
            + (at(left, y) + at(right, y) + at(x, up) + at(x, down)) * WEIGHT_ORTHOGONAL
            + (at(left, up) + at(right, up) + at(left, down) + at(right, down)) * WEIGHT_DIAGONAL
    }

    /// One explicit update of every cell followed by a buffer swap
    pub fn step(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let a = self.a[idx];
                let b = self.b[idx];
                let reaction = a * b * b;
                let next_a = a + DIFFUSION_A * self.laplacian(&self.a, x, y) - reaction + self.feed * (1.0 - a);
                let next_b = b + DIFFUSION_B * self.laplacian(&self.b, x, y) + reaction - (self.kill + self.feed) * b;
                self.next_a[idx] = next_a.clamp(0.0, 1.0);
                self.next_b[idx] = next_b.clamp(0.0, 1.0);
            }
        }
        std::mem::swap(&mut self.a, &mut self.next_a);
        std::mem::swap(&mut self.b, &mut self.next_b);
    }

    pub fn frame(&mut self) {
        for _ in 0..SUBSTEPS_PER_FRAME {
            self.step();
        }
    }

    pub fn a(&self) -> &[f64] {
        &self.a
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn snapshot(&self) -> ScalarPair {
        ScalarPair {
            width: self.width,
            height: self.height,
            a: self.a.clone(),
            b: self.b.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn in_unit_range(values: &[f64]) -> bool {
        values.iter().all(|v| (0.0..=1.0).contains(v))
    }

    #[test]
    fn test_unseeded_grid_is_steady() {
        let mut sim = GrayScott::new(16, 12, DEFAULT_FEED, DEFAULT_KILL);
        sim.frame();
        assert!(sim.a().iter().all(|&v| (v - 1.0).abs() < 1e-12));
        assert!(sim.b().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_values_stay_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(17);
        for (feed, kill) in [(0.01, 0.045), (0.055, 0.062), (0.1, 0.07), (0.03, 0.055)] {
            let mut sim = GrayScott::seeded(48, 40, feed, kill, &mut rng);
            for _ in 0..40 {
                sim.frame();
                assert!(in_unit_range(sim.a()));
                assert!(in_unit_range(sim.b()));
            }
        }
    }

    #[test]
    fn test_laplacian_wraps() {
        let mut sim = GrayScott::new(5, 5, DEFAULT_FEED, DEFAULT_KILL);
        sim.set(4, 4, 1.0, 1.0);
        // (0, 0) sees (4, 4) as its diagonal neighbour
        assert!((sim.laplacian(&sim.b, 0, 0) - WEIGHT_DIAGONAL).abs() < 1e-12);
        assert!((sim.laplacian(&sim.b, 4, 0) - WEIGHT_ORTHOGONAL).abs() < 1e-12);
        assert!((sim.laplacian(&sim.b, 4, 4) - WEIGHT_CENTER).abs() < 1e-12);
    }

    #[test]
    fn test_step_matches_hand_computation() {
        let mut sim = GrayScott::new(3, 3, 0.05, 0.06);
        sim.set(1, 1, 0.5, 0.5);
        sim.step();
        // All eight neighbours hold A = 1, B = 0
        let lap_a = -0.5 + 4.0 * 0.2 + 4.0 * 0.05;
        let lap_b = -0.5;
        let reaction = 0.5 * 0.25;
        let expected_a: f64 = 0.5 + lap_a - reaction + 0.05 * 0.5;
        let expected_b: f64 = 0.5 + 0.5 * lap_b + reaction - 0.11 * 0.5;
        assert!((sim.a()[4] - expected_a.clamp(0.0, 1.0)).abs() < 1e-12);
        assert!((sim.b()[4] - expected_b.clamp(0.0, 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_seeding_is_reproducible() {
        let a = GrayScott::seeded(60, 50, DEFAULT_FEED, DEFAULT_KILL, &mut StdRng::seed_from_u64(3));
        let b = GrayScott::seeded(60, 50, DEFAULT_FEED, DEFAULT_KILL, &mut StdRng::seed_from_u64(3));
        assert_eq!(a.snapshot(), b.snapshot());
        assert!(a.b().iter().any(|&v| v == 1.0));
    }
}
