//! Iterated Function Systems - chaos game sampling
//!
//! Each step picks one affine map by cumulative probability, applies it
//! to the current point and records the result. The cloud converges to
//! the attractor statistically, so two unseeded runs never match exactly.

use std::collections::VecDeque;

use rand::Rng;
use serde::Serialize;

use super::geometry::Point2;
use super::KernelError;

/// Tolerance on the probability sum
const PROBABILITY_EPSILON: f64 = 1e-6;

/// x' = a·x + b·y + e, y' = c·x + d·y + f
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AffineMap {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
    pub probability: f64,
}

impl AffineMap {
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64, probability: f64) -> Self {
        Self { a, b, c, d, e, f, probability }
    }

    pub fn apply(&self, p: Point2) -> Point2 {
        Point2::new(
            self.a * p.x + self.b * p.y + self.e,
            self.c * p.x + self.d * p.y + self.f,
        )
    }
}

/// Barnsley fern: stem, successive leaflets, left and right leaflets
pub const BARNSLEY_FERN: [AffineMap; 4] = [
    AffineMap::new(0.0, 0.0, 0.0, 0.16, 0.0, 0.0, 0.01),
    AffineMap::new(0.85, 0.04, -0.04, 0.85, 0.0, 1.6, 0.85),
    AffineMap::new(0.2, -0.26, 0.23, 0.22, 0.0, 1.6, 0.07),
    AffineMap::new(-0.15, 0.28, 0.26, 0.24, 0.0, 0.44, 0.07),
];

/// Sierpinski triangle on the unit triangle
pub const SIERPINSKI: [AffineMap; 3] = [
    AffineMap::new(0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 1.0 / 3.0),
    AffineMap::new(0.5, 0.0, 0.0, 0.5, 0.5, 0.0, 1.0 / 3.0),
    AffineMap::new(0.5, 0.0, 0.0, 0.5, 0.25, 0.5, 1.0 / 3.0),
];

/// Chaos-game point accumulator
#[derive(Debug, Clone)]
pub struct IfsSampler {
    maps: Vec<AffineMap>,
    /// Running cumulative probabilities, same order as `maps`
    cumulative: Vec<f64>,
    point: Point2,
    cloud: VecDeque<Point2>,
    capacity: Option<usize>,
}

impl IfsSampler {
    /// Probabilities must sum to 1
    pub fn new(maps: &[AffineMap]) -> Result<Self, KernelError> {
        let total: f64 = maps.iter().map(|m| m.probability).sum();
        if maps.is_empty() || (total - 1.0).abs() > PROBABILITY_EPSILON {
            return Err(KernelError::InvalidProbabilities(total));
        }

        let cumulative = maps
            .iter()
            .scan(0.0, |acc, m| {
                *acc += m.probability;
                Some(*acc)
            })
            .collect();

        Ok(Self {
            maps: maps.to_vec(),
            cumulative,
            point: Point2::ORIGIN,
            cloud: VecDeque::new(),
            capacity: None,
        })
    }

    /// Keep at most `capacity` of the newest points
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Index of the map selected by a uniform draw in [0, 1)
    pub fn select(&self, draw: f64) -> usize {
        self.cumulative
            .iter()
            .position(|&c| draw < c)
            .unwrap_or(self.maps.len() - 1)
    }

    /// One chaos-game step
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Point2 {
        let idx = self.select(rng.gen::<f64>());
        self.point = self.maps[idx].apply(self.point);
        match self.capacity {
            Some(0) => {}
            Some(cap) => {
                if self.cloud.len() == cap {
                    self.cloud.pop_front();
                }
                self.cloud.push_back(self.point);
            }
            None => self.cloud.push_back(self.point),
        }
        self.point
    }

    pub fn sample_batch<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize) {
        for _ in 0..count {
            self.step(rng);
        }
    }

    pub fn point(&self) -> Point2 {
        self.point
    }

    /// Recorded points, oldest first
    pub fn cloud(&self) -> &VecDeque<Point2> {
        &self.cloud
    }

    pub fn to_vec(&self) -> Vec<Point2> {
        self.cloud.iter().copied().collect()
    }

    /// Parameters changed: restart from the origin with an empty cloud
    pub fn reset(&mut self) {
        self.point = Point2::ORIGIN;
        self.cloud.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rejects_bad_probabilities() {
        let mut maps = BARNSLEY_FERN;
        maps[0].probability = 0.5;
        assert!(matches!(IfsSampler::new(&maps), Err(KernelError::InvalidProbabilities(_))));
        assert!(IfsSampler::new(&[]).is_err());
    }

    #[test]
    fn test_select_partitions_unit_interval() {
        let sampler = IfsSampler::new(&BARNSLEY_FERN).unwrap();
        assert_eq!(sampler.select(0.0), 0);
        assert_eq!(sampler.select(0.005), 0);
        assert_eq!(sampler.select(0.5), 1);
        assert_eq!(sampler.select(0.9), 2);
        assert_eq!(sampler.select(0.99), 3);
        assert_eq!(sampler.select(0.999_999_9999), 3);
    }

    #[test]
    fn test_fern_stays_in_envelope() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sampler = IfsSampler::new(&BARNSLEY_FERN).unwrap();
        sampler.sample_batch(&mut rng, 20_000);
        for p in sampler.cloud() {
            assert!(p.x > -2.2 && p.x < 2.7, "x out of envelope: {}", p.x);
            assert!(p.y >= 0.0 && p.y < 10.0, "y out of envelope: {}", p.y);
        }
    }

    #[test]
    fn test_selection_frequency() {
        let mut rng = StdRng::seed_from_u64(11);
        let sampler = IfsSampler::new(&BARNSLEY_FERN).unwrap();
        let hits = (0..10_000).filter(|_| sampler.select(rng.gen()) == 1).count();
        let freq = hits as f64 / 10_000.0;
        assert!((freq - 0.85).abs() < 0.03, "frequency {freq}");
    }

    #[test]
    fn test_capacity_keeps_newest() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sampler = IfsSampler::new(&SIERPINSKI).unwrap().with_capacity(100);
        sampler.sample_batch(&mut rng, 250);
        assert_eq!(sampler.cloud().len(), 100);
        assert_eq!(sampler.cloud().back().copied(), Some(sampler.point()));
    }

    #[test]
    fn test_large_capacity_evicts_oldest_in_order() {
        let cap = 100_000;
        let total = 150_000;
        let mut capped = IfsSampler::new(&BARNSLEY_FERN).unwrap().with_capacity(cap);
        capped.sample_batch(&mut StdRng::seed_from_u64(9), total);
        let mut full = IfsSampler::new(&BARNSLEY_FERN).unwrap();
        full.sample_batch(&mut StdRng::seed_from_u64(9), total);

        assert_eq!(capped.cloud().len(), cap);
        assert_eq!(capped.cloud().front(), full.cloud().get(total - cap));
        assert_eq!(capped.cloud().back(), full.cloud().back());
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut sampler = IfsSampler::new(&SIERPINSKI).unwrap().with_capacity(0);
        sampler.sample_batch(&mut StdRng::seed_from_u64(1), 20);
        assert!(sampler.cloud().is_empty());
    }

    #[test]
    fn test_reset_clears_cloud() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut sampler = IfsSampler::new(&SIERPINSKI).unwrap();
        sampler.sample_batch(&mut rng, 10);
        sampler.reset();
        assert!(sampler.cloud().is_empty());
        assert_eq!(sampler.point(), Point2::ORIGIN);
    }

    #[test]
    fn test_seeded_runs_match() {
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut sampler = IfsSampler::new(&BARNSLEY_FERN).unwrap();
            sampler.sample_batch(&mut rng, 500);
            sampler.point()
        };
        assert_eq!(run(42), run(42));
    }
}
