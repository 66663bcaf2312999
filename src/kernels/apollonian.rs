//! Apollonian gasket via the Descartes circle theorem
//!
//! Curvatures: k4 = k1 + k2 + k3 ± 2·sqrt(k1k2 + k2k3 + k3k1)
//! Centres (complex form, z = centre as a complex number):
//!   k4·z4 = k1z1 + k2z2 + k3z3 ± 2·sqrt(k1k2z1z2 + k2k3z2z3 + k3k1z3z1)
//!
//! Curvature is signed: the enclosing circle carries a negative curvature.
//! Candidates that are not tangent to all three parents, leave the
//! enclosing circle, fall outside the radius limits or repeat an existing
//! circle are dropped silently.

use std::collections::HashMap;

use num_complex::Complex64;
use serde::Serialize;

/// Curvatures closer to zero than this describe a straight line
const MIN_CURVATURE: f64 = 1e-9;

/// Relative slack when checking tangency of a candidate centre
const TANGENCY_TOLERANCE: f64 = 1e-4;

/// Relative slack when checking containment in the enclosing circle
const CONTAINMENT_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub curvature: f64,
}

impl Circle {
    /// Circle from a centre and signed curvature
    pub fn new(x: f64, y: f64, curvature: f64) -> Self {
        Self { x, y, r: 1.0 / curvature.abs(), curvature }
    }

    pub fn center(&self) -> Complex64 {
        Complex64::new(self.x, self.y)
    }

    fn distance_to(&self, other: &Circle) -> f64 {
        (self.center() - other.center()).norm()
    }

    /// Externally tangent for two positive curvatures, internally tangent
    /// when either one encloses the other
    pub fn is_tangent_to(&self, other: &Circle) -> bool {
        let expected = if self.curvature < 0.0 || other.curvature < 0.0 {
            (self.r - other.r).abs()
        } else {
            self.r + other.r
        };
        (self.distance_to(other) - expected).abs() <= TANGENCY_TOLERANCE * (self.r + other.r)
    }
}

/// The two curvatures completing a Descartes quadruple
pub fn descartes_curvatures(k1: f64, k2: f64, k3: f64) -> (f64, f64) {
    let sum = k1 + k2 + k3;
    // Rounding can push an exactly-zero discriminant slightly negative
    let root = 2.0 * (k1 * k2 + k2 * k3 + k3 * k1).max(0.0).sqrt();
    (sum + root, sum - root)
}

/// Both centre candidates for curvature `k4`, or `None` when k4 ≈ 0
pub fn descartes_centers(c1: &Circle, c2: &Circle, c3: &Circle, k4: f64) -> Option<[Complex64; 2]> {
    if !k4.is_finite() || k4.abs() < MIN_CURVATURE {
        return None;
    }
    let (w1, w2, w3) = (
        c1.center() * c1.curvature,
        c2.center() * c2.curvature,
        c3.center() * c3.curvature,
    );
    let sum = w1 + w2 + w3;
    let root = (w1 * w2 + w2 * w3 + w3 * w1).sqrt() * 2.0;
    Some([(sum + root) / k4, (sum - root) / k4])
}

/// Every circle tangent to all three parents, for both curvature roots
pub fn companions(c1: &Circle, c2: &Circle, c3: &Circle) -> Vec<Circle> {
    let (ka, kb) = descartes_curvatures(c1.curvature, c2.curvature, c3.curvature);
    let mut found: Vec<Circle> = Vec::new();

    for k4 in [ka, kb] {
        let Some(centers) = descartes_centers(c1, c2, c3, k4) else {
            continue;
        };
        for z in centers {
            if !z.re.is_finite() || !z.im.is_finite() {
                continue;
            }
            let candidate = Circle::new(z.re, z.im, k4);
            let tangent = [c1, c2, c3].iter().all(|p| candidate.is_tangent_to(p));
            let repeated = found
                .iter()
                .any(|f| f.curvature == k4 && (f.center() - z).norm() < 1e-9 * candidate.r.max(1.0));
            if tangent && !repeated {
                found.push(candidate);
            }
        }
    }
    found
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackingConfig {
    pub center_x: f64,
    pub center_y: f64,
    /// Radius of the enclosing circle
    pub radius: f64,
    /// Generations generated after the seed circles
    pub depth: u32,
    /// Smallest radius kept
    pub min_radius: f64,
    /// Two circles closer than this in x, y and r are the same circle
    pub dedup_epsilon: f64,
}

impl PackingConfig {
    pub fn new(radius: f64, depth: u32) -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            radius,
            depth,
            min_radius: 2.0,
            dedup_epsilon: 1.0,
        }
    }
}

/// A growing set of mutually non-overlapping circles
#[derive(Debug, Clone)]
pub struct Packing {
    config: PackingConfig,
    circles: Vec<Circle>,
    /// Spatial hash on centres, cell size = dedup epsilon
    buckets: HashMap<(i64, i64), Vec<usize>>,
    /// Pending triples of mutually tangent circles with their generation
    pending: Vec<([usize; 3], u32)>,
}

impl Packing {
    /// Enclosing circle, two half-radius circles side by side and the two
    /// circles filling the gaps above and below them
    pub fn standard(config: PackingConfig) -> Self {
        let (cx, cy, big) = (config.center_x, config.center_y, config.radius);
        let outer = Circle::new(cx, cy, -1.0 / big);
        let left = Circle::new(cx - big / 2.0, cy, 2.0 / big);
        let right = Circle::new(cx + big / 2.0, cy, 2.0 / big);
        let (k4, _) = descartes_curvatures(outer.curvature, left.curvature, right.curvature);
        let r4 = 1.0 / k4.abs();
        let top = Circle::new(cx, cy - big + r4, k4);
        let bottom = Circle::new(cx, cy + big - r4, k4);

        let triples = vec![
            [0, 1, 2],
            [0, 1, 3],
            [0, 2, 3],
            [1, 2, 3],
            [0, 1, 4],
            [0, 2, 4],
            [1, 2, 4],
        ];
        Self::with_seed(config, vec![outer, left, right, top, bottom], triples)
    }

    /// Start from arbitrary seed circles (index 0 must be the enclosing one)
    /// and the triples of mutually tangent seeds to grow from
    pub fn with_seed(config: PackingConfig, seeds: Vec<Circle>, triples: Vec<[usize; 3]>) -> Self {
        let mut packing = Self {
            config,
            circles: Vec::with_capacity(seeds.len()),
            buckets: HashMap::new(),
            pending: Vec::new(),
        };
        for seed in seeds {
            packing.insert(seed);
        }
        // Reverse so the first triple is processed first
        packing.pending = triples.into_iter().rev().map(|t| (t, 0)).collect();
        packing
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    fn bucket_key(&self, x: f64, y: f64) -> (i64, i64) {
        let eps = self.config.dedup_epsilon.max(f64::EPSILON);
        ((x / eps).floor() as i64, (y / eps).floor() as i64)
    }

    fn insert(&mut self, circle: Circle) -> usize {
        let idx = self.circles.len();
        let key = self.bucket_key(circle.x, circle.y);
        self.circles.push(circle);
        self.buckets.entry(key).or_default().push(idx);
        idx
    }

    fn is_duplicate(&self, candidate: &Circle) -> bool {
        let eps = self.config.dedup_epsilon;
        let (bx, by) = self.bucket_key(candidate.x, candidate.y);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = self.buckets.get(&(bx + dx, by + dy)) else {
                    continue;
                };
                let hit = bucket.iter().any(|&i| {
                    let c = &self.circles[i];
                    (c.x - candidate.x).abs() < eps
                        && (c.y - candidate.y).abs() < eps
                        && (c.r - candidate.r).abs() < eps
                });
                if hit {
                    return true;
                }
            }
        }
        false
    }

    fn accepts(&self, candidate: &Circle) -> bool {
        let cfg = &self.config;
        if !candidate.curvature.is_finite() || candidate.curvature <= 0.0 {
            return false;
        }
        if !candidate.r.is_finite() || candidate.r < cfg.min_radius || candidate.r > cfg.radius * 2.0 {
            return false;
        }
        let from_center = ((candidate.x - cfg.center_x).powi(2) + (candidate.y - cfg.center_y).powi(2)).sqrt();
        if from_center + candidate.r > cfg.radius * (1.0 + CONTAINMENT_TOLERANCE) {
            return false;
        }
        !self.is_duplicate(candidate)
    }

    /// Run the work-list until every triple below the depth budget is spent
    pub fn generate(&mut self) {
        while let Some(([a, b, c], level)) = self.pending.pop() {
            if level >= self.config.depth {
                continue;
            }
            let (ca, cb, cc) = (self.circles[a], self.circles[b], self.circles[c]);
            for candidate in companions(&ca, &cb, &cc) {
                if !self.accepts(&candidate) {
                    continue;
                }
                let n = self.insert(candidate);
                self.pending.push(([b, c, n], level + 1));
                self.pending.push(([a, c, n], level + 1));
                self.pending.push(([a, b, n], level + 1));
            }
        }
        tracing::debug!(depth = self.config.depth, circles = self.circles.len(), "packing complete");
    }
}

/// Standard gasket generated to `config.depth`
pub fn apollonian_gasket(config: PackingConfig) -> Vec<Circle> {
    let mut packing = Packing::standard(config);
    packing.generate();
    packing.circles
}
