//! Closed-form parametric figures
//!
//! Unit-scale point sequences; the host scales and centres them.

use serde::Serialize;

use super::geometry::Point2;

/// Golden angle in degrees used for sunflower packing
pub const GOLDEN_ANGLE_DEGREES: f64 = 137.5;

/// Seed n sits at radius spacing·√n and angle n·137.5°
pub fn phyllotaxis(count: usize, spacing: f64) -> Vec<Point2> {
    let golden = GOLDEN_ANGLE_DEGREES.to_radians();
    (0..count)
        .map(|n| {
            let r = spacing * (n as f64).sqrt();
            let theta = n as f64 * golden;
            Point2::new(r * theta.cos(), r * theta.sin())
        })
        .collect()
}

fn rose_point(n: f64, k: f64) -> Point2 {
    let r = (n * k).sin();
    Point2::new(r * k.cos(), r * k.sin())
}

/// Rose r = sin(n·θ) sampled once per degree, 361 vertices
pub fn rose_curve(n: f64) -> Vec<Point2> {
    (0..=360).map(|i| rose_point(n, (i as f64).to_radians())).collect()
}

/// Maurer rose: the rose visited in steps of `d` degrees, joined as a polyline
pub fn maurer_rose(n: f64, d: f64) -> Vec<Point2> {
    (0..=360).map(|i| rose_point(n, (i as f64 * d).to_radians())).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Superformula {
    pub m: f64,
    pub n1: f64,
    pub n2: f64,
    pub n3: f64,
}

impl Superformula {
    pub fn radius(&self, phi: f64) -> f64 {
        let part1 = (self.m * phi / 4.0).cos().abs().powf(self.n2);
        let part2 = (self.m * phi / 4.0).sin().abs().powf(self.n3);
        (part1 + part2).powf(-1.0 / self.n1)
    }

    /// Two turns at half-degree resolution; non-finite radii are skipped
    pub fn outline(&self) -> Vec<Point2> {
        let samples = 720;
        (0..=samples)
            .filter_map(|i| {
                let phi = i as f64 / 360.0 * std::f64::consts::TAU;
                let r = self.radius(phi);
                r.is_finite().then(|| Point2::new(r * phi.cos(), r * phi.sin()))
            })
            .collect()
    }
}

/// Equal circles on a hexagonal lattice plus a bounding circle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowerOfLife {
    pub radius: f64,
    pub centers: Vec<Point2>,
    pub boundary_radius: f64,
}

fn hex_corner(i: usize, distance: f64) -> Point2 {
    let angle = (i as f64 * 60.0).to_radians();
    Point2::new(angle.cos() * distance, angle.sin() * distance)
}

pub fn flower_of_life(layers: u32, radius: f64) -> FlowerOfLife {
    let mut centers = vec![Point2::ORIGIN];
    for ring in 1..=layers as usize {
        let distance = radius * ring as f64;
        for i in 0..6 {
            let start = hex_corner(i, distance);
            let end = hex_corner(i + 1, distance);
            centers.push(start);
            // Edge circles between adjacent tips
            for j in 1..ring {
                let t = j as f64 / ring as f64;
                centers.push(Point2::new(start.x + (end.x - start.x) * t, start.y + (end.y - start.y) * t));
            }
        }
    }

    FlowerOfLife {
        radius,
        centers,
        boundary_radius: radius * (layers as f64 + 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phyllotaxis_radius_grows_with_sqrt() {
        let points = phyllotaxis(100, 4.0);
        assert_eq!(points.len(), 100);
        assert_eq!(points[0], Point2::ORIGIN);
        assert!((points[25].distance(Point2::ORIGIN) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_rose_vertices_on_unit_disc() {
        let rose = maurer_rose(6.0, 71.0);
        assert_eq!(rose.len(), 361);
        assert!(rose.iter().all(|p| p.distance(Point2::ORIGIN) <= 1.0 + 1e-12));
        // d = 1 reproduces the plain rose
        assert_eq!(maurer_rose(4.0, 1.0), rose_curve(4.0));
    }

    #[test]
    fn test_superformula_circle() {
        // m = 0 with n1 = n2 = n3 = 1 is the unit circle
        let shape = Superformula { m: 0.0, n1: 1.0, n2: 1.0, n3: 1.0 };
        let outline = shape.outline();
        assert_eq!(outline.len(), 721);
        assert!(outline.iter().all(|p| (p.distance(Point2::ORIGIN) - 1.0).abs() < 1e-9));
    }

    #[test]
    fn test_superformula_skips_non_finite() {
        // n1 = 0 makes every radius non-finite
        let shape = Superformula { m: 6.0, n1: 0.0, n2: 1.0, n3: 1.0 };
        assert!(shape.outline().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_flower_hexagonal_counts() {
        for layers in 0..5u32 {
            let flower = flower_of_life(layers, 30.0);
            let l = layers as usize;
            assert_eq!(flower.centers.len(), 3 * l * (l + 1) + 1);
            assert_eq!(flower.boundary_radius, 30.0 * (layers as f64 + 1.0));
        }
    }

    #[test]
    fn test_flower_first_ring_touches_centre() {
        let flower = flower_of_life(1, 30.0);
        for c in &flower.centers[1..] {
            assert!((c.distance(Point2::ORIGIN) - 30.0).abs() < 1e-9);
        }
    }
}
