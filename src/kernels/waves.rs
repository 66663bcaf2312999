//! Standing and travelling wave fields
//!
//! - `WaveInterference`: point sources on a circle, amplitude summed per cell
//! - `ChladniPlate`: particles shaken off vibrating regions, collecting on nodal lines

use rand::Rng;
use serde::Serialize;

use super::geometry::Point2;

/// Row-major scalar field in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct WaveInterference {
    width: usize,
    height: usize,
    frequency: f64,
    speed: f64,
    sources: Vec<Point2>,
    time: f64,
}

impl WaveInterference {
    pub fn new(width: usize, height: usize, sources: usize, frequency: f64, speed: f64) -> Self {
        let (w, h) = (width as f64, height as f64);
        let radius = w.min(h) * 0.3;
        let positions = (0..sources)
            .map(|i| {
                let angle = i as f64 / sources as f64 * std::f64::consts::TAU;
                Point2::new(w / 2.0 + angle.cos() * radius, h / 2.0 + angle.sin() * radius)
            })
            .collect();
        Self { width, height, frequency, speed, sources: positions, time: 0.0 }
    }

    pub fn sources(&self) -> &[Point2] {
        &self.sources
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn advance(&mut self) {
        self.time += 0.05 * self.speed;
    }

    /// Normalized amplitude at one cell; 0.5 when there are no sources
    pub fn amplitude(&self, x: f64, y: f64) -> f64 {
        if self.sources.is_empty() {
            return 0.5;
        }
        let falloff = self.width.max(self.height) as f64 * 0.7;
        let sum: f64 = self
            .sources
            .iter()
            .map(|s| {
                let d = s.distance(Point2::new(x, y));
                let decay = if falloff > 0.0 { (1.0 - d / falloff).max(0.0) } else { 0.0 };
                (d * self.frequency - self.time).sin() * decay
            })
            .sum();
        (sum / self.sources.len() as f64 + 1.0) / 2.0
    }

    pub fn field(&self) -> Field {
        let mut values = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                values.push(self.amplitude(x as f64, y as f64));
            }
        }
        Field { width: self.width, height: self.height, values }
    }
}

pub const CHLADNI_PARTICLES: usize = 3000;
const CHLADNI_AMPLITUDE: f64 = 0.01;

/// Plate mode (n, m) for a driving frequency
pub fn chladni_mode(frequency: f64) -> (u32, u32) {
    let f = frequency.max(0.0);
    (1 + (f / 100.0).floor() as u32, 2 + (f / 150.0).floor() as u32)
}

/// cos(nπx)cos(mπy) − cos(mπx)cos(nπy); zero on the nodal lines
pub fn chladni_value(x: f64, y: f64, n: u32, m: u32) -> f64 {
    use std::f64::consts::PI;
    let (n, m) = (n as f64, m as f64);
    (n * PI * x).cos() * (m * PI * y).cos() - (m * PI * x).cos() * (n * PI * y).cos()
}

#[derive(Debug, Clone)]
pub struct ChladniPlate<R> {
    n: u32,
    m: u32,
    particles: Vec<Point2>,
    rng: R,
}

impl<R: Rng> ChladniPlate<R> {
    pub fn new(frequency: f64, particles: usize, mut rng: R) -> Self {
        let (n, m) = chladni_mode(frequency);
        let particles = (0..particles)
            .map(|_| Point2::new(rng.gen::<f64>(), rng.gen::<f64>()))
            .collect();
        Self { n, m, particles, rng }
    }

    pub fn mode(&self) -> (u32, u32) {
        (self.n, self.m)
    }

    pub fn particles(&self) -> &[Point2] {
        &self.particles
    }

    /// Jitter each particle by noise proportional to the local vibration
    pub fn shake(&mut self) {
        for p in &mut self.particles {
            let amount = chladni_value(p.x, p.y, self.n, self.m).abs() * CHLADNI_AMPLITUDE;
            p.x += (self.rng.gen::<f64>() - 0.5) * amount;
            p.y += (self.rng.gen::<f64>() - 0.5) * amount;
            p.x = wrap_unit(p.x);
            p.y = wrap_unit(p.y);
        }
    }
}

/// Leaving one side re-enters at the opposite edge
fn wrap_unit(v: f64) -> f64 {
    if v < 0.0 {
        1.0
    } else if v > 1.0 {
        0.0
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sources_on_circle() {
        let waves = WaveInterference::new(100, 60, 4, 0.1, 1.0);
        assert_eq!(waves.sources().len(), 4);
        for s in waves.sources() {
            assert!((s.distance(Point2::new(50.0, 30.0)) - 18.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_field_is_normalized() {
        let mut waves = WaveInterference::new(40, 30, 3, 0.3, 2.0);
        for _ in 0..5 {
            waves.advance();
            let field = waves.field();
            assert_eq!(field.values.len(), 40 * 30);
            assert!(field.values.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        assert!((waves.time() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_no_sources_is_flat() {
        let waves = WaveInterference::new(8, 8, 0, 0.1, 1.0);
        assert!(waves.field().values.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_chladni_modes() {
        assert_eq!(chladni_mode(0.0), (1, 2));
        assert_eq!(chladni_mode(300.0), (4, 4));
        assert_eq!(chladni_mode(-50.0), (1, 2));
    }

    #[test]
    fn test_chladni_antisymmetric() {
        // Swapping x and y flips the sign, so the diagonal is nodal
        for &(x, y) in &[(0.1, 0.7), (0.33, 0.2), (0.5, 0.9)] {
            assert!((chladni_value(x, y, 1, 2) + chladni_value(y, x, 1, 2)).abs() < 1e-12);
        }
        assert!(chladni_value(0.4, 0.4, 3, 5).abs() < 1e-12);
    }

    #[test]
    fn test_particles_stay_in_unit_square() {
        let mut plate = ChladniPlate::new(250.0, 500, StdRng::seed_from_u64(21));
        for _ in 0..100 {
            plate.shake();
        }
        assert_eq!(plate.particles().len(), 500);
        assert!(plate.particles().iter().all(|p| (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y)));
    }
}
