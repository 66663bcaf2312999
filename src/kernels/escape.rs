//! Mandelbrot and Julia escape-time evaluation
//!
//! z_{n+1} = z_n^2 + c, starting from z = 0 (Mandelbrot) or from the
//! plane coordinate itself (Julia).
//!
//! Iteration-count convention: the count is the number of z² + c
//! applications performed before |z|² > 4 was observed. A point already
//! outside the radius reports 0; a Mandelbrot c outside the radius
//! reports 1; a point that never escapes reports the bound.

use num_complex::Complex64;
use serde::Serialize;

/// Squared escape radius
pub const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// Raw per-pixel result, enough for smooth colouring
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EscapeSample {
    pub iterations: u32,
    /// |z|² at the point the loop stopped
    pub modulus_sq: f64,
    pub escaped: bool,
}

impl EscapeSample {
    /// Continuous (normalized) iteration count; interior points return
    /// the raw count.
    pub fn smooth(&self) -> f64 {
        if !self.escaped || self.modulus_sq <= 1.0 {
            return self.iterations as f64;
        }
        let log_modulus = 0.5 * self.modulus_sq.ln();
        self.iterations as f64 + 1.0 - log_modulus.ln() / std::f64::consts::LN_2
    }
}

/// Iterate z ← z² + c from `z0`. Pure; safe to evaluate per pixel in any order.
pub fn iterate(z0: Complex64, c: Complex64, max_iterations: u32) -> EscapeSample {
    let mut z = z0;
    let mut n = 0;
    while z.norm_sqr() <= ESCAPE_RADIUS_SQ && n < max_iterations {
        z = z * z + c;
        n += 1;
    }
    let modulus_sq = z.norm_sqr();
    EscapeSample { iterations: n, modulus_sq, escaped: modulus_sq > ESCAPE_RADIUS_SQ }
}

pub fn mandelbrot(c: Complex64, max_iterations: u32) -> EscapeSample {
    iterate(Complex64::new(0.0, 0.0), c, max_iterations)
}

pub fn julia(z: Complex64, c: Complex64, max_iterations: u32) -> EscapeSample {
    iterate(z, c, max_iterations)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EscapeKind {
    Mandelbrot,
    Julia { c: Complex64 },
}

/// Pixel grid -> complex plane mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneView {
    pub width: usize,
    pub height: usize,
    pub center: Complex64,
    pub span_re: f64,
    pub span_im: f64,
}

fn guard_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() && zoom > 0.0 {
        zoom
    } else {
        1.0
    }
}

impl PlaneView {
    /// 3.5 units across at zoom 1, panned to (offset_x, offset_y)
    pub fn mandelbrot(width: usize, height: usize, zoom: f64, offset_x: f64, offset_y: f64) -> Self {
        let span = 3.5 / guard_zoom(zoom);
        Self {
            width,
            height,
            center: Complex64::new(offset_x, offset_y),
            span_re: span,
            span_im: span,
        }
    }

    /// [-1.5, 1.5] × [-1, 1] at zoom 1, centred on the origin
    pub fn julia(width: usize, height: usize, zoom: f64) -> Self {
        let zoom = guard_zoom(zoom);
        Self {
            width,
            height,
            center: Complex64::new(0.0, 0.0),
            span_re: 3.0 / zoom,
            span_im: 2.0 / zoom,
        }
    }

    pub fn pixel_to_complex(&self, px: usize, py: usize) -> Complex64 {
        let w = self.width.max(1) as f64;
        let h = self.height.max(1) as f64;
        Complex64::new(
            self.center.re + (px as f64 - w / 2.0) * (self.span_re / w),
            self.center.im + (py as f64 - h / 2.0) * (self.span_im / h),
        )
    }
}

/// Row-major buffer of samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscapeField {
    pub width: usize,
    pub height: usize,
    pub max_iterations: u32,
    pub samples: Vec<EscapeSample>,
}

impl EscapeField {
    pub fn get(&self, px: usize, py: usize) -> Option<&EscapeSample> {
        if px >= self.width || py >= self.height {
            return None;
        }
        self.samples.get(py * self.width + px)
    }

    pub fn interior_count(&self) -> usize {
        self.samples.iter().filter(|s| !s.escaped).count()
    }
}

pub fn render(view: &PlaneView, kind: EscapeKind, max_iterations: u32) -> EscapeField {
    let mut samples = Vec::with_capacity(view.width * view.height);
    for py in 0..view.height {
        for px in 0..view.width {
            let point = view.pixel_to_complex(px, py);
            let sample = match kind {
                EscapeKind::Mandelbrot => mandelbrot(point, max_iterations),
                EscapeKind::Julia { c } => julia(point, c, max_iterations),
            };
            samples.push(sample);
        }
    }

    let field = EscapeField { width: view.width, height: view.height, max_iterations, samples };
    tracing::debug!(
        width = field.width,
        height = field.height,
        interior = field.interior_count(),
        "escape field rendered"
    );
    field
}

/// Predefined interesting Julia set parameters
pub struct JuliaPoint {
    pub name: &'static str,
    pub c_re: f64,
    pub c_im: f64,
}

pub const JULIA_POINTS: &[JuliaPoint] = &[
    JuliaPoint { name: "rabbit", c_re: -0.123, c_im: 0.745 },
    JuliaPoint { name: "dendrite", c_re: 0.0, c_im: 1.0 },
    JuliaPoint { name: "dragon", c_re: -0.8, c_im: 0.156 },
    JuliaPoint { name: "spiral", c_re: -0.4, c_im: 0.6 },
    JuliaPoint { name: "siegel", c_re: -0.391, c_im: -0.587 },
    JuliaPoint { name: "san_marco", c_re: -0.75, c_im: 0.0 },
];

pub fn julia_point(name: &str) -> Option<Complex64> {
    JULIA_POINTS
        .iter()
        .find(|p| p.name == name)
        .map(|p| Complex64::new(p.c_re, p.c_im))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_never_escapes() {
        for bound in [1, 10, 100, 10_000] {
            let s = mandelbrot(Complex64::new(0.0, 0.0), bound);
            assert_eq!(s.iterations, bound);
            assert!(!s.escaped);
        }
    }

    #[test]
    fn test_outside_radius_escapes_after_one_step() {
        let s = mandelbrot(Complex64::new(2.5, 0.0), 100);
        assert_eq!(s.iterations, 1);
        assert!(s.escaped);

        let s = mandelbrot(Complex64::new(0.0, -3.0), 100);
        assert_eq!(s.iterations, 1);
    }

    #[test]
    fn test_julia_start_outside_reports_zero() {
        let s = julia(Complex64::new(3.0, 0.0), Complex64::new(-0.8, 0.156), 50);
        assert_eq!(s.iterations, 0);
        assert!(s.escaped);
    }

    #[test]
    fn test_cardioid_point_bounded() {
        let s = mandelbrot(Complex64::new(-0.5, 0.0), 1000);
        assert!(!s.escaped);
    }

    #[test]
    fn test_smooth_count_is_continuous_near_integer() {
        let s = mandelbrot(Complex64::new(0.4, 0.4), 200);
        assert!(s.escaped);
        let smooth = s.smooth();
        assert!(smooth.is_finite());
        assert!((smooth - s.iterations as f64).abs() < 2.0);
    }

    #[test]
    fn test_view_centre_pixel_maps_to_offset() {
        let view = PlaneView::mandelbrot(400, 400, 1.0, -0.5, 0.0);
        let c = view.pixel_to_complex(200, 200);
        assert!((c.re + 0.5).abs() < 1e-12);
        assert!(c.im.abs() < 1e-12);
        let corner = view.pixel_to_complex(0, 0);
        assert!((corner.re - (-0.5 - 1.75)).abs() < 1e-12);
    }

    #[test]
    fn test_zero_zoom_is_guarded() {
        let view = PlaneView::julia(10, 10, 0.0);
        assert_eq!(view.span_re, 3.0);
    }

    #[test]
    fn test_render_is_deterministic() {
        let view = PlaneView::julia(32, 24, 1.0);
        let c = julia_point("rabbit").unwrap();
        let a = render(&view, EscapeKind::Julia { c }, 50);
        let b = render(&view, EscapeKind::Julia { c }, 50);
        assert_eq!(a, b);
        assert_eq!(a.samples.len(), 32 * 24);
        assert!(a.get(32, 0).is_none());
    }
}
