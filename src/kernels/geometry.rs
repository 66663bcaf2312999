//! Shared geometry - points, segments, bounding boxes and 3D projection
//!
//! Kernels emit geometry in their own unit space. The host fits that
//! space to a viewport with [`BoundingBox::fit`].

use serde::Serialize;

/// Scale used when the bounding box has no extent on either axis
pub const FALLBACK_SCALE: f64 = 1.0;

/// Extents below this are treated as zero
const MIN_EXTENT: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ORIGIN: Point2 = Point2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A drawn line segment, never mutated after emission
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
}

impl Segment {
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// Axis-aligned running bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Zero-area box around a single point
    pub fn at(p: Point2) -> Self {
        Self { min_x: p.x, min_y: p.y, max_x: p.x, max_y: p.y }
    }

    pub fn include(&mut self, p: Point2) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Uniform scale + centering that fits this box into a viewport,
    /// keeping `padding` pixels free on every side.
    ///
    /// An axis with no extent does not constrain the scale. If neither
    /// axis has extent the scale falls back to [`FALLBACK_SCALE`].
    pub fn fit(&self, width: f64, height: f64, padding: f64) -> ViewTransform {
        let avail_w = (width - padding * 2.0).max(0.0);
        let avail_h = (height - padding * 2.0).max(0.0);

        let mut scale = f64::INFINITY;
        if self.width() > MIN_EXTENT {
            scale = scale.min(avail_w / self.width());
        }
        if self.height() > MIN_EXTENT {
            scale = scale.min(avail_h / self.height());
        }
        if !scale.is_finite() || scale <= 0.0 {
            scale = FALLBACK_SCALE;
        }

        ViewTransform {
            scale,
            offset_x: (width - self.width() * scale) / 2.0 - self.min_x * scale,
            offset_y: (height - self.height() * scale) / 2.0 - self.min_y * scale,
        }
    }
}

/// Unit space -> viewport mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ViewTransform {
    pub fn apply(&self, p: Point2) -> Point2 {
        Point2::new(p.x * self.scale + self.offset_x, p.y * self.scale + self.offset_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    pub fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    pub fn scale(self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn midpoint(self, o: Vec3) -> Vec3 {
        self.add(o).scale(0.5)
    }

    pub fn dot(self, o: Vec3) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    pub fn cross(self, o: Vec3) -> Vec3 {
        Vec3::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }
}

/// Rotate `v` around `axis` by `theta` radians (Rodrigues' formula).
///
/// The axis is normalized here; a zero axis leaves `v` unchanged.
pub fn rodrigues_rotate(v: Vec3, axis: Vec3, theta: f64) -> Vec3 {
    let len = axis.length();
    if len < MIN_EXTENT {
        return v;
    }
    let k = axis.scale(1.0 / len);
    let (sin_t, cos_t) = theta.sin_cos();

    v.scale(cos_t)
        .add(k.cross(v).scale(sin_t))
        .add(k.scale(k.dot(v) * (1.0 - cos_t)))
}

pub fn rotate_x(v: Vec3, angle: f64) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(v.x, v.y * cos - v.z * sin, v.y * sin + v.z * cos)
}

pub fn rotate_y(v: Vec3, angle: f64) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(v.x * cos - v.z * sin, v.y, v.x * sin + v.z * cos)
}

/// Simple pinhole projection onto the z = 0 plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Perspective {
    pub fov: f64,
    pub distance: f64,
}

impl Default for Perspective {
    fn default() -> Self {
        Self { fov: 300.0, distance: 400.0 }
    }
}

impl Perspective {
    /// Projected point (relative to the viewport centre) and its scale factor.
    /// Points at or behind the eye get a zero scale.
    pub fn project(&self, v: Vec3) -> (Point2, f64) {
        let depth = self.distance + v.z;
        let scale = if depth > MIN_EXTENT { self.fov / depth } else { 0.0 };
        (Point2::new(v.x * scale, v.y * scale), scale)
    }
}
