//! Recursive spatial subdivision
//!
//! A primitive either stays as a leaf (depth budget spent) or splits into
//! its retained children, which continue with one less unit of budget.
//! Cost is exponential in depth: 3^d triangles, 4^d tetrahedra, 20^d cubes.

use serde::Serialize;

use super::geometry::{rodrigues_rotate, rotate_x, rotate_y, Perspective, Point2, Vec3};

/// A primitive that knows how to split itself
pub trait Subdivide: Sized {
    /// Children kept by the fractal rule (removed ones are never produced)
    fn children(&self) -> Vec<Self>;
}

/// Expand `root` to `depth` levels and return the leaves in emission order.
///
/// Uses an explicit stack so deep budgets cannot overflow the call stack.
pub fn subdivide<P: Subdivide>(root: P, depth: u32) -> Vec<P> {
    let mut leaves = Vec::new();
    let mut stack = vec![(root, depth)];

    while let Some((primitive, budget)) = stack.pop() {
        if budget == 0 {
            leaves.push(primitive);
            continue;
        }
        // Reverse so the first child is processed first
        for child in primitive.children().into_iter().rev() {
            stack.push((child, budget - 1));
        }
    }

    tracing::debug!(depth, leaves = leaves.len(), "subdivision complete");
    leaves
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Triangle {
    pub vertices: [Point2; 3],
}

impl Triangle {
    /// Upward-pointing equilateral triangle of side `size` with its base
    /// centred on `base_center` (screen coordinates, y down)
    pub fn equilateral(base_center: Point2, size: f64) -> Self {
        let h = size * 3f64.sqrt() / 2.0;
        Self {
            vertices: [
                Point2::new(base_center.x, base_center.y - h),
                Point2::new(base_center.x - size / 2.0, base_center.y),
                Point2::new(base_center.x + size / 2.0, base_center.y),
            ],
        }
    }

    pub fn area(&self) -> f64 {
        let [a, b, c] = self.vertices;
        ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() / 2.0
    }
}

fn mid2(a: Point2, b: Point2) -> Point2 {
    Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

impl Subdivide for Triangle {
    /// The three corner triangles; the middle one is removed
    fn children(&self) -> Vec<Self> {
        let [p1, p2, p3] = self.vertices;
        let m12 = mid2(p1, p2);
        let m23 = mid2(p2, p3);
        let m31 = mid2(p3, p1);
        vec![
            Triangle { vertices: [p1, m12, m31] },
            Triangle { vertices: [m12, p2, m23] },
            Triangle { vertices: [m31, m23, p3] },
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tetrahedron {
    pub vertices: [Vec3; 4],
}

/// Vertex index pairs for the six edges
pub const TETRAHEDRON_EDGES: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

impl Tetrahedron {
    /// Regular tetrahedron inscribed in the cube [-r, r]³
    pub fn regular(r: f64) -> Self {
        Self {
            vertices: [
                Vec3::new(r, r, r),
                Vec3::new(-r, -r, r),
                Vec3::new(-r, r, -r),
                Vec3::new(r, -r, -r),
            ],
        }
    }

    /// Edges rotated about `axis` by `angle` and projected to 2D
    pub fn projected_edges(&self, axis: Vec3, angle: f64, camera: &Perspective) -> Vec<(Point2, Point2)> {
        let projected: Vec<Point2> = self
            .vertices
            .iter()
            .map(|&v| camera.project(rodrigues_rotate(v, axis, angle)).0)
            .collect();
        TETRAHEDRON_EDGES
            .iter()
            .map(|&(i, j)| (projected[i], projected[j]))
            .collect()
    }

    pub fn edge_length(&self) -> f64 {
        self.vertices[0].sub(self.vertices[1]).length()
    }
}

impl Subdivide for Tetrahedron {
    /// One half-scale tetrahedron per corner; the central octahedron is removed
    fn children(&self) -> Vec<Self> {
        let [v0, v1, v2, v3] = self.vertices;
        let m01 = v0.midpoint(v1);
        let m02 = v0.midpoint(v2);
        let m03 = v0.midpoint(v3);
        let m12 = v1.midpoint(v2);
        let m13 = v1.midpoint(v3);
        let m23 = v2.midpoint(v3);
        vec![
            Tetrahedron { vertices: [v0, m01, m02, m03] },
            Tetrahedron { vertices: [m01, v1, m12, m13] },
            Tetrahedron { vertices: [m02, m12, v2, m23] },
            Tetrahedron { vertices: [m03, m13, m23, v3] },
        ]
    }
}

/// Axis-aligned cube given by its centre and edge length
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cube {
    pub center: Vec3,
    pub size: f64,
}

impl Cube {
    pub fn new(center: Vec3, size: f64) -> Self {
        Self { center, size }
    }
}

/// Projected squares smaller than this are dropped
pub const MIN_PROJECTED_SIZE: f64 = 1.0;

/// A cube as seen by the camera: screen centre, apparent edge and view depth
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedCube {
    pub center: Point2,
    pub size: f64,
    pub depth: f64,
}

/// Rotate each cube centre about Y then X, project it, and sort by view depth
/// (ascending). Cubes narrower than `MIN_PROJECTED_SIZE` on screen are skipped.
pub fn project_cubes(cubes: &[Cube], rotation_x: f64, rotation_y: f64, camera: &Perspective) -> Vec<ProjectedCube> {
    let mut projected: Vec<ProjectedCube> = cubes
        .iter()
        .filter_map(|cube| {
            let rotated = rotate_x(rotate_y(cube.center, rotation_y), rotation_x);
            let (center, scale) = camera.project(rotated);
            let size = cube.size * scale;
            (size >= MIN_PROJECTED_SIZE).then_some(ProjectedCube { center, size, depth: rotated.z })
        })
        .collect();
    projected.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    projected
}

/// A sub-cube is removed when two or more of its grid coordinates are central
fn menger_removed(dx: usize, dy: usize, dz: usize) -> bool {
    [dx, dy, dz].iter().filter(|&&d| d == 1).count() >= 2
}

impl Subdivide for Cube {
    /// 20 of the 27 third-scale sub-cubes (Menger sponge step)
    fn children(&self) -> Vec<Self> {
        let size = self.size / 3.0;
        let mut cubes = Vec::with_capacity(20);
        for dx in 0..3 {
            for dy in 0..3 {
                for dz in 0..3 {
                    if menger_removed(dx, dy, dz) {
                        continue;
                    }
                    let offset = Vec3::new(dx as f64 - 1.0, dy as f64 - 1.0, dz as f64 - 1.0).scale(size);
                    cubes.push(Cube::new(self.center.add(offset), size));
                }
            }
        }
        cubes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_zero_emits_root() {
        let t = Triangle::equilateral(Point2::new(0.0, 0.0), 1.0);
        assert_eq!(subdivide(t, 0), vec![t]);
    }

    #[test]
    fn test_triangle_counts_and_area() {
        let t = Triangle::equilateral(Point2::new(0.0, 0.0), 2.0);
        for depth in 0..6 {
            let leaves = subdivide(t, depth);
            assert_eq!(leaves.len(), 3usize.pow(depth));
            // Each level keeps 3/4 of the area
            let area: f64 = leaves.iter().map(Triangle::area).sum();
            assert!((area - t.area() * 0.75f64.powi(depth as i32)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_tetrahedron_counts_and_scale() {
        let root = Tetrahedron::regular(200.0);
        let leaves = subdivide(root, 3);
        assert_eq!(leaves.len(), 64);
        assert!((leaves[0].edge_length() - root.edge_length() / 8.0).abs() < 1e-9);
        // First leaf keeps the first root corner
        assert_eq!(leaves[0].vertices[0], root.vertices[0]);
    }

    #[test]
    fn test_menger_removes_seven() {
        let cube = Cube::new(Vec3::ZERO, 27.0);
        let children = cube.children();
        assert_eq!(children.len(), 20);
        assert!(children.iter().all(|c| (c.size - 9.0).abs() < 1e-12));
        // Body centre and face centres are gone
        assert!(!children.iter().any(|c| c.center == Vec3::ZERO));
        assert!(!children.iter().any(|c| c.center == Vec3::new(9.0, 0.0, 0.0)));
        // Edge and corner cubes survive
        assert!(children.iter().any(|c| c.center == Vec3::new(9.0, 9.0, 0.0)));
        assert!(children.iter().any(|c| c.center == Vec3::new(-9.0, -9.0, -9.0)));
    }

    #[test]
    fn test_menger_depth_two() {
        let leaves = subdivide(Cube::new(Vec3::ZERO, 1.0), 2);
        assert_eq!(leaves.len(), 400);
    }

    #[test]
    fn test_projected_cubes_sorted_by_depth() {
        let cubes = subdivide(Cube::new(Vec3::ZERO, 200.0), 1);
        let projected = project_cubes(&cubes, 0.5, 0.3, &Perspective::default());
        assert_eq!(projected.len(), 20);
        assert!(projected.windows(2).all(|w| w[0].depth <= w[1].depth));
        // Nearer cubes appear larger
        assert!(projected[0].size > projected[19].size);
    }

    #[test]
    fn test_projected_cube_scale() {
        let camera = Perspective::default();
        let cube = Cube::new(Vec3::new(0.0, 0.0, 100.0), 50.0);
        let projected = project_cubes(&[cube], 0.0, 0.0, &camera);
        // fov / (distance + z) = 300 / 500
        assert!((projected[0].size - 30.0).abs() < 1e-9);
        assert_eq!(projected[0].center, Point2::new(0.0, 0.0));
        assert_eq!(projected[0].depth, 100.0);

        // Quarter turn about Y carries +x onto +z
        let side = Cube::new(Vec3::new(100.0, 0.0, 0.0), 50.0);
        let turned = project_cubes(&[side], 0.0, std::f64::consts::FRAC_PI_2, &camera);
        assert!((turned[0].depth - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_tiny_projected_cubes_skipped() {
        let cubes = [Cube::new(Vec3::ZERO, 1.0), Cube::new(Vec3::ZERO, 0.5)];
        let projected = project_cubes(&cubes, 0.0, 0.0, &Perspective::default());
        // 0.75 and 0.375 px
        assert!(projected.is_empty());
    }

    #[test]
    fn test_projected_edges_count() {
        let edges = Tetrahedron::regular(1.0).projected_edges(Vec3::new(0.0, 1.0, 0.0), 0.3, &Perspective::default());
        assert_eq!(edges.len(), 6);
    }
}
