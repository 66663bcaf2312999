//! 3-D binary branching (bronchial tree)

use serde::Serialize;

use super::geometry::{rotate_y, Perspective, Point2, Vec3};

pub const TRUNK_LENGTH: f64 = 120.0;
pub const TRUNK_WIDTH: f64 = 12.0;
pub const LENGTH_RATIO: f64 = 0.7;
pub const SPREAD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Branch {
    pub start: Vec3,
    pub end: Vec3,
    pub width: f64,
    pub level: u32,
}

/// Breathing scale at time `t` seconds: 1 ± 10%
pub fn breathing_scale(t: f64) -> f64 {
    1.0 + (t * 2.0).sin() * 0.1
}

/// Every branch down to `depth`, trunk first, y pointing up.
///
/// Each branch forks into two children rotated by ±SPREAD on both the
/// azimuth and the tilt, at 0.7 times the parent length.
pub fn bronchial_tree(depth: u32, scale: f64) -> Vec<Branch> {
    let mut branches = Vec::new();
    // (start, length, azimuth, tilt, width, level)
    let mut stack = vec![(Vec3::ZERO, TRUNK_LENGTH, 0.0f64, 0.0f64, TRUNK_WIDTH, 0u32)];

    while let Some((start, len, azimuth, tilt, width, level)) = stack.pop() {
        let reach = len * scale;
        let end = start.add(Vec3::new(
            tilt.sin() * azimuth.cos() * reach,
            tilt.cos() * reach,
            tilt.sin() * azimuth.sin() * reach,
        ));
        branches.push(Branch { start, end, width, level });

        if level < depth {
            let child = (len * LENGTH_RATIO, width * LENGTH_RATIO, level + 1);
            stack.push((end, child.0, azimuth - SPREAD, tilt - SPREAD, child.1, child.2));
            stack.push((end, child.0, azimuth + SPREAD, tilt + SPREAD, child.1, child.2));
        }
    }

    tracing::debug!(depth, branches = branches.len(), "bronchial tree built");
    branches
}

/// A branch after rotation and projection, with its on-screen width
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedBranch {
    pub start: Point2,
    pub end: Point2,
    pub width: f64,
    pub level: u32,
}

/// Rotate about the vertical axis and project; screen y grows downward
pub fn project_tree(branches: &[Branch], rotation: f64, camera: &Perspective) -> Vec<ProjectedBranch> {
    let to_screen = |v: Vec3| {
        let r = rotate_y(v, rotation);
        camera.project(Vec3::new(r.x, -r.y, r.z))
    };
    branches
        .iter()
        .map(|b| {
            let (start, start_scale) = to_screen(b.start);
            let (end, _) = to_screen(b.end);
            ProjectedBranch { start, end, width: b.width * start_scale, level: b.level }
        })
        .collect()
}
