//! Explicit integrators for chaotic systems
//!
//! - Lorenz attractor: forward Euler on (x, y, z), several sub-steps per frame
//! - Double pendulum: closed-form angular accelerations, semi-implicit Euler
//!   with a small velocity damping per step
//!
//! Both are sensitive to initial conditions. Nearby starts diverge after a
//! bounded number of steps; that is the behaviour being modelled.

use std::collections::VecDeque;

use serde::Serialize;

use super::geometry::{Point2, Vec3};

/// Bounded trail of recent positions, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct TrailBuffer {
    points: VecDeque<Point2>,
    capacity: usize,
}

impl TrailBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { points: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, point: Point2) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point2> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<Point2> {
        self.points.iter().copied().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LorenzParams {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
    pub dt: f64,
    pub substeps: usize,
    pub trail_capacity: usize,
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
            dt: 0.01,
            substeps: 5,
            trail_capacity: 2000,
        }
    }
}

impl LorenzParams {
    /// Classic constants with the time step scaled by `speed`
    pub fn with_speed(speed: f64) -> Self {
        let defaults = Self::default();
        Self { dt: defaults.dt * speed, ..defaults }
    }
}

#[derive(Debug, Clone)]
pub struct Lorenz {
    params: LorenzParams,
    state: Vec3,
    trail: TrailBuffer,
}

impl Lorenz {
    pub const START: Vec3 = Vec3 { x: 0.1, y: 0.0, z: 0.0 };

    pub fn new(params: LorenzParams) -> Self {
        Self::with_state(params, Self::START)
    }

    pub fn with_state(params: LorenzParams, state: Vec3) -> Self {
        Self { params, state, trail: TrailBuffer::new(params.trail_capacity) }
    }

    /// (σ(y−x), x(ρ−z)−y, xy−βz)
    pub fn derivative(&self, s: Vec3) -> Vec3 {
        let LorenzParams { sigma, rho, beta, .. } = self.params;
        Vec3::new(sigma * (s.y - s.x), s.x * (rho - s.z) - s.y, s.x * s.y - beta * s.z)
    }

    pub fn step(&mut self) -> Vec3 {
        let d = self.derivative(self.state);
        self.state = self.state.add(d.scale(self.params.dt));
        self.trail.push(Self::project(self.state));
        self.state
    }

    pub fn frame(&mut self) {
        for _ in 0..self.params.substeps {
            self.step();
        }
    }

    /// Side view: x across, z up
    pub fn project(s: Vec3) -> Point2 {
        Point2::new(s.x, -s.z)
    }

    pub fn state(&self) -> Vec3 {
        self.state
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PendulumParams {
    pub m1: f64,
    pub m2: f64,
    pub l1: f64,
    pub l2: f64,
    pub gravity: f64,
    /// Multiplier applied to both angular velocities each step
    pub damping: f64,
    pub dt: f64,
    pub trail_length: usize,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            m1: 10.0,
            m2: 10.0,
            l1: 100.0,
            l2: 100.0,
            gravity: 0.5,
            damping: 0.9999,
            dt: 1.0,
            trail_length: 500,
        }
    }
}

impl PendulumParams {
    /// Gravity slider value g maps to an effective 0.5·g
    pub fn with_gravity(gravity: f64, trail_length: usize) -> Self {
        Self { gravity: gravity * 0.5, trail_length, ..Self::default() }
    }
}

/// Angles measured from the downward vertical
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PendulumState {
    pub a1: f64,
    pub a2: f64,
    pub v1: f64,
    pub v2: f64,
}

impl PendulumState {
    pub const HORIZONTAL: PendulumState = PendulumState {
        a1: std::f64::consts::FRAC_PI_2,
        a2: std::f64::consts::FRAC_PI_2,
        v1: 0.0,
        v2: 0.0,
    };
}

#[derive(Debug, Clone)]
pub struct DoublePendulum {
    params: PendulumParams,
    state: PendulumState,
    trail: TrailBuffer,
}

impl DoublePendulum {
    pub fn new(params: PendulumParams) -> Self {
        Self::with_state(params, PendulumState::HORIZONTAL)
    }

    pub fn with_state(params: PendulumParams, state: PendulumState) -> Self {
        Self { params, state, trail: TrailBuffer::new(params.trail_length) }
    }

    /// Angular accelerations from the two-body Lagrangian
    pub fn accelerations(&self, s: &PendulumState) -> (f64, f64) {
        let PendulumParams { m1, m2, l1, l2, gravity: g, .. } = self.params;
        let delta = s.a1 - s.a2;
        let shared = 2.0 * m1 + m2 - m2 * (2.0 * s.a1 - 2.0 * s.a2).cos();

        let num1 = -g * (2.0 * m1 + m2) * s.a1.sin();
        let num2 = -m2 * g * (s.a1 - 2.0 * s.a2).sin();
        let num3 = -2.0 * delta.sin() * m2;
        let num4 = s.v2 * s.v2 * l2 + s.v1 * s.v1 * l1 * delta.cos();
        let acc1 = (num1 + num2 + num3 * num4) / (l1 * shared);

        let num5 = 2.0 * delta.sin();
        let num6 = s.v1 * s.v1 * l1 * (m1 + m2);
        let num7 = g * (m1 + m2) * s.a1.cos();
        let num8 = s.v2 * s.v2 * l2 * m2 * delta.cos();
        let acc2 = num5 * (num6 + num7 + num8) / (l2 * shared);

        (acc1, acc2)
    }

    pub fn step(&mut self) -> PendulumState {
        let (acc1, acc2) = self.accelerations(&self.state);
        let dt = self.params.dt;
        let s = &mut self.state;
        s.v1 += acc1 * dt;
        s.v2 += acc2 * dt;
        s.a1 += s.v1 * dt;
        s.a2 += s.v2 * dt;
        s.v1 *= self.params.damping;
        s.v2 *= self.params.damping;

        let (_, bob) = self.bobs();
        self.trail.push(bob);
        self.state
    }

    /// Positions of both bobs relative to the pivot (y down)
    pub fn bobs(&self) -> (Point2, Point2) {
        let PendulumParams { l1, l2, .. } = self.params;
        let s = &self.state;
        let first = Point2::new(l1 * s.a1.sin(), l1 * s.a1.cos());
        let second = Point2::new(first.x + l2 * s.a2.sin(), first.y + l2 * s.a2.cos());
        (first, second)
    }

    pub fn state(&self) -> PendulumState {
        self.state
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_evicts_oldest() {
        let mut trail = TrailBuffer::new(3);
        for i in 0..5 {
            trail.push(Point2::new(i as f64, 0.0));
        }
        assert_eq!(trail.len(), trail.capacity());
        let xs: Vec<f64> = trail.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);

        let mut empty = TrailBuffer::new(0);
        empty.push(Point2::ORIGIN);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_lorenz_first_step() {
        let mut lorenz = Lorenz::new(LorenzParams::default());
        let s = lorenz.step();
        // dx = 10 * (0 - 0.1) * 0.01, dy = 0.1 * 28 * 0.01
        assert!((s.x - 0.09).abs() < 1e-12);
        assert!((s.y - 0.028).abs() < 1e-12);
        assert_eq!(s.z, 0.0);
        assert_eq!(lorenz.trail().len(), 1);
    }

    #[test]
    fn test_lorenz_stays_on_attractor() {
        let mut lorenz = Lorenz::new(LorenzParams::default());
        for _ in 0..10_000 {
            let s = lorenz.step();
            assert!(s.x.abs() < 60.0 && s.y.abs() < 60.0 && s.z.abs() < 60.0, "left envelope: {s:?}");
        }
        assert_eq!(lorenz.trail().len(), 2000);
    }

    #[test]
    fn test_lorenz_is_sensitive() {
        let params = LorenzParams::default();
        let mut a = Lorenz::new(params);
        let mut b = Lorenz::with_state(params, Vec3::new(0.1 + 1e-9, 0.0, 0.0));
        for _ in 0..5_000 {
            a.step();
            b.step();
        }
        assert!(a.state().sub(b.state()).length() > 1.0);
    }

    #[test]
    fn test_lorenz_frame_substeps() {
        let mut lorenz = Lorenz::new(LorenzParams::with_speed(2.0));
        lorenz.frame();
        assert_eq!(lorenz.trail().len(), 5);
    }

    #[test]
    fn test_pendulum_at_rest_stays_at_rest() {
        let rest = PendulumState { a1: 0.0, a2: 0.0, v1: 0.0, v2: 0.0 };
        let mut pendulum = DoublePendulum::with_state(PendulumParams::default(), rest);
        for _ in 0..100 {
            pendulum.step();
        }
        assert_eq!(pendulum.state(), rest);
        let (_, bob) = pendulum.bobs();
        assert!((bob.y - 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_pendulum_first_step_from_horizontal() {
        let mut pendulum = DoublePendulum::new(PendulumParams::default());
        let (acc1, acc2) = pendulum.accelerations(&PendulumState::HORIZONTAL);
        // Both arms horizontal: only the upper arm feels gravity
        assert!((acc1 - (-0.5 * 30.0 + 10.0 * 0.5) / (100.0 * 20.0)).abs() < 1e-12);
        assert!(acc2.abs() < 1e-12);
        pendulum.step();
        assert!(pendulum.state().a1 < std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_pendulum_is_sensitive() {
        let params = PendulumParams::default();
        let mut a = DoublePendulum::new(params);
        let nudged = PendulumState { a1: PendulumState::HORIZONTAL.a1 + 1e-9, ..PendulumState::HORIZONTAL };
        let mut b = DoublePendulum::with_state(params, nudged);
        for _ in 0..5_000 {
            a.step();
            b.step();
        }
        let (_, pa) = a.bobs();
        let (_, pb) = b.bobs();
        assert!(pa.distance(pb) > 1e-3);
        assert_eq!(a.trail().len(), 500);
    }
}
