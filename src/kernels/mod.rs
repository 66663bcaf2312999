//! Generative and simulation kernels
//!
//! Each kernel turns a small numeric parameter set into drawable output:
//! - Static: L-systems, escape-time planes, subdivision, circle packing,
//!   parametric figures
//! - Animated: chaos game, DLA, reaction-diffusion, Lorenz, double
//!   pendulum, wave interference, Chladni plate, bronchial tree
//!
//! Kernels are addressed by dotted strings such as `lsystem.koch`,
//! `escape.julia.rabbit` or `sim.dla`.

pub mod apollonian;
pub mod branching;
pub mod dla;
pub mod dynamics;
pub mod escape;
pub mod geometry;
pub mod ifs;
pub mod lsystem;
pub mod parametric;
pub mod reaction_diffusion;
pub mod subdivide;
pub mod turtle;
pub mod waves;

use std::collections::HashMap;
use std::ops::ControlFlow;

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

use apollonian::{Circle, PackingConfig};
use branching::{Branch, ProjectedBranch};
use dla::{DlaGrower, DlaParams, StuckCell};
use dynamics::{DoublePendulum, Lorenz, LorenzParams, PendulumParams};
use escape::{EscapeField, EscapeKind, PlaneView};
use geometry::{Perspective, Point2, Vec3};
use ifs::{AffineMap, IfsSampler};
use lsystem::LSystemPreset;
use parametric::{FlowerOfLife, Superformula};
use reaction_diffusion::{GrayScott, ScalarPair};
use subdivide::{Cube, ProjectedCube, Tetrahedron, Triangle};
use turtle::TurtlePath;
use waves::{ChladniPlate, Field, WaveInterference};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    #[error("Unknown kernel: {0}")]
    UnknownKernel(String),
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Affine map probabilities sum to {0}, expected 1")]
    InvalidProbabilities(f64),
    #[error("Kernel '{0}' has no animation")]
    NotAnimated(String),
}

pub type Result<T> = std::result::Result<T, KernelError>;

/// Numeric parameters by name; booleans are 0 / 1
pub type Params = HashMap<String, f64>;

fn real(params: &Params, name: &str, default: f64) -> Result<f64> {
    match params.get(name) {
        None => Ok(default),
        Some(v) if v.is_finite() => Ok(*v),
        Some(v) => Err(KernelError::InvalidParameter {
            name: name.to_string(),
            reason: format!("{v} is not finite"),
        }),
    }
}

/// Non-negative whole number; fractional values are truncated
fn count(params: &Params, name: &str, default: usize) -> Result<usize> {
    let v = real(params, name, default as f64)?;
    if v < 0.0 {
        return Err(KernelError::InvalidParameter {
            name: name.to_string(),
            reason: format!("{v} is negative"),
        });
    }
    Ok(v.floor() as usize)
}

fn flag(params: &Params, name: &str, default: bool) -> Result<bool> {
    Ok(real(params, name, if default { 1.0 } else { 0.0 })? != 0.0)
}

/// Which affine system the chaos game runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfsPreset {
    Fern,
    Sierpinski,
}

impl IfsPreset {
    pub fn maps(&self) -> &'static [AffineMap] {
        match self {
            IfsPreset::Fern => &ifs::BARNSLEY_FERN,
            IfsPreset::Sierpinski => &ifs::SIERPINSKI,
        }
    }
}

/// A fully parameterized kernel, ready to render or animate
#[derive(Debug, Clone, PartialEq)]
pub enum Kernel {
    LSystem { preset: LSystemPreset, iterations: u32, angle: f64 },
    Ifs { preset: IfsPreset, points: usize, per_frame: usize },
    Mandelbrot { width: usize, height: usize, zoom: f64, offset_x: f64, offset_y: f64, max_iterations: u32 },
    Julia { width: usize, height: usize, zoom: f64, c: Complex64, max_iterations: u32 },
    SierpinskiTriangle { depth: u32, size: f64 },
    SierpinskiTetrahedron { depth: u32, size: f64, axis: Vec3, rotation: f64 },
    MengerSponge { depth: u32, size: f64, rotation_x: f64, rotation_y: f64 },
    Apollonian(PackingConfig),
    Phyllotaxis { count: usize, spacing: f64 },
    MaurerRose { n: f64, d: f64 },
    Superformula(Superformula),
    FlowerOfLife { layers: u32, radius: f64 },
    BronchialTree { depth: u32, breathing: bool },
    Dla(DlaParams),
    ReactionDiffusion { width: usize, height: usize, feed: f64, kill: f64 },
    Lorenz(LorenzParams),
    DoublePendulum(PendulumParams),
    WaveInterference { width: usize, height: usize, sources: usize, frequency: f64, speed: f64 },
    Chladni { frequency: f64, particles: usize },
}

impl Kernel {
    /// Build a kernel from its dotted name and parameter map.
    ///
    /// Missing parameters take the gallery defaults.
    pub fn parse(kernel: &str, params: &Params) -> Result<Self> {
        let parts: Vec<&str> = kernel.split('.').collect();
        let unknown = || KernelError::UnknownKernel(kernel.to_string());

        let parsed = match (parts.first().copied(), parts.get(1).copied(), parts.get(2).copied()) {
            (Some("lsystem"), Some(name), None) => {
                let preset = LSystemPreset::from_name(name).ok_or_else(unknown)?;
                Kernel::LSystem {
                    preset,
                    iterations: count(params, "iterations", preset.default_iterations() as usize)? as u32,
                    angle: real(params, "angle", preset.default_angle_degrees())?,
                }
            }

            (Some("ifs"), Some(name), None) => {
                let preset = match name {
                    "fern" => IfsPreset::Fern,
                    "sierpinski" => IfsPreset::Sierpinski,
                    _ => return Err(unknown()),
                };
                let density = real(params, "density", 1.0)?.max(0.0);
                Kernel::Ifs {
                    preset,
                    points: count(params, "points", 20_000)?,
                    per_frame: (50.0 * density).floor() as usize,
                }
            }

            (Some("escape"), Some("mandelbrot"), None) => Kernel::Mandelbrot {
                width: count(params, "width", 400)?,
                height: count(params, "height", 400)?,
                zoom: real(params, "zoom", 1.0)?,
                offset_x: real(params, "offset_x", -0.5)?,
                offset_y: real(params, "offset_y", 0.0)?,
                max_iterations: count(params, "max_iterations", 100)? as u32,
            },

            (Some("escape"), Some("julia"), named) => {
                let preset = match named {
                    Some(name) => escape::julia_point(name).ok_or_else(unknown)?,
                    None => Complex64::new(-0.8, 0.156),
                };
                Kernel::Julia {
                    width: count(params, "width", 300)?,
                    height: count(params, "height", 200)?,
                    zoom: real(params, "zoom", 1.0)?,
                    c: Complex64::new(real(params, "c_re", preset.re)?, real(params, "c_im", preset.im)?),
                    max_iterations: count(params, "max_iterations", 100)? as u32,
                }
            }

            (Some("subdivide"), Some("triangle"), None) => Kernel::SierpinskiTriangle {
                depth: count(params, "depth", 5)? as u32,
                size: real(params, "size", 360.0)?,
            },
            (Some("subdivide"), Some("tetrahedron"), None) => Kernel::SierpinskiTetrahedron {
                depth: count(params, "depth", 3)? as u32,
                size: real(params, "size", 200.0)?,
                axis: Vec3::new(
                    real(params, "axis_x", 0.0)?,
                    real(params, "axis_y", 1.0)?,
                    real(params, "axis_z", 0.0)?,
                ),
                rotation: real(params, "rotation", 0.0)?,
            },
            (Some("subdivide"), Some("menger"), None) => Kernel::MengerSponge {
                depth: count(params, "depth", 2)? as u32,
                size: real(params, "size", 200.0)?,
                rotation_x: real(params, "rotation_x", 0.5)?,
                rotation_y: real(params, "rotation_y", 0.3)?,
            },

            (Some("packing"), Some("apollonian"), None) => {
                let radius = real(params, "radius", 200.0)?;
                if radius <= 0.0 {
                    return Err(KernelError::InvalidParameter {
                        name: "radius".to_string(),
                        reason: format!("{radius} must be positive"),
                    });
                }
                Kernel::Apollonian(PackingConfig::new(radius, count(params, "depth", 5)? as u32))
            }

            (Some("parametric"), Some("phyllotaxis"), None) => Kernel::Phyllotaxis {
                count: count(params, "count", 1500)?,
                spacing: real(params, "spacing", 4.0)?,
            },
            (Some("parametric"), Some("maurer"), None) => Kernel::MaurerRose {
                n: real(params, "n", 6.0)?,
                d: real(params, "d", 71.0)?,
            },
            (Some("parametric"), Some("superformula"), None) => Kernel::Superformula(Superformula {
                m: real(params, "m", 6.0)?,
                n1: real(params, "n1", 1.0)?,
                n2: real(params, "n2", 7.0)?,
                n3: real(params, "n3", 8.0)?,
            }),
            (Some("parametric"), Some("flower"), None) => Kernel::FlowerOfLife {
                layers: count(params, "layers", 2)? as u32,
                radius: real(params, "radius", 30.0)?,
            },

            (Some("branching"), Some("bronchial"), None) => Kernel::BronchialTree {
                depth: count(params, "depth", 7)? as u32,
                breathing: flag(params, "breathing", true)?,
            },

            (Some("sim"), Some("dla"), None) => {
                let defaults = DlaParams::default();
                Kernel::Dla(DlaParams {
                    cols: count(params, "cols", defaults.cols)?,
                    rows: count(params, "rows", defaults.rows)?,
                    particle_speed: real(params, "particle_speed", defaults.particle_speed)?,
                    stickiness: real(params, "stickiness", defaults.stickiness)?.clamp(0.0, 1.0),
                    walkers: count(params, "walkers", defaults.walkers)?,
                    target_particles: count(params, "target_particles", defaults.target_particles)?,
                    ..defaults
                })
            }
            (Some("sim"), Some("reaction_diffusion"), None) => Kernel::ReactionDiffusion {
                width: count(params, "width", 200)?,
                height: count(params, "height", 150)?,
                feed: real(params, "feed", reaction_diffusion::DEFAULT_FEED)?,
                kill: real(params, "kill", reaction_diffusion::DEFAULT_KILL)?,
            },
            (Some("sim"), Some("lorenz"), None) => Kernel::Lorenz(LorenzParams::with_speed(real(params, "speed", 1.0)?)),
            (Some("sim"), Some("pendulum"), None) => Kernel::DoublePendulum(PendulumParams::with_gravity(
                real(params, "gravity", 1.0)?,
                count(params, "trail_length", 500)?,
            )),
            (Some("sim"), Some("waves"), None) => Kernel::WaveInterference {
                width: count(params, "width", 200)?,
                height: count(params, "height", 150)?,
                sources: count(params, "sources", 2)?,
                frequency: real(params, "frequency", 0.1)?,
                speed: real(params, "speed", 1.0)?,
            },
            (Some("sim"), Some("chladni"), None) => Kernel::Chladni {
                frequency: real(params, "frequency", 200.0)?,
                particles: count(params, "particles", waves::CHLADNI_PARTICLES)?,
            },

            _ => return Err(unknown()),
        };
        Ok(parsed)
    }

    /// Short kind name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Kernel::LSystem { .. } => "lsystem",
            Kernel::Ifs { .. } => "ifs",
            Kernel::Mandelbrot { .. } => "mandelbrot",
            Kernel::Julia { .. } => "julia",
            Kernel::SierpinskiTriangle { .. } => "sierpinski_triangle",
            Kernel::SierpinskiTetrahedron { .. } => "sierpinski_tetrahedron",
            Kernel::MengerSponge { .. } => "menger_sponge",
            Kernel::Apollonian(_) => "apollonian",
            Kernel::Phyllotaxis { .. } => "phyllotaxis",
            Kernel::MaurerRose { .. } => "maurer_rose",
            Kernel::Superformula(_) => "superformula",
            Kernel::FlowerOfLife { .. } => "flower_of_life",
            Kernel::BronchialTree { .. } => "bronchial_tree",
            Kernel::Dla(_) => "dla",
            Kernel::ReactionDiffusion { .. } => "reaction_diffusion",
            Kernel::Lorenz(_) => "lorenz",
            Kernel::DoublePendulum(_) => "double_pendulum",
            Kernel::WaveInterference { .. } => "wave_interference",
            Kernel::Chladni { .. } => "chladni",
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(
            self,
            Kernel::Ifs { .. }
                | Kernel::BronchialTree { .. }
                | Kernel::Dla(_)
                | Kernel::ReactionDiffusion { .. }
                | Kernel::Lorenz(_)
                | Kernel::DoublePendulum(_)
                | Kernel::WaveInterference { .. }
                | Kernel::Chladni { .. }
        )
    }

    /// Produce the kernel's output in one pass.
    ///
    /// The chaos game samples its full point budget; other animated
    /// kernels return their initial state.
    pub fn render(&self, rng: &mut StdRng) -> Result<KernelOutput> {
        let output = match self {
            Kernel::LSystem { preset, iterations, angle } => {
                let symbols = preset.grammar().expand(*iterations);
                KernelOutput::Path(turtle::interpret(&symbols, &preset.turtle_config(*angle)))
            }

            Kernel::Ifs { preset, points, .. } => {
                let mut sampler = IfsSampler::new(preset.maps())?;
                sampler.sample_batch(rng, *points);
                KernelOutput::Points { points: sampler.to_vec() }
            }

            Kernel::Mandelbrot { width, height, zoom, offset_x, offset_y, max_iterations } => {
                let view = PlaneView::mandelbrot(*width, *height, *zoom, *offset_x, *offset_y);
                KernelOutput::EscapeField(escape::render(&view, EscapeKind::Mandelbrot, *max_iterations))
            }
            Kernel::Julia { width, height, zoom, c, max_iterations } => {
                let view = PlaneView::julia(*width, *height, *zoom);
                KernelOutput::EscapeField(escape::render(&view, EscapeKind::Julia { c: *c }, *max_iterations))
            }

            Kernel::SierpinskiTriangle { depth, size } => {
                let root = Triangle::equilateral(Point2::ORIGIN, *size);
                KernelOutput::Triangles { triangles: subdivide::subdivide(root, *depth) }
            }
            Kernel::SierpinskiTetrahedron { depth, size, axis, rotation } => {
                let tetrahedra = subdivide::subdivide(Tetrahedron::regular(*size), *depth);
                let camera = Perspective::default();
                let edges = tetrahedra
                    .iter()
                    .flat_map(|t| t.projected_edges(*axis, *rotation, &camera))
                    .collect();
                KernelOutput::Tetrahedra { tetrahedra, edges }
            }
            Kernel::MengerSponge { depth, size, rotation_x, rotation_y } => {
                let cubes = subdivide::subdivide(Cube::new(Vec3::ZERO, *size), *depth);
                let projected = subdivide::project_cubes(&cubes, *rotation_x, *rotation_y, &Perspective::default());
                KernelOutput::Cubes { cubes, projected }
            }

            Kernel::Apollonian(config) => KernelOutput::Circles { circles: apollonian::apollonian_gasket(*config) },

            Kernel::Phyllotaxis { count, spacing } => KernelOutput::Points {
                points: parametric::phyllotaxis(*count, *spacing),
            },
            Kernel::MaurerRose { n, d } => KernelOutput::Polylines {
                lines: vec![parametric::maurer_rose(*n, *d), parametric::rose_curve(*n)],
            },
            Kernel::Superformula(shape) => KernelOutput::Polylines { lines: vec![shape.outline()] },
            Kernel::FlowerOfLife { layers, radius } => {
                KernelOutput::Flower(parametric::flower_of_life(*layers, *radius))
            }

            _ => self.instantiate(rng)?.snapshot(),
        };
        Ok(output)
    }

    /// Fresh time-stepped instance with its own RNG drawn from `rng`
    pub fn instantiate(&self, rng: &mut StdRng) -> Result<Box<dyn Animated>> {
        let child = StdRng::seed_from_u64(rng.gen());
        let animated: Box<dyn Animated> = match self {
            Kernel::Ifs { preset, points, per_frame } => Box::new(ChaosGame {
                sampler: IfsSampler::new(preset.maps())?.with_capacity(*points),
                per_frame: *per_frame,
                rng: child,
            }),
            Kernel::BronchialTree { depth, breathing } => Box::new(BreathingTree {
                depth: *depth,
                breathing: *breathing,
                time: 0.0,
                rotation: 0.0,
            }),
            Kernel::Dla(params) => Box::new(Aggregation {
                grower: DlaGrower::new(*params, child),
                last_stuck: Vec::new(),
            }),
            Kernel::ReactionDiffusion { width, height, feed, kill } => {
                let mut child = child;
                Box::new(GrayScott::seeded(*width, *height, *feed, *kill, &mut child))
            }
            Kernel::Lorenz(params) => Box::new(Lorenz::new(*params)),
            Kernel::DoublePendulum(params) => Box::new(DoublePendulum::new(*params)),
            Kernel::WaveInterference { width, height, sources, frequency, speed } => {
                Box::new(WaveInterference::new(*width, *height, *sources, *frequency, *speed))
            }
            Kernel::Chladni { frequency, particles } => Box::new(ChladniPlate::new(*frequency, *particles, child)),
            _ => return Err(KernelError::NotAnimated(self.name().to_string())),
        };
        tracing::debug!(kernel = self.name(), "animated kernel instantiated");
        Ok(animated)
    }
}

/// Everything a kernel can hand to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KernelOutput {
    Path(TurtlePath),
    Points { points: Vec<Point2> },
    Polylines { lines: Vec<Vec<Point2>> },
    EscapeField(EscapeField),
    Triangles { triangles: Vec<Triangle> },
    Tetrahedra { tetrahedra: Vec<Tetrahedron>, edges: Vec<(Point2, Point2)> },
    Cubes { cubes: Vec<Cube>, projected: Vec<ProjectedCube> },
    Circles { circles: Vec<Circle> },
    Flower(FlowerOfLife),
    Branches { branches: Vec<Branch>, projected: Vec<ProjectedBranch> },
    Occupancy { cols: usize, rows: usize, cells: Vec<(usize, usize)>, stuck: Vec<StuckCell>, finished: bool },
    ScalarPair(ScalarPair),
    Trail { state: Vec<f64>, trail: Vec<Point2> },
    Field(Field),
}

/// A time-stepped kernel driven by the frame scheduler
pub trait Animated {
    /// Advance one display frame. `Break` means the simulation is done.
    fn advance(&mut self, elapsed_ms: f64) -> ControlFlow<()>;

    fn snapshot(&self) -> KernelOutput;
}

struct ChaosGame {
    sampler: IfsSampler,
    per_frame: usize,
    rng: StdRng,
}

impl Animated for ChaosGame {
    fn advance(&mut self, _elapsed_ms: f64) -> ControlFlow<()> {
        self.sampler.sample_batch(&mut self.rng, self.per_frame);
        ControlFlow::Continue(())
    }

    fn snapshot(&self) -> KernelOutput {
        KernelOutput::Points { points: self.sampler.to_vec() }
    }
}

struct BreathingTree {
    depth: u32,
    breathing: bool,
    /// Seconds since start
    time: f64,
    rotation: f64,
}

impl Animated for BreathingTree {
    fn advance(&mut self, elapsed_ms: f64) -> ControlFlow<()> {
        self.time += elapsed_ms * 0.001;
        self.rotation += 0.005;
        ControlFlow::Continue(())
    }

    fn snapshot(&self) -> KernelOutput {
        let scale = if self.breathing { branching::breathing_scale(self.time) } else { 1.0 };
        let branches = branching::bronchial_tree(self.depth, scale);
        let projected = branching::project_tree(&branches, self.rotation, &Perspective::default());
        KernelOutput::Branches { branches, projected }
    }
}

struct Aggregation {
    grower: DlaGrower<StdRng>,
    last_stuck: Vec<StuckCell>,
}

impl Animated for Aggregation {
    fn advance(&mut self, _elapsed_ms: f64) -> ControlFlow<()> {
        if self.grower.is_finished() {
            self.last_stuck.clear();
            return ControlFlow::Break(());
        }
        self.last_stuck = self.grower.frame();
        if self.grower.is_finished() {
            tracing::debug!(
                occupied = self.grower.occupied_count(),
                radius = self.grower.max_radius(),
                "aggregation finished"
            );
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    fn snapshot(&self) -> KernelOutput {
        KernelOutput::Occupancy {
            cols: self.grower.cols(),
            rows: self.grower.rows(),
            cells: self.grower.occupied_cells(),
            stuck: self.last_stuck.clone(),
            finished: self.grower.is_finished(),
        }
    }
}

impl Animated for GrayScott {
    fn advance(&mut self, _elapsed_ms: f64) -> ControlFlow<()> {
        self.frame();
        ControlFlow::Continue(())
    }

    fn snapshot(&self) -> KernelOutput {
        KernelOutput::ScalarPair(GrayScott::snapshot(self))
    }
}

impl Animated for Lorenz {
    fn advance(&mut self, _elapsed_ms: f64) -> ControlFlow<()> {
        self.frame();
        ControlFlow::Continue(())
    }

    fn snapshot(&self) -> KernelOutput {
        let s = self.state();
        KernelOutput::Trail { state: vec![s.x, s.y, s.z], trail: self.trail().to_vec() }
    }
}

impl Animated for DoublePendulum {
    fn advance(&mut self, _elapsed_ms: f64) -> ControlFlow<()> {
        self.step();
        ControlFlow::Continue(())
    }

    fn snapshot(&self) -> KernelOutput {
        let s = self.state();
        KernelOutput::Trail { state: vec![s.a1, s.a2, s.v1, s.v2], trail: self.trail().to_vec() }
    }
}

impl Animated for WaveInterference {
    fn advance(&mut self, _elapsed_ms: f64) -> ControlFlow<()> {
        WaveInterference::advance(self);
        ControlFlow::Continue(())
    }

    fn snapshot(&self) -> KernelOutput {
        KernelOutput::Field(self.field())
    }
}

impl Animated for ChladniPlate<StdRng> {
    fn advance(&mut self, _elapsed_ms: f64) -> ControlFlow<()> {
        self.shake();
        ControlFlow::Continue(())
    }

    fn snapshot(&self) -> KernelOutput {
        KernelOutput::Points { points: self.particles().to_vec() }
    }
}
