//! Fractal Gallery - generative and simulation kernels
//!
//! Turns small parameter sets into geometry or pixel fields:
//! - Grammar rewriting + turtle interpretation
//! - Iterated function systems (chaos game)
//! - Escape-time complex iteration
//! - Recursive spatial subdivision
//! - Apollonian packing via the Descartes circle theorem
//! - Diffusion-limited aggregation
//! - Gray-Scott reaction-diffusion
//! - Chaotic ODE integration (Lorenz, double pendulum)
//!
//! Drawing, colour mapping and UI state belong to the host.

pub mod config;
pub mod kernels;
pub mod logging;
pub mod scheduler;
pub mod state;

pub use kernels::{Animated, Kernel, KernelError, KernelOutput};
pub use scheduler::{FrameHandle, FrameScheduler};
pub use state::GalleryState;
