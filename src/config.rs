//! Configuration loader - YAML gallery catalog + .env settings

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::kernels::{Kernel, Params};

/// Gallery catalog loaded from gallery.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub categories: BTreeMap<String, String>,
    pub visualizations: Vec<Visualization>,
}

/// One gallery entry: a kernel string plus its parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visualization {
    pub id: String,
    pub name: String,
    pub category: String,
    pub kernel: String,
    #[serde(default)]
    pub params: Params,
}

impl Visualization {
    fn new(id: &str, name: &str, category: &str, kernel: &str, params: &[(&str, f64)]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            kernel: kernel.to_string(),
            params: params.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    pub fn build(&self) -> Result<Kernel> {
        Kernel::parse(&self.kernel, &self.params).with_context(|| format!("visualization '{}'", self.id))
    }
}

/// Runtime settings loaded from the environment / .env
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub output_dir: String,
    pub log_dir: String,
    /// Fixed RNG seed; None draws one from entropy
    pub seed: Option<u64>,
    pub fps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: "./out".to_string(),
            log_dir: "./logs".to_string(),
            seed: None,
            fps: 60,
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the built-in catalog
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::info!("No catalog at {}, using built-in gallery", path.as_ref().display());
            Ok(default_config())
        }
    }

    /// Ids must be unique and every kernel string must parse
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for vis in &self.visualizations {
            if !seen.insert(vis.id.as_str()) {
                bail!("duplicate visualization id '{}'", vis.id);
            }
            vis.build()?;
        }
        Ok(())
    }

    /// Get visualization by ID
    pub fn get(&self, id: &str) -> Option<&Visualization> {
        self.visualizations.iter().find(|v| v.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Visualization> {
        self.visualizations.iter_mut().find(|v| v.id == id)
    }

    /// Get all visualizations in a category
    pub fn by_category(&self, category: &str) -> Vec<&Visualization> {
        self.visualizations.iter().filter(|v| v.category == category).collect()
    }
}

impl Settings {
    /// Load settings from .env file and environment
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();
        Settings {
            output_dir: lookup("GALLERY_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            log_dir: lookup("GALLERY_LOG_DIR").unwrap_or(defaults.log_dir),
            seed: lookup("GALLERY_SEED").and_then(|s| s.parse().ok()),
            fps: lookup("GALLERY_FPS")
                .and_then(|s| s.parse().ok())
                .filter(|&fps| fps > 0)
                .unwrap_or(defaults.fps),
        }
    }
}

/// Built-in catalog covering every kernel
pub fn default_config() -> Config {
    let categories = [
        ("lsystem", "L-Systems"),
        ("chaos", "Chaos Game"),
        ("escape", "Escape-Time Fractals"),
        ("geometric", "Recursive Geometry"),
        ("nature", "Natural Patterns"),
        ("simulation", "Simulations"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let visualizations = vec![
        Visualization::new("koch", "Koch Snowflake", "lsystem", "lsystem.koch", &[("iterations", 4.0)]),
        Visualization::new("dragon", "Dragon Curve", "lsystem", "lsystem.dragon", &[("iterations", 10.0)]),
        Visualization::new("tree", "L-System Tree", "lsystem", "lsystem.tree", &[("iterations", 4.0), ("angle", 25.0)]),
        Visualization::new("windy", "Windy Plant", "lsystem", "lsystem.windy", &[("iterations", 5.0), ("angle", 25.0)]),
        Visualization::new("hilbert", "Hilbert Curve", "lsystem", "lsystem.hilbert", &[]),
        Visualization::new("fern", "Barnsley Fern", "chaos", "ifs.fern", &[("density", 1.0)]),
        Visualization::new("sierpinski_chaos", "Chaos Game Triangle", "chaos", "ifs.sierpinski", &[]),
        Visualization::new("mandelbrot", "Mandelbrot Set", "escape", "escape.mandelbrot", &[("max_iterations", 100.0)]),
        Visualization::new("julia", "Julia Set", "escape", "escape.julia.dragon", &[]),
        Visualization::new("sierpinski", "Sierpinski Triangle", "geometric", "subdivide.triangle", &[("depth", 5.0)]),
        Visualization::new(
            "tetrahedron",
            "Sierpinski Tetrahedron",
            "geometric",
            "subdivide.tetrahedron",
            &[("depth", 3.0), ("axis_x", 1.0), ("axis_y", 1.0), ("axis_z", 0.0)],
        ),
        Visualization::new("menger", "Menger Sponge", "geometric", "subdivide.menger", &[("depth", 2.0)]),
        Visualization::new("apollonian", "Apollonian Gasket", "geometric", "packing.apollonian", &[("depth", 5.0)]),
        Visualization::new("flower", "Flower of Life", "geometric", "parametric.flower", &[("layers", 2.0)]),
        Visualization::new("phyllotaxis", "Phyllotaxis", "nature", "parametric.phyllotaxis", &[("spacing", 4.0)]),
        Visualization::new("maurer", "Maurer Rose", "nature", "parametric.maurer", &[("n", 6.0), ("d", 71.0)]),
        Visualization::new(
            "superformula",
            "Superformula",
            "nature",
            "parametric.superformula",
            &[("m", 6.0), ("n1", 1.0), ("n2", 7.0), ("n3", 8.0)],
        ),
        Visualization::new("bronchial", "Bronchial Tree", "nature", "branching.bronchial", &[("depth", 7.0)]),
        Visualization::new("dla", "Diffusion-Limited Aggregation", "simulation", "sim.dla", &[("stickiness", 1.0)]),
        Visualization::new(
            "reaction_diffusion",
            "Reaction-Diffusion",
            "simulation",
            "sim.reaction_diffusion",
            &[("feed", 0.055), ("kill", 0.062)],
        ),
        Visualization::new("lorenz", "Lorenz Attractor", "simulation", "sim.lorenz", &[("speed", 1.0)]),
        Visualization::new("pendulum", "Double Pendulum", "simulation", "sim.pendulum", &[("gravity", 1.0)]),
        Visualization::new("waves", "Wave Interference", "simulation", "sim.waves", &[("sources", 2.0)]),
        Visualization::new("chladni", "Chladni Plate", "simulation", "sim.chladni", &[("frequency", 200.0)]),
    ];

    Config { categories, visualizations }
}
