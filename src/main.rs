//! Fractal Gallery - command line front end
//!
//! CLI commands:
//! - list: List available visualizations
//! - generate: Render one visualization to JSON
//! - generate-all: Render every visualization to JSON
//! - simulate: Run an animated visualization for N frames, then dump it

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use serde::Serialize;

use fractal_gallery::config::{self, Settings};
use fractal_gallery::scheduler::{self, FrameScheduler};
use fractal_gallery::state::{GalleryState, VisualizationMeta};
use fractal_gallery::{logging, KernelOutput};

#[derive(Parser)]
#[command(name = "fractal_gallery")]
#[command(about = "Generative fractal and simulation kernels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to gallery.yaml catalog
    #[arg(short, long, default_value = "gallery.yaml")]
    config: PathBuf,

    /// RNG seed (overrides GALLERY_SEED)
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available visualizations
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Render one visualization to JSON
    Generate {
        /// Visualization id
        #[arg(long)]
        id: String,

        /// Output directory (defaults to GALLERY_OUTPUT_DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render every visualization to JSON
    GenerateAll {
        /// Output directory (defaults to GALLERY_OUTPUT_DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run an animated visualization and write its final frame
    Simulate {
        /// Visualization id
        #[arg(long)]
        id: String,

        /// Number of frames to run
        #[arg(short, long, default_value = "300")]
        frames: u64,

        /// Frames per second (defaults to GALLERY_FPS)
        #[arg(long)]
        fps: Option<u32>,

        /// Output directory (defaults to GALLERY_OUTPUT_DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// JSON document written per visualization
#[derive(Serialize)]
struct Rendered<'a> {
    id: &'a str,
    name: &'a str,
    category: &'a str,
    kernel: &'a str,
    generated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<u64>,
    output: &'a KernelOutput,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load();
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }

    // Initialize logging first
    logging::init_logging(&settings.log_dir)?;
    tracing::info!("Fractal Gallery starting up");
    tracing::debug!("CLI args parsed: config={:?}", cli.config);

    let config = config::Config::load_or_default(&cli.config)?;
    tracing::info!(
        "Catalog loaded: {} visualizations, {} categories",
        config.visualizations.len(),
        config.categories.len()
    );

    let mut state = GalleryState::new(config, settings);

    match cli.command {
        Commands::List { category } => {
            list_visualizations(&state, category.as_deref());
        }

        Commands::Generate { id, output } => {
            let dir = output_dir(&state, output);
            let path = generate(&mut state, &id, &dir)?;
            println!("  {} -> {:?}", id, path);
        }

        Commands::GenerateAll { output } => {
            let dir = output_dir(&state, output);
            let ids = state.ids();
            println!("Generating {} visualizations...", ids.len());
            let mut failed = 0;
            for id in ids {
                match generate(&mut state, &id, &dir) {
                    Ok(path) => println!("  [OK] {} -> {:?}", id, path),
                    Err(e) => {
                        fractal_gallery::log_error!(e, id = %id);
                        println!("  [FAIL] {}: {:#}", id, e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} visualizations failed");
            }
            println!("Done!");
        }

        Commands::Simulate { id, frames, fps, output } => {
            let dir = output_dir(&state, output);
            let fps = fps.unwrap_or(state.settings().fps);
            let path = simulate(&state, &id, frames, fps, &dir).await?;
            println!("  {} -> {:?}", id, path);
        }
    }

    Ok(())
}

fn output_dir(state: &GalleryState, flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| PathBuf::from(&state.settings().output_dir))
}

fn write_json(dir: &Path, id: &str, doc: &Rendered<'_>) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{id}.json"));
    std::fs::write(&path, serde_json::to_string(doc)?)?;
    Ok(path)
}

/// Render one visualization and write it to `dir/<id>.json`
fn generate(state: &mut GalleryState, id: &str, dir: &Path) -> anyhow::Result<PathBuf> {
    let vis = state
        .config()
        .get(id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("unknown visualization '{id}'"))?;
    let output = state.render(id)?;
    let doc = Rendered {
        id: &vis.id,
        name: &vis.name,
        category: &vis.category,
        kernel: &vis.kernel,
        generated: chrono::Local::now().to_rfc3339(),
        frames: None,
        output,
    };
    write_json(dir, id, &doc)
}

/// Drive a fresh instance through the frame scheduler, then write its snapshot
async fn simulate(state: &GalleryState, id: &str, frames: u64, fps: u32, dir: &Path) -> anyhow::Result<PathBuf> {
    let vis = state
        .config()
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("unknown visualization '{id}'"))?;

    let sim = Rc::new(RefCell::new(state.instantiate(id)?));
    let driver = Rc::clone(&sim);

    let mut frame_scheduler = FrameScheduler::new();
    frame_scheduler.start(move |elapsed| driver.borrow_mut().advance(elapsed));

    println!("Simulating '{}' for {} frames at {} fps...", vis.name, frames, fps);
    let ran = scheduler::run_frames(&mut frame_scheduler, fps, frames).await;
    if ran < frames {
        tracing::info!("'{}' finished after {} of {} frames", id, ran, frames);
    }

    let output = sim.borrow().snapshot();
    let doc = Rendered {
        id: &vis.id,
        name: &vis.name,
        category: &vis.category,
        kernel: &vis.kernel,
        generated: chrono::Local::now().to_rfc3339(),
        frames: Some(ran),
        output: &output,
    };
    write_json(dir, id, &doc)
}

/// List available visualizations
fn list_visualizations(state: &GalleryState, category: Option<&str>) {
    let config = state.config();
    let mut entries: Vec<VisualizationMeta> = match category {
        Some(cat) => config.by_category(cat).into_iter().map(VisualizationMeta::from).collect(),
        None => config.visualizations.iter().map(VisualizationMeta::from).collect(),
    };
    entries.sort_by(|a, b| a.category.cmp(&b.category));

    println!("Available visualizations ({}):", entries.len());
    println!();

    let mut current_cat = String::new();
    for meta in entries {
        if meta.category != current_cat {
            current_cat = meta.category.clone();
            println!("## {}", config.categories.get(&current_cat).unwrap_or(&current_cat));
        }
        let marker = if meta.animated { " (animated)" } else { "" };
        println!("  - {} [{}] ({}){}", meta.name, meta.id, meta.kernel, marker);
    }
}
