//! Gallery State - Single Source of Truth (SSOT)
//!
//! Owns the catalog, cached static renders and live animated instances.
//! Everything runs on one thread; each instance is mutated only by its owner.

use std::collections::HashMap;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::{Config, Settings, Visualization};
use crate::kernels::{Animated, Kernel, KernelOutput, Params};

pub struct GalleryState {
    config: Config,
    settings: Settings,
    cache: HashMap<String, KernelOutput>,
    live: HashMap<String, Box<dyn Animated>>,
}

impl GalleryState {
    pub fn new(config: Config, settings: Settings) -> Self {
        Self {
            config,
            settings,
            cache: HashMap::new(),
            live: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Per-visualization RNG: reproducible when a seed is configured
    fn rng_for(&self, id: &str) -> StdRng {
        match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ id_hash(id)),
            None => StdRng::from_entropy(),
        }
    }

    fn visualization(&self, id: &str) -> Result<&Visualization> {
        self.config.get(id).with_context(|| format!("unknown visualization '{id}'"))
    }

    pub fn kernel(&self, id: &str) -> Result<Kernel> {
        self.visualization(id)?.build()
    }

    /// Render once and cache the result until the parameters change
    pub fn render(&mut self, id: &str) -> Result<&KernelOutput> {
        if !self.cache.contains_key(id) {
            let kernel = self.kernel(id)?;
            crate::log_kernel!(id, kernel.name());
            let output = kernel.render(&mut self.rng_for(id))?;
            self.cache.insert(id.to_string(), output);
        } else {
            tracing::debug!("Render for '{}' served from cache", id);
        }
        self.cache.get(id).with_context(|| format!("render cache miss for '{id}'"))
    }

    /// A new, independent animated instance
    pub fn instantiate(&self, id: &str) -> Result<Box<dyn Animated>> {
        let kernel = self.kernel(id)?;
        crate::log_kernel!(id, kernel.name(), animated = true);
        Ok(kernel.instantiate(&mut self.rng_for(id))?)
    }

    /// The live instance for `id`, created on first use
    pub fn animation(&mut self, id: &str) -> Result<&mut (dyn Animated + 'static)> {
        if !self.live.contains_key(id) {
            let instance = self.instantiate(id)?;
            self.live.insert(id.to_string(), instance);
        }
        self.live
            .get_mut(id)
            .map(|b| b.as_mut())
            .with_context(|| format!("no live instance for '{id}'"))
    }

    /// Replace the parameters of `id`.
    ///
    /// The cached render is dropped and a running instance is rebuilt
    /// from scratch. Invalid parameters leave the old ones in place.
    pub fn set_params(&mut self, id: &str, params: Params) -> Result<()> {
        let kernel_name = self.visualization(id)?.kernel.clone();
        Kernel::parse(&kernel_name, &params).with_context(|| format!("new parameters for '{id}'"))?;

        if let Some(vis) = self.config.get_mut(id) {
            vis.params = params;
        }
        self.cache.remove(id);
        if self.live.remove(id).is_some() {
            let instance = self.instantiate(id)?;
            self.live.insert(id.to_string(), instance);
        }
        tracing::info!("Parameters updated for '{}'", id);
        Ok(())
    }

    /// Stop and drop the live instance, if any
    pub fn stop(&mut self, id: &str) -> bool {
        self.live.remove(id).is_some()
    }

    pub fn ids(&self) -> Vec<String> {
        self.config.visualizations.iter().map(|v| v.id.clone()).collect()
    }

    pub fn categories(&self) -> Vec<String> {
        self.config.categories.keys().cloned().collect()
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over the id bytes; stable across toolchains and platforms
fn id_hash(id: &str) -> u64 {
    id.bytes().fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME))
}

/// Visualization metadata for listing
#[derive(Debug, Clone, Serialize)]
pub struct VisualizationMeta {
    pub id: String,
    pub name: String,
    pub category: String,
    pub kernel: String,
    pub animated: bool,
}

impl From<&Visualization> for VisualizationMeta {
    fn from(v: &Visualization) -> Self {
        Self {
            id: v.id.clone(),
            name: v.name.clone(),
            category: v.category.clone(),
            kernel: v.kernel.clone(),
            animated: v.build().map(|k| k.is_animated()).unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use std::ops::ControlFlow;

    fn seeded() -> GalleryState {
        let settings = Settings { seed: Some(7), ..Settings::default() };
        GalleryState::new(default_config(), settings)
    }

    fn koch_segments(state: &mut GalleryState) -> usize {
        match state.render("koch").unwrap() {
            KernelOutput::Path(path) => path.segments.len(),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn test_render_is_cached_and_params_invalidate() {
        let mut state = seeded();
        assert_eq!(koch_segments(&mut state), 3 * 4usize.pow(4));

        let params: Params = [("iterations".to_string(), 1.0)].into_iter().collect();
        state.set_params("koch", params).unwrap();
        assert_eq!(koch_segments(&mut state), 12);
    }

    #[test]
    fn test_invalid_params_keep_old_ones() {
        let mut state = seeded();
        let params: Params = [("iterations".to_string(), -3.0)].into_iter().collect();
        assert!(state.set_params("koch", params).is_err());
        assert_eq!(state.config().get("koch").unwrap().params["iterations"], 4.0);
    }

    #[test]
    fn test_unknown_id() {
        let mut state = seeded();
        assert!(state.render("nope").is_err());
        assert!(state.set_params("nope", Params::new()).is_err());
    }

    #[test]
    fn test_set_params_rebuilds_live_instance() {
        let mut state = seeded();
        let sim = state.animation("lorenz").unwrap();
        for _ in 0..10 {
            assert_eq!(sim.advance(16.0), ControlFlow::Continue(()));
        }
        let trail_len = |out: KernelOutput| match out {
            KernelOutput::Trail { trail, .. } => trail.len(),
            other => panic!("unexpected output: {other:?}"),
        };
        assert_eq!(trail_len(state.animation("lorenz").unwrap().snapshot()), 50);

        let params: Params = [("speed".to_string(), 0.5)].into_iter().collect();
        state.set_params("lorenz", params).unwrap();
        assert_eq!(trail_len(state.animation("lorenz").unwrap().snapshot()), 0);
    }

    #[test]
    fn test_seeded_instances_repeat() {
        let state = seeded();
        let mut a = state.instantiate("chladni").unwrap();
        let mut b = state.instantiate("chladni").unwrap();
        assert!(a.advance(16.0).is_continue());
        assert!(b.advance(16.0).is_continue());
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_id_hash_is_fnv1a() {
        assert_eq!(id_hash(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(id_hash("a"), 0xaf63_dc4c_8601_ec8c);
        assert_ne!(id_hash("koch"), id_hash("dragon"));
    }

    #[test]
    fn test_static_kernel_has_no_animation() {
        let mut state = seeded();
        assert!(state.animation("mandelbrot").is_err());
        assert!(!state.stop("mandelbrot"));
    }

    #[test]
    fn test_meta_flags_animation() {
        let config = default_config();
        let meta = VisualizationMeta::from(config.get("dla").unwrap());
        assert!(meta.animated);
        let meta = VisualizationMeta::from(config.get("koch").unwrap());
        assert!(!meta.animated);
    }
}
