use serde::{Deserialize, Serialize};

use super::export::MissingGpuCell;
use super::value_objects::BackendKind;
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::scene::SceneId;

/// Upper bound on `object_count`; keeps instance buffers within device limits.
pub const MAX_OBJECTS: u32 = 1_000_000;

/// Options recognised for one benchmark run.
///
/// Deserialized through `PartialConfig`, so fields missing from JSON take the
/// defaults of the scene that was named, not of the default scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PartialConfig")]
pub struct BenchmarkConfig {
    pub scene: SceneId,
    pub backend: BackendKind,
    /// Rendering without recording before capture starts.
    pub warmup_ms: f64,
    /// Length of the capture window.
    pub capture_ms: f64,
    pub object_count: u32,
    /// Export whatever was captured when the run is stopped by hand.
    pub export_on_manual_stop: bool,
    /// Rendering of frames without a GPU time in the exported table.
    pub missing_gpu: MissingGpuCell,
    /// Retry with the raster backend when the next-gen API is missing.
    pub fallback_to_raster: bool,
    /// Seed for object placement.
    pub seed: u64,
}

/// Wire form of `BenchmarkConfig`: every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialConfig {
    scene: Option<SceneId>,
    backend: Option<BackendKind>,
    warmup_ms: Option<f64>,
    capture_ms: Option<f64>,
    object_count: Option<u32>,
    export_on_manual_stop: Option<bool>,
    missing_gpu: Option<MissingGpuCell>,
    fallback_to_raster: Option<bool>,
    seed: Option<u64>,
}

impl From<PartialConfig> for BenchmarkConfig {
    fn from(partial: PartialConfig) -> Self {
        let defaults = Self::for_scene(partial.scene.unwrap_or_default());
        Self {
            backend: partial.backend.unwrap_or(defaults.backend),
            warmup_ms: partial.warmup_ms.unwrap_or(defaults.warmup_ms),
            capture_ms: partial.capture_ms.unwrap_or(defaults.capture_ms),
            object_count: partial.object_count.unwrap_or(defaults.object_count),
            export_on_manual_stop: partial
                .export_on_manual_stop
                .unwrap_or(defaults.export_on_manual_stop),
            missing_gpu: partial.missing_gpu.unwrap_or(defaults.missing_gpu),
            fallback_to_raster: partial.fallback_to_raster.unwrap_or(defaults.fallback_to_raster),
            seed: partial.seed.unwrap_or(defaults.seed),
            ..defaults
        }
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self::for_scene(SceneId::default())
    }
}

impl BenchmarkConfig {
    /// Scene defaults with the next-gen backend.
    pub fn for_scene(scene: SceneId) -> Self {
        let descriptor = scene.descriptor();
        Self {
            scene,
            backend: BackendKind::NextGenGpu,
            warmup_ms: descriptor.warmup_ms,
            capture_ms: descriptor.capture_ms,
            object_count: descriptor.default_objects,
            export_on_manual_stop: false,
            missing_gpu: MissingGpuCell::Empty,
            fallback_to_raster: false,
            seed: 0x5EED,
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// `None` keeps the scene default.
    pub fn with_object_count(mut self, object_count: Option<u32>) -> Self {
        if let Some(count) = object_count {
            self.object_count = count;
        }
        self
    }

    pub fn with_timing(mut self, warmup_ms: f64, capture_ms: f64) -> Self {
        self.warmup_ms = warmup_ms;
        self.capture_ms = capture_ms;
        self
    }

    pub fn from_json(json: &str) -> BenchResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BenchResult<()> {
        if !(self.warmup_ms >= 0.0) || !self.warmup_ms.is_finite() {
            return Err(BenchError::InvalidConfig(format!(
                "warmupMs must be a finite duration >= 0, got {}",
                self.warmup_ms
            )));
        }
        if !(self.capture_ms > 0.0) || !self.capture_ms.is_finite() {
            return Err(BenchError::InvalidConfig(format!(
                "captureMs must be a finite duration > 0, got {}",
                self.capture_ms
            )));
        }
        if self.object_count == 0 || self.object_count > MAX_OBJECTS {
            return Err(BenchError::InvalidConfig(format!(
                "objectCount must be in 1..={}, got {}",
                MAX_OBJECTS, self.object_count
            )));
        }
        Ok(())
    }

    /// Delay from `start` until the finish timer fires.
    pub fn total_ms(&self) -> f64 {
        self.warmup_ms + self.capture_ms
    }
}
