//! Scene collaborators. The harness only needs drawable content plus a
//! per-frame update hook; everything here is deliberately minimal dressing.

pub mod geometry;
mod orbit;
mod torus;

pub use orbit::OrbitScene;
pub use torus::TorusScene;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::domain::benchmark::BenchmarkConfig;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum SceneId {
    /// Cones, boxes and spheres on a torus, one instanced draw per primitive.
    #[default]
    TorusBatched,
    /// Same content, one draw call per object.
    TorusNaive,
    /// Few heavy spheres, orbiting camera, expensive fragment shading.
    OrbitSpheres,
}

/// Defaults a scene brings to a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneDescriptor {
    pub title: &'static str,
    pub default_objects: u32,
    pub warmup_ms: f64,
    pub capture_ms: f64,
}

impl SceneId {
    pub fn descriptor(&self) -> SceneDescriptor {
        match self {
            SceneId::TorusBatched => SceneDescriptor {
                title: "Torus (instanced)",
                default_objects: 10_000,
                warmup_ms: 5_000.0,
                capture_ms: 15_000.0,
            },
            SceneId::TorusNaive => SceneDescriptor {
                title: "Torus (draw per object)",
                default_objects: 5_000,
                warmup_ms: 5_000.0,
                capture_ms: 15_000.0,
            },
            SceneId::OrbitSpheres => SceneDescriptor {
                title: "Orbit spheres (heavy shading)",
                default_objects: 100,
                warmup_ms: 5_000.0,
                capture_ms: 10_000.0,
            },
        }
    }
}

/// How a backend should submit the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStrategy {
    /// One instanced draw per mesh batch.
    Instanced,
    /// One draw call per object.
    PerObject,
}

/// One mesh and every placement of it.
#[derive(Debug, Clone)]
pub struct MeshBatch {
    pub label: &'static str,
    pub vertices: Vec<geometry::Position>,
    /// Column-major model matrices.
    pub transforms: Vec<[f32; 16]>,
}

impl MeshBatch {
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn instance_count(&self) -> u32 {
        self.transforms.len() as u32
    }
}

/// Static drawable content, uploaded once at backend initialization.
#[derive(Debug, Clone)]
pub struct SceneContent {
    pub batches: Vec<MeshBatch>,
    pub draw: DrawStrategy,
    /// Extra per-fragment loop iterations (post-processing style load).
    pub shading_iterations: u32,
}

impl SceneContent {
    pub fn object_count(&self) -> u32 {
        self.batches.iter().map(MeshBatch::instance_count).sum()
    }
}

/// Depth convention of the target API's clip space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipDepth {
    /// `[0, 1]` (WebGPU).
    ZeroToOne,
    /// `[-1, 1]` (WebGL).
    NegativeOneToOne,
}

/// Per-frame camera and scene transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneFrame {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
    pub rotation: Mat4,
}

impl SceneFrame {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32, depth: ClipDepth) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        match depth {
            ClipDepth::ZeroToOne => {
                Mat4::perspective_rh(self.fov_y_radians, aspect, self.near, self.far)
            }
            ClipDepth::NegativeOneToOne => {
                Mat4::perspective_rh_gl(self.fov_y_radians, aspect, self.near, self.far)
            }
        }
    }
}

/// What the harness needs from a scene.
pub trait Scene {
    fn id(&self) -> SceneId;
    fn content(&self) -> &SceneContent;
    /// Per-frame animation hook (rotate content, advance the camera...).
    fn update(&mut self, delta_seconds: f64);
    fn frame(&self) -> SceneFrame;
}

/// Build the scene a config asks for.
pub fn build_scene(config: &BenchmarkConfig) -> Box<dyn Scene> {
    match config.scene {
        SceneId::TorusBatched => Box::new(TorusScene::new(
            SceneId::TorusBatched,
            config.object_count,
            config.seed,
            DrawStrategy::Instanced,
            0.5,
        )),
        SceneId::TorusNaive => Box::new(TorusScene::new(
            SceneId::TorusNaive,
            config.object_count,
            config.seed,
            DrawStrategy::PerObject,
            0.1,
        )),
        SceneId::OrbitSpheres => Box::new(OrbitScene::new(config.object_count, config.seed)),
    }
}
