use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::geometry::sphere_vertices;
use super::{DrawStrategy, MeshBatch, Scene, SceneContent, SceneFrame, SceneId};

const ORBIT_RADIUS: f32 = 5.0;
const ORBIT_SPEED: f64 = 0.3;
const SHADING_ITERATIONS: u32 = 64;

/// A handful of finely tessellated spheres seen from an orbiting camera, with
/// an expensive fragment loop standing in for post-processing.
pub struct OrbitScene {
    content: SceneContent,
    orbit_angle: f64,
}

impl OrbitScene {
    pub fn new(object_count: u32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let transforms = (0..object_count)
            .map(|_| {
                let position = Vec3::new(
                    (rng.r#gen::<f32>() - 0.5) * 50.0,
                    (rng.r#gen::<f32>() - 0.5) * 20.0,
                    (rng.r#gen::<f32>() - 0.5) * 50.0,
                );
                Mat4::from_translation(position).to_cols_array()
            })
            .collect();

        Self {
            content: SceneContent {
                batches: vec![MeshBatch {
                    label: "sphere",
                    vertices: sphere_vertices(64, 0.75),
                    transforms,
                }],
                draw: DrawStrategy::Instanced,
                shading_iterations: SHADING_ITERATIONS,
            },
            orbit_angle: 0.0,
        }
    }
}

impl Scene for OrbitScene {
    fn id(&self) -> SceneId {
        SceneId::OrbitSpheres
    }

    fn content(&self) -> &SceneContent {
        &self.content
    }

    fn update(&mut self, delta_seconds: f64) {
        self.orbit_angle = (self.orbit_angle + delta_seconds * ORBIT_SPEED) % std::f64::consts::TAU;
    }

    fn frame(&self) -> SceneFrame {
        let angle = self.orbit_angle as f32;
        SceneFrame {
            eye: Vec3::new(angle.sin() * ORBIT_RADIUS, 1.5, angle.cos() * ORBIT_RADIUS),
            target: Vec3::new(0.0, 0.5, 0.0),
            fov_y_radians: 75f32.to_radians(),
            near: 0.1,
            far: 200.0,
            rotation: Mat4::IDENTITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_orbits_at_fixed_radius() {
        let mut scene = OrbitScene::new(4, 3);
        let start = scene.frame().eye;
        scene.update(1.0);
        let moved = scene.frame().eye;
        assert_ne!(start, moved);
        let planar = Vec3::new(moved.x, 0.0, moved.z).length();
        assert!((planar - ORBIT_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn heavy_shading_is_requested() {
        assert_eq!(OrbitScene::new(1, 0).content().shading_iterations, SHADING_ITERATIONS);
    }
}
