use glam::{Mat4, Vec3};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::geometry::{TorusShape, box_vertices, cone_vertices, sphere_vertices};
use super::{DrawStrategy, MeshBatch, Scene, SceneContent, SceneFrame, SceneId};

/// Cones, boxes and spheres scattered over a torus; the whole scene spins
/// around Y.
pub struct TorusScene {
    id: SceneId,
    content: SceneContent,
    /// Radians per second.
    spin_speed: f64,
    angle: f64,
}

impl TorusScene {
    pub fn new(
        id: SceneId,
        object_count: u32,
        seed: u64,
        draw: DrawStrategy,
        spin_speed: f64,
    ) -> Self {
        let mut batches = vec![
            MeshBatch { label: "cone", vertices: cone_vertices(20), transforms: Vec::new() },
            MeshBatch { label: "box", vertices: box_vertices(), transforms: Vec::new() },
            MeshBatch { label: "sphere", vertices: sphere_vertices(10, 0.1), transforms: Vec::new() },
        ];

        let shape = TorusShape::default();
        let mut rng = StdRng::seed_from_u64(seed);
        for i in 0..object_count as usize {
            let transform = shape.sample(&mut rng);
            batches[i % 3].transforms.push(transform.to_cols_array());
        }

        Self {
            id,
            content: SceneContent { batches, draw, shading_iterations: 0 },
            spin_speed,
            angle: 0.0,
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }
}

impl Scene for TorusScene {
    fn id(&self) -> SceneId {
        self.id
    }

    fn content(&self) -> &SceneContent {
        &self.content
    }

    fn update(&mut self, delta_seconds: f64) {
        self.angle = (self.angle + delta_seconds * self.spin_speed) % std::f64::consts::TAU;
    }

    fn frame(&self) -> SceneFrame {
        SceneFrame {
            eye: Vec3::new(0.0, 17.0, 25.0),
            target: Vec3::new(0.0, 0.0, 7.0),
            fov_y_radians: 75f32.to_radians(),
            near: 0.1,
            far: 200.0,
            rotation: Mat4::from_rotation_y(self.angle as f32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_round_robin_over_primitives() {
        let scene = TorusScene::new(SceneId::TorusBatched, 10, 1, DrawStrategy::Instanced, 0.5);
        let counts: Vec<_> = scene.content().batches.iter().map(|b| b.instance_count()).collect();
        assert_eq!(counts, vec![4, 3, 3]);
    }

    #[test]
    fn same_seed_same_layout() {
        let a = TorusScene::new(SceneId::TorusNaive, 50, 9, DrawStrategy::PerObject, 0.1);
        let b = TorusScene::new(SceneId::TorusNaive, 50, 9, DrawStrategy::PerObject, 0.1);
        assert_eq!(a.content().batches[0].transforms, b.content().batches[0].transforms);
    }

    #[test]
    fn update_advances_rotation() {
        let mut scene = TorusScene::new(SceneId::TorusBatched, 3, 1, DrawStrategy::Instanced, 0.5);
        scene.update(2.0);
        assert!((scene.angle() - 1.0).abs() < 1e-9);
        assert_ne!(scene.frame().rotation, Mat4::IDENTITY);
    }
}
