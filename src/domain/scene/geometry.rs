//! Non-indexed triangle lists for the benchmark primitives and the torus
//! placement used by the torus scenes.

use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use std::f32::consts::PI;

pub type Position = [f32; 3];

/// UV sphere as a triangle list.
pub fn sphere_vertices(segments: u32, radius: f32) -> Vec<Position> {
    let segments = segments.max(3);
    let point = |lat: f32, lon: f32| -> Position {
        [lat.sin() * lon.cos() * radius, lat.cos() * radius, lat.sin() * lon.sin() * radius]
    };
    let mut verts = Vec::with_capacity((segments * segments * 6) as usize);
    for lat in 0..segments {
        for lon in 0..segments {
            let a = lat as f32 / segments as f32 * PI;
            let b = (lat + 1) as f32 / segments as f32 * PI;
            let c = lon as f32 / segments as f32 * PI * 2.0;
            let d = (lon + 1) as f32 / segments as f32 * PI * 2.0;

            let (p1, p2, p3, p4) = (point(a, c), point(b, c), point(b, d), point(a, d));
            verts.extend_from_slice(&[p1, p2, p3, p1, p3, p4]);
        }
    }
    verts
}

/// Cone with apex at +0.15 and base radius 0.1 at -0.15 (side only).
pub fn cone_vertices(segments: u32) -> Vec<Position> {
    let segments = segments.max(3);
    let mut verts = Vec::with_capacity((segments * 3) as usize);
    for i in 0..segments {
        let a = i as f32 / segments as f32 * PI * 2.0;
        let b = (i + 1) as f32 / segments as f32 * PI * 2.0;
        verts.push([0.0, 0.15, 0.0]);
        verts.push([0.1 * a.cos(), -0.15, 0.1 * a.sin()]);
        verts.push([0.1 * b.cos(), -0.15, 0.1 * b.sin()]);
    }
    verts
}

/// Axis-aligned cube with half-extent 0.1.
pub fn box_vertices() -> Vec<Position> {
    const H: f32 = 0.1;
    #[rustfmt::skip]
    let verts = vec![
        // front
        [-H, -H, H], [H, -H, H], [H, H, H], [-H, -H, H], [H, H, H], [-H, H, H],
        // back
        [-H, -H, -H], [H, H, -H], [H, -H, -H], [-H, -H, -H], [-H, H, -H], [H, H, -H],
        // left
        [-H, -H, -H], [-H, -H, H], [-H, H, H], [-H, -H, -H], [-H, H, H], [-H, H, -H],
        // right
        [H, -H, -H], [H, H, H], [H, -H, H], [H, -H, -H], [H, H, -H], [H, H, H],
        // top
        [-H, H, H], [H, H, H], [H, H, -H], [-H, H, H], [H, H, -H], [-H, H, -H],
        // bottom
        [-H, -H, H], [H, -H, -H], [H, -H, H], [-H, -H, H], [-H, -H, -H], [H, -H, -H],
    ];
    verts
}

/// Torus the objects are scattered over.
#[derive(Debug, Clone, Copy)]
pub struct TorusShape {
    pub major_radius: f32,
    pub minor_radius: f32,
    /// Relative jitter of the minor radius, in `[-jitter, jitter] * 0.5`.
    pub jitter: f32,
}

impl Default for TorusShape {
    fn default() -> Self {
        Self { major_radius: 10.0, minor_radius: 4.0, jitter: 0.6 }
    }
}

impl TorusShape {
    /// A random point on (or near) the torus surface, oriented so local +Y
    /// points away from the origin.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Mat4 {
        let u = rng.gen_range(0.0..PI * 2.0);
        let v = rng.gen_range(0.0..PI * 2.0);
        let radial_offset = rng.gen_range(-1.0f32..1.0) * self.jitter;
        let minor = self.minor_radius * (1.0 + radial_offset * 0.5);

        let position = Vec3::new(
            (self.major_radius + minor * v.cos()) * u.cos(),
            minor * v.sin(),
            (self.major_radius + minor * v.cos()) * u.sin(),
        );
        let rotation = Quat::from_rotation_arc(Vec3::Y, position.normalize_or_zero());
        Mat4::from_rotation_translation(rotation, position)
    }

    /// Farthest distance from the origin any sample can have.
    pub fn bounding_radius(&self) -> f32 {
        self.major_radius + self.minor_radius * (1.0 + self.jitter * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn primitive_vertex_counts() {
        assert_eq!(box_vertices().len(), 36);
        assert_eq!(cone_vertices(20).len(), 60);
        assert_eq!(sphere_vertices(10, 0.1).len(), 600);
    }

    #[test]
    fn sphere_respects_radius() {
        for p in sphere_vertices(8, 0.75) {
            let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((len - 0.75).abs() < 1e-4);
        }
    }

    #[test]
    fn torus_samples_stay_in_bounds() {
        let shape = TorusShape::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let m = shape.sample(&mut rng);
            let t = m.w_axis.truncate();
            assert!(t.length() <= shape.bounding_radius() + 1e-3);
            assert!(t.y.abs() <= shape.minor_radius * 1.3 + 1e-3);
        }
    }
}
