use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::domain::scene::geometry::Position;

/// Mesh vertex, position only; shading derives a normal from it.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
}

impl SceneVertex {
    pub fn from_positions(positions: &[Position]) -> Vec<Self> {
        positions.iter().map(|&position| Self { position }).collect()
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SceneVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Per-object model matrix, one column per attribute.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectInstance {
    pub model: [f32; 16],
}

impl ObjectInstance {
    pub fn from_transforms(transforms: &[[f32; 16]]) -> Vec<Self> {
        transforms.iter().map(|&model| Self { model }).collect()
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        const COLUMN: wgpu::BufferAddress = (4 * std::mem::size_of::<f32>()) as wgpu::BufferAddress;
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ObjectInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: COLUMN,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: 2 * COLUMN,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: 3 * COLUMN,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Per-frame uniforms shared by the WGSL and GLSL shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub rotation: [[f32; 4]; 4],
    /// (shading_iterations, elapsed_seconds, _, _)
    pub params: [f32; 4],
}

impl Default for SceneUniforms {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            rotation: Mat4::IDENTITY.to_cols_array_2d(),
            params: [0.0; 4],
        }
    }
}

impl SceneUniforms {
    pub fn new(projection: Mat4, view: Mat4, rotation: Mat4, shading_iterations: u32, elapsed_seconds: f32) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            rotation: rotation.to_cols_array_2d(),
            params: [shading_iterations as f32, elapsed_seconds, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_shader_expectations() {
        assert_eq!(std::mem::size_of::<SceneVertex>(), 12);
        assert_eq!(std::mem::size_of::<ObjectInstance>(), 64);
        // uniform blocks must be a multiple of 16 bytes
        assert_eq!(std::mem::size_of::<SceneUniforms>() % 16, 0);
        assert_eq!(ObjectInstance::desc().attributes.len(), 4);
    }

    #[test]
    fn uniforms_carry_iterations() {
        let u = SceneUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY, 64, 1.5);
        assert_eq!(u.params[0], 64.0);
        assert_eq!(u.params[1], 1.5);
        let bytes: &[u8] = bytemuck::bytes_of(&u);
        assert_eq!(bytes.len(), 208);
    }
}
