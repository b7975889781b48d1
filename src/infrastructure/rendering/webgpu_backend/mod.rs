//! Next-gen backend: wgpu on the browser's WebGPU implementation.
//!
//! GPU time comes from timestamp writes around the render pass. The
//! timestamps are resolved and copied into a mappable buffer, then mapped
//! asynchronously; `ReadbackSlot` keeps at most one mapping in flight and
//! frames never wait for it.

use futures::channel::oneshot;

use crate::domain::benchmark::{BackendKind, FrameTiming, RenderBackend};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::scene::{DrawStrategy, Scene};
use crate::infrastructure::rendering::timing::{ReadbackSlot, ReadbackToken};

mod initialization;
mod render_loop;

const COMPONENT: LogComponent = LogComponent::Infrastructure("WebGpu");
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// One mesh batch on the GPU.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    vertex_count: u32,
    instance_count: u32,
}

/// Timestamp query resources; absent when the adapter lacks `TIMESTAMP_QUERY`.
struct TimestampQueries {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    readback_buffer: wgpu::Buffer,
    /// Nanoseconds per timestamp tick.
    period_ns: f32,
}

struct PendingReadback {
    token: ReadbackToken,
    done: oneshot::Receiver<Result<(), wgpu::BufferAsyncError>>,
}

/// Everything created by a successful initialization.
struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    meshes: Vec<GpuMesh>,
    draw: DrawStrategy,
    shading_iterations: u32,
    timestamps: Option<TimestampQueries>,
}

pub struct WebGpuBackend {
    state: Option<GpuState>,
    readback: ReadbackSlot,
    pending: Option<PendingReadback>,
    elapsed_seconds: f64,
}

impl WebGpuBackend {
    fn from_state(state: GpuState) -> Self {
        Self {
            state: Some(state),
            readback: ReadbackSlot::new(),
            pending: None,
            elapsed_seconds: 0.0,
        }
    }
}

impl RenderBackend for WebGpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::NextGenGpu
    }

    fn supports_gpu_timing(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.timestamps.is_some())
    }

    fn render_frame(&mut self, scene: &mut dyn Scene, delta_seconds: f64) -> FrameTiming {
        let started = crate::time_utils::now_ms();
        scene.update(delta_seconds);
        self.elapsed_seconds += delta_seconds;

        if self.state.is_none() {
            return FrameTiming { cpu_ms: 0.0, gpu: None };
        }
        self.poll_readback();
        if let Err(err) = self.encode_and_submit(scene) {
            get_logger().warn(COMPONENT, &err.to_string());
        }

        FrameTiming {
            cpu_ms: crate::time_utils::now_ms() - started,
            gpu: self.readback.latest(),
        }
    }

    fn dispose(&mut self) {
        self.readback.dispose();
        self.pending = None;
        if let Some(state) = self.state.take() {
            if let Some(timestamps) = &state.timestamps {
                timestamps.resolve_buffer.destroy();
                timestamps.readback_buffer.destroy();
            }
            for mesh in &state.meshes {
                mesh.vertex_buffer.destroy();
                mesh.instance_buffer.destroy();
            }
            state.uniform_buffer.destroy();
            state.device.destroy();
            get_logger().info(COMPONENT, "device released");
        }
    }
}

impl Drop for WebGpuBackend {
    fn drop(&mut self) {
        self.dispose();
    }
}
