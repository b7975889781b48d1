use web_sys::HtmlCanvasElement;
use wgpu::util::DeviceExt;

use super::*;
use crate::domain::errors::{BenchError, BenchResult};
use crate::infrastructure::rendering::gpu_structures::{ObjectInstance, SceneUniforms, SceneVertex};

impl WebGpuBackend {
    pub fn is_webgpu_supported() -> bool {
        web_sys::window()
            .map(|window| js_sys::Reflect::has(&window.navigator(), &"gpu".into()).unwrap_or(false))
            .unwrap_or(false)
    }

    pub async fn new(canvas: HtmlCanvasElement, scene: &dyn Scene) -> BenchResult<Self> {
        if !Self::is_webgpu_supported() {
            return Err(BenchError::BackendUnavailable("navigator.gpu is not exposed".to_string()));
        }
        let (width, height) = (canvas.width().max(1), canvas.height().max(1));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });
        let surface = create_surface(&instance, canvas)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| BenchError::DeviceRequestFailed(format!("no adapter: {}", e)))?;

        let timestamp_support = adapter.features().contains(wgpu::Features::TIMESTAMP_QUERY);
        let required_features = if timestamp_support {
            wgpu::Features::TIMESTAMP_QUERY
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Bench Device"),
                required_features,
                required_limits: adapter.limits(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| BenchError::DeviceRequestFailed(format!("device request: {}", e)))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| BenchError::DeviceRequestFailed("surface reports no formats".to_string()))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            // Fifo keeps the frame rate tied to rAF.
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniforms"),
            contents: bytemuck::cast_slice(&[SceneUniforms::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline = create_pipeline(&device, &uniform_layout, config.format);
        let depth_view = create_depth_view(&device, width, height);

        let content = scene.content();
        let meshes = content
            .batches
            .iter()
            .map(|batch| GpuMesh {
                vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(batch.label),
                    contents: bytemuck::cast_slice(&SceneVertex::from_positions(&batch.vertices)),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                instance_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(batch.label),
                    contents: bytemuck::cast_slice(&ObjectInstance::from_transforms(&batch.transforms)),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                vertex_count: batch.vertex_count(),
                instance_count: batch.instance_count(),
            })
            .collect();

        let timestamps = timestamp_support.then(|| create_timestamp_queries(&device, &queue));

        get_logger().info(
            COMPONENT,
            &format!(
                "initialized {}x{} {:?}, {} objects, timestamp queries: {}",
                width,
                height,
                config.format,
                content.object_count(),
                timestamp_support
            ),
        );

        Ok(Self::from_state(GpuState {
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            depth_view,
            meshes,
            draw: content.draw,
            shading_iterations: content.shading_iterations,
            timestamps,
        }))
    }
}

#[cfg(target_arch = "wasm32")]
fn create_surface(
    instance: &wgpu::Instance,
    canvas: HtmlCanvasElement,
) -> BenchResult<wgpu::Surface<'static>> {
    instance
        .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
        .map_err(|e| BenchError::DeviceRequestFailed(format!("surface: {}", e)))
}

#[cfg(not(target_arch = "wasm32"))]
fn create_surface(
    _instance: &wgpu::Instance,
    _canvas: HtmlCanvasElement,
) -> BenchResult<wgpu::Surface<'static>> {
    Err(BenchError::BackendUnavailable("canvas surfaces need a browser".to_string()))
}

fn create_pipeline(
    device: &wgpu::Device,
    uniform_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Scene Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/scene.wgsl").into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Scene Pipeline Layout"),
        bind_group_layouts: &[uniform_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Scene Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[SceneVertex::desc(), ObjectInstance::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_timestamp_queries(device: &wgpu::Device, queue: &wgpu::Queue) -> TimestampQueries {
    const SIZE: wgpu::BufferAddress = 2 * std::mem::size_of::<u64>() as wgpu::BufferAddress;
    TimestampQueries {
        query_set: device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("Pass Timestamps"),
            ty: wgpu::QueryType::Timestamp,
            count: 2,
        }),
        resolve_buffer: device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Timestamp Resolve"),
            size: SIZE,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        }),
        readback_buffer: device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Timestamp Readback"),
            size: SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }),
        period_ns: queue.get_timestamp_period(),
    }
}
