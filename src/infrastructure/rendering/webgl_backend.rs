//! Raster backend: raw WebGL2 through `web-sys`.
//!
//! `cpu_ms` is host wall time spent inside `render_frame`. WebGL calls can
//! stall synchronously in the driver, so this is an approximation of CPU cost
//! rather than a pure submission time.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlQuery,
    WebGlShader, WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::domain::benchmark::{BackendKind, FrameTiming, RenderBackend};
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::scene::{ClipDepth, DrawStrategy, MeshBatch, Scene};
use crate::infrastructure::rendering::gpu_structures::SceneVertex;
use crate::infrastructure::rendering::timing::{TimerQueryApi, TimerQueryQueue};

const COMPONENT: LogComponent = LogComponent::Infrastructure("WebGl");

/// `EXT_disjoint_timer_query_webgl2` enums.
const TIME_ELAPSED_EXT: u32 = 0x88BF;
const GPU_DISJOINT_EXT: u32 = 0x8FBB;
/// Queries in flight before new frames stop being timed.
const MAX_PENDING_QUERIES: usize = 8;

const POSITION_LOCATION: u32 = 0;
/// `mat4` attribute, occupies four consecutive locations.
const MODEL_LOCATION: u32 = 1;
const INSTANCE_STRIDE: i32 = 64;
const COLUMN_BYTES: i32 = 16;

struct GlMesh {
    vao: WebGlVertexArrayObject,
    vertex_buffer: WebGlBuffer,
    instance_buffer: WebGlBuffer,
    vertex_count: i32,
    instance_count: i32,
}

struct GlUniforms {
    projection: Option<WebGlUniformLocation>,
    view: Option<WebGlUniformLocation>,
    rotation: Option<WebGlUniformLocation>,
    params: Option<WebGlUniformLocation>,
}

struct GlState {
    gl: Gl,
    program: WebGlProgram,
    uniforms: GlUniforms,
    meshes: Vec<GlMesh>,
    draw: DrawStrategy,
    shading_iterations: u32,
    width: i32,
    height: i32,
}

/// Timer queries through the extension; present only when it is exposed.
struct GlTimerQueries {
    gl: Gl,
}

impl TimerQueryApi for GlTimerQueries {
    type Query = WebGlQuery;

    fn create(&mut self) -> Option<WebGlQuery> {
        self.gl.create_query()
    }

    fn begin(&mut self, query: &WebGlQuery) {
        self.gl.begin_query(TIME_ELAPSED_EXT, query);
    }

    fn end(&mut self) {
        self.gl.end_query(TIME_ELAPSED_EXT);
    }

    fn is_available(&mut self, query: &WebGlQuery) -> bool {
        self.gl
            .get_query_parameter(query, Gl::QUERY_RESULT_AVAILABLE)
            .as_bool()
            .unwrap_or(false)
    }

    fn is_disjoint(&mut self) -> bool {
        self.gl
            .get_parameter(GPU_DISJOINT_EXT)
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    fn elapsed_ns(&mut self, query: &WebGlQuery) -> f64 {
        self.gl.get_query_parameter(query, Gl::QUERY_RESULT).as_f64().unwrap_or(0.0)
    }

    fn delete(&mut self, query: WebGlQuery) {
        self.gl.delete_query(Some(&query));
    }
}

pub struct WebGlBackend {
    state: Option<GlState>,
    timer: Option<GlTimerQueries>,
    queries: TimerQueryQueue<WebGlQuery>,
    elapsed_seconds: f64,
}

impl WebGlBackend {
    pub fn new(canvas: &HtmlCanvasElement, scene: &dyn Scene) -> BenchResult<Self> {
        let gl = canvas
            .get_context("webgl2")
            .map_err(|e| BenchError::BackendUnavailable(format!("webgl2 context: {:?}", e)))?
            .ok_or_else(|| BenchError::BackendUnavailable("webgl2 is not supported".to_string()))?
            .dyn_into::<Gl>()
            .map_err(|_| BenchError::BackendUnavailable("context is not WebGL2".to_string()))?;

        let program = link_program(
            &gl,
            include_str!("../../shaders/scene.vert"),
            include_str!("../../shaders/scene.frag"),
        )?;
        let uniforms = GlUniforms {
            projection: gl.get_uniform_location(&program, "u_projection"),
            view: gl.get_uniform_location(&program, "u_view"),
            rotation: gl.get_uniform_location(&program, "u_rotation"),
            params: gl.get_uniform_location(&program, "u_params"),
        };

        let content = scene.content();
        let mut meshes = Vec::with_capacity(content.batches.len());
        for batch in &content.batches {
            match upload_mesh(&gl, batch) {
                Ok(mesh) => meshes.push(mesh),
                Err(err) => {
                    for mesh in &meshes {
                        delete_mesh(&gl, mesh);
                    }
                    gl.delete_program(Some(&program));
                    return Err(err);
                }
            }
        }

        let timer = match gl.get_extension("EXT_disjoint_timer_query_webgl2") {
            Ok(Some(_)) => Some(GlTimerQueries { gl: gl.clone() }),
            _ => None,
        };

        gl.enable(Gl::DEPTH_TEST);
        gl.clear_color(0.07, 0.08, 0.1, 1.0);

        get_logger().info(
            COMPONENT,
            &format!(
                "initialized {}x{}, {} objects, timer queries: {}",
                canvas.width(),
                canvas.height(),
                content.object_count(),
                timer.is_some()
            ),
        );

        Ok(Self {
            state: Some(GlState {
                gl,
                program,
                uniforms,
                meshes,
                draw: content.draw,
                shading_iterations: content.shading_iterations,
                width: canvas.width() as i32,
                height: canvas.height() as i32,
            }),
            timer,
            queries: TimerQueryQueue::new(MAX_PENDING_QUERIES),
            elapsed_seconds: 0.0,
        })
    }

    fn draw(state: &GlState, scene: &dyn Scene, elapsed_seconds: f64) {
        let gl = &state.gl;
        let frame = scene.frame();
        let aspect = state.width as f32 / state.height.max(1) as f32;

        gl.viewport(0, 0, state.width, state.height);
        gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
        gl.use_program(Some(&state.program));
        gl.uniform_matrix4fv_with_f32_array(
            state.uniforms.projection.as_ref(),
            false,
            &frame.projection(aspect, ClipDepth::NegativeOneToOne).to_cols_array(),
        );
        gl.uniform_matrix4fv_with_f32_array(state.uniforms.view.as_ref(), false, &frame.view().to_cols_array());
        gl.uniform_matrix4fv_with_f32_array(
            state.uniforms.rotation.as_ref(),
            false,
            &frame.rotation.to_cols_array(),
        );
        gl.uniform4f(
            state.uniforms.params.as_ref(),
            state.shading_iterations as f32,
            elapsed_seconds as f32,
            0.0,
            0.0,
        );

        for mesh in state.meshes.iter().filter(|m| m.vertex_count > 0 && m.instance_count > 0) {
            gl.bind_vertex_array(Some(&mesh.vao));
            match state.draw {
                DrawStrategy::Instanced => {
                    gl.draw_arrays_instanced(Gl::TRIANGLES, 0, mesh.vertex_count, mesh.instance_count);
                }
                DrawStrategy::PerObject => {
                    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&mesh.instance_buffer));
                    for i in 0..mesh.instance_count {
                        point_model_attribute(gl, i * INSTANCE_STRIDE);
                        gl.draw_arrays_instanced(Gl::TRIANGLES, 0, mesh.vertex_count, 1);
                    }
                    point_model_attribute(gl, 0);
                }
            }
        }
        gl.bind_vertex_array(None);
    }
}

impl RenderBackend for WebGlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Raster
    }

    fn supports_gpu_timing(&self) -> bool {
        self.timer.is_some()
    }

    fn render_frame(&mut self, scene: &mut dyn Scene, delta_seconds: f64) -> FrameTiming {
        let started = crate::time_utils::now_ms();
        scene.update(delta_seconds);
        self.elapsed_seconds += delta_seconds;

        let Some(state) = self.state.as_ref() else {
            return FrameTiming { cpu_ms: 0.0, gpu: None };
        };

        let timed = match self.timer.as_mut() {
            Some(timer) => self.queries.begin_frame(timer),
            None => false,
        };
        Self::draw(state, scene, self.elapsed_seconds);
        let gpu = match self.timer.as_mut() {
            Some(timer) => {
                if timed {
                    self.queries.end_frame(timer);
                }
                self.queries.poll(timer)
            }
            None => None,
        };

        FrameTiming { cpu_ms: crate::time_utils::now_ms() - started, gpu }
    }

    fn dispose(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            self.queries.clear(timer);
        }
        self.timer = None;
        let Some(state) = self.state.take() else {
            return;
        };
        let gl = &state.gl;
        for mesh in &state.meshes {
            delete_mesh(gl, mesh);
        }
        gl.delete_program(Some(&state.program));
        get_logger().info(COMPONENT, "context resources released");
    }
}

impl Drop for WebGlBackend {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn point_model_attribute(gl: &Gl, base_offset: i32) {
    for column in 0..4u32 {
        gl.vertex_attrib_pointer_with_i32(
            MODEL_LOCATION + column,
            4,
            Gl::FLOAT,
            false,
            INSTANCE_STRIDE,
            base_offset + column as i32 * COLUMN_BYTES,
        );
    }
}

fn delete_mesh(gl: &Gl, mesh: &GlMesh) {
    gl.delete_vertex_array(Some(&mesh.vao));
    gl.delete_buffer(Some(&mesh.vertex_buffer));
    gl.delete_buffer(Some(&mesh.instance_buffer));
}

/// Creation failures here mean the context is lost or out of memory.
fn upload_mesh(gl: &Gl, batch: &MeshBatch) -> BenchResult<GlMesh> {
    let failed = |what: &str| {
        BenchError::DeviceRequestFailed(format!("{}: create {} failed", batch.label, what))
    };
    let vao = gl.create_vertex_array().ok_or_else(|| failed("vertex array"))?;
    let Some(vertex_buffer) = gl.create_buffer() else {
        gl.delete_vertex_array(Some(&vao));
        return Err(failed("vertex buffer"));
    };
    let Some(instance_buffer) = gl.create_buffer() else {
        gl.delete_buffer(Some(&vertex_buffer));
        gl.delete_vertex_array(Some(&vao));
        return Err(failed("instance buffer"));
    };

    gl.bind_vertex_array(Some(&vao));

    let vertices = SceneVertex::from_positions(&batch.vertices);
    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&vertex_buffer));
    gl.buffer_data_with_u8_array(Gl::ARRAY_BUFFER, bytemuck::cast_slice(&vertices), Gl::STATIC_DRAW);
    gl.enable_vertex_attrib_array(POSITION_LOCATION);
    gl.vertex_attrib_pointer_with_i32(POSITION_LOCATION, 3, Gl::FLOAT, false, 12, 0);

    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&instance_buffer));
    gl.buffer_data_with_u8_array(
        Gl::ARRAY_BUFFER,
        bytemuck::cast_slice(&batch.transforms),
        Gl::STATIC_DRAW,
    );
    for column in 0..4u32 {
        gl.enable_vertex_attrib_array(MODEL_LOCATION + column);
        gl.vertex_attrib_divisor(MODEL_LOCATION + column, 1);
    }
    point_model_attribute(gl, 0);

    gl.bind_vertex_array(None);
    gl.bind_buffer(Gl::ARRAY_BUFFER, None);

    Ok(GlMesh {
        vao,
        vertex_buffer,
        instance_buffer,
        vertex_count: batch.vertex_count() as i32,
        instance_count: batch.instance_count() as i32,
    })
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> BenchResult<WebGlShader> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| BenchError::DeviceRequestFailed("create shader failed".to_string()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.get_shader_parameter(&shader, Gl::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(BenchError::DeviceRequestFailed(format!("shader compile: {}", log)))
    }
}

fn link_program(gl: &Gl, vertex_source: &str, fragment_source: &str) -> BenchResult<WebGlProgram> {
    let vertex = compile_shader(gl, Gl::VERTEX_SHADER, vertex_source)?;
    let fragment = match compile_shader(gl, Gl::FRAGMENT_SHADER, fragment_source) {
        Ok(fragment) => fragment,
        Err(err) => {
            gl.delete_shader(Some(&vertex));
            return Err(err);
        }
    };
    let Some(program) = gl.create_program() else {
        gl.delete_shader(Some(&vertex));
        gl.delete_shader(Some(&fragment));
        return Err(BenchError::DeviceRequestFailed("create program failed".to_string()));
    };

    gl.attach_shader(&program, &vertex);
    gl.attach_shader(&program, &fragment);
    gl.link_program(&program);
    // Shaders are no longer needed once linked (or failed to link).
    gl.delete_shader(Some(&vertex));
    gl.delete_shader(Some(&fragment));

    let linked: JsValue = gl.get_program_parameter(&program, Gl::LINK_STATUS);
    if linked.as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(BenchError::DeviceRequestFailed(format!("program link: {}", log)))
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use crate::domain::benchmark::BenchmarkConfig;
    use crate::domain::scene::{SceneId, build_scene};
    use crate::infrastructure::canvas::prepare_canvas;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn context() -> Gl {
        prepare_canvas()
            .unwrap()
            .get_context("webgl2")
            .unwrap()
            .unwrap()
            .dyn_into::<Gl>()
            .unwrap()
    }

    #[wasm_bindgen_test]
    fn broken_shader_is_a_device_failure() {
        let gl = context();
        let err = link_program(&gl, "#version 300 es\nnot glsl", include_str!("../../shaders/scene.frag"))
            .unwrap_err();
        assert!(matches!(err, BenchError::DeviceRequestFailed(_)));
    }

    #[wasm_bindgen_test]
    fn canvas_bound_to_another_api_is_unavailable() {
        let canvas = prepare_canvas().unwrap();
        canvas.get_context("2d").unwrap();
        let scene = build_scene(&BenchmarkConfig::for_scene(SceneId::TorusBatched).with_object_count(Some(3)));
        let result = WebGlBackend::new(&canvas, scene.as_ref());
        assert!(matches!(result, Err(BenchError::BackendUnavailable(_))));
    }
}
