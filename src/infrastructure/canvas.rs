use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

use crate::domain::errors::{BenchError, BenchResult};

pub const CANVAS_ID: &str = "bench-canvas";

/// Replace any previous benchmark canvas with a fresh one sized to the
/// window. A canvas that already handed out a WebGL2 context cannot give a
/// WebGPU one (and vice versa), so every run gets its own.
pub fn prepare_canvas() -> BenchResult<HtmlCanvasElement> {
    let window = web_sys::window()
        .ok_or_else(|| BenchError::BackendUnavailable("no window object".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| BenchError::BackendUnavailable("no document".to_string()))?;
    let body = document
        .body()
        .ok_or_else(|| BenchError::BackendUnavailable("document has no body".to_string()))?;

    if let Some(previous) = document.get_element_by_id(CANVAS_ID) {
        previous.remove();
    }

    let canvas = document
        .create_element("canvas")
        .map_err(|e| BenchError::BackendUnavailable(format!("create canvas: {:?}", e)))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| BenchError::BackendUnavailable("created element is not a canvas".to_string()))?;
    canvas.set_id(CANVAS_ID);

    let dpr = window.device_pixel_ratio().max(1.0);
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1280.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(720.0);
    canvas.set_width(((width * dpr) as u32).max(1));
    canvas.set_height(((height * dpr) as u32).max(1));
    let _ = canvas.set_attribute(
        "style",
        "position: fixed; inset: 0; width: 100vw; height: 100vh; z-index: 0;",
    );

    body.prepend_with_node_1(&canvas)
        .map_err(|e| BenchError::BackendUnavailable(format!("attach canvas: {:?}", e)))?;
    Ok(canvas)
}
