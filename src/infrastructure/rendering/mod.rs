pub mod gpu_structures;
pub mod timing;
pub mod webgl_backend;
pub mod webgpu_backend;

pub use gpu_structures::*;
pub use webgl_backend::WebGlBackend;
pub use webgpu_backend::WebGpuBackend;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use web_sys::HtmlCanvasElement;

use crate::application::BackendProvider;
use crate::domain::benchmark::{BackendKind, RenderBackend};
use crate::domain::errors::BenchResult;
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::scene::Scene;
use crate::infrastructure::canvas::prepare_canvas;

/// Bring up the backend for `kind` on `canvas`, uploading the scene content.
pub async fn initialize_backend(
    kind: BackendKind,
    canvas: HtmlCanvasElement,
    scene: &dyn Scene,
) -> BenchResult<Box<dyn RenderBackend>> {
    get_logger().info(
        LogComponent::Infrastructure("Rendering"),
        &format!("initializing {} backend for {}", kind, scene.id()),
    );
    match kind {
        BackendKind::Raster => Ok(Box::new(WebGlBackend::new(&canvas, scene)?)),
        BackendKind::NextGenGpu => Ok(Box::new(WebGpuBackend::new(canvas, scene).await?)),
    }
}

/// Provider used by the browser runner: a fresh canvas per attempt.
#[derive(Default)]
pub struct BrowserBackendProvider;

impl BackendProvider for BrowserBackendProvider {
    fn initialize<'a>(
        &'a self,
        kind: BackendKind,
        scene: &'a dyn Scene,
    ) -> LocalBoxFuture<'a, BenchResult<Box<dyn RenderBackend>>> {
        async move {
            let canvas = prepare_canvas()?;
            initialize_backend(kind, canvas, scene).await
        }
        .boxed_local()
    }
}
