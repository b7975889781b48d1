#![cfg(feature = "render")]

use scene_bench_wasm::domain::benchmark::{BackendKind, BenchmarkConfig};
use scene_bench_wasm::domain::errors::BenchError;
use scene_bench_wasm::domain::scene::{SceneId, build_scene};
use scene_bench_wasm::infrastructure::canvas::{CANVAS_ID, prepare_canvas};
use scene_bench_wasm::infrastructure::rendering::{WebGpuBackend, initialize_backend};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn canvas_is_replaced_not_stacked() {
    let first = prepare_canvas().unwrap();
    let second = prepare_canvas().unwrap();

    assert!(first.parent_node().is_none());
    assert!(second.parent_node().is_some());
    assert_eq!(second.id(), CANVAS_ID);
}

#[wasm_bindgen_test]
async fn raster_backend_renders_and_disposes() {
    let config = BenchmarkConfig::for_scene(SceneId::TorusNaive).with_object_count(Some(30));
    let mut scene = build_scene(&config);
    let canvas = prepare_canvas().unwrap();

    let mut backend = initialize_backend(BackendKind::Raster, canvas, scene.as_ref()).await.unwrap();
    assert_eq!(backend.kind(), BackendKind::Raster);
    for _ in 0..5 {
        let timing = backend.render_frame(scene.as_mut(), 1.0 / 60.0);
        assert!(timing.cpu_ms >= 0.0);
    }
    backend.dispose();
    backend.dispose();
}

#[wasm_bindgen_test]
async fn next_gen_backend_reports_unavailable_or_renders() {
    let config = BenchmarkConfig::for_scene(SceneId::OrbitSpheres).with_object_count(Some(4));
    let mut scene = build_scene(&config);
    let canvas = prepare_canvas().unwrap();

    match initialize_backend(BackendKind::NextGenGpu, canvas, scene.as_ref()).await {
        Ok(mut backend) => {
            assert!(WebGpuBackend::is_webgpu_supported());
            backend.render_frame(scene.as_mut(), 1.0 / 60.0);
            backend.dispose();
        }
        Err(err) => assert!(matches!(
            err,
            BenchError::BackendUnavailable(_) | BenchError::DeviceRequestFailed(_)
        )),
    }
}
