use gloo_timers::callback::Timeout;
use js_sys::{Function, Promise};
use std::rc::Rc;
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use super::{BrowserRunner, harness, stop_current_run};
use crate::domain::benchmark::{BackendKind, BenchmarkConfig, RunId};
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::scene::SceneId;

/// JS facade over the page-wide benchmark runner.
#[wasm_bindgen]
pub struct BenchmarkApi {
    runner: Rc<BrowserRunner>,
}

impl Default for BenchmarkApi {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl BenchmarkApi {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { runner: harness() }
    }

    /// Resolves with the run id once rendering has started.
    pub fn start(&self, scene_id: String, backend_id: String, object_count: Option<u32>) -> Promise {
        let runner = self.runner.clone();
        future_to_promise(async move {
            let (scene, backend) = parse_ids(&scene_id, &backend_id).map_err(to_js)?;
            let run = runner.start(scene, backend, object_count).await.map_err(to_js)?;
            Ok(run_to_js(run))
        })
    }

    /// Full `BenchmarkConfig` as JSON; missing fields take scene defaults.
    #[wasm_bindgen(js_name = startWithConfig)]
    pub fn start_with_config(&self, config_json: String) -> Promise {
        let runner = self.runner.clone();
        future_to_promise(async move {
            let config = BenchmarkConfig::from_json(&config_json).map_err(to_js)?;
            let run = runner.start_config(config).await.map_err(to_js)?;
            Ok(run_to_js(run))
        })
    }

    pub fn stop(&self) -> bool {
        stop_current_run()
    }

    pub fn phase(&self) -> String {
        self.runner.controller().borrow().phase().to_string()
    }

    #[wasm_bindgen(js_name = sampleCount)]
    pub fn sample_count(&self) -> usize {
        self.runner.controller().borrow().samples().len()
    }

    #[wasm_bindgen(js_name = lastSamplesJson)]
    pub fn last_samples_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.runner.controller().borrow().samples())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// `callback(sampleCount, stoppedManually)` after each finished run.
    /// Invoked from a fresh task so it may start the next run.
    #[wasm_bindgen(js_name = setOnComplete)]
    pub fn set_on_complete(&self, callback: Function) {
        self.runner.controller().borrow_mut().set_completion_callback(move |session| {
            let callback = callback.clone();
            let samples = JsValue::from_f64(session.samples().len() as f64);
            let manual = JsValue::from_bool(session.stopped_manually());
            Timeout::new(0, move || {
                if let Err(err) = callback.call2(&JsValue::NULL, &samples, &manual) {
                    get_logger().warn(
                        LogComponent::Presentation("BenchmarkApi"),
                        &format!("onComplete threw: {:?}", err),
                    );
                }
            })
            .forget();
        });
    }
}

/// Parse `sceneId` / `backendId` strings (`webgl` and `webgpu` are accepted
/// as aliases).
pub fn parse_ids(scene_id: &str, backend_id: &str) -> BenchResult<(SceneId, BackendKind)> {
    let scene = SceneId::from_str(scene_id.trim())
        .map_err(|_| BenchError::InvalidConfig(format!("unknown scene '{}'", scene_id)))?;
    let backend = BackendKind::from_str(backend_id.trim())
        .map_err(|_| BenchError::InvalidConfig(format!("unknown backend '{}'", backend_id)))?;
    Ok((scene, backend))
}

fn run_to_js(run: RunId) -> JsValue {
    JsValue::from_f64(run.0 as f64)
}

fn to_js(err: BenchError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_with_aliases() {
        assert_eq!(
            parse_ids("orbit-spheres", "webgpu").unwrap(),
            (SceneId::OrbitSpheres, BackendKind::NextGenGpu)
        );
        assert_eq!(
            parse_ids(" torus-naive ", "RASTER").unwrap(),
            (SceneId::TorusNaive, BackendKind::Raster)
        );
    }

    #[test]
    fn unknown_ids_are_config_errors() {
        assert!(matches!(parse_ids("cubes", "raster"), Err(BenchError::InvalidConfig(_))));
        assert!(matches!(parse_ids("torus-batched", "vulkan"), Err(BenchError::InvalidConfig(_))));
    }
}
