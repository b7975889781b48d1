use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::rc::Rc;

use super::controller::BenchmarkController;
use crate::domain::benchmark::{BackendKind, BenchmarkConfig, RenderBackend, RunId};
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::scene::{Scene, SceneId, build_scene};

/// Asynchronously brings up a backend for a scene.
pub trait BackendProvider {
    fn initialize<'a>(
        &'a self,
        kind: BackendKind,
        scene: &'a dyn Scene,
    ) -> LocalBoxFuture<'a, BenchResult<Box<dyn RenderBackend>>>;
}

/// Glue between the synchronous controller and async backend bring-up.
pub struct BenchmarkRunner<P: BackendProvider> {
    controller: Rc<RefCell<BenchmarkController>>,
    provider: P,
    now_ms: fn() -> f64,
}

impl<P: BackendProvider> BenchmarkRunner<P> {
    pub fn new(controller: Rc<RefCell<BenchmarkController>>, provider: P, now_ms: fn() -> f64) -> Self {
        Self { controller, provider, now_ms }
    }

    pub fn controller(&self) -> &Rc<RefCell<BenchmarkController>> {
        &self.controller
    }

    /// Start with scene defaults; `object_count` overrides the scene's count.
    pub async fn start(
        &self,
        scene: SceneId,
        backend: BackendKind,
        object_count: Option<u32>,
    ) -> BenchResult<RunId> {
        let config = BenchmarkConfig::for_scene(scene)
            .with_backend(backend)
            .with_object_count(object_count);
        self.start_config(config).await
    }

    pub async fn start_config(&self, config: BenchmarkConfig) -> BenchResult<RunId> {
        let run = self.controller.borrow_mut().begin(config.clone())?;
        let scene = build_scene(&config);

        let initialized = match self.provider.initialize(config.backend, scene.as_ref()).await {
            Err(BenchError::BackendUnavailable(reason))
                if config.fallback_to_raster && config.backend != BackendKind::Raster =>
            {
                get_logger().warn(
                    LogComponent::Application("Runner"),
                    &format!("{} unavailable ({}), falling back to {}", config.backend, reason, BackendKind::Raster),
                );
                self.provider.initialize(BackendKind::Raster, scene.as_ref()).await
            }
            other => other,
        };

        match initialized {
            Ok(backend) => {
                let now = (self.now_ms)();
                self.controller.borrow_mut().attach(run, scene, backend, now)?;
                Ok(run)
            }
            Err(err) => {
                self.controller.borrow_mut().abort(run, &err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::benchmark::{
        FrameTiming, HostScheduler, Phase, PhaseTimer, ResultSink,
    };
    use futures::FutureExt;
    use futures::executor::block_on;

    struct NoopHost;
    impl HostScheduler for NoopHost {
        fn start_frame_loop(&mut self, _run: RunId) {}
        fn stop_frame_loop(&mut self) {}
        fn schedule_timer(&mut self, _run: RunId, _timer: PhaseTimer, _delay_ms: f64) {}
        fn cancel_timers(&mut self) {}
    }
    impl ResultSink for NoopHost {
        fn deliver(&mut self, _file_name: &str, _bytes: Vec<u8>) {}
    }

    struct Stub(BackendKind);
    impl RenderBackend for Stub {
        fn kind(&self) -> BackendKind {
            self.0
        }
        fn supports_gpu_timing(&self) -> bool {
            false
        }
        fn render_frame(&mut self, _scene: &mut dyn Scene, _delta_seconds: f64) -> FrameTiming {
            FrameTiming::default()
        }
        fn dispose(&mut self) {}
    }

    /// Only the raster API "exists".
    struct RasterOnly;
    impl BackendProvider for RasterOnly {
        fn initialize<'a>(
            &'a self,
            kind: BackendKind,
            _scene: &'a dyn Scene,
        ) -> LocalBoxFuture<'a, BenchResult<Box<dyn RenderBackend>>> {
            async move {
                match kind {
                    BackendKind::Raster => Ok(Box::new(Stub(kind)) as Box<dyn RenderBackend>),
                    BackendKind::NextGenGpu => {
                        Err(BenchError::BackendUnavailable("navigator.gpu missing".into()))
                    }
                }
            }
            .boxed_local()
        }
    }

    fn runner() -> BenchmarkRunner<RasterOnly> {
        let controller = BenchmarkController::new(Box::new(NoopHost), Box::new(NoopHost));
        BenchmarkRunner::new(Rc::new(RefCell::new(controller)), RasterOnly, || 0.0)
    }

    #[test]
    fn unavailable_backend_rolls_back_to_idle() {
        let runner = runner();
        let result = block_on(runner.start(SceneId::TorusBatched, BackendKind::NextGenGpu, Some(3)));
        assert!(matches!(result, Err(BenchError::BackendUnavailable(_))));
        assert_eq!(runner.controller().borrow().phase(), Phase::Idle);
        assert!(!runner.controller().borrow().is_running());
    }

    #[test]
    fn fallback_uses_raster() {
        let runner = runner();
        let mut config = BenchmarkConfig::for_scene(SceneId::OrbitSpheres).with_object_count(Some(2));
        config.fallback_to_raster = true;

        let run = block_on(runner.start_config(config)).unwrap();
        let controller = runner.controller().borrow();
        assert_eq!(controller.current_run(), Some(run));
        assert_eq!(controller.phase(), Phase::WarmingUp);
    }

    #[test]
    fn invalid_config_never_starts() {
        let runner = runner();
        let result = block_on(runner.start(SceneId::TorusNaive, BackendKind::Raster, Some(0)));
        assert!(matches!(result, Err(BenchError::InvalidConfig(_))));
        assert_eq!(runner.controller().borrow().phase(), Phase::Idle);
    }
}
