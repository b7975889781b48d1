pub mod wasm_api;

use std::cell::RefCell;
use std::rc::Rc;

use crate::application::{BenchmarkController, BenchmarkRunner};
use crate::domain::logging::LogComponent;
use crate::infrastructure::{BrowserBackendProvider, BrowserDownload, BrowserScheduler};

pub type BrowserRunner = BenchmarkRunner<BrowserBackendProvider>;

thread_local! {
    static HARNESS: Rc<BrowserRunner> = build_harness();
}

/// The page-wide runner shared by the control panel and the JS API, so only
/// one run can ever be active.
pub fn harness() -> Rc<BrowserRunner> {
    HARNESS.with(Rc::clone)
}

fn build_harness() -> Rc<BrowserRunner> {
    let controller = Rc::new_cyclic(|weak| {
        RefCell::new(BenchmarkController::new(
            Box::new(BrowserScheduler::new(weak.clone())),
            Box::new(BrowserDownload::new()),
        ))
    });
    controller.borrow_mut().subscribe(crate::global_state::apply_event);
    Rc::new(BenchmarkRunner::new(controller, BrowserBackendProvider, crate::time_utils::now_ms))
}

/// Manual stop from any UI surface. `false` when nothing was running.
pub fn stop_current_run() -> bool {
    stop_run(harness().controller())
}

/// A stop that lands while the controller is mid-callback is dropped with a
/// warning rather than re-entering it.
fn stop_run(controller: &RefCell<BenchmarkController>) -> bool {
    match controller.try_borrow_mut() {
        Ok(mut controller) => controller.stop(),
        Err(_) => {
            crate::log_warn!(LogComponent::Presentation("Harness"), "stop dropped: controller busy");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::benchmark::{BenchmarkConfig, HostScheduler, PhaseTimer, ResultSink, RunId};
    use crate::domain::scene::SceneId;

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

    fn controller() -> RefCell<BenchmarkController> {
        RefCell::new(BenchmarkController::new(Box::new(NoopHost), Box::new(NoopHost)))
    }

    #[test]
    fn stop_while_busy_is_dropped() {
        let controller = controller();
        controller.borrow_mut().begin(BenchmarkConfig::for_scene(SceneId::TorusBatched)).unwrap();

        let busy = controller.borrow();
        assert!(!stop_run(&controller));
        drop(busy);

        assert!(controller.borrow().current_run().is_some());
        assert!(stop_run(&controller));
        assert!(!stop_run(&controller));
    }
}
