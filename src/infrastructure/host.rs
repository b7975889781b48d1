use gloo_timers::callback::Timeout;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::application::BenchmarkController;
use crate::domain::benchmark::{HostScheduler, PhaseTimer, RunId};
use crate::domain::logging::{LogComponent, get_logger};

type FrameCallback = Closure<dyn FnMut(f64)>;

/// A running `requestAnimationFrame` chain.
struct FrameLoop {
    running: Rc<Cell<bool>>,
    handle: Rc<Cell<Option<i32>>>,
    callback: Rc<RefCell<Option<FrameCallback>>>,
}

/// Browser-side `HostScheduler`: one rAF loop plus one-shot `Timeout`s.
///
/// Callbacks reach the controller through a `Weak`, so they turn into no-ops
/// once the controller is gone, and only `try_borrow_mut` it so a callback
/// landing inside another controller call is skipped instead of panicking.
pub struct BrowserScheduler {
    controller: Weak<RefCell<BenchmarkController>>,
    frame_loop: Option<FrameLoop>,
    timers: Vec<Timeout>,
    /// Callbacks torn down while possibly executing; dropped on the next
    /// scheduling call.
    retired_timers: Vec<Closure<dyn FnMut()>>,
    retired_frames: Vec<Rc<RefCell<Option<FrameCallback>>>>,
}

impl BrowserScheduler {
    pub fn new(controller: Weak<RefCell<BenchmarkController>>) -> Self {
        Self {
            controller,
            frame_loop: None,
            timers: Vec::new(),
            retired_timers: Vec::new(),
            retired_frames: Vec::new(),
        }
    }

    fn purge_retired(&mut self) {
        self.retired_timers.clear();
        for callback in self.retired_frames.drain(..) {
            callback.borrow_mut().take();
        }
    }
}

fn request_frame(callback: &FrameCallback) -> Option<i32> {
    web_sys::window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .ok()
}

impl HostScheduler for BrowserScheduler {
    fn start_frame_loop(&mut self, run: RunId) {
        self.stop_frame_loop();
        self.purge_retired();

        let running = Rc::new(Cell::new(true));
        let handle = Rc::new(Cell::new(None));
        let callback: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));

        let controller = self.controller.clone();
        let next = callback.clone();
        let still_running = running.clone();
        let next_handle = handle.clone();
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |now_ms: f64| {
            if !still_running.get() {
                return;
            }
            match controller.upgrade() {
                Some(controller) => {
                    if let Ok(mut controller) = controller.try_borrow_mut() {
                        controller.on_frame(run, now_ms);
                    }
                }
                None => {
                    still_running.set(false);
                    return;
                }
            }
            if still_running.get() {
                if let Some(callback) = next.borrow().as_ref() {
                    next_handle.set(request_frame(callback));
                }
            }
        }) as Box<dyn FnMut(f64)>));

        if let Some(first) = callback.borrow().as_ref() {
            handle.set(request_frame(first));
        }
        if handle.get().is_none() {
            get_logger().error(
                LogComponent::Infrastructure("Host"),
                "requestAnimationFrame unavailable, no frames will be rendered",
            );
        }

        self.frame_loop = Some(FrameLoop { running, handle, callback });
    }

    fn stop_frame_loop(&mut self) {
        let Some(frame_loop) = self.frame_loop.take() else {
            return;
        };
        frame_loop.running.set(false);
        if let (Some(window), Some(id)) = (web_sys::window(), frame_loop.handle.get()) {
            let _ = window.cancel_animation_frame(id);
        }
        self.retired_frames.push(frame_loop.callback);
    }

    fn schedule_timer(&mut self, run: RunId, timer: PhaseTimer, delay_ms: f64) {
        let controller = self.controller.clone();
        let millis = delay_ms.clamp(0.0, u32::MAX as f64) as u32;
        self.timers.push(Timeout::new(millis, move || {
            let Some(controller) = controller.upgrade() else {
                return;
            };
            match controller.try_borrow_mut() {
                Ok(mut controller) => controller.on_timer(run, timer, crate::time_utils::now_ms()),
                Err(_) => {
                    crate::log_warn!(
                        LogComponent::Infrastructure("Host"),
                        "{} timer for {} dropped: controller busy",
                        timer,
                        run
                    );
                }
            }
        }));
    }

    fn cancel_timers(&mut self) {
        for timeout in self.timers.drain(..) {
            self.retired_timers.push(timeout.cancel());
        }
    }
}

impl Drop for BrowserScheduler {
    fn drop(&mut self) {
        self.stop_frame_loop();
        self.cancel_timers();
        self.purge_retired();
    }
}
