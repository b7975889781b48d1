//! Seams between the lifecycle logic and the host: rendering backends, the
//! frame/timer scheduler and the export sink.

use super::value_objects::{BackendKind, FrameTiming, PhaseTimer, RunId};
use crate::domain::scene::Scene;

/// Uniform "render one frame and report timing" contract.
///
/// The concrete variant is picked once at initialization; per-frame code only
/// ever sees this trait.
pub trait RenderBackend {
    fn kind(&self) -> BackendKind;

    /// Whether `render_frame` can ever report a GPU reading.
    fn supports_gpu_timing(&self) -> bool;

    /// Run the scene's update hook, submit the draw workload and return timing.
    /// Must not block on GPU readback.
    fn render_frame(&mut self, scene: &mut dyn Scene, delta_seconds: f64) -> FrameTiming;

    /// Release every backend resource. Idempotent.
    fn dispose(&mut self);
}

/// Host-side scheduling: the per-frame callback and the two one-shot timers.
///
/// Implementations call back into the controller with the `RunId` they were
/// given so late callbacks can be recognised.
pub trait HostScheduler {
    fn start_frame_loop(&mut self, run: RunId);
    fn stop_frame_loop(&mut self);
    fn schedule_timer(&mut self, run: RunId, timer: PhaseTimer, delay_ms: f64);
    fn cancel_timers(&mut self);
}

/// Receives the exported table.
pub trait ResultSink {
    fn deliver(&mut self, file_name: &str, bytes: Vec<u8>);
}
