use leptos::*;
use once_cell::sync::OnceCell;

use crate::domain::benchmark::Phase;
use crate::domain::events::BenchmarkEvent;

/// Keep the on-screen log bounded.
pub const MAX_LOG_LINES: usize = 200;

/// Reactive state shared by the overlay, the control panel and the logger.
pub struct Globals {
    pub phase: RwSignal<Phase>,
    pub fps: RwSignal<f64>,
    pub cpu_ms: RwSignal<f64>,
    pub gpu_ms: RwSignal<Option<f64>>,
    pub remaining_ms: RwSignal<f64>,
    pub sample_count: RwSignal<usize>,
    pub is_running: RwSignal<bool>,
    pub status: RwSignal<String>,
    pub logs: RwSignal<Vec<String>>,
    pub logs_paused: RwSignal<bool>,
}

static GLOBALS: OnceCell<Globals> = OnceCell::new();

pub fn globals() -> &'static Globals {
    GLOBALS.get_or_init(|| Globals {
        phase: create_rw_signal(Phase::Idle),
        fps: create_rw_signal(0.0),
        cpu_ms: create_rw_signal(0.0),
        gpu_ms: create_rw_signal(None),
        remaining_ms: create_rw_signal(0.0),
        sample_count: create_rw_signal(0),
        is_running: create_rw_signal(false),
        status: create_rw_signal(String::new()),
        logs: create_rw_signal(Vec::new()),
        logs_paused: create_rw_signal(false),
    })
}

crate::global_signals! {
    pub phase_signal => phase: Phase,
    pub fps_signal => fps: f64,
    pub cpu_ms_signal => cpu_ms: f64,
    pub gpu_ms_signal => gpu_ms: Option<f64>,
    pub remaining_ms_signal => remaining_ms: f64,
    pub sample_count_signal => sample_count: usize,
    pub is_running_signal => is_running: bool,
    pub status_signal => status: String,
    pub logs_signal => logs: Vec<String>,
    pub logs_paused_signal => logs_paused: bool,
}

/// Mirror controller events into the overlay signals.
pub fn apply_event(event: &BenchmarkEvent) {
    match event {
        BenchmarkEvent::PhaseChanged { to, .. } => {
            phase_signal().set(*to);
            is_running_signal().set(to.is_running());
            if *to == Phase::WarmingUp {
                sample_count_signal().set(0);
                gpu_ms_signal().set(None);
            }
        }
        BenchmarkEvent::FrameRendered { fps, cpu_ms, gpu_ms, remaining_ms, .. } => {
            fps_signal().set(*fps);
            cpu_ms_signal().set(*cpu_ms);
            gpu_ms_signal().set(*gpu_ms);
            remaining_ms_signal().set(*remaining_ms);
        }
        BenchmarkEvent::SampleRecorded { count, .. } => sample_count_signal().set(*count),
        BenchmarkEvent::RunFinished { run, samples, exported, .. } => {
            is_running_signal().set(false);
            status_signal().set(format!(
                "{} finished with {} samples{}",
                run,
                samples,
                if *exported { ", CSV saved" } else { "" }
            ));
        }
        BenchmarkEvent::RunFailed { reason, .. } => {
            is_running_signal().set(false);
            status_signal().set(reason.clone());
        }
    }
}

/// Append a log line unless the console is paused.
pub fn push_log_line(line: String) {
    if logs_paused_signal().get_untracked() {
        return;
    }
    logs_signal().update(|lines| {
        lines.push(line);
        if lines.len() > MAX_LOG_LINES {
            let overflow = lines.len() - MAX_LOG_LINES;
            lines.drain(..overflow);
        }
    });
}
