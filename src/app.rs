use leptos::*;
use std::str::FromStr;
use strum::IntoEnumIterator;

use crate::{
    domain::{
        benchmark::{BackendKind, Phase},
        logging::{LogComponent, LogEntry, Logger, get_logger},
        scene::SceneId,
    },
    global_state::{
        cpu_ms_signal, fps_signal, gpu_ms_signal, is_running_signal, logs_paused_signal,
        logs_signal, phase_signal, push_log_line, remaining_ms_signal, sample_count_signal,
        status_signal,
    },
    infrastructure::services::ConsoleLogger,
    presentation::{harness, stop_current_run},
    time_utils::format_countdown,
};

/// Bridge logger: browser console plus the on-page debug console.
pub struct LeptosLogger {
    console: ConsoleLogger,
}

impl LeptosLogger {
    pub fn new(console: ConsoleLogger) -> Self {
        Self { console }
    }
}

impl Logger for LeptosLogger {
    fn log(&self, entry: LogEntry) {
        if entry.level < self.console.min_level() {
            return;
        }
        push_log_line(entry.format());
        self.console.log(entry);
    }
}

/// Overlay label for the current phase.
pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Idle",
        Phase::WarmingUp => "Warming...",
        Phase::Capturing => "Capturing...",
        Phase::Finished => "Finished",
    }
}

#[component]
pub fn App() -> impl IntoView {
    view! {
        <style>
            "
            body { margin: 0; background: #101014; color: #e6e6e6; font-family: monospace; overflow: hidden; }
            #bench-canvas { position: fixed; inset: 0; width: 100vw; height: 100vh; }
            .panel { position: fixed; top: 12px; left: 12px; background: rgba(16,16,20,0.85); padding: 10px; border-radius: 6px; display: flex; flex-direction: column; gap: 6px; min-width: 220px; }
            .panel select, .panel input, .panel button { font-family: monospace; }
            .panel .status { color: #9aa0a6; font-size: 12px; max-width: 260px; }
            .overlay { position: fixed; top: 12px; right: 12px; background: rgba(16,16,20,0.85); padding: 10px; border-radius: 6px; min-width: 180px; }
            .overlay .phase { font-weight: bold; color: #ffd166; }
            .debug-console { position: fixed; bottom: 0; left: 0; right: 0; max-height: 160px; background: rgba(0,0,0,0.8); font-size: 11px; }
            .debug-header { display: flex; gap: 8px; padding: 4px 8px; border-bottom: 1px solid #333; }
            .debug-log { overflow-y: auto; max-height: 130px; padding: 4px 8px; }
            "
        </style>
        <ControlPanel/>
        <StatsOverlay/>
        <DebugConsole/>
    }
}

#[component]
fn ControlPanel() -> impl IntoView {
    let scene = create_rw_signal(SceneId::default());
    let backend = create_rw_signal(BackendKind::NextGenGpu);
    let object_count = create_rw_signal(SceneId::default().descriptor().default_objects.to_string());
    let is_running = is_running_signal();

    let on_start = move |_| {
        if is_running.get_untracked() {
            return;
        }
        let scene = scene.get_untracked();
        let backend = backend.get_untracked();
        let count = object_count.get_untracked().trim().parse::<u32>().ok();

        is_running.set(true);
        status_signal().set(format!("starting {} on {}", scene, backend.label()));
        spawn_local(async move {
            if let Err(err) = harness().start(scene, backend, count).await {
                get_logger().error(LogComponent::Presentation("ControlPanel"), &err.to_string());
                status_signal().set(err.to_string());
                is_running_signal().set(false);
            }
        });
    };

    view! {
        <div class="panel">
            <select
                disabled=move || is_running.get()
                on:change=move |ev| {
                    if let Ok(id) = SceneId::from_str(&event_target_value(&ev)) {
                        scene.set(id);
                        object_count.set(id.descriptor().default_objects.to_string());
                    }
                }
            >
                {SceneId::iter()
                    .map(|id| {
                        view! {
                            <option value=id.to_string() selected=move || scene.get() == id>
                                {id.descriptor().title}
                            </option>
                        }
                    })
                    .collect_view()}
            </select>
            <select
                disabled=move || is_running.get()
                on:change=move |ev| {
                    if let Ok(kind) = BackendKind::from_str(&event_target_value(&ev)) {
                        backend.set(kind);
                    }
                }
            >
                {BackendKind::iter()
                    .map(|kind| {
                        view! {
                            <option value=kind.to_string() selected=move || backend.get() == kind>
                                {kind.label()}
                            </option>
                        }
                    })
                    .collect_view()}
            </select>
            <input
                type="number"
                min="1"
                disabled=move || is_running.get()
                prop:value=move || object_count.get()
                on:input=move |ev| object_count.set(event_target_value(&ev))
            />
            <button disabled=move || is_running.get() on:click=on_start>"Start"</button>
            <Show when=move || is_running.get()>
                <button on:click=move |_| {
                    stop_current_run();
                }>"Stop"</button>
            </Show>
            <div class="status">{move || status_signal().get()}</div>
        </div>
    }
}

#[component]
fn StatsOverlay() -> impl IntoView {
    view! {
        <div class="overlay">
            <div class="phase">
                {move || {
                    let phase = phase_signal().get();
                    if phase.is_running() {
                        format!("{} {}", phase_label(phase), format_countdown(remaining_ms_signal().get()))
                    } else {
                        phase_label(phase).to_string()
                    }
                }}
            </div>
            <div>{move || format!("FPS: {:.1}", fps_signal().get())}</div>
            <div>{move || format!("CPU: {:.2} ms", cpu_ms_signal().get())}</div>
            <div>
                {move || match gpu_ms_signal().get() {
                    Some(ms) => format!("GPU: {:.2} ms", ms),
                    None => "GPU: n/a".to_string(),
                }}
            </div>
            <div>{move || format!("Samples: {}", sample_count_signal().get())}</div>
        </div>
    }
}

#[component]
fn DebugConsole() -> impl IntoView {
    let logs = logs_signal();
    let is_paused = logs_paused_signal();

    view! {
        <div class="debug-console">
            <div class="debug-header">
                <span>"Log"</span>
                <button on:click=move |_| is_paused.update(|p| *p = !*p)>
                    {move || if is_paused.get() { "Resume" } else { "Pause" }}
                </button>
                <button on:click=move |_| logs.set(Vec::new())>"Clear"</button>
            </div>
            <div class="debug-log">
                <For
                    each=move || logs.get().into_iter().enumerate()
                    key=|(index, line)| (*index, line.clone())
                    children=move |(_, line)| view! { <div class="log-line">{line}</div> }
                />
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_phases_have_progress_labels() {
        assert_eq!(phase_label(Phase::WarmingUp), "Warming...");
        assert_eq!(phase_label(Phase::Capturing), "Capturing...");
        assert_eq!(phase_label(Phase::Idle), "Idle");
    }
}
