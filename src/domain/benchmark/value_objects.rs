use serde::{Deserialize, Serialize};

/// Which GPU programming interface drives the run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum BackendKind {
    /// Rasterization API (WebGL2).
    #[serde(rename = "raster")]
    #[strum(to_string = "raster", serialize = "webgl")]
    Raster,
    /// Explicit next-generation API (WebGPU).
    #[serde(rename = "nextgen-gpu")]
    #[strum(to_string = "nextgen-gpu", serialize = "webgpu")]
    NextGenGpu,
}

impl BackendKind {
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::Raster => "WebGL2",
            BackendKind::NextGenGpu => "WebGPU",
        }
    }
}

/// Lifecycle phase of a benchmark session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr)]
pub enum Phase {
    Idle,
    WarmingUp,
    Capturing,
    Finished,
}

impl Phase {
    /// Whether frames are being rendered in this phase.
    pub fn is_running(&self) -> bool {
        matches!(self, Phase::WarmingUp | Phase::Capturing)
    }

    /// Legal edges of the lifecycle graph. `WarmingUp -> Idle` is the
    /// initialization-failure rollback.
    pub fn can_transition_to(&self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::WarmingUp)
                | (Phase::WarmingUp, Phase::Idle)
                | (Phase::WarmingUp, Phase::Capturing)
                | (Phase::WarmingUp, Phase::Finished)
                | (Phase::Capturing, Phase::Finished)
        )
    }
}

/// One-shot timers that drive phase transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum PhaseTimer {
    WarmUpElapsed,
    CaptureElapsed,
}

/// Why a run reached `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum FinishReason {
    Timer,
    Manual,
}

/// Liveness token identifying one run of the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RunId(pub u64);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// One GPU timing measurement. `sequence` identifies the measurement so that
/// a value re-reported by a lagging readback is recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpuReading {
    pub sequence: u64,
    pub millis: f64,
}

/// What a backend reports for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTiming {
    pub cpu_ms: f64,
    pub gpu: Option<GpuReading>,
}

/// One measurement per captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSample {
    /// Milliseconds since capture start.
    pub time_offset_ms: f64,
    pub fps: f64,
    pub cpu_ms: f64,
    /// `None` when the backend has no GPU timing (or none has resolved yet).
    pub gpu_ms: Option<f64>,
}

impl FrameSample {
    pub fn new(time_offset_ms: f64, fps: f64, cpu_ms: f64, gpu_ms: Option<f64>) -> Self {
        Self { time_offset_ms, fps, cpu_ms, gpu_ms }
    }
}
