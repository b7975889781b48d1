use super::config::BenchmarkConfig;
use super::value_objects::{BackendKind, FinishReason, FrameSample, Phase, RunId};
use crate::domain::errors::{BenchError, BenchResult};

/// One run of the harness. Owned exclusively by the lifecycle controller and
/// created fresh for every run.
#[derive(Debug, Clone)]
pub struct BenchmarkSession {
    run: RunId,
    config: BenchmarkConfig,
    phase: Phase,
    samples: Vec<FrameSample>,
    start_of_capture: Option<f64>,
    stopped_manually: bool,
    backend_used: Option<BackendKind>,
    finish_reason: Option<FinishReason>,
}

impl BenchmarkSession {
    pub fn new(run: RunId, config: BenchmarkConfig) -> Self {
        Self {
            run,
            config,
            phase: Phase::Idle,
            samples: Vec::new(),
            start_of_capture: None,
            stopped_manually: false,
            backend_used: None,
            finish_reason: None,
        }
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn samples(&self) -> &[FrameSample] {
        &self.samples
    }

    pub fn start_of_capture(&self) -> Option<f64> {
        self.start_of_capture
    }

    pub fn stopped_manually(&self) -> bool {
        self.stopped_manually
    }

    pub fn backend_used(&self) -> Option<BackendKind> {
        self.backend_used
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    /// `<scene>-<backend>-<objects>.csv`, using the backend that actually ran.
    pub fn export_file_name(&self) -> String {
        let backend = self.backend_used.unwrap_or(self.config.backend);
        format!("{}-{}-{}.csv", self.config.scene, backend, self.config.object_count)
    }

    fn transition(&mut self, next: Phase) -> BenchResult<()> {
        if !self.phase.can_transition_to(next) {
            return Err(BenchError::Rendering(format!(
                "illegal phase transition {} -> {}",
                self.phase, next
            )));
        }
        self.phase = next;
        Ok(())
    }

    pub fn begin_warm_up(&mut self) -> BenchResult<()> {
        self.transition(Phase::WarmingUp)
    }

    /// Initialization failed: fall back to `Idle` with nothing recorded.
    pub fn roll_back(&mut self) -> BenchResult<()> {
        self.transition(Phase::Idle)
    }

    pub fn set_backend_used(&mut self, kind: BackendKind) {
        self.backend_used = Some(kind);
    }

    pub fn begin_capture(&mut self, now_ms: f64) -> BenchResult<()> {
        self.transition(Phase::Capturing)?;
        self.start_of_capture = Some(now_ms);
        Ok(())
    }

    pub fn finish(&mut self, reason: FinishReason) -> BenchResult<()> {
        self.transition(Phase::Finished)?;
        self.stopped_manually = reason == FinishReason::Manual;
        self.finish_reason = Some(reason);
        Ok(())
    }

    /// Append a sample. Only accepted while capturing; offsets are kept
    /// non-decreasing from zero, and a NaN offset repeats the previous one.
    pub fn record(&mut self, mut sample: FrameSample) -> bool {
        if self.phase != Phase::Capturing {
            return false;
        }
        let floor = self.samples.last().map_or(0.0, |last| last.time_offset_ms);
        if !(sample.time_offset_ms >= floor) {
            sample.time_offset_ms = floor;
        }
        self.samples.push(sample);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scene::SceneId;
    use quickcheck_macros::quickcheck;

    fn session() -> BenchmarkSession {
        BenchmarkSession::new(RunId(1), BenchmarkConfig::for_scene(SceneId::TorusBatched))
    }

    #[test]
    fn samples_rejected_outside_capture() {
        let mut s = session();
        assert!(!s.record(FrameSample::new(0.0, 60.0, 1.0, None)));
        s.begin_warm_up().unwrap();
        assert!(!s.record(FrameSample::new(0.0, 60.0, 1.0, None)));
        s.begin_capture(5000.0).unwrap();
        assert!(s.record(FrameSample::new(0.0, 60.0, 1.0, None)));
        assert_eq!(s.samples().len(), 1);
        assert_eq!(s.start_of_capture(), Some(5000.0));
    }

    #[test]
    fn offsets_never_go_backward() {
        let mut s = session();
        s.begin_warm_up().unwrap();
        s.begin_capture(0.0).unwrap();
        s.record(FrameSample::new(10.0, 60.0, 1.0, None));
        s.record(FrameSample::new(4.0, 60.0, 1.0, None));
        assert_eq!(s.samples()[1].time_offset_ms, 10.0);
    }

    #[test]
    fn nan_offset_repeats_the_previous_one() {
        let mut s = session();
        s.begin_warm_up().unwrap();
        s.begin_capture(0.0).unwrap();
        s.record(FrameSample::new(f64::NAN, 60.0, 1.0, None));
        s.record(FrameSample::new(16.0, 60.0, 1.0, None));
        s.record(FrameSample::new(f64::NAN, 60.0, 1.0, None));
        let offsets: Vec<f64> = s.samples().iter().map(|sample| sample.time_offset_ms).collect();
        assert_eq!(offsets, vec![0.0, 16.0, 16.0]);
    }

    #[quickcheck]
    fn recorded_offsets_are_non_decreasing(offsets: Vec<f64>) -> bool {
        let mut s = session();
        s.begin_warm_up().unwrap();
        s.begin_capture(0.0).unwrap();
        for offset in &offsets {
            s.record(FrameSample::new(*offset, 60.0, 1.0, None));
        }
        s.samples().len() == offsets.len()
            && s.samples().first().is_none_or(|first| first.time_offset_ms >= 0.0)
            && s.samples().windows(2).all(|w| w[0].time_offset_ms <= w[1].time_offset_ms)
    }

    #[test]
    fn manual_finish_sets_flag() {
        let mut s = session();
        s.begin_warm_up().unwrap();
        s.finish(FinishReason::Manual).unwrap();
        assert_eq!(s.phase(), Phase::Finished);
        assert!(s.stopped_manually());
        assert!(s.finish(FinishReason::Manual).is_err());
    }

    #[test]
    fn capture_requires_warm_up_first() {
        let mut s = session();
        assert!(s.begin_capture(0.0).is_err());
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn file_name_prefers_backend_that_ran() {
        let mut s = session();
        assert_eq!(s.export_file_name(), "torus-batched-nextgen-gpu-10000.csv");
        s.set_backend_used(BackendKind::Raster);
        assert_eq!(s.export_file_name(), "torus-batched-raster-10000.csv");
    }
}
