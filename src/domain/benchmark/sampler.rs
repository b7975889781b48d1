//! Frame statistics: FPS estimation and sample novelty tracking.

use super::value_objects::{FrameSample, GpuReading};

/// Width of the rolling FPS window.
pub const FPS_WINDOW_MS: f64 = 1000.0;

/// Rolling one-second FPS estimate.
///
/// Instantaneous `1000 / delta` values are dominated by single-frame jitter, so
/// frames are counted over a wall-clock window and the rate is published only
/// when the window closes.
#[derive(Debug, Clone, Default)]
pub struct FpsWindow {
    accumulated_ms: f64,
    frames: u32,
    current: f64,
}

impl FpsWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame delta; returns the latest published rate (0 until the
    /// first window closes).
    pub fn push(&mut self, delta_ms: f64) -> f64 {
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.accumulated_ms += delta_ms;
        }
        self.frames += 1;
        if self.accumulated_ms >= FPS_WINDOW_MS {
            self.current = self.frames as f64 * 1000.0 / self.accumulated_ms;
            self.accumulated_ms = 0.0;
            self.frames = 0;
        }
        self.current
    }

    pub fn current(&self) -> f64 {
        self.current
    }
}

/// Converts raw per-frame timing into `FrameSample`s.
///
/// Holds no notion of "capturing"; the caller only invokes it while capturing.
#[derive(Debug, Clone, Default)]
pub struct PerformanceSampler {
    last_gpu_sequence: Option<u64>,
}

impl PerformanceSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when the GPU measurement has not advanced since the last
    /// call. Frames without any GPU reading are always novel.
    pub fn observe(
        &mut self,
        time_offset_ms: f64,
        fps: f64,
        cpu_ms: f64,
        gpu: Option<GpuReading>,
    ) -> Option<FrameSample> {
        let gpu_ms = match gpu {
            Some(reading) => {
                if self.last_gpu_sequence == Some(reading.sequence) {
                    return None;
                }
                self.last_gpu_sequence = Some(reading.sequence);
                Some(reading.millis.max(0.0))
            }
            None => None,
        };

        let fps = if fps.is_finite() { fps.max(0.0) } else { 0.0 };
        Some(FrameSample::new(time_offset_ms, fps, cpu_ms.max(0.0), gpu_ms))
    }

    pub fn last_gpu_sequence(&self) -> Option<u64> {
        self.last_gpu_sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn reading(sequence: u64, millis: f64) -> Option<GpuReading> {
        Some(GpuReading { sequence, millis })
    }

    #[test]
    fn fps_is_zero_until_window_closes() {
        let mut window = FpsWindow::new();
        for _ in 0..49 {
            assert_eq!(window.push(20.0), 0.0);
        }
        assert_eq!(window.push(20.0), 50.0);
    }

    #[test]
    fn fps_window_resets_after_publishing() {
        let mut window = FpsWindow::new();
        for _ in 0..25 {
            window.push(40.0);
        }
        assert_eq!(window.current(), 25.0);
        // A faster window replaces the value only once it closes.
        for _ in 0..49 {
            window.push(20.0);
        }
        assert_eq!(window.current(), 25.0);
        window.push(20.0);
        assert_eq!(window.current(), 50.0);
    }

    #[test]
    fn repeated_gpu_reading_is_emitted_once() {
        let mut sampler = PerformanceSampler::new();
        let emitted: Vec<_> = (0..3)
            .filter_map(|i| sampler.observe(i as f64 * 16.7, 60.0, 2.0, reading(7, 1.25)))
            .collect();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].gpu_ms, Some(1.25));
    }

    #[test]
    fn identical_values_with_new_identity_are_kept() {
        let mut sampler = PerformanceSampler::new();
        assert!(sampler.observe(0.0, 60.0, 2.0, reading(1, 1.0)).is_some());
        assert!(sampler.observe(16.7, 60.0, 2.0, reading(2, 1.0)).is_some());
        assert_eq!(sampler.last_gpu_sequence(), Some(2));
    }

    #[test]
    fn missing_gpu_timing_always_samples() {
        let mut sampler = PerformanceSampler::new();
        for i in 0..5 {
            let sample = sampler.observe(i as f64, 60.0, 1.0, None).unwrap();
            assert_eq!(sample.gpu_ms, None);
        }
    }

    #[test]
    fn negative_or_nan_fps_clamps_to_zero() {
        let mut sampler = PerformanceSampler::new();
        assert_eq!(sampler.observe(0.0, -3.0, 1.0, None).unwrap().fps, 0.0);
        assert_eq!(sampler.observe(1.0, f64::NAN, 1.0, None).unwrap().fps, 0.0);
    }

    #[quickcheck]
    fn fps_is_never_negative(deltas: Vec<u16>) -> bool {
        let mut window = FpsWindow::new();
        deltas.into_iter().all(|d| window.push(d as f64) >= 0.0)
    }

    #[quickcheck]
    fn emissions_match_distinct_sequence_runs(seqs: Vec<u8>) -> bool {
        let mut sampler = PerformanceSampler::new();
        let emitted = seqs
            .iter()
            .filter(|&&s| sampler.observe(0.0, 60.0, 1.0, reading(s as u64, 1.0)).is_some())
            .count();
        let mut runs = 0;
        let mut prev = None;
        for s in &seqs {
            if prev != Some(s) {
                runs += 1;
            }
            prev = Some(s);
        }
        emitted == runs
    }
}
