/// Tracks wall time between rendered frames.
///
/// The host clock is passed in on every call, so the clock itself is a pure
/// state machine over "last tick time".
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: f64,
}

impl FrameClock {
    pub fn new(now_ms: f64) -> Self {
        Self { last_ms: now_ms }
    }

    /// Seconds since the previous tick (or since creation). A host clock that
    /// went backward yields `0` and the reference point is kept.
    pub fn tick(&mut self, now_ms: f64) -> f64 {
        let delta_ms = now_ms - self.last_ms;
        if !(delta_ms > 0.0) {
            return 0.0;
        }
        self.last_ms = now_ms;
        delta_ms / 1000.0
    }
}
