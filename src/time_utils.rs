/// Milliseconds on the host's monotonic clock.
///
/// `performance.now()` in the browser, time since first use natively.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or_else(js_sys::Date::now)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use once_cell::sync::Lazy;
    use std::time::Instant;

    static ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);
    ORIGIN.elapsed().as_secs_f64() * 1000.0
}

/// `SS.mmm` style label for monotonic timestamps, e.g. `12.045s`.
pub fn format_elapsed(timestamp_ms: f64) -> String {
    if !timestamp_ms.is_finite() || timestamp_ms < 0.0 {
        return "--.---s".to_string();
    }
    format!("{:.3}s", timestamp_ms / 1000.0)
}

/// Remaining time label for the overlay, rounded up to whole seconds.
pub fn format_countdown(remaining_ms: f64) -> String {
    let secs = (remaining_ms.max(0.0) / 1000.0).ceil() as u64;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_labels() {
        assert_eq!(format_elapsed(12_045.0), "12.045s");
        assert_eq!(format_elapsed(-1.0), "--.---s");
        assert_eq!(format_elapsed(f64::NAN), "--.---s");
    }

    #[test]
    fn countdown_rounds_up() {
        assert_eq!(format_countdown(15_000.0), "0:15");
        assert_eq!(format_countdown(59_001.0), "1:00");
        assert_eq!(format_countdown(-5.0), "0:00");
    }

    #[test]
    fn native_clock_is_monotonic() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
    }
}
