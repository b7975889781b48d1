use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::value_objects::FrameSample;

pub const CSV_HEADER: [&str; 4] = ["Time (ms)", "FPS", "CPU (ms)", "GPU (ms)"];

/// How a frame without a GPU time is written in the `GPU (ms)` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MissingGpuCell {
    /// Empty field: the backend could not time the frame.
    #[default]
    Empty,
    /// `0.00`, for consumers that expect every field to be numeric.
    Zero,
}

/// Render samples as a comma-separated table: one header row, then one row
/// per sample with two-decimal fields. Rows are joined by `\n`.
///
/// A missing GPU time is an empty field, so "unsupported" and "measured as
/// zero" stay distinguishable. See [`to_csv_with`] for the numeric form.
pub fn to_csv(samples: &[FrameSample]) -> Vec<u8> {
    to_csv_with(samples, MissingGpuCell::Empty)
}

pub fn to_csv_with(samples: &[FrameSample], missing_gpu: MissingGpuCell) -> Vec<u8> {
    let mut lines = Vec::with_capacity(samples.len() + 1);
    lines.push(CSV_HEADER.join(","));
    lines.extend(samples.iter().map(|s| {
        let gpu = match (s.gpu_ms, missing_gpu) {
            (Some(gpu), _) => format!("{:.2}", gpu),
            (None, MissingGpuCell::Zero) => format!("{:.2}", 0.0),
            (None, MissingGpuCell::Empty) => String::new(),
        };
        format!("{:.2},{:.2},{:.2},{}", s.time_offset_ms, s.fps, s.cpu_ms, gpu)
    }));
    lines.join("\n").into_bytes()
}
