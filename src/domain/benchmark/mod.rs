pub mod clock;
pub mod config;
pub mod export;
pub mod ports;
pub mod sampler;
pub mod session;
pub mod value_objects;

pub use clock::FrameClock;
pub use config::{BenchmarkConfig, MAX_OBJECTS};
pub use export::{CSV_HEADER, MissingGpuCell, to_csv, to_csv_with};
pub use ports::{HostScheduler, RenderBackend, ResultSink};
pub use sampler::{FpsWindow, PerformanceSampler};
pub use session::BenchmarkSession;
pub use value_objects::*;
