pub mod controller;
pub mod runner;

pub use controller::BenchmarkController;
pub use runner::{BackendProvider, BenchmarkRunner};
