/// Errors surfaced by the benchmark harness.
#[derive(Debug, Clone, PartialEq)]
pub enum BenchError {
    /// The requested GPU API is not exposed by the host.
    BackendUnavailable(String),
    /// The API exists but adapter/device negotiation failed.
    DeviceRequestFailed(String),
    /// `start` was requested while another run is active.
    AlreadyRunning,
    /// An async result arrived for a run that is no longer live.
    StaleAsyncResult,
    InvalidConfig(String),
    Rendering(String),
}

impl std::fmt::Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchError::BackendUnavailable(msg) => write!(f, "Backend unavailable: {}", msg),
            BenchError::DeviceRequestFailed(msg) => write!(f, "Device request failed: {}", msg),
            BenchError::AlreadyRunning => write!(f, "A benchmark is already running"),
            BenchError::StaleAsyncResult => write!(f, "Discarded result of a finished run"),
            BenchError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            BenchError::Rendering(msg) => write!(f, "Rendering Error: {}", msg),
        }
    }
}

impl std::error::Error for BenchError {}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::InvalidConfig(err.to_string())
    }
}

pub type BenchResult<T> = Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failure() {
        assert_eq!(
            BenchError::BackendUnavailable("webgpu".into()).to_string(),
            "Backend unavailable: webgpu"
        );
        assert_eq!(BenchError::AlreadyRunning.to_string(), "A benchmark is already running");
    }

    #[test]
    fn json_errors_become_invalid_config() {
        let err: BenchError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, BenchError::InvalidConfig(_)));
    }
}
