pub mod canvas;
pub mod download;
pub mod host;
pub mod rendering;
pub mod services;

pub use download::BrowserDownload;
pub use host::BrowserScheduler;
pub use rendering::{BrowserBackendProvider, initialize_backend};
