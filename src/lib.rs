use wasm_bindgen::prelude::*;

use crate::domain::logging::{LogComponent, get_logger};

pub mod app;
pub mod application;
pub mod domain;
pub mod global_state;
pub mod infrastructure;
pub mod macros;
pub mod presentation;
pub mod time_utils;

pub use presentation::wasm_api::BenchmarkApi;

/// Install logging and the panic hook as soon as the module loads.
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();

    let console = if cfg!(debug_assertions) {
        infrastructure::services::ConsoleLogger::new_development()
    } else {
        infrastructure::services::ConsoleLogger::new_production()
    };
    domain::logging::init_logger(Box::new(app::LeptosLogger::new(console)));
    domain::logging::init_time_provider(Box::new(
        infrastructure::services::BrowserTimeProvider::new(),
    ));

    get_logger().info(
        LogComponent::Presentation("Initialize"),
        &format!("scene bench {} ready", env!("CARGO_PKG_VERSION")),
    );
}

/// Mount the control panel and live overlay.
#[wasm_bindgen(js_name = mountApp)]
pub fn mount_app() {
    leptos::mount_to_body(app::App);
}
