use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use crate::domain::benchmark::ResultSink;
use crate::domain::logging::{LogComponent, get_logger};

/// Saves the exported table through a transient `<a download>` link.
#[derive(Default)]
pub struct BrowserDownload;

impl BrowserDownload {
    pub fn new() -> Self {
        Self
    }

    fn save(file_name: &str, bytes: &[u8]) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("document not available"))?;

        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type("text/csv");
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
        let url = Url::create_object_url_with_blob(&blob)?;

        let anchor = document
            .create_element("a")?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(|_| JsValue::from_str("created element is not an anchor"))?;
        anchor.set_href(&url);
        anchor.set_download(file_name);
        anchor.click();

        Url::revoke_object_url(&url)
    }
}

impl ResultSink for BrowserDownload {
    fn deliver(&mut self, file_name: &str, bytes: Vec<u8>) {
        match Self::save(file_name, &bytes) {
            Ok(()) => get_logger().info(
                LogComponent::Infrastructure("Download"),
                &format!("saved {} ({} bytes)", file_name, bytes.len()),
            ),
            Err(err) => get_logger().error(
                LogComponent::Infrastructure("Download"),
                &format!("failed to save {}: {:?}", file_name, err),
            ),
        }
    }
}
