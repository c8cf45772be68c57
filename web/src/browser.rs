//! Browser-only side effects: saving a download, reading a picked file and
//! asking for confirmation. Builds without `hydrate` get inert versions,
//! since event handlers only ever run in the browser.

use leptos::ev::Event;

use crate::pages::upload::PickedFile;

cfg_if::cfg_if! {
    if #[cfg(feature = "hydrate")] {
        use leptos::task::spawn_local;
        use tracing::debug;
        use wasm_bindgen::JsCast;
        use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlInputElement, Url};

        fn js_error(e: wasm_bindgen::JsValue) -> String {
            format!("{e:?}")
        }

        /// Hand `bytes` to the browser as a download named `name`.
        pub fn offer_download(name: &str, bytes: &[u8]) -> Result<(), String> {
            let window = web_sys::window().ok_or("no window")?;
            let document = window.document().ok_or("no document")?;

            let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
            let options = BlobPropertyBag::new();
            options.set_type("application/pdf");
            let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
                .map_err(js_error)?;
            let url = Url::create_object_url_with_blob(&blob).map_err(js_error)?;

            let anchor: HtmlAnchorElement = document
                .create_element("a")
                .map_err(js_error)?
                .dyn_into()
                .map_err(|_| "not an anchor".to_string())?;
            anchor.set_href(&url);
            anchor.set_download(name);
            anchor.click();

            Url::revoke_object_url(&url).map_err(js_error)
        }

        /// Read the file chosen in the `<input type="file">` behind `ev` and
        /// pass it to `done` (`None` when the selection was cleared).
        pub fn read_picked_file(ev: &Event, done: impl FnOnce(Option<PickedFile>) + 'static) {
            let file = ev
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                .and_then(|input| input.files())
                .and_then(|files| files.get(0));
            spawn_local(async move {
                let picked = match file {
                    Some(file) => {
                        match wasm_bindgen_futures::JsFuture::from(file.array_buffer()).await {
                            Ok(buffer) => Some(PickedFile::new(
                                file.name(),
                                js_sys::Uint8Array::new(&buffer).to_vec(),
                            )),
                            Err(e) => {
                                debug!("Reading {} failed: {e:?}", file.name());
                                None
                            }
                        }
                    }
                    None => None,
                };
                done(picked);
            });
        }

        pub fn confirm(question: &str) -> bool {
            web_sys::window()
                .and_then(|w| w.confirm_with_message(question).ok())
                .unwrap_or(false)
        }
    } else {
        pub fn offer_download(_name: &str, _bytes: &[u8]) -> Result<(), String> {
            Err("downloads need a browser".into())
        }

        pub fn read_picked_file(_ev: &Event, done: impl FnOnce(Option<PickedFile>) + 'static) {
            done(None);
        }

        pub fn confirm(_question: &str) -> bool {
            false
        }
    }
}
