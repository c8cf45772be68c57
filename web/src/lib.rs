//! QP Archive client – session handling, backend API, navigation guards,
//! the page controllers behind every screen and their Leptos views.

pub mod api;
pub mod app;
pub mod browser;
pub mod cascade;
pub mod components;
pub mod download;
pub mod notice;
pub mod pages;
pub mod session;
pub mod views;

/// Entry-point called from the WASM bundle to hydrate the server-rendered HTML.
///
/// The backend origin is fixed at build time through `QPARCHIVE_API_BASE_URL`.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use leptos::prelude::*;
    use qparchive_common::config::{Config, DEFAULT_API_BASE_URL};

    console_error_panic_hook::set_once();

    let config = Config {
        api_base_url: option_env!("QPARCHIVE_API_BASE_URL")
            .unwrap_or(DEFAULT_API_BASE_URL)
            .to_string(),
        ..Config::default()
    };
    match app::App::new(config, session::SessionStore::browser()) {
        Ok(app) => leptos::mount::hydrate_body(move || {
            provide_context(app);
            view! { <views::QpArchive/> }
        }),
        Err(e) => leptos::logging::error!("Cannot start: {e:#}"),
    }
}
