//! Server entry-point – Axum + Leptos SSR.

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use axum::Router;
    use leptos::prelude::*;
    use leptos_axum::{generate_route_list, LeptosRoutes};
    use tower_http::services::ServeDir;

    use qparchive_common::config::{self, Config};
    use qparchive_web::app::App;
    use qparchive_web::session::SessionStore;
    use qparchive_web::views::{shell, QpArchive};

    // ── Tracing ──────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qparchive_web=info,tower_http=info".into()),
        )
        .init();

    // ── Configuration ────────────────────────────────────────────────────
    let conf = get_configuration(None).context("Leptos configuration")?;
    let leptos_options = conf.leptos_options;
    let addr = leptos_options.site_addr;
    let site_root = leptos_options.site_root.to_string();

    let config_path = std::env::var_os("QPARCHIVE_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| Config::default_path().into());
    let config = config::load_or_default(&config_path).context("Config load failed")?;
    tracing::info!("Backend {}", config.api_base_url);

    // Server rendering never sees the visitor's session; it lives in the
    // browser's localStorage.
    let app = App::new(config, SessionStore::in_memory())?;

    // ── Routes ───────────────────────────────────────────────────────────
    let routes = generate_route_list(QpArchive);

    let router = Router::new()
        .leptos_routes_with_context(
            &leptos_options,
            routes,
            {
                let app = app.clone();
                move || provide_context(app.clone())
            },
            {
                let options = leptos_options.clone();
                move || shell(options.clone())
            },
        )
        // Serve static assets (WASM bundle, CSS)
        .nest_service("/pkg", ServeDir::new(format!("{site_root}/pkg")))
        .fallback(leptos_axum::file_and_error_handler_with_context(
            move || provide_context(app.clone()),
            shell,
        ))
        .with_state(leptos_options);

    tracing::info!("QP Archive listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind {addr}"))?;
    axum::serve(listener, router.into_make_service())
        .await
        .context("Server error")?;
    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    // This binary is only built with the `ssr` feature.
    // The WASM entry point is `lib::hydrate()`.
}
