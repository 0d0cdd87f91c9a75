//! # Montage Server
//!
//! Local embedded server for the montage editor.
//! Binds to localhost only for security.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use montage_render::{ComposeConfig, Compositor, FontLibrary};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use montage_server::blend::BlendClient;
use montage_server::gallery::Gallery;
use montage_server::library;
use montage_server::routes;
use montage_server::store::SessionStore;
use montage_server::{AppState, CliArgs, ServerConfig};

/// Build a CORS layer that only allows localhost origins.
///
/// This is a security measure to ensure the server only accepts requests from
/// the local machine. The server is designed to run on localhost only.
fn build_cors_layer(port: u16) -> CorsLayer {
    // Allowed localhost origins with the configured port
    let localhost_origins = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
        // Also allow common development ports for dev servers
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(), // Vite
        "http://localhost:8080".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://127.0.0.1:8080".to_string(),
    ];

    let origins: Vec<HeaderValue> = localhost_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,montage_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output (recommended for production).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,montage_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    // Use JSON format in production (RUST_LOG_FORMAT=json)
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with optional JSON format
    init_tracing();

    let config = ServerConfig::from(CliArgs::parse());

    let backgrounds = library::load_backgrounds(
        config.backgrounds_dir.as_deref(),
        config.canvas_width,
        config.canvas_height,
    );
    tracing::info!("Loaded {} background image(s)", backgrounds.len());

    let sessions = SessionStore::new(backgrounds, config.canvas_width, config.canvas_height)?;
    let gallery = Gallery::new(&config.gallery_dir)?;
    tracing::info!("Saving creations to {:?}", gallery.dir());

    let fonts = if config.font_dirs.is_empty() {
        FontLibrary::with_system_dirs()
    } else {
        FontLibrary::new(config.font_dirs.clone())
    };
    let compositor = Arc::new(Compositor::new(ComposeConfig::default(), fonts));

    let blend = init_blend_client(config.blend_url.as_deref());

    let state = AppState {
        sessions,
        compositor,
        gallery,
        blend,
    };

    // Build the router
    let app = routes::router(state)
        // Request ID for distributed tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // CORS configuration - restricted to localhost only for security
        .layer(build_cors_layer(config.port))
        // Structured request tracing with timing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    // Bind to localhost ONLY (security requirement)
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Montage server starting on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// Configure the blend client when an endpoint is provided.
fn init_blend_client(url: Option<&str>) -> Option<BlendClient> {
    let url = url?;
    match BlendClient::new(url) {
        Ok(client) => {
            tracing::info!("Blend service configured at {}", url);
            Some(client)
        }
        Err(err) => {
            tracing::error!("Failed to configure blend client: {}", err);
            None
        }
    }
}
