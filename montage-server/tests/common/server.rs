//! Test server harness for integration tests.
//!
//! Spins up the real router on a random port with a throwaway gallery
//! directory, two solid-color backgrounds, and a fontless compositor so
//! tests never depend on host fonts.

use std::net::SocketAddr;
use std::sync::Arc;

use montage_render::{ComposeConfig, Compositor, FontLibrary, ImageData};
use montage_server::blend::{BlendClient, RetryConfig};
use montage_server::gallery::Gallery;
use montage_server::routes;
use montage_server::store::SessionStore;
use montage_server::AppState;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Canvas width used by every test session.
pub const CANVAS_WIDTH: u32 = 800;
/// Canvas height used by every test session.
pub const CANVAS_HEIGHT: u32 = 600;

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    state: AppState,
    gallery_dir: TempDir,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server on a random available port.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or the server fails to bind.
    pub async fn start() -> Self {
        Self::start_with_blend(None).await
    }

    /// Start a test server, optionally with a blend endpoint configured.
    #[allow(dead_code)]
    pub async fn start_with_blend(blend_url: Option<&str>) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let backgrounds = vec![
            solid_background(30, 30, 30),
            solid_background(200, 200, 200),
        ];
        let sessions =
            SessionStore::new(backgrounds, CANVAS_WIDTH, CANVAS_HEIGHT).expect("session store");

        let gallery_dir = tempfile::tempdir().expect("gallery dir");
        let gallery = Gallery::new(gallery_dir.path()).expect("gallery");

        // No font directories: text layers rasterize as blanks instead
        // of erroring, so exports stay deterministic across hosts
        let compositor = Arc::new(Compositor::new(
            ComposeConfig::default(),
            FontLibrary::new(Vec::new()),
        ));

        // Fast retries keep unreachable-endpoint tests quick
        let blend = blend_url.map(|url| {
            BlendClient::with_retry_config(url, RetryConfig::new(2, 1, 10, 2.0))
                .expect("blend client")
        });

        let state = AppState {
            sessions,
            compositor,
            gallery,
            blend,
        };

        let app = routes::router(state.clone());

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        // Spawn the server
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            state,
            gallery_dir,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Get the server's socket address.
    #[allow(dead_code)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build a full URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Get access to the shared state (for test assertions).
    #[allow(dead_code)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Directory creations are saved into.
    #[allow(dead_code)]
    pub fn gallery_path(&self) -> &std::path::Path {
        self.gallery_dir.path()
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}

/// A canvas-sized solid-color PNG wrapped in a data URI.
fn solid_background(r: u8, g: u8, b: u8) -> String {
    ImageData::solid_color(CANVAS_WIDTH, CANVAS_HEIGHT, r, g, b, 255)
        .to_data_uri()
        .expect("background data uri")
}
