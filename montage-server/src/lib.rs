//! # Montage Server Library
//!
//! Shared types and functionality for the montage server.
//! This library is used by both the binary and integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use montage_render::Compositor;

pub mod blend;
pub mod gallery;
pub mod health;
pub mod library;
pub mod routes;
pub mod store;

pub use blend::{BlendClient, BlendError, RetryConfig, DEFAULT_INSTRUCTION};
pub use gallery::{Gallery, GalleryError, RECENT_LIMIT};
pub use routes::router;
pub use store::{SessionStore, DEFAULT_SESSION};

/// Default port for the montage server ("MONT" on a phone keypad).
pub const DEFAULT_PORT: u16 = 6668;

/// Command-line arguments for the montage server.
#[derive(Debug, Clone, Parser)]
#[command(name = "montage")]
#[command(about = "Layered image compositing editor server")]
#[command(version)]
pub struct CliArgs {
    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT, env = "MONTAGE_PORT")]
    pub port: u16,

    /// Directory of background images offered to new sessions
    #[arg(long, env = "MONTAGE_BACKGROUNDS_DIR")]
    pub backgrounds_dir: Option<PathBuf>,

    /// Directory where exported creations are saved
    #[arg(long, default_value = "creations", env = "MONTAGE_GALLERY_DIR")]
    pub gallery_dir: PathBuf,

    /// Font directories searched instead of the system defaults
    #[arg(long = "font-dir", env = "MONTAGE_FONT_DIR")]
    pub font_dirs: Vec<PathBuf>,

    /// Blend service URL (e.g., <https://host/run/predict>)
    #[arg(long, env = "MONTAGE_BLEND_URL")]
    pub blend_url: Option<String>,

    /// Canvas width in pixels
    #[arg(
        long,
        default_value_t = montage_core::DEFAULT_CANVAS_WIDTH,
        env = "MONTAGE_CANVAS_WIDTH"
    )]
    pub canvas_width: u32,

    /// Canvas height in pixels
    #[arg(
        long,
        default_value_t = montage_core::DEFAULT_CANVAS_HEIGHT,
        env = "MONTAGE_CANVAS_HEIGHT"
    )]
    pub canvas_height: u32,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Directory of background images, if any.
    pub backgrounds_dir: Option<PathBuf>,
    /// Directory where exported creations are saved.
    pub gallery_dir: PathBuf,
    /// Font directories; empty means use the system defaults.
    pub font_dirs: Vec<PathBuf>,
    /// Blend service URL for generative edits.
    pub blend_url: Option<String>,
    /// Canvas width in pixels.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfig {
    /// Create a new server configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            backgrounds_dir: None,
            gallery_dir: PathBuf::from("creations"),
            font_dirs: Vec::new(),
            blend_url: None,
            canvas_width: montage_core::DEFAULT_CANVAS_WIDTH,
            canvas_height: montage_core::DEFAULT_CANVAS_HEIGHT,
        }
    }
}

impl From<CliArgs> for ServerConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            port: args.port,
            backgrounds_dir: args.backgrounds_dir,
            gallery_dir: args.gallery_dir,
            font_dirs: args.font_dirs,
            blend_url: args.blend_url,
            canvas_width: args.canvas_width,
            canvas_height: args.canvas_height,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Per-session editors.
    pub sessions: SessionStore,
    /// Scene rasterizer shared across handlers.
    pub compositor: Arc<Compositor>,
    /// On-disk gallery of exported creations.
    pub gallery: Gallery,
    /// Optional client for the generative blend service.
    pub blend: Option<BlendClient>,
}

impl AppState {
    /// Get a reference to the session store.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Get a reference to the optional blend client.
    pub fn blend(&self) -> Option<&BlendClient> {
        self.blend.as_ref()
    }
}
