//! HTTP API for the montage editor.
//!
//! Every editing operation is a small JSON request against a session;
//! responses carry either the touched layer or a full scene document so
//! clients can redraw without a follow-up fetch. Export and blend are
//! the two heavyweight routes: both freeze the scene into a snapshot
//! and rasterize it off the async runtime.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use montage_core::{
    DecodedImage, Direction, EditorError, ImageDecoder, Layer, LayerId, LayerKind, Point,
    PointerEvent, PointerPhase, SceneDocument, SceneSnapshot, StickerKind, Tool, TransformPatch,
};
use montage_render::{decode_data_uri, encode_data_uri, ExportFormat, RenderError, UploadDecoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::blend::{BlendError, DEFAULT_INSTRUCTION};
use crate::gallery::{GalleryError, RECENT_LIMIT};
use crate::health;
use crate::AppState;

/// Pause between dropping the selection and freezing the scene, so a
/// drag released just before an export still lands in the frame.
const EXPORT_SETTLE: Duration = Duration::from_millis(100);

/// Errors surfaced by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The editor rejected the operation.
    #[error(transparent)]
    Editor(#[from] EditorError),
    /// Compositing or encoding failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// The blend service failed.
    #[error(transparent)]
    Blend(#[from] BlendError),
    /// The gallery could not persist a creation.
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    /// The addressed layer does not exist.
    #[error("Layer {0} not found")]
    LayerNotFound(LayerId),
    /// An export is already running for this session.
    #[error("An export is already running for session {0}")]
    ExportBusy(String),
    /// No blend endpoint was configured at startup.
    #[error("No blend endpoint is configured")]
    BlendUnconfigured,
    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Editor(EditorError::InvalidInput(_) | EditorError::WrongLayerKind(..)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Editor(EditorError::EmptyBackgroundList)
            | Self::Gallery(_)
            | Self::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Render(_) | Self::BlendUnconfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::Blend(BlendError::GenerationFailed(_)) => StatusCode::BAD_GATEWAY,
            Self::Blend(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::LayerNotFound(_) => StatusCode::NOT_FOUND,
            Self::ExportBusy(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Build the API router. Middleware (tracing, CORS, request IDs) is
/// layered on by the binary so tests can drive the bare routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::readiness))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/api/sessions/{session}/scene", get(get_scene))
        .route("/api/sessions/{session}/layers/image", post(add_image_layer))
        .route("/api/sessions/{session}/layers/text", post(add_text_layer))
        .route(
            "/api/sessions/{session}/layers/sticker",
            post(add_sticker_layer),
        )
        .route(
            "/api/sessions/{session}/layers/{id}",
            patch(update_layer).delete(delete_layer),
        )
        .route(
            "/api/sessions/{session}/layers/{id}/image",
            post(replace_layer_image),
        )
        .route(
            "/api/sessions/{session}/layers/{id}/remove-background",
            post(remove_layer_background),
        )
        .route("/api/sessions/{session}/select", post(select_layer))
        .route("/api/sessions/{session}/tool", post(set_tool))
        .route("/api/sessions/{session}/brush", post(set_brush))
        .route("/api/sessions/{session}/pointer", post(pointer))
        .route("/api/sessions/{session}/background", post(cycle_background))
        .route("/api/sessions/{session}/reset", post(reset))
        .route("/api/sessions/{session}/export", post(export))
        .route("/api/sessions/{session}/blend", post(blend_scene))
        .route("/api/creations", get(recent_creations))
        .with_state(state)
}

// ----- request and response bodies --------------------------------------

#[derive(Debug, Deserialize)]
struct ImagePayload {
    /// Image file contents: a data URI or raw base64.
    data: String,
}

#[derive(Debug, Deserialize)]
struct StickerPayload {
    kind: StickerKind,
}

#[derive(Debug, Default, Deserialize)]
struct LayerPatch {
    position: Option<Point>,
    scale: Option<f32>,
    rotation: Option<f32>,
    content: Option<String>,
    color: Option<String>,
    font_family: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SelectPayload {
    id: Option<LayerId>,
}

#[derive(Debug, Deserialize)]
struct ToolPayload {
    tool: Tool,
}

#[derive(Debug, Default, Deserialize)]
struct BrushPayload {
    color: Option<String>,
    size: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct PointerPayload {
    phase: PointerPhase,
    x: f32,
    y: f32,
}

#[derive(Debug, Deserialize)]
struct BackgroundPayload {
    direction: Direction,
}

#[derive(Debug, Default, Deserialize)]
struct ResetPayload {
    #[serde(default)]
    hard: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ExportPayload {
    format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BlendPayload {
    instruction: Option<String>,
}

#[derive(Debug, Serialize)]
struct BlendImage {
    image: String,
}

#[derive(Debug, Serialize)]
struct CreationsResponse {
    creations: Vec<String>,
}

// ----- shared helpers ----------------------------------------------------

/// Hands an already-decoded image to the editor, which wants a decoder.
struct Predecoded(DecodedImage);

impl ImageDecoder for Predecoded {
    fn decode_upload(&self, _bytes: &[u8]) -> montage_core::EditorResult<DecodedImage> {
        Ok(self.0.clone())
    }
}

fn upload_bytes(data: &str) -> ApiResult<Vec<u8>> {
    if data.starts_with("data:") {
        decode_data_uri(data)
            .map_err(|e| ApiError::Editor(EditorError::InvalidInput(e.to_string())))
    } else {
        BASE64.decode(data.trim()).map_err(|e| {
            ApiError::Editor(EditorError::InvalidInput(format!(
                "invalid base64 payload: {e}"
            )))
        })
    }
}

/// Decode upload bytes off the async runtime.
async fn decode_upload(bytes: Vec<u8>) -> ApiResult<DecodedImage> {
    tokio::task::spawn_blocking(move || UploadDecoder.decode_upload(&bytes))
        .await
        .map_err(|e| ApiError::TaskFailed(e.to_string()))?
        .map_err(ApiError::from)
}

/// Freeze the scene for rendering: drop the selection, give an in-flight
/// drag a beat to land, then snapshot.
async fn capture_scene(state: &AppState, session: &str) -> SceneSnapshot {
    state.sessions.with_editor(session, |editor| editor.deselect());
    tokio::time::sleep(EXPORT_SETTLE).await;
    state
        .sessions
        .with_editor(session, |editor| editor.export_snapshot())
}

// ----- scene and layer handlers ------------------------------------------

#[tracing::instrument(name = "get_scene", skip(state))]
async fn get_scene(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Json<SceneDocument> {
    Json(state.sessions.document(&session))
}

#[tracing::instrument(name = "add_image_layer", skip(state, payload))]
async fn add_image_layer(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<ImagePayload>,
) -> ApiResult<(StatusCode, Json<Layer>)> {
    let bytes = upload_bytes(&payload.data)?;
    let decoded = decode_upload(bytes).await?;
    let layer = state
        .sessions
        .with_editor(&session, |editor| -> ApiResult<Layer> {
            let id = editor.upload_image(&[], &Predecoded(decoded))?;
            editor.layer(id).cloned().ok_or(ApiError::LayerNotFound(id))
        })?;
    Ok((StatusCode::CREATED, Json(layer)))
}

#[tracing::instrument(name = "add_text_layer", skip(state))]
async fn add_text_layer(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> ApiResult<(StatusCode, Json<Layer>)> {
    let layer = state
        .sessions
        .with_editor(&session, |editor| -> ApiResult<Layer> {
            let id = editor.add_text_layer();
            editor.layer(id).cloned().ok_or(ApiError::LayerNotFound(id))
        })?;
    Ok((StatusCode::CREATED, Json(layer)))
}

#[tracing::instrument(name = "add_sticker_layer", skip(state, payload))]
async fn add_sticker_layer(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<StickerPayload>,
) -> ApiResult<(StatusCode, Json<Layer>)> {
    let layer = state
        .sessions
        .with_editor(&session, |editor| -> ApiResult<Layer> {
            let id = editor.add_sticker_layer(payload.kind);
            editor.layer(id).cloned().ok_or(ApiError::LayerNotFound(id))
        })?;
    Ok((StatusCode::CREATED, Json(layer)))
}

#[tracing::instrument(name = "update_layer", skip(state, patch))]
async fn update_layer(
    State(state): State<AppState>,
    Path((session, id)): Path<(String, LayerId)>,
    Json(patch): Json<LayerPatch>,
) -> ApiResult<Json<Layer>> {
    let layer = state
        .sessions
        .with_editor(&session, |editor| -> ApiResult<Layer> {
            if editor.layer(id).is_none() {
                return Err(ApiError::LayerNotFound(id));
            }
            editor.update_layer_transform(
                id,
                TransformPatch {
                    position: patch.position,
                    scale: patch.scale,
                    rotation: patch.rotation,
                },
            );
            if let Some(content) = patch.content.as_deref() {
                editor.set_text_content(id, content)?;
            }
            if patch.color.is_some() || patch.font_family.is_some() {
                editor.set_text_style(id, patch.color.as_deref(), patch.font_family.as_deref())?;
            }
            editor.layer(id).cloned().ok_or(ApiError::LayerNotFound(id))
        })?;
    Ok(Json(layer))
}

#[tracing::instrument(name = "delete_layer", skip(state))]
async fn delete_layer(
    State(state): State<AppState>,
    Path((session, id)): Path<(String, LayerId)>,
) -> ApiResult<StatusCode> {
    let removed = state
        .sessions
        .with_editor(&session, |editor| editor.delete_layer(id));
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::LayerNotFound(id))
    }
}

#[tracing::instrument(name = "replace_layer_image", skip(state, payload))]
async fn replace_layer_image(
    State(state): State<AppState>,
    Path((session, id)): Path<(String, LayerId)>,
    Json(payload): Json<ImagePayload>,
) -> ApiResult<Json<Layer>> {
    let bytes = upload_bytes(&payload.data)?;
    let decoded = decode_upload(bytes).await?;
    let layer = state
        .sessions
        .with_editor(&session, |editor| -> ApiResult<Layer> {
            if !editor.replace_layer_image(id, &[], &Predecoded(decoded))? {
                return Err(ApiError::LayerNotFound(id));
            }
            editor.layer(id).cloned().ok_or(ApiError::LayerNotFound(id))
        })?;
    Ok(Json(layer))
}

// ----- mode and interaction handlers --------------------------------------

#[tracing::instrument(name = "select_layer", skip(state, payload))]
async fn select_layer(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<SelectPayload>,
) -> Json<SceneDocument> {
    Json(state.sessions.with_editor(&session, |editor| {
        match payload.id {
            // Stale ids and non-move tools make this a no-op
            Some(id) => {
                editor.select_layer(id);
            }
            None => editor.deselect(),
        }
        editor.document()
    }))
}

#[tracing::instrument(name = "set_tool", skip(state, payload))]
async fn set_tool(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<ToolPayload>,
) -> Json<SceneDocument> {
    Json(state.sessions.with_editor(&session, |editor| {
        editor.set_tool(payload.tool);
        editor.document()
    }))
}

#[tracing::instrument(name = "set_brush", skip(state, payload))]
async fn set_brush(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<BrushPayload>,
) -> ApiResult<Json<SceneDocument>> {
    let doc = state
        .sessions
        .with_editor(&session, |editor| -> ApiResult<SceneDocument> {
            editor.set_brush(payload.color.as_deref(), payload.size)?;
            Ok(editor.document())
        })?;
    Ok(Json(doc))
}

#[tracing::instrument(name = "pointer_event", skip(state, payload))]
async fn pointer(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<PointerPayload>,
) -> Json<SceneDocument> {
    Json(state.sessions.with_editor(&session, |editor| {
        editor.handle_pointer(PointerEvent::new(payload.phase, payload.x, payload.y));
        editor.document()
    }))
}

#[tracing::instrument(name = "cycle_background", skip(state, payload))]
async fn cycle_background(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<BackgroundPayload>,
) -> Json<SceneDocument> {
    Json(state.sessions.with_editor(&session, |editor| {
        editor.cycle_background(payload.direction);
        editor.document()
    }))
}

#[tracing::instrument(name = "reset_scene", skip(state, payload))]
async fn reset(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<ResetPayload>,
) -> Json<SceneDocument> {
    Json(state.sessions.with_editor(&session, |editor| {
        editor.reset(payload.hard);
        editor.document()
    }))
}

// ----- export and blend handlers ------------------------------------------

#[tracing::instrument(name = "export_scene", skip(state, payload))]
async fn export(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<ExportPayload>,
) -> ApiResult<Response> {
    let format = match payload.format.as_deref() {
        None => ExportFormat::Png,
        Some(name) => ExportFormat::from_name(name).ok_or_else(|| {
            ApiError::Editor(EditorError::InvalidInput(format!(
                "unknown export format: {name}"
            )))
        })?,
    };

    if !state.sessions.try_begin_export(&session) {
        return Err(ApiError::ExportBusy(session));
    }
    let result = run_export(&state, &session, format).await;
    state.sessions.finish_export(&session);
    result
}

async fn run_export(state: &AppState, session: &str, format: ExportFormat) -> ApiResult<Response> {
    let snapshot = capture_scene(state, session).await;

    let compositor = Arc::clone(&state.compositor);
    let gallery = state.gallery.clone();
    let (bytes, saved) = tokio::task::spawn_blocking(
        move || -> Result<(Vec<u8>, bool), RenderError> {
            let bytes = compositor.export(&snapshot, format)?;
            // Gallery failures never fail the export itself
            let saved = match gallery.save(&bytes, format.extension()) {
                Ok(_) => true,
                Err(e) => {
                    tracing::error!("Creation could not be saved: {e}");
                    false
                }
            };
            Ok((bytes, saved))
        },
    )
    .await
    .map_err(|e| ApiError::TaskFailed(e.to_string()))??;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.mime_type())
        .header("x-creation-saved", if saved { "true" } else { "false" })
        .body(Body::from(bytes))
        .map_err(|e| ApiError::TaskFailed(e.to_string()))
}

#[tracing::instrument(name = "blend_scene", skip(state, payload))]
async fn blend_scene(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<BlendPayload>,
) -> ApiResult<Json<BlendImage>> {
    let Some(client) = state.blend.clone() else {
        return Err(ApiError::BlendUnconfigured);
    };

    let snapshot = capture_scene(&state, &session).await;
    let compositor = Arc::clone(&state.compositor);
    let bytes =
        tokio::task::spawn_blocking(move || compositor.export(&snapshot, ExportFormat::Png))
            .await
            .map_err(|e| ApiError::TaskFailed(e.to_string()))??;
    let composite = encode_data_uri("image/png", &bytes);

    let instruction = payload
        .instruction
        .as_deref()
        .unwrap_or(DEFAULT_INSTRUCTION);
    let image = client.edit_image(&composite, instruction).await?;
    Ok(Json(BlendImage { image }))
}

#[tracing::instrument(name = "remove_layer_background", skip(state))]
async fn remove_layer_background(
    State(state): State<AppState>,
    Path((session, id)): Path<(String, LayerId)>,
) -> ApiResult<Json<Layer>> {
    let Some(client) = state.blend.clone() else {
        return Err(ApiError::BlendUnconfigured);
    };

    let src = state
        .sessions
        .with_editor(&session, |editor| -> ApiResult<String> {
            let layer = editor.layer(id).ok_or(ApiError::LayerNotFound(id))?;
            match &layer.kind {
                LayerKind::Image { src } => Ok(src.clone()),
                _ => Err(ApiError::Editor(EditorError::WrongLayerKind(
                    id.to_string(),
                    "image",
                ))),
            }
        })?;

    let cutout = client.remove_background(&src).await?;

    // The service answered; an unreadable payload is its fault, not the
    // caller's
    let bytes = decode_data_uri(&cutout)
        .map_err(|e| ApiError::Blend(BlendError::GenerationFailed(e.to_string())))?;
    let decoded = tokio::task::spawn_blocking(move || UploadDecoder.decode_upload(&bytes))
        .await
        .map_err(|e| ApiError::TaskFailed(e.to_string()))?
        .map_err(|e| ApiError::Blend(BlendError::GenerationFailed(e.to_string())))?;

    let layer = state
        .sessions
        .with_editor(&session, |editor| -> ApiResult<Layer> {
            if !editor.replace_layer_image(id, &[], &Predecoded(decoded))? {
                return Err(ApiError::LayerNotFound(id));
            }
            editor.layer(id).cloned().ok_or(ApiError::LayerNotFound(id))
        })?;
    Ok(Json(layer))
}

#[tracing::instrument(name = "recent_creations", skip(state))]
async fn recent_creations(State(state): State<AppState>) -> ApiResult<Json<CreationsResponse>> {
    let gallery = state.gallery.clone();
    let creations = tokio::task::spawn_blocking(move || gallery.recent(RECENT_LIMIT))
        .await
        .map_err(|e| ApiError::TaskFailed(e.to_string()))?;
    Ok(Json(CreationsResponse { creations }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use uuid::Uuid;

    #[test]
    fn upload_accepts_data_uri() {
        let bytes = upload_bytes("data:image/png;base64,QUJD").expect("decode");
        assert_eq!(bytes, b"ABC");
    }

    #[test]
    fn upload_accepts_raw_base64() {
        let bytes = upload_bytes("  QUJD  ").expect("decode");
        assert_eq!(bytes, b"ABC");
    }

    #[test]
    fn upload_rejects_junk() {
        let err = upload_bytes("@@not base64@@").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err = upload_bytes("data:image/png;base64,@@@").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn error_status_mapping() {
        let cases = [
            (
                ApiError::Editor(EditorError::InvalidInput("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Editor(EditorError::WrongLayerKind("x".into(), "text")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Editor(EditorError::EmptyBackgroundList),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Render(RenderError::NotReady("canvas".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Blend(BlendError::GenerationFailed("refused".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Blend(BlendError::ServiceUnavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::LayerNotFound(LayerId::from_uuid(Uuid::new_v4())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::ExportBusy("default".into()),
                StatusCode::CONFLICT,
            ),
            (ApiError::BlendUnconfigured, StatusCode::SERVICE_UNAVAILABLE),
            (
                ApiError::TaskFailed("join".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error}");
        }

        let gallery = ApiError::Gallery(GalleryError::Persist(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied",
        )));
        assert_eq!(gallery.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn predecoded_ignores_bytes() {
        let decoder = Predecoded(DecodedImage {
            src: "data:image/png;base64,QUJD".into(),
            width: 3,
            height: 2,
        });
        let decoded = decoder.decode_upload(&[]).expect("decode");
        assert_eq!(decoded.width, 3);
        assert_eq!(decoded.height, 2);
    }
}
