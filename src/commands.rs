//! Tauri commands for the map overlay.
//!
//! These commands expose the overlay session to the WebView frontend via IPC.
//! Changes that alter the rendered pixels (new document, page, scale) start a
//! background render whose result is pushed back as an event. Drag and
//! rotation only move the overlay, so they return the new placement directly.

use std::sync::Arc;
use tauri::{AppHandle, Emitter, Runtime, State};
use tracing::warn;

use crate::config::MapSettings;
use crate::document;
use crate::overlay::{LatLng, RenderOutcome};
use crate::pdf::{PageInfo, PdfError, RenderedImage};
use crate::session::{OverlaySession, UploadOutcome, ViewSnapshot};

/// Emitted with a `RenderedImage` when a render becomes the displayed image.
pub const OVERLAY_RENDERED_EVENT: &str = "overlay-rendered";
/// Emitted with an error message when the newest render failed.
pub const OVERLAY_ERROR_EVENT: &str = "overlay-error";

/// Application state shared by all commands.
pub struct AppState {
    pub session: Arc<OverlaySession>,
    pub map: MapSettings,
}

impl AppState {
    pub fn new(session: OverlaySession, map: MapSettings) -> Self {
        Self {
            session: Arc::new(session),
            map,
        }
    }
}

/// Render in the background and report the outcome to the WebView.
fn schedule_render<R: Runtime>(app: &AppHandle<R>, session: &Arc<OverlaySession>) {
    let app = app.clone();
    let session = Arc::clone(session);
    tauri::async_runtime::spawn(async move {
        let emitted = match session.refresh().await {
            RenderOutcome::Applied { image } => app.emit(OVERLAY_RENDERED_EVENT, &image),
            RenderOutcome::Failed { error } => app.emit(OVERLAY_ERROR_EVENT, error.to_string()),
            RenderOutcome::Superseded | RenderOutcome::Idle => Ok(()),
        };
        if let Err(e) = emitted {
            warn!(error = %e, "failed to emit render event");
        }
    });
}

/// Tile source, attribution and initial view for the base map.
#[tauri::command]
pub fn get_map_settings(state: State<AppState>) -> MapSettings {
    state.map.clone()
}

#[tauri::command]
pub fn get_view_state(state: State<AppState>) -> ViewSnapshot {
    state.session.snapshot()
}

/// Load a PDF from bytes (file input or drag-and-drop).
///
/// A superseded upload was replaced by a newer one while loading; the newer
/// upload schedules its own render.
#[tauri::command]
pub async fn upload_pdf<R: Runtime>(
    bytes: Vec<u8>,
    name: Option<String>,
    app: AppHandle<R>,
    state: State<'_, AppState>,
) -> Result<UploadOutcome, PdfError> {
    let outcome = state.session.upload(bytes, name).await?;
    if outcome.document().is_some() {
        schedule_render(&app, &state.session);
    }
    Ok(outcome)
}

/// Load a PDF from a path chosen with the native file dialog.
#[tauri::command]
pub async fn open_pdf<R: Runtime>(
    path: String,
    app: AppHandle<R>,
    state: State<'_, AppState>,
) -> Result<UploadOutcome, PdfError> {
    let path = document::resolve_pdf_path(&path)?;
    let (bytes, name) = document::read_pdf_file(&path)?;
    upload_pdf(bytes, name, app, state).await
}

/// Close the document and clear the overlay.
#[tauri::command]
pub fn close_pdf(state: State<AppState>) -> ViewSnapshot {
    state.session.close();
    state.session.snapshot()
}

#[tauri::command]
pub fn next_page<R: Runtime>(app: AppHandle<R>, state: State<AppState>) -> ViewSnapshot {
    if state.session.next_page() {
        schedule_render(&app, &state.session);
    }
    state.session.snapshot()
}

#[tauri::command]
pub fn previous_page<R: Runtime>(app: AppHandle<R>, state: State<AppState>) -> ViewSnapshot {
    if state.session.previous_page() {
        schedule_render(&app, &state.session);
    }
    state.session.snapshot()
}

/// Set the render scale from the raw text of the scale field.
///
/// # Arguments
/// * `value` - Scale text (1.0 = 72 DPI, 2.0 = 144 DPI, etc.)
#[tauri::command]
pub fn set_scale<R: Runtime>(
    value: String,
    app: AppHandle<R>,
    state: State<AppState>,
) -> Result<ViewSnapshot, PdfError> {
    state.session.set_scale(&value)?;
    schedule_render(&app, &state.session);
    Ok(state.session.snapshot())
}

/// Set the display rotation (degrees) from the raw text of the rotation field.
#[tauri::command]
pub fn set_rotation(value: String, state: State<AppState>) -> Result<ViewSnapshot, PdfError> {
    state.session.set_rotation(&value)?;
    Ok(state.session.snapshot())
}

/// Move the overlay to where the user dropped it.
#[tauri::command]
pub fn drag_overlay(lat: f64, lng: f64, state: State<AppState>) -> Result<ViewSnapshot, PdfError> {
    state.session.drag_to(LatLng::new(lat, lng))?;
    Ok(state.session.snapshot())
}

/// Re-render with the current parameters (manual retry).
#[tauri::command]
pub fn render_overlay<R: Runtime>(app: AppHandle<R>, state: State<AppState>) {
    schedule_render(&app, &state.session);
}

/// Native size of the current page, shown next to the page label.
#[tauri::command]
pub async fn get_page_info(state: State<'_, AppState>) -> Result<PageInfo, PdfError> {
    state.session.page_info().await
}

#[tauri::command]
pub fn get_current_image(state: State<AppState>) -> Option<RenderedImage> {
    state.session.current_image()
}
