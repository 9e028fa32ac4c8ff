//! The overlay session: one document, one set of render parameters, one
//! displayed image.
//!
//! All state is owned here and changed only through these methods. The lock
//! is never held while the rasterizer runs; slow work happens on blocking
//! tasks and its results go through the render supervisor.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::OverlayConfig;
use crate::document::{DocumentHandle, DocumentSource};
use crate::overlay::{LatLng, OverlayPlacement, RenderOutcome, RenderSupervisor, ViewState};
use crate::pdf::{self, DocumentInfo, PageInfo, PageRasterizer, PdfError, RenderedImage};

/// Result of loading a PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Unique document ID for subsequent operations
    pub id: String,
    pub name: Option<String>,
    /// Document metadata
    pub info: DocumentInfo,
}

/// Result of an upload that did not fail.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// The document is loaded and is the current one.
    Loaded { document: DocumentSummary },
    /// A newer upload replaced this document before its metadata loaded.
    Superseded,
}

impl UploadOutcome {
    pub fn document(&self) -> Option<&DocumentSummary> {
        match self {
            UploadOutcome::Loaded { document } => Some(document),
            UploadOutcome::Superseded => None,
        }
    }
}

/// Everything the view needs to draw its controls.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub document: Option<DocumentSummary>,
    pub page_number: u32,
    pub page_count: Option<u32>,
    pub page_label: String,
    pub can_previous: bool,
    pub can_next: bool,
    pub scale: f32,
    pub rotation: f32,
    pub position: LatLng,
    pub placement: OverlayPlacement,
    pub has_image: bool,
    pub last_error: Option<PdfError>,
}

struct SessionState {
    documents: DocumentSource,
    summary: Option<DocumentSummary>,
    view: ViewState,
}

pub struct OverlaySession {
    engine: Arc<dyn PageRasterizer>,
    config: OverlayConfig,
    state: Mutex<SessionState>,
    supervisor: RenderSupervisor,
}

async fn run_blocking<T, F>(task: F) -> Result<T, PdfError>
where
    F: FnOnce() -> Result<T, PdfError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| PdfError::RenderError(format!("Task join error: {}", e)))?
}

impl OverlaySession {
    pub fn new(engine: Arc<dyn PageRasterizer>, config: OverlayConfig, position: LatLng) -> Self {
        Self {
            engine,
            state: Mutex::new(SessionState {
                documents: DocumentSource::new(),
                summary: None,
                view: ViewState::new(position, &config),
            }),
            config,
            supervisor: RenderSupervisor::new(),
        }
    }

    /// Replace the current document and load its metadata.
    ///
    /// The page number goes back to 1 and the previous image is dropped.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        name: Option<String>,
    ) -> Result<UploadOutcome, PdfError> {
        let handle = {
            let mut state = self.state.lock();
            let handle = match state.documents.upload(bytes, name) {
                Ok(handle) => handle,
                Err(e) => {
                    self.supervisor.report_error(e.clone());
                    return Err(e);
                }
            };
            state.summary = None;
            state.view.reset_for_new_document();
            // Under the state lock, so no render can take a ticket for the
            // old document after this point.
            self.supervisor.invalidate();
            handle
        };
        info!(id = handle.id(), name = ?handle.name(), bytes = handle.bytes().len(), "document uploaded");

        let engine = Arc::clone(&self.engine);
        let bytes = Arc::clone(handle.bytes());
        let loaded = run_blocking(move || engine.open(&bytes)).await.and_then(|info| {
            if info.page_count == 0 {
                return Err(PdfError::LoadError("document has no pages".to_string()));
            }
            Ok(info)
        });

        let mut state = self.state.lock();
        if !state.documents.is_current(handle.id()) {
            debug!(id = handle.id(), "document replaced while loading");
            return Ok(UploadOutcome::Superseded);
        }

        match loaded {
            Ok(info) => {
                state.view.set_page_count(info.page_count);
                let summary = DocumentSummary {
                    id: handle.id().to_string(),
                    name: handle.name().map(str::to_string),
                    info,
                };
                state.summary = Some(summary.clone());
                info!(id = handle.id(), pages = summary.info.page_count, "document loaded");
                Ok(UploadOutcome::Loaded { document: summary })
            }
            Err(e) => {
                warn!(id = handle.id(), error = %e, "document failed to load");
                self.supervisor.report_error(e.clone());
                Err(e)
            }
        }
    }

    /// Drop the current document and its image.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if let Some(handle) = state.documents.close() {
            debug!(id = handle.id(), "document closed");
        }
        state.summary = None;
        state.view.reset_for_new_document();
        self.supervisor.invalidate();
    }

    /// Render the current page with the current parameters.
    ///
    /// Starting a refresh supersedes every refresh still in flight.
    pub async fn refresh(&self) -> RenderOutcome {
        // The ticket is taken under the same lock that reads the parameters,
        // so ticket order always matches parameter order.
        let (handle, request, ticket) = {
            let state = self.state.lock();
            match state.documents.current() {
                Some(handle) => (
                    handle.clone(),
                    state.view.render_request(),
                    self.supervisor.begin(),
                ),
                None => return RenderOutcome::Idle,
            }
        };

        debug!(
            ticket = ticket.generation(),
            page = request.page_number,
            scale = request.scale,
            "render started"
        );

        let engine = Arc::clone(&self.engine);
        let result = run_blocking(move || {
            pdf::render_page(engine.as_ref(), handle.id(), handle.bytes(), &request)
        })
        .await;

        self.supervisor.finish(ticket, result)
    }

    /// Returns whether the page changed (and a render is needed).
    pub fn next_page(&self) -> bool {
        self.state.lock().view.next_page()
    }

    pub fn previous_page(&self) -> bool {
        self.state.lock().view.previous_page()
    }

    pub fn set_scale(&self, text: &str) -> Result<f32, PdfError> {
        self.state.lock().view.set_scale(text, self.config.max_scale)
    }

    /// Rotation is a display transform; the image does not need re-rendering.
    pub fn set_rotation(&self, text: &str) -> Result<f32, PdfError> {
        self.state.lock().view.set_rotation(text)
    }

    /// Move the overlay. Only the placement changes, never the image content.
    pub fn drag_to(&self, position: LatLng) -> Result<OverlayPlacement, PdfError> {
        let mut state = self.state.lock();
        state.view.drag_to(position)?;
        Ok(state.view.placement(&self.config))
    }

    /// Native size of the current page.
    pub async fn page_info(&self) -> Result<PageInfo, PdfError> {
        let (handle, page_number): (DocumentHandle, u32) = {
            let state = self.state.lock();
            let handle = state.documents.current().cloned().ok_or(PdfError::NoDocument)?;
            (handle, state.view.page_number())
        };

        let engine = Arc::clone(&self.engine);
        run_blocking(move || engine.page_info(handle.bytes(), page_number)).await
    }

    pub fn current_image(&self) -> Option<RenderedImage> {
        self.supervisor.current_image()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let state = self.state.lock();
        let view = &state.view;
        ViewSnapshot {
            document: state.summary.clone(),
            page_number: view.page_number(),
            page_count: view.page_count(),
            page_label: view.page_label(),
            can_previous: view.can_previous(),
            can_next: view.can_next(),
            scale: view.scale(),
            rotation: view.rotation(),
            position: view.position(),
            placement: view.placement(&self.config),
            has_image: self.supervisor.current_image().is_some(),
            last_error: self.supervisor.last_error(),
        }
    }
}
