//! Last-write-wins bookkeeping for in-flight renders.
//!
//! Every render takes a ticket carrying a generation number. Only a result
//! whose ticket is still the newest one issued is applied; anything older is
//! dropped on arrival.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::pdf::{PdfError, RenderedImage};

/// Handed out when a render starts; returned with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    generation: u64,
}

impl RenderTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a finished render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// Nothing to render (no document loaded).
    Idle,
    /// The result became the displayed image.
    Applied { image: RenderedImage },
    /// A newer render was started before this one finished.
    Superseded,
    /// Rendering failed; the previously displayed image is kept.
    Failed { error: PdfError },
}

#[derive(Default)]
struct Inner {
    generation: u64,
    image: Option<RenderedImage>,
    last_error: Option<PdfError>,
}

#[derive(Default)]
pub struct RenderSupervisor {
    inner: Mutex<Inner>,
}

impl RenderSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a render, superseding every render still in flight.
    pub fn begin(&self) -> RenderTicket {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        RenderTicket {
            generation: inner.generation,
        }
    }

    /// Accept or drop the result of the render identified by `ticket`.
    pub fn finish(
        &self,
        ticket: RenderTicket,
        result: Result<RenderedImage, PdfError>,
    ) -> RenderOutcome {
        let mut inner = self.inner.lock();
        if inner.generation != ticket.generation {
            debug!(
                ticket = ticket.generation,
                newest = inner.generation,
                "dropping superseded render"
            );
            return RenderOutcome::Superseded;
        }

        match result {
            Ok(image) => {
                debug!(
                    page = image.page_number,
                    width = image.width,
                    height = image.height,
                    "render applied"
                );
                inner.image = Some(image.clone());
                inner.last_error = None;
                RenderOutcome::Applied { image }
            }
            Err(error) => {
                warn!(%error, "render failed, keeping previous image");
                inner.last_error = Some(error.clone());
                RenderOutcome::Failed { error }
            }
        }
    }

    /// Forget the displayed image and reject every render in flight.
    pub fn invalidate(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.image = None;
        inner.last_error = None;
    }

    /// Record a failure that did not come from a render (e.g. document load).
    pub fn report_error(&self, error: PdfError) {
        self.inner.lock().last_error = Some(error);
    }

    pub fn current_image(&self) -> Option<RenderedImage> {
        self.inner.lock().image.clone()
    }

    pub fn last_error(&self) -> Option<PdfError> {
        self.inner.lock().last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(page_number: u32) -> RenderedImage {
        RenderedImage {
            document_id: "doc_1".to_string(),
            page_number,
            scale: 1.0,
            rotation: 0.0,
            width: 10,
            height: 14,
            data_uri: format!("data:image/png;base64,page{}", page_number),
        }
    }

    #[test]
    fn newest_render_wins_regardless_of_completion_order() {
        let supervisor = RenderSupervisor::new();
        let first = supervisor.begin();
        let second = supervisor.begin();

        assert_eq!(
            supervisor.finish(second, Ok(image(2))),
            RenderOutcome::Applied { image: image(2) }
        );
        assert_eq!(supervisor.finish(first, Ok(image(1))), RenderOutcome::Superseded);
        assert_eq!(supervisor.current_image().unwrap().page_number, 2);
    }

    #[test]
    fn superseded_failures_are_ignored_too() {
        let supervisor = RenderSupervisor::new();
        let first = supervisor.begin();
        let second = supervisor.begin();
        supervisor.finish(second, Ok(image(2)));

        assert_eq!(
            supervisor.finish(first, Err(PdfError::RenderError("slow".to_string()))),
            RenderOutcome::Superseded
        );
        assert!(supervisor.last_error().is_none());
    }

    #[test]
    fn failure_keeps_previous_image() {
        let supervisor = RenderSupervisor::new();
        let ticket = supervisor.begin();
        supervisor.finish(ticket, Ok(image(1)));

        let ticket = supervisor.begin();
        let outcome = supervisor.finish(ticket, Err(PdfError::RenderError("boom".to_string())));
        assert!(matches!(outcome, RenderOutcome::Failed { .. }));
        assert_eq!(supervisor.current_image(), Some(image(1)));
        assert_eq!(
            supervisor.last_error(),
            Some(PdfError::RenderError("boom".to_string()))
        );

        // A later success clears the error
        let ticket = supervisor.begin();
        supervisor.finish(ticket, Ok(image(1)));
        assert!(supervisor.last_error().is_none());
    }

    #[test]
    fn invalidate_rejects_in_flight_renders() {
        let supervisor = RenderSupervisor::new();
        let ticket = supervisor.begin();
        supervisor.invalidate();
        assert_eq!(supervisor.finish(ticket, Ok(image(1))), RenderOutcome::Superseded);
        assert!(supervisor.current_image().is_none());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(RenderOutcome::Failed {
            error: PdfError::NoDocument,
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "No document loaded");
    }
}
