//! Overlay presentation: where the page goes on the map, the controls that
//! move and resize it, and which render result is shown.

mod controls;
mod geo;
mod supervisor;

pub use controls::ViewState;
pub use geo::{GeoBounds, LatLng, OverlayPlacement};
pub use supervisor::{RenderOutcome, RenderSupervisor, RenderTicket};
