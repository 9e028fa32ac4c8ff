//! Render parameters and the controls that change them.

use serde::{Deserialize, Serialize};

use super::geo::{LatLng, OverlayPlacement};
use crate::config::OverlayConfig;
use crate::pdf::{PdfError, RenderRequest};

/// Page, scale, rotation and position of the overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    page_number: u32,
    page_count: Option<u32>,
    scale: f32,
    rotation: f32,
    position: LatLng,
}

impl ViewState {
    pub fn new(position: LatLng, config: &OverlayConfig) -> Self {
        Self {
            page_number: 1,
            page_count: None,
            scale: config.default_scale,
            rotation: 0.0,
            position,
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_count(&self) -> Option<u32> {
        self.page_count
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    /// Back to page 1 with an unknown page count. Scale, rotation and
    /// position carry over to the new document.
    pub fn reset_for_new_document(&mut self) {
        self.page_number = 1;
        self.page_count = None;
    }

    pub fn set_page_count(&mut self, page_count: u32) {
        self.page_count = Some(page_count);
        self.page_number = self.page_number.clamp(1, page_count.max(1));
    }

    pub fn can_previous(&self) -> bool {
        self.page_count.is_some() && self.page_number > 1
    }

    pub fn can_next(&self) -> bool {
        matches!(self.page_count, Some(count) if self.page_number < count)
    }

    /// Step forward one page. Returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.page_number += 1;
        true
    }

    /// Step back one page. Returns whether the page changed.
    pub fn previous_page(&mut self) -> bool {
        if !self.can_previous() {
            return false;
        }
        self.page_number -= 1;
        true
    }

    /// Parse and apply a scale typed by the user. Invalid input keeps the
    /// previous scale.
    pub fn set_scale(&mut self, text: &str, max_scale: f32) -> Result<f32, PdfError> {
        let value = parse_number("scale", text)?;
        if value <= 0.0 || value > max_scale {
            return Err(PdfError::InvalidParameter(format!(
                "scale must be greater than 0 and at most {}, got {}",
                max_scale, value
            )));
        }
        self.scale = value;
        Ok(value)
    }

    /// Parse and apply a rotation in degrees typed by the user.
    pub fn set_rotation(&mut self, text: &str) -> Result<f32, PdfError> {
        let value = parse_number("rotation", text)?;
        self.rotation = value;
        Ok(value)
    }

    pub fn drag_to(&mut self, position: LatLng) -> Result<(), PdfError> {
        if !position.is_valid() {
            return Err(PdfError::InvalidParameter(format!(
                "position out of range: {}, {}",
                position.lat, position.lng
            )));
        }
        self.position = position;
        Ok(())
    }

    /// "Page X of Y", or "Page X" until the page count is known.
    pub fn page_label(&self) -> String {
        match self.page_count {
            Some(count) => format!("Page {} of {}", self.page_number, count),
            None => format!("Page {}", self.page_number),
        }
    }

    pub fn render_request(&self) -> RenderRequest {
        RenderRequest {
            page_number: self.page_number,
            scale: self.scale,
            rotation: self.rotation,
        }
    }

    pub fn placement(&self, config: &OverlayConfig) -> OverlayPlacement {
        OverlayPlacement::new(self.position, self.rotation, config)
    }
}

fn parse_number(name: &str, text: &str) -> Result<f32, PdfError> {
    let trimmed = text.trim();
    match trimmed.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(PdfError::InvalidParameter(format!(
            "{} must be a number, got {:?}",
            name, text
        ))),
    }
}
