//! Geographic placement of the overlay.

use serde::{Deserialize, Serialize};

use crate::config::OverlayConfig;

/// WGS-84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite, with latitude inside ±90. Longitude may exceed ±180 when the
    /// map wraps around the antimeridian.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && (-90.0..=90.0).contains(&self.lat)
    }
}

/// Axis-aligned box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Box of `margin` degrees in every direction around `center`.
    pub fn around(center: LatLng, margin: f64) -> Self {
        Self {
            south: center.lat - margin,
            west: center.lng - margin,
            north: center.lat + margin,
            east: center.lng + margin,
        }
    }

    /// `[[south, west], [north, east]]`, the corner order Leaflet expects.
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }
}

/// Where and how the current image is drawn on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlacement {
    pub bounds: GeoBounds,
    pub corners: [[f64; 2]; 2],
    /// Display rotation in degrees, applied around the box centre.
    pub rotation: f32,
    pub opacity: f32,
    pub z_index: i32,
}

impl OverlayPlacement {
    pub fn new(position: LatLng, rotation: f32, config: &OverlayConfig) -> Self {
        let bounds = GeoBounds::around(position, config.margin_degrees);
        Self {
            bounds,
            corners: bounds.corners(),
            rotation,
            opacity: config.opacity,
            z_index: config.z_index,
        }
    }
}
