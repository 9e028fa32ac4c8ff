//! Configuration management for the overlay app.
//!
//! Values come from the environment (optionally a `.env` file loaded by
//! `dotenvy`) and fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::overlay::LatLng;

pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} is out of range: {value}")]
    OutOfRange { name: &'static str, value: String },

    #[error("Tile URL template must contain {{z}}, {{x}} and {{y}}: {0}")]
    InvalidTileTemplate(String),
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub map: MapSettings,
    pub overlay: OverlayConfig,
    pub pdfium: PdfiumConfig,
}

/// Base map settings, handed to the WebView as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    pub tile_url: String,
    pub attribution: String,
    pub center: LatLng,
    pub zoom: u8,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            tile_url: DEFAULT_TILE_URL.to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            center: LatLng::new(51.505, -0.09),
            zoom: 13,
        }
    }
}

/// How the rendered page sits on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Half-width and half-height of the overlay box, in degrees.
    pub margin_degrees: f64,
    pub opacity: f32,
    pub z_index: i32,
    pub default_scale: f32,
    pub max_scale: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            margin_degrees: 0.005,
            opacity: 0.5,
            z_index: 10,
            default_scale: 1.0,
            max_scale: 8.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PdfiumConfig {
    /// Explicit path to the PDFium shared library.
    pub library_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let tile_url = lookup("PDF_OVERLAY_TILE_URL").unwrap_or(defaults.map.tile_url);
        validate_tile_template(&tile_url)?;

        let lat = parse_or("PDF_OVERLAY_LAT", &lookup, defaults.map.center.lat)?;
        let lng = parse_or("PDF_OVERLAY_LNG", &lookup, defaults.map.center.lng)?;
        let center = LatLng::new(lat, lng);
        if !center.is_valid() {
            return Err(ConfigError::OutOfRange {
                name: "PDF_OVERLAY_LAT",
                value: lat.to_string(),
            });
        }

        let zoom = parse_or("PDF_OVERLAY_ZOOM", &lookup, defaults.map.zoom)?;
        if zoom > 19 {
            return Err(ConfigError::OutOfRange {
                name: "PDF_OVERLAY_ZOOM",
                value: zoom.to_string(),
            });
        }

        let margin_degrees =
            parse_or("PDF_OVERLAY_MARGIN", &lookup, defaults.overlay.margin_degrees)?;
        if !(margin_degrees.is_finite() && margin_degrees > 0.0) {
            return Err(ConfigError::OutOfRange {
                name: "PDF_OVERLAY_MARGIN",
                value: margin_degrees.to_string(),
            });
        }

        let opacity = parse_or("PDF_OVERLAY_OPACITY", &lookup, defaults.overlay.opacity)?;
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ConfigError::OutOfRange {
                name: "PDF_OVERLAY_OPACITY",
                value: opacity.to_string(),
            });
        }

        let max_scale = parse_or("PDF_OVERLAY_MAX_SCALE", &lookup, defaults.overlay.max_scale)?;
        if !(max_scale.is_finite() && max_scale >= defaults.overlay.default_scale) {
            return Err(ConfigError::OutOfRange {
                name: "PDF_OVERLAY_MAX_SCALE",
                value: max_scale.to_string(),
            });
        }

        Ok(AppConfig {
            map: MapSettings {
                tile_url,
                attribution: lookup("PDF_OVERLAY_ATTRIBUTION").unwrap_or(defaults.map.attribution),
                center,
                zoom,
            },
            overlay: OverlayConfig {
                margin_degrees,
                opacity,
                max_scale,
                ..defaults.overlay
            },
            pdfium: PdfiumConfig {
                library_path: lookup("PDFIUM_LIBRARY_PATH")
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from),
            },
        })
    }
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

fn validate_tile_template(template: &str) -> Result<(), ConfigError> {
    let complete = ["{z}", "{x}", "{y}"].iter().all(|p| template.contains(p));
    if !complete {
        return Err(ConfigError::InvalidTileTemplate(template.to_string()));
    }
    Ok(())
}
