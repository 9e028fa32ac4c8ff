// PDF Map Overlay - Tauri Backend
//
// Renders pages of an uploaded PDF with PDFium and places them on a Leaflet
// map at a draggable position, scale and rotation.

mod commands;
pub mod config;
pub mod document;
pub mod overlay;
pub mod pdf;
pub mod session;

use commands::{
    close_pdf, drag_overlay, get_current_image, get_map_settings, get_page_info, get_view_state,
    next_page, open_pdf, previous_page, render_overlay, set_rotation, set_scale, upload_pdf,
    AppState,
};
use config::AppConfig;
use pdf::{PageRasterizer, PdfiumEngine, UnavailableRasterizer};
use session::OverlaySession;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_overlay_lib=debug,pdf_overlay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Bind the rasterization engine once, before any window opens.
fn init_engine(config: &AppConfig) -> Arc<dyn PageRasterizer> {
    match PdfiumEngine::initialize(&config.pdfium) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            tracing::error!("{}", e);
            Arc::new(UnavailableRasterizer::new(e.to_string()))
        }
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        AppConfig::default()
    });
    tracing::info!("Starting PDF overlay v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Tile source: {}", config.map.tile_url);

    let engine = init_engine(&config);
    let session = OverlaySession::new(engine, config.overlay.clone(), config.map.center);
    let app_state = AppState::new(session, config.map.clone());

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            get_map_settings,
            get_view_state,
            upload_pdf,
            open_pdf,
            close_pdf,
            next_page,
            previous_page,
            set_scale,
            set_rotation,
            drag_overlay,
            render_overlay,
            get_page_info,
            get_current_image,
        ])
        .setup(|_app| {
            tracing::debug!("App setup complete");
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
