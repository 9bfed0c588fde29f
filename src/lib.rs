// src/lib.rs
use actix_web::{error::JsonPayloadError, web};
use std::sync::Arc;

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

use crate::config::Config;
use crate::errors::ScannerError;
use crate::services::{ImageProcessor, LLMService, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub image_processor: Arc<ImageProcessor>,
    pub llm_service: Arc<LLMService>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

/// Route table shared by the binary and the integration tests.
pub fn app_config(cfg: &mut web::ServiceConfig, state: AppState) {
    let json_config = web::JsonConfig::default()
        .limit(state.config.json_body_limit())
        .error_handler(|err, _req| {
            let message = match &err {
                JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                    "Request body too large".to_string()
                }
                other => format!("Invalid JSON body: {}", other),
            };
            ScannerError::Validation(message).into()
        });

    cfg.app_data(web::Data::new(state))
        .app_data(json_config)
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health_check))
                .route("/analyze", web::post().to(handlers::analyze))
                .route("/process-image", web::post().to(handlers::process_image))
                .route("/design-tokens", web::post().to(handlers::design_tokens)),
        );
}
