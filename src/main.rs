// src/main.rs
use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware};
use anyhow::Context;
use log::info;
use std::sync::Arc;

use multi_shot_scanner::config::Config;
use multi_shot_scanner::services::{
    AnthropicClient, HourlyRateLimiter, ImageProcessor, LLMService,
};
use multi_shot_scanner::{AppState, app_config};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("invalid configuration")?;
    let default_filter = if config.debug { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    info!("Starting multi-shot-scanner...");

    // Initialize services
    let model = Arc::new(AnthropicClient::new(&config).context("failed to build AI client")?);
    let app_state = AppState {
        image_processor: Arc::new(ImageProcessor::new(&config)),
        llm_service: Arc::new(LLMService::new(model)),
        rate_limiter: Arc::new(HourlyRateLimiter::new(config.rate_limit)),
        config: Arc::new(config),
    };

    let bind_addr = (app_state.config.host.clone(), app_state.config.port);
    info!("Starting HTTP server on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        let state = app_state.clone();
        App::new()
            .wrap(build_cors(&state.config))
            .wrap(middleware::Logger::default())
            .configure(|cfg| app_config(cfg, state))
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}

fn build_cors(config: &Config) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

    if config.allows_any_origin() {
        cors.allow_any_origin()
    } else {
        config
            .cors_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}
