// src/handlers.rs
use crate::{AppState, errors::ScannerError, models::*};
use actix_web::{HttpRequest, HttpResponse, web};
use log::{error, info, warn};
use uuid::Uuid;

const DATA_URL_IMAGE_PREFIX: &str = "data:image";

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": timestamp(),
        "service": "multi-shot-scanner"
    }))
}

pub async fn analyze(
    req: HttpRequest,
    body: web::Json<AnalyzeRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ScannerError> {
    let request_id = Uuid::new_v4();
    let client = client_id(&req);
    enforce_rate_limit(&data, &client)?;

    let body = body.into_inner();
    let (image, react_code) = match (body.image, body.react_code) {
        (Some(image), Some(code)) => (image, code),
        _ => {
            warn!("[{}] rejected analyze from {}: missing fields", request_id, client);
            return Err(ScannerError::Validation(
                "Missing required fields: image and reactCode".to_string(),
            ));
        }
    };
    if !image.starts_with(DATA_URL_IMAGE_PREFIX) {
        warn!("[{}] rejected analyze from {}: not an image data URL", request_id, client);
        return Err(ScannerError::Validation("Invalid image format".to_string()));
    }

    let options = body.options.unwrap_or_default();
    info!(
        "[{}] analyze from {}: type={:?}, image={}B, code={}B",
        request_id,
        client,
        options.resolved_type(),
        image.len(),
        react_code.len()
    );

    let result = run_analysis(&data, image, &react_code, &options)
        .await
        .inspect_err(|e| log_failure(request_id, e))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "result": result,
        "timestamp": timestamp(),
        "imageCount": body.image_count.unwrap_or(1)
    })))
}

pub async fn process_image(
    req: HttpRequest,
    body: web::Json<ImageRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ScannerError> {
    let client = client_id(&req);
    enforce_rate_limit(&data, &client)?;

    let image = required_image(body.into_inner())?;
    let processor = data.image_processor.clone();
    let processed = off_worker(move || processor.process_image_data(&image))
        .await
        .inspect_err(|e| log_failure(Uuid::new_v4(), e))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "processedImage": processed,
        "timestamp": timestamp()
    })))
}

pub async fn design_tokens(
    req: HttpRequest,
    body: web::Json<ImageRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ScannerError> {
    let request_id = Uuid::new_v4();
    let client = client_id(&req);
    enforce_rate_limit(&data, &client)?;

    let image = required_image(body.into_inner())?;
    let processor = data.image_processor.clone();
    let (normalized, dominant_colors) = off_worker(move || {
        let normalized = processor.prepare(&image)?;
        Ok((normalized, processor.extract_dominant_colors(&image)))
    })
    .await
    .inspect_err(|e| log_failure(request_id, e))?;

    info!("[{}] design-tokens from {}", request_id, client);
    let tokens = data
        .llm_service
        .analyze_design_system(&normalized)
        .await
        .inspect_err(|e| log_failure(request_id, e))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "tokens": tokens,
        "dominantColors": dominant_colors,
        "timestamp": timestamp()
    })))
}

async fn run_analysis(
    data: &web::Data<AppState>,
    image: String,
    react_code: &str,
    options: &AnalysisOptions,
) -> Result<AnalysisResult, ScannerError> {
    let normalized = normalize_image(data, image).await?;
    let analysis = data.llm_service.analyze_code(react_code);
    data.llm_service
        .analyze_ui(&normalized, react_code, analysis, options)
        .await
}

async fn normalize_image(
    data: &web::Data<AppState>,
    image: String,
) -> Result<NormalizedImage, ScannerError> {
    let processor = data.image_processor.clone();
    off_worker(move || processor.prepare(&image)).await
}

/// Runs CPU-bound image work on the blocking pool.
async fn off_worker<T, F>(f: F) -> Result<T, ScannerError>
where
    F: FnOnce() -> Result<T, ScannerError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| ScannerError::Internal(e.to_string()))?
}

fn enforce_rate_limit(data: &web::Data<AppState>, client: &str) -> Result<(), ScannerError> {
    if data.rate_limiter.check(client) {
        Ok(())
    } else {
        warn!("rate limit exceeded for {}", client);
        Err(ScannerError::RateLimit)
    }
}

fn required_image(body: ImageRequest) -> Result<String, ScannerError> {
    body.image
        .filter(|i| !i.is_empty())
        .ok_or_else(|| ScannerError::Validation("Missing image data".to_string()))
}

fn client_id(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn log_failure(request_id: Uuid, err: &ScannerError) {
    use actix_web::ResponseError;
    if err.status_code().is_server_error() {
        error!("[{}] request failed: {}", request_id, err);
    } else {
        warn!("[{}] request rejected: {}", request_id, err);
    }
}

fn timestamp() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
