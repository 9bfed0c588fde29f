// src/services/mod.rs
pub mod code_analyzer;
pub mod image_processor;
pub mod llm_service;
pub mod prompt;
pub mod rate_limiter;

pub use code_analyzer::CodeAnalyzer;
pub use image_processor::ImageProcessor;
pub use llm_service::{AnthropicClient, LLMService, VisionModel, VisionRequest};
pub use rate_limiter::{HourlyRateLimiter, RateLimiter};
