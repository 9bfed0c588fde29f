// src/config.rs
use crate::errors::ScannerError;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub ai_timeout_secs: u64,
    pub debug: bool,
    pub max_image_size: usize,
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub max_image_dimension: u32,
    pub jpeg_quality: u8,
    pub rate_limit: u32,
    pub cors_origins: Vec<String>,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ScannerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Missing keys take their
    /// defaults; present but unparseable values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScannerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let anthropic_api_key = lookup("ANTHROPIC_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ScannerError::Config(
                    "ANTHROPIC_API_KEY is required in environment variables".to_string(),
                )
            })?;

        let jpeg_quality: u8 = parse_or(&lookup, "JPEG_QUALITY", 85)?;
        if !(1..=100).contains(&jpeg_quality) {
            return Err(ScannerError::Config(format!(
                "JPEG_QUALITY must be between 1 and 100, got {}",
                jpeg_quality
            )));
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            anthropic_api_key,
            anthropic_model: lookup("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            anthropic_base_url: lookup("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            ai_timeout_secs: parse_or(&lookup, "AI_TIMEOUT_SECS", 60)?,
            debug: lookup("DEBUG")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            max_image_size: parse_or(&lookup, "MAX_IMAGE_SIZE", 10 * 1024 * 1024)?,
            max_image_width: parse_or(&lookup, "MAX_IMAGE_WIDTH", 4096)?,
            max_image_height: parse_or(&lookup, "MAX_IMAGE_HEIGHT", 4096)?,
            max_image_dimension: parse_or(&lookup, "MAX_IMAGE_DIMENSION", 2048)?,
            jpeg_quality,
            rate_limit: parse_or(&lookup, "RATE_LIMIT", 100)?,
            cors_origins,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 5000)?,
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }

    /// JSON body ceiling: base64 expansion of the largest accepted image plus
    /// headroom for the source code and options.
    pub fn json_body_limit(&self) -> usize {
        self.max_image_size / 3 * 4 + 1024 * 1024
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ScannerError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ScannerError::Config(format!("Invalid value for {}: {}", key, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_fails() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ScannerError::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("ANTHROPIC_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ScannerError::Config(_)));
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup_from(&[("ANTHROPIC_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.max_image_size, 10_485_760);
        assert_eq!(config.max_image_width, 4096);
        assert_eq!(config.max_image_height, 4096);
        assert_eq!(config.max_image_dimension, 2048);
        assert_eq!(config.jpeg_quality, 85);
        assert_eq!(config.rate_limit, 100);
        assert_eq!(config.port, 5000);
        assert!(config.allows_any_origin());
        assert!(!config.debug);
    }

    #[test]
    fn overrides_and_bad_numbers() {
        let config = Config::from_lookup(lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("RATE_LIMIT", "5"),
            ("DEBUG", "TRUE"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
        ]))
        .unwrap();
        assert_eq!(config.rate_limit, 5);
        assert!(config.debug);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert!(!config.allows_any_origin());

        let err = Config::from_lookup(lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("MAX_IMAGE_SIZE", "ten"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MAX_IMAGE_SIZE"));
    }
}
