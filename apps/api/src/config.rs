use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// The Gemini API key is the only hard requirement; everything else
/// falls back to a sensible default.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub ocr_python: String,
    pub ocr_script: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            ocr_python: std::env::var("OCR_PYTHON").unwrap_or_else(|_| "python3".to_string()),
            ocr_script: std::env::var("OCR_SCRIPT")
                .unwrap_or_else(|_| "backend/chandra_service.py".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
