// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Settings for the free-text grading service.
#[derive(Clone)]
pub struct GraderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

// Keeps the API key out of logs.
impl std::fmt::Debug for GraderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraderConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// JSON question bank loaded into the database at startup.
    pub questions_path: String,
    pub grader: GraderConfig,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = parse_or("JWT_EXPIRATION", 3600);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let defaults = GraderConfig::default();
        let grader = GraderConfig {
            api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            model: env::var("GRADER_MODEL").unwrap_or(defaults.model),
            timeout_secs: parse_or("GRADER_TIMEOUT_SECS", defaults.timeout_secs),
            max_retries: parse_or("GRADER_MAX_RETRIES", defaults.max_retries),
        };

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port: parse_or("PORT", 8000),
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            questions_path: env::var("QUESTIONS_PATH")
                .unwrap_or_else(|_| "questions.json".to_string()),
            grader,
        }
    }
}

/// Reads a numeric variable, falling back to `default` when unset or unparsable.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
