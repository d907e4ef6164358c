use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Deployment environment. Closed set; anything else is a fatal startup error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnv {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development" => Ok(AppEnv::Development),
            "production" => Ok(AppEnv::Production),
            "testing" => Ok(AppEnv::Testing),
            other => bail!("APP_ENV must be one of: development, production, testing (got '{other}')"),
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnv::Development => "development",
            AppEnv::Production => "production",
            AppEnv::Testing => "testing",
        };
        f.write_str(s)
    }
}

/// Application configuration loaded from environment variables.
/// Missing required variables abort startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub app_env: AppEnv,
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let app_env: AppEnv = std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .parse()?;

        let debug = std::env::var("DEBUG")
            .map(|v| matches!(v.as_str(), "true" | "1"))
            .unwrap_or(app_env != AppEnv::Production);

        Ok(Config {
            supabase_url: require_env("SUPABASE_URL")?,
            supabase_key: require_env("SUPABASE_KEY")?,
            llm_api_url: std::env::var("LLM_API_URL")
                .unwrap_or_else(|_| crate::llm_client::DEFAULT_API_URL.to_string()),
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_model: std::env::var("LLM_MODEL")
                .unwrap_or_else(|_| crate::llm_client::DEFAULT_MODEL.to_string()),
            app_env,
            debug,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| if debug { "debug" } else { "info" }.to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
