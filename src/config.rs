use anyhow::{Context, Result};
use std::str::FromStr;

/// Highest numbered suffix read for a rotated credential (`KEY`, `KEY_2` .. `KEY_5`).
pub const MAX_ROTATED_KEYS: usize = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub youtube_keys: Vec<(String, Option<String>)>,
    pub serper_keys: Vec<(String, Option<String>)>,
    pub together_api_key: Option<String>,
    pub youtube_api_url: String,
    pub serper_api_url: String,
    pub together_api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub context_char_budget: usize,
    pub key_cooldown_secs: u64,
    pub http_timeout_secs: u64,
    pub session_ttl_secs: u64,
    pub log_dir: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            youtube_keys: rotated_keys("YOUTUBE_API_KEY"),
            serper_keys: rotated_keys("SERPER_API_KEY"),
            together_api_key: non_empty_var("TOGETHER_API_KEY"),
            youtube_api_url: std::env::var("YOUTUBE_API_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3/search".into()),
            serper_api_url: std::env::var("SERPER_API_URL")
                .unwrap_or_else(|_| "https://google.serper.dev/search".into()),
            together_api_url: std::env::var("TOGETHER_API_URL")
                .unwrap_or_else(|_| "https://api.together.xyz/v1/completions".into()),
            model: std::env::var("MODEL_NAME")
                .unwrap_or_else(|_| "mistralai/Mixtral-8x7B-Instruct-v0.1".into()),
            max_tokens: parsed_var("MAX_TOKENS", "300")?,
            temperature: parsed_var("TEMPERATURE", "0.3")?,
            top_p: parsed_var("TOP_P", "0.8")?,
            context_char_budget: parsed_var("CONTEXT_CHAR_BUDGET", "2500")?,
            key_cooldown_secs: parsed_var("KEY_COOLDOWN_SECS", "0")?,
            http_timeout_secs: parsed_var("HTTP_TIMEOUT_SECS", "30")?,
            session_ttl_secs: parsed_var("SESSION_TTL_SECS", "3600")?,
            log_dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".into()),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8501".into()),
        })
    }
}

/// Reads `BASE`, `BASE_2`, ... `BASE_5` in order. Unset variables stay in the
/// list as `None` so the pool can report them as unusable.
fn rotated_keys(base: &str) -> Vec<(String, Option<String>)> {
    (1..=MAX_ROTATED_KEYS)
        .map(|n| {
            let name = if n == 1 {
                base.to_string()
            } else {
                format!("{}_{}", base, n)
            };
            let value = non_empty_var(&name);
            (name, value)
        })
        .collect()
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    std::env::var(name)
        .unwrap_or_else(|_| default.into())
        .parse()
        .context(format!("{} must be a number", name))
}
