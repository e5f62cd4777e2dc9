use std::env;
use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_AUDIO_EXTENSIONS: &str = "wav,mp3,m4a,aac,ogg";

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` selects the in-process store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub claude_api_key: Option<String>,
    pub claude_model: String,
    pub claude_api_url: String,
    pub insight_timeout_secs: u64,
    pub insight_max_tokens: u32,

    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub allowed_audio_extensions: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".into())
                .parse()
                .context("PORT must be a number")?,
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "*".into()),
            // e.g. a phone on the LAN during development
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            claude_api_key: env::var("CLAUDE_API_KEY").ok().filter(|s| !s.is_empty()),
            claude_model: env::var("CLAUDE_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".into()),
            claude_api_url: env::var("CLAUDE_API_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".into()),
            insight_timeout_secs: env::var("INSIGHT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .context("INSIGHT_TIMEOUT_SECS must be a number")?,
            insight_max_tokens: env::var("INSIGHT_MAX_TOKENS")
                .unwrap_or_else(|_| "1024".into())
                .parse()
                .context("INSIGHT_MAX_TOKENS must be a number")?,

            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "voice_notes".into())
                .into(),
            max_upload_bytes: match env::var("MAX_UPLOAD_BYTES") {
                Ok(v) => v.parse().context("MAX_UPLOAD_BYTES must be a number")?,
                Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
            },
            allowed_audio_extensions: parse_extensions(
                &env::var("ALLOWED_AUDIO_EXTENSIONS")
                    .unwrap_or_else(|_| DEFAULT_AUDIO_EXTENSIONS.into()),
            ),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    /// Local defaults: in-memory store, no insight credential.
    fn default() -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 5000,
            frontend_url: "*".into(),
            cors_extra_origins: Vec::new(),
            claude_api_key: None,
            claude_model: "claude-sonnet-4-20250514".into(),
            claude_api_url: "https://api.anthropic.com/v1/messages".into(),
            insight_timeout_secs: 30,
            insight_max_tokens: 1024,
            upload_dir: "voice_notes".into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_audio_extensions: parse_extensions(DEFAULT_AUDIO_EXTENSIONS),
        }
    }
}

/// Splits a comma list into lowercased extensions without leading dots.
fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extensions_normalizes() {
        assert_eq!(
            parse_extensions(" WAV, .mp3,,ogg "),
            vec!["wav".to_string(), "mp3".to_string(), "ogg".to_string()]
        );
    }

    #[test]
    fn test_default_allows_five_audio_types() {
        let config = Config::default();
        assert_eq!(config.allowed_audio_extensions.len(), 5);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.claude_api_key.is_none());
    }
}
