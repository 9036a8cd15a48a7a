use anyhow::{anyhow, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::debug;

use crate::llm::ProviderConfig;

/// Minimum length of the cookie signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Secret used to sign the per-client session cookie
    pub session_secret: Option<String>,

    /// SQLite connection string
    pub database_url: String,

    /// API key for the text-generation backend
    pub api_key: Option<String>,

    /// Base URL for the API
    pub base_url: Option<String>,

    /// Model to use
    pub model: String,

    /// Sampling temperature for interview answers
    pub temperature: f32,

    /// Address to listen on
    pub host: IpAddr,

    /// Port to listen on
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_secret: None,
            database_url: "sqlite://interview_assistant.db".to_string(),
            api_key: None,
            base_url: None,
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("session_secret", &self.session_secret.as_ref().map(|_| "<redacted>"))
            .field("database_url", &self.database_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Initialize configuration from the environment
    pub fn init() -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = Self::default();
        config.load_from_env(|name| std::env::var(name).ok())?;

        Ok(config)
    }

    /// Load configuration from environment variables, read through `var`
    pub fn load_from_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = var("SESSION_SECRET") {
            self.session_secret = Some(secret);
        }

        if let Some(url) = var("DATABASE_URL") {
            self.database_url = url;
        }

        if let Some(key) = var("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }

        if let Some(base_url) = var("OPENAI_BASE_URL") {
            self.base_url = Some(base_url);
        }

        if let Some(model) = var("INTERVIEW_MODEL") {
            self.model = model;
        }

        if let Some(temperature) = var("INTERVIEW_TEMPERATURE") {
            self.temperature = temperature
                .parse()
                .map_err(|e| anyhow!("Invalid INTERVIEW_TEMPERATURE '{}': {}", temperature, e))?;
        }

        if let Some(host) = var("INTERVIEW_HOST") {
            self.host = host
                .parse()
                .map_err(|e| anyhow!("Invalid INTERVIEW_HOST '{}': {}", host, e))?;
        }

        if let Some(port) = var("INTERVIEW_PORT") {
            self.port = port
                .parse()
                .map_err(|e| anyhow!("Invalid INTERVIEW_PORT '{}': {}", port, e))?;
        }

        Ok(())
    }

    /// Check if the configuration has a usable API key
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }

    /// Validate what every command needs
    pub fn validate(&self) -> Result<()> {
        if !self.has_api_key() {
            return Err(anyhow!(
                "No API key configured. Set the OPENAI_API_KEY environment variable."
            ));
        }

        if self.model.trim().is_empty() {
            return Err(anyhow!("Model is required"));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("temperature must be between 0.0 and 2.0"));
        }

        Ok(())
    }

    /// Validate what the HTTP server additionally needs
    pub fn validate_server(&self) -> Result<()> {
        self.validate()?;

        match self.session_secret.as_deref() {
            None => Err(anyhow!(
                "No session secret configured. Set the SESSION_SECRET environment variable."
            )),
            Some(secret) if secret.len() < MIN_SECRET_LEN => Err(anyhow!(
                "SESSION_SECRET must be at least {} bytes long",
                MIN_SECRET_LEN
            )),
            Some(_) => Ok(()),
        }
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = Config::default();
        config.load_from_env(|name| vars.get(name).cloned())?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.bind_address().port(), 5000);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_api_key_is_required() {
        let secret = "s".repeat(MIN_SECRET_LEN);
        let config = load(&[("SESSION_SECRET", secret.as_str())]).unwrap();
        assert!(config.validate().is_err());
        assert!(config.validate_server().is_err());

        let config = load(&[("OPENAI_API_KEY", "   ")]).unwrap();
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_server_needs_long_secret() {
        let short = load(&[("OPENAI_API_KEY", "sk-test"), ("SESSION_SECRET", "short")]).unwrap();
        assert!(short.validate().is_ok());
        assert!(short.validate_server().is_err());

        let secret = "x".repeat(MIN_SECRET_LEN);
        let ok = load(&[("OPENAI_API_KEY", "sk-test"), ("SESSION_SECRET", secret.as_str())]).unwrap();
        assert!(ok.validate_server().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = load(&[
            ("DATABASE_URL", ":memory:"),
            ("INTERVIEW_MODEL", "gpt-4o-mini"),
            ("INTERVIEW_TEMPERATURE", "0.2"),
            ("INTERVIEW_HOST", "127.0.0.1"),
            ("INTERVIEW_PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.database_url, ":memory:");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.bind_address().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("INTERVIEW_PORT", "not-a-port")]).is_err());

        let config = load(&[("OPENAI_API_KEY", "sk-test"), ("INTERVIEW_TEMPERATURE", "3.5")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[("OPENAI_API_KEY", "sk-very-secret")]).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
