//! Process configuration, read once at start-up and passed down explicitly.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Where per-request temporary files are created
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Anthropic,
    OpenAi,
    DeepSeek,
    Ollama,
}

impl AiProvider {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => AiProvider::OpenAi,
            "deepseek" => AiProvider::DeepSeek,
            "ollama" => AiProvider::Ollama,
            _ => AiProvider::Anthropic,
        }
    }

    /// Environment variable holding this provider's key, if it needs one
    pub fn key_var(self) -> Option<&'static str> {
        match self {
            AiProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
            AiProvider::OpenAi => Some("OPENAI_API_KEY"),
            AiProvider::DeepSeek => Some("DEEPSEEK_API_KEY"),
            AiProvider::Ollama => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: AiProvider,
    pub api_key: Option<String>,
    pub ollama_model: String,
    pub ollama_host: String,
    /// Pages of text sent to the model
    pub max_pages: u32,
}

impl AiConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider == AiProvider::Ollama || self.api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                max_upload_bytes: 500 * 1024 * 1024,
                upload_dir: env::temp_dir(),
            },
            ai: AiConfig {
                provider: AiProvider::Anthropic,
                api_key: None,
                ollama_model: "llama3.2".to_string(),
                ollama_host: "http://localhost:11434".to_string(),
                max_pages: 30,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or unparsable values fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = var("AI_PROVIDER")
            .map(|p| AiProvider::from_name(&p))
            .unwrap_or(defaults.ai.provider);
        let api_key = provider.key_var().and_then(|key| var(key));

        Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: var("SERVER_PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
                max_upload_bytes: var("MAX_UPLOAD_MB")
                    .and_then(|mb| mb.parse::<usize>().ok())
                    .map(|mb| mb * 1024 * 1024)
                    .unwrap_or(defaults.server.max_upload_bytes),
                upload_dir: var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.server.upload_dir),
            },
            ai: AiConfig {
                provider,
                api_key,
                ollama_model: var("OLLAMA_MODEL").unwrap_or(defaults.ai.ollama_model),
                ollama_host: var("OLLAMA_HOST").unwrap_or(defaults.ai.ollama_host),
                max_pages: var("ANALYSIS_MAX_PAGES")
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(defaults.ai.max_pages),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.max_upload_bytes, 500 * 1024 * 1024);
        assert_eq!(config.ai.provider, AiProvider::Anthropic);
        assert_eq!(config.ai.max_pages, 30);
        assert!(!config.ai.is_enabled());
    }

    #[test]
    fn test_key_follows_selected_provider() {
        let config = config_from(&[
            ("AI_PROVIDER", "deepseek"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("DEEPSEEK_API_KEY", "sk-ds"),
        ]);
        assert_eq!(config.ai.provider, AiProvider::DeepSeek);
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-ds"));
        assert!(config.ai.is_enabled());

        let config = config_from(&[("AI_PROVIDER", "openai"), ("ANTHROPIC_API_KEY", "sk-ant")]);
        assert!(config.ai.api_key.is_none());
        assert!(!config.ai.is_enabled());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = config_from(&[("AI_PROVIDER", "Ollama"), ("OLLAMA_MODEL", "mistral")]);
        assert_eq!(config.ai.provider, AiProvider::Ollama);
        assert_eq!(config.ai.ollama_model, "mistral");
        assert!(config.ai.is_enabled());
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = config_from(&[
            ("SERVER_PORT", "eighty"),
            ("MAX_UPLOAD_MB", "12"),
            ("AI_PROVIDER", "something-else"),
        ]);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.max_upload_bytes, 12 * 1024 * 1024);
        assert_eq!(config.ai.provider, AiProvider::Anthropic);
    }
}
