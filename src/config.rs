use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Escriba";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "info,escriba=debug".to_string()
}

/// Get the application data directory (`~/Escriba/`).
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join("Escriba")
}

/// Process configuration, read once from the environment in `main` and
/// passed by value into constructors. No hidden globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address for the API surface.
    pub bind_addr: String,
    /// Local Ollama endpoint.
    pub ollama_url: String,
    pub ollama_model: String,
    /// Hosted API credential; the OpenAI provider is only active when set.
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    /// Provider name to try first, when configured and available.
    pub preferred_provider: Option<String>,
    /// Per-request provider timeout.
    pub request_timeout: Duration,
    /// Retries after the first failed attempt, per provider.
    pub max_retries: u32,
    /// Base of the exponential backoff between attempts.
    pub retry_backoff: Duration,
    /// Response cache capacity (entries).
    pub cache_capacity: usize,
    /// Optional extra synonym file merged over the builtin glossary.
    pub glossary_file: Option<PathBuf>,
    /// Session history root (JSONL files).
    pub history_dir: PathBuf,
    /// Export bundle directory.
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8808".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "qwen2.5:7b-instruct".to_string(),
            openai_api_key: None,
            openai_model: "gpt-3.5-turbo".to_string(),
            preferred_provider: None,
            request_timeout: Duration::from_secs(45),
            max_retries: 2,
            retry_backoff: Duration::from_secs(2),
            cache_capacity: 64,
            glossary_file: None,
            history_dir: app_data_dir().join("history"),
            export_dir: app_data_dir().join("export"),
        }
    }
}

impl Config {
    /// Build from environment variables, defaulting every unset field.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_or("ESCRIBA_BIND", defaults.bind_addr),
            ollama_url: env_or("OLLAMA_URL", defaults.ollama_url),
            ollama_model: env_or("OLLAMA_MODEL", defaults.ollama_model),
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            openai_model: env_or("OPENAI_MODEL", defaults.openai_model),
            preferred_provider: std::env::var("ESCRIBA_PROVIDER")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            request_timeout: Duration::from_secs(env_parsed(
                "ESCRIBA_TIMEOUT_S",
                defaults.request_timeout.as_secs(),
            )),
            max_retries: env_parsed("ESCRIBA_MAX_RETRIES", defaults.max_retries),
            retry_backoff: Duration::from_secs(env_parsed(
                "ESCRIBA_RETRY_BACKOFF_S",
                defaults.retry_backoff.as_secs(),
            )),
            cache_capacity: env_parsed("ESCRIBA_CACHE_SIZE", defaults.cache_capacity),
            glossary_file: std::env::var("ESCRIBA_GLOSSARY").ok().map(PathBuf::from),
            history_dir: std::env::var("ESCRIBA_HISTORY_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_dir),
            export_dir: std::env::var("ESCRIBA_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_setup() {
        let cfg = Config::default();
        assert_eq!(cfg.ollama_url, "http://localhost:11434");
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.request_timeout, Duration::from_secs(45));
        assert_eq!(cfg.cache_capacity, 64);
        assert!(cfg.openai_api_key.is_none());
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("Escriba"));
    }

    #[test]
    fn history_and_export_under_app_dir() {
        let cfg = Config::default();
        assert!(cfg.history_dir.starts_with(app_data_dir()));
        assert!(cfg.export_dir.starts_with(app_data_dir()));
    }
}
