use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::retry_config::RetryConfig;

/// Environment variables override everything else and are read with this
/// prefix, e.g. `LOOPWRIGHT_MODEL`, `LOOPWRIGHT_API_KEY`,
/// `LOOPWRIGHT_RETRY__MAX_RETRY_ATTEMPTS` (double underscore descends into
/// a nested struct).
pub const CONFIG_ENV_PREFIX: &str = "LOOPWRIGHT";

/// Fully-resolved configuration a binary hands to the loop's collaborators
/// (the `ChatService` and `CompactionService` implementations). The loop
/// core never sees this type directly — it only sees the
/// `ChatServiceConfig` those collaborators derive from it.
#[derive(Debug, Clone, Serialize, Deserialize, Setters, PartialEq)]
#[setters(strip_option, into)]
pub struct RuntimeConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_context_tokens: u32,
    pub max_output_tokens: Option<u32>,

    /// `-1` unlimited, `0` disables chat, any positive value is a hard cap.
    /// Mirrors `loopwright_domain::config::{UNLIMITED_MAX_TURNS,
    /// CHAT_DISABLED_MAX_TURNS}` without depending on that crate.
    pub max_turns: i32,

    pub log_level: String,
    pub retry: RetryConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            api_key: None,
            base_url: None,
            max_context_tokens: 128_000,
            max_output_tokens: None,
            max_turns: -1,
            log_level: "info".into(),
            retry: RetryConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Loads configuration in increasing precedence: built-in defaults, an
    /// optional TOML file, then environment variables. `.env` is loaded
    /// first (best-effort — a missing file is not an error) so secrets like
    /// `LOOPWRIGHT_API_KEY` can live outside the shell's own environment.
    pub fn load(toml_path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let mut builder = Config::builder().add_source(
            config::Config::try_from(&defaults)
                .expect("RuntimeConfig::default() always serializes")
                .clone(),
        );

        if let Some(path) = toml_path {
            builder = builder.add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(false));
        } else if let Some(default_path) = Self::default_config_path() {
            builder = builder.add_source(File::new(&default_path.to_string_lossy(), FileFormat::Toml).required(false));
        }

        let config = builder.add_source(Environment::with_prefix(CONFIG_ENV_PREFIX).separator("__")).build()?;

        let resolved: Self = config.try_deserialize()?;
        if let Some(base_url) = &resolved.base_url {
            url::Url::parse(base_url)?;
        }
        Ok(resolved)
    }

    /// `~/.loopwright/config.toml`, the per-user default when no explicit
    /// path is given.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".loopwright").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn load_with_no_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist.toml");
        let resolved = RuntimeConfig::load(Some(&missing)).unwrap();
        assert_eq!(resolved, RuntimeConfig::default());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "model = \"claude-x\"\nmax_turns = 25").unwrap();

        let resolved = RuntimeConfig::load(Some(&path)).unwrap();
        assert_eq!(resolved.model, "claude-x");
        assert_eq!(resolved.max_turns, 25);
        assert_eq!(resolved.max_context_tokens, 128_000);
    }

    #[test]
    fn env_var_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = \"claude-x\"\n").unwrap();

        unsafe {
            std::env::set_var("LOOPWRIGHT_MODEL", "env-model");
        }
        let resolved = RuntimeConfig::load(Some(&path)).unwrap();
        unsafe {
            std::env::remove_var("LOOPWRIGHT_MODEL");
        }
        assert_eq!(resolved.model, "env-model");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "base_url = \"not a url\"\n").unwrap();
        assert!(RuntimeConfig::load(Some(&path)).is_err());
    }
}
