use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid base_url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
