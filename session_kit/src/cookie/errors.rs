use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CookieError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Header error: {0}")]
    Header(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}
