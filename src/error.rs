use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarioError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid menu: {0}")]
    MenuInvalid(String),

    #[error("terminal error: {0}")]
    Terminal(String),
}
