use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("decode: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum NavError {
    #[error("redundant navigation to {0}")]
    Redundant(String),

    #[error("navigation failed: {0}")]
    Failed(String),
}
