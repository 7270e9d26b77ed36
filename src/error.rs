// src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserOpError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cryptographic failure: {0}")]
    Crypto(String),

    #[error("Ethereum provider error: {0}")]
    Provider(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed JSON response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("Simulation failed: {0}")]
    Remote(String),

    #[error("could not simulate transaction. execution reverted")]
    Reverted,
}
