use thiserror::Error;

pub mod manifest;
pub mod package;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading input file: {0}")]
    IO(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed source rpm identifier `{0}`")]
    MalformedSourceRpm(String),
    #[error("Binary package `{0}` carries no source rpm identifier")]
    MissingSourceRpm(String),
    #[error("Manifest enables no repositories")]
    NoRepositories,
}
