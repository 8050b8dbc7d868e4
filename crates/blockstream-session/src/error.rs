use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Malformed upstream chunk: {0}")]
    MalformedChunk(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] blockstream_parser::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
