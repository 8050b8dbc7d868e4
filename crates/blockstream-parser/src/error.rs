use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Session already finished; no fragments accepted after the summary")]
    SessionFinished,
}

pub type Result<T> = std::result::Result<T, ParseError>;
