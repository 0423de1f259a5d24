use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("invalid mode code: {0}")]
    InvalidModeCode(i64),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}
