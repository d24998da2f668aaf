use std::fmt;
use std::io;

use wire::shared::WireError as MarshalError;

/// Control-socket framing/decode errors (section 4.5/7). A framing error
/// closes the offending connection; it never takes down the server.
#[derive(Debug)]
pub enum CtlError {
    Io(io::Error),
    Truncated,
    PayloadTooLarge(u32),
    UnknownMessageType(u32),
    Malformed(String),
}

impl fmt::Display for CtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtlError::Io(err) => write!(f, "io error: {}", err),
            CtlError::Truncated => write!(f, "truncated control frame"),
            CtlError::PayloadTooLarge(len) => write!(f, "payload too large: {} bytes", len),
            CtlError::UnknownMessageType(v) => write!(f, "unknown control message type {}", v),
            CtlError::Malformed(reason) => write!(f, "malformed control payload: {}", reason),
        }
    }
}

impl std::error::Error for CtlError {}

impl From<io::Error> for CtlError {
    fn from(err: io::Error) -> Self {
        CtlError::Io(err)
    }
}

impl From<MarshalError> for CtlError {
    fn from(err: MarshalError) -> Self {
        match err {
            MarshalError::Io(err) => CtlError::Io(err),
            MarshalError::Truncated => CtlError::Truncated,
            other => CtlError::Malformed(other.to_string()),
        }
    }
}

pub type CtlResult<T> = Result<T, CtlError>;
