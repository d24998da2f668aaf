use std::fmt;
use std::io;

use privsep::PrivError;

/// Errors from raw-socket I/O (section 4.4/7). `Privileged` wraps a failed
/// monitor round trip (open/init/multicast); `Io` is a failed read/write on
/// an already-open descriptor.
#[derive(Debug)]
pub enum RawIoError {
    Privileged(PrivError),
    Io(io::Error),
}

impl fmt::Display for RawIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawIoError::Privileged(err) => write!(f, "privileged request failed: {}", err),
            RawIoError::Io(err) => write!(f, "raw socket io error: {}", err),
        }
    }
}

impl std::error::Error for RawIoError {}

impl From<PrivError> for RawIoError {
    fn from(err: PrivError) -> Self {
        RawIoError::Privileged(err)
    }
}

impl From<io::Error> for RawIoError {
    fn from(err: io::Error) -> Self {
        RawIoError::Io(err)
    }
}

impl From<nix::Error> for RawIoError {
    fn from(err: nix::Error) -> Self {
        RawIoError::Io(io::Error::from(err))
    }
}

pub type RawIoResult<T> = Result<T, RawIoError>;
