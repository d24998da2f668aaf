use std::fmt;
use std::io;

/// Errors from the privilege-separation channel (section 4.2/7). `Denied`
/// and `Protocol` are the non-fatal category ("reported, not fatal" and
/// "authorization failures are non-fatal"); `Io` on the channel itself is
/// always fatal to both processes -- callers that observe it must tear down
/// rather than retry.
#[derive(Debug)]
pub enum PrivError {
    /// The monitor refused the request: an unmatched path, or an
    /// operation-specific failure (ioctl error, missing interface).
    Denied(String),
    /// A malformed response was read from the channel -- wrong command
    /// selector, truncated payload, missing expected ancillary data.
    Protocol(String),
    /// I/O error reading or writing the socket pair itself. Fatal.
    Io(io::Error),
}

impl fmt::Display for PrivError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivError::Denied(reason) => write!(f, "privileged request denied: {}", reason),
            PrivError::Protocol(reason) => write!(f, "privsep protocol error: {}", reason),
            PrivError::Io(err) => write!(f, "privsep channel io error: {}", err),
        }
    }
}

impl std::error::Error for PrivError {}

impl From<io::Error> for PrivError {
    fn from(err: io::Error) -> Self {
        PrivError::Io(err)
    }
}

impl From<nix::Error> for PrivError {
    fn from(err: nix::Error) -> Self {
        PrivError::Io(io::Error::from(err))
    }
}

pub type PrivResult<T> = Result<T, PrivError>;

impl PrivError {
    /// True for the two non-fatal categories (section 7: "authorization
    /// failures are non-fatal and reported to the worker as an ordinary
    /// error code").
    pub fn is_fatal(&self) -> bool {
        matches!(self, PrivError::Io(_))
    }
}
