use std::fmt;
use std::io;

/// Errors produced by the transport-level plumbing shared across the
/// marshalling engine, the privilege-separation channel and raw socket I/O.
///
/// This mirrors the error taxonomy from the design: authorization failures
/// and per-interface errors are recoverable, framing/truncation errors close
/// the offending connection, and IPC/allocation failures are fatal to the
/// process that observes them.
#[derive(Debug)]
pub enum WireError {
    /// Underlying I/O error. `io::ErrorKind::WouldBlock` is surfaced as-is so
    /// callers driving a readiness loop can distinguish "try again" from a
    /// real failure.
    Io(io::Error),
    /// The input ended before a complete frame or schema body could be read.
    Truncated,
    /// A schema name referenced in a wire frame has no local registration.
    UnknownSchema(String),
    /// A schema declares an inline substruct cycle; rejected at registration.
    CyclicSubstruct(String),
    /// Allocation of a freshly deserialized node failed.
    Allocation,
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Io(err) => write!(f, "io error: {}", err),
            WireError::Truncated => write!(f, "truncated input"),
            WireError::UnknownSchema(name) => write!(f, "unknown schema: {}", name),
            WireError::CyclicSubstruct(name) => {
                write!(f, "cyclic inline substruct declared on {}", name)
            }
            WireError::Allocation => write!(f, "allocation failure"),
        }
    }
}

impl std::error::Error for WireError {}

impl From<io::Error> for WireError {
    #[inline]
    fn from(err: io::Error) -> Self {
        WireError::Io(err)
    }
}

pub type WireResult<T> = Result<T, WireError>;

/// True if a [`WireResult`] failure means "try again later" rather than a
/// hard failure that should tear down the connection.
pub trait ErrorUtils {
    fn would_block(&self) -> bool;
}

impl<T> ErrorUtils for WireResult<T> {
    fn would_block(&self) -> bool {
        matches!(self, Err(WireError::Io(err)) if err.kind() == io::ErrorKind::WouldBlock)
    }
}

/// Augmented `io::Write` that is aware of the amount of remaining free capacity in the destination.
pub trait SizedWrite: io::Write {
    /// Remaining free capacity in the destination.
    fn free_capacity(&self) -> usize;
}

/// Augmented `io::Read` that is aware of the amount of remaining data in the source.
pub trait SizedRead: io::Read {
    /// Remaining data in the source.
    fn remaining_data(&self) -> usize;
}

impl SizedWrite for io::Cursor<&mut [u8]> {
    #[inline]
    fn free_capacity(&self) -> usize {
        self.get_ref().len() - self.position() as usize
    }
}

impl SizedRead for io::Cursor<&[u8]> {
    #[inline]
    fn remaining_data(&self) -> usize {
        self.get_ref().len() - self.position() as usize
    }
}

impl SizedRead for io::Cursor<Vec<u8>> {
    #[inline]
    fn remaining_data(&self) -> usize {
        self.get_ref().len() - self.position() as usize
    }
}
