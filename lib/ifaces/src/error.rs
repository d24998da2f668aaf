use std::fmt;

use privsep::PrivError;

/// Errors from interface classification (section 4.3/7). All of these are
/// the "per-interface error" category: the offending interface is simply
/// skipped, the scan continues.
#[derive(Debug)]
pub enum ClassifyError {
    Privileged(PrivError),
    Io(std::io::Error),
    Malformed(String),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::Privileged(err) => write!(f, "privileged request failed: {}", err),
            ClassifyError::Io(err) => write!(f, "io error: {}", err),
            ClassifyError::Malformed(reason) => write!(f, "malformed interface data: {}", reason),
        }
    }
}

impl std::error::Error for ClassifyError {}

impl From<PrivError> for ClassifyError {
    fn from(err: PrivError) -> Self {
        ClassifyError::Privileged(err)
    }
}

impl From<std::io::Error> for ClassifyError {
    fn from(err: std::io::Error) -> Self {
        ClassifyError::Io(err)
    }
}

pub type ClassifyResult<T> = Result<T, ClassifyError>;
