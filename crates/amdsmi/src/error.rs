use std::borrow::Cow;

use thiserror::Error;

use crate::sys::Status;

/// Failure to bring the native module into a usable state.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open module `{name}`: {reason}")]
    Open { name: Cow<'static, str>, reason: String },

    #[error("Failed to resolve symbol `{symbol}`: {reason}")]
    Symbol { symbol: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A native call returned anything other than success.
    #[error("failed to {op}: {status}")]
    Status { op: &'static str, status: Status },
}

impl Error {
    /// Native status carried by the error, if the failure came from a call.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Load(_) => None,
        }
    }
}

/// Maps a native status onto `Result`.
pub(crate) fn check(op: &'static str, status: Status) -> Result<(), Error> {
    if status.is_success() {
        Ok(())
    } else {
        tracing::debug!(op, %status, "native call failed");
        Err(Error::Status { op, status })
    }
}
