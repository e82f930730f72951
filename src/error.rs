//! Error type shared by every container in the crate.

use core::fmt;

/// Failure raised synchronously at the point of detection.
///
/// Any `Err` return leaves the container exactly as it was before the
/// failing call; no partially applied insert or erase is observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A key or position that was required to exist does not: `at` on a
    /// missing key, or stepping a handle past the container's bounds.
    OutOfRange,
    /// A stale or foreign handle, a positional hint that fails the
    /// is-sorted sanity check, or a non-positive load-factor cap.
    InvalidArgument,
    /// Reserved for precondition violations; not raised by this crate.
    Logic,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfRange => f.write_str("key or position out of range"),
            Error::InvalidArgument => f.write_str("invalid handle or argument"),
            Error::Logic => f.write_str("logic error"),
        }
    }
}

impl std::error::Error for Error {}
