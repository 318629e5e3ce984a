use std::io;

use thiserror::Error;

/// Failure kinds reported by every filesystem operation.
///
/// Each variant carries a short context string naming where the failure
/// was detected, the same way the rest of the crate reports errors.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Errno {
  /// Malformed or unresolvable path
  #[error("invalid path: {0}")]
  InvalidPath(&'static str),
  /// Bad name, out-of-range user index, malformed permission code
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),
  /// Acting user lacks the read or write bit
  #[error("permission denied: {0}")]
  PermissionDenied(&'static str),
  /// No free inode, data block, index entry or user slot
  #[error("resource exhausted: {0}")]
  ResourceExhausted(&'static str),
  /// Name collision
  #[error("already exists: {0}")]
  AlreadyExists(&'static str),
  /// Non-recursive delete of a populated directory
  #[error("directory not empty: {0}")]
  NotEmpty(&'static str),
  /// Directory copy, oversized file
  #[error("unsupported operation: {0}")]
  UnsupportedOperation(&'static str),
  /// Backing store read/write error
  #[error("i/o failure: {0}")]
  IOFailure(String),
  /// Structural inconsistency found while mounting
  #[error("corrupt image: {0}")]
  CorruptImage(&'static str),
}

impl From<io::Error> for Errno {
  fn from(error: io::Error) -> Self {
    match error.kind() {
      // Every region has a fixed size, so a short read means a truncated image
      io::ErrorKind::UnexpectedEof => Errno::CorruptImage("short read from backing store"),
      _ => Errno::IOFailure(error.to_string()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unexpected_eof_is_corrupt_image() {
    let errno: Errno = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
    assert_eq!(errno, Errno::CorruptImage("short read from backing store"));
  }

  #[test]
  fn other_io_errors_keep_their_message() {
    let errno: Errno = io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into();
    assert_eq!(errno, Errno::IOFailure(String::from("read-only")));
  }
}

// vim:ts=2 sw=2
