//! Record error types.

use thiserror::Error;

/// Record-level errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Integer code does not name a known adapter type.
    #[error("unknown io type code: {0}")]
    UnknownIoType(u8),
}
