//! Framing errors.

use thiserror::Error;

/// Result alias for framing operations.
pub type Result<T> = std::result::Result<T, FramingError>;

/// Errors produced while decoding framed content.
///
/// Encoding never fails; only decoding untrusted bytes can.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// Input shorter than its own title length prefix claims.
    ///
    /// Covers the empty input as well (`title_len` is reported as zero and
    /// `required` as one, the length byte itself).
    #[error("malformed framing: need {required} bytes for a {title_len}-byte title, got {actual}")]
    MalformedFraming {
        /// Title length read from the prefix byte.
        title_len: usize,
        /// Minimum number of bytes the frame must contain.
        required: usize,
        /// Number of bytes actually present.
        actual: usize,
    },
}
