//! Error type for row storage operations.

/// Error type for row storage operations.
///
/// All failures are synchronous. Mutating operations validate their entire
/// replacement plan before touching any field, so a call that returns an
/// error leaves the row exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    /// A caller-supplied argument was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// A run length would overflow its 16-bit representation.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(&'static str),
}
