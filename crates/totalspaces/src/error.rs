//! Error types for TotalSpaces operations

use std::ffi::NulError;
use thiserror::Error;

/// Errors raised by the binding itself
///
/// Invalid space numbers and unknown window ids are not errors: the native
/// service reports them as a `false` result, which is passed through as-is.
#[derive(Debug, Error)]
pub enum TotalSpacesError {
    /// The linked dylib and the running TotalSpaces disagree on the API version
    #[error("libtotalspacesapi version {library} does not match the TotalSpaces API version {api}")]
    ApiVersionMismatch { library: String, api: String },

    /// The running TotalSpaces reports an API version other than the configured one
    #[error("TotalSpaces API version is {actual}, expected {expected}")]
    UnexpectedApiVersion { expected: String, actual: String },

    /// A space name exceeds the native length limit
    #[error("Space name is {len} bytes long, the maximum is {max}")]
    NameTooLong { len: usize, max: usize },

    /// A space name cannot be passed as a C string
    #[error("Space name contains a NUL byte: {0}")]
    NameContainsNul(#[source] NulError),
}
