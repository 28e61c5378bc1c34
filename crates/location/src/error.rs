//! Errors reported by a location provider.
//!
//! These never escape [`LocationStatusMonitor`](crate::LocationStatusMonitor):
//! it logs them and keeps its last known status.

use thiserror::Error;

/// Failure of a single provider call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The platform location service could not be reached
    #[error("location provider unavailable: {0}")]
    Unavailable(String),

    /// A one-shot fix did not arrive in time
    #[error("timed out waiting for a position fix")]
    Timeout,

    /// The call needs a permission the app does not hold
    #[error("location permission not granted")]
    PermissionDenied,

    /// Location services are switched off
    #[error("location services are disabled")]
    ServicesDisabled,

    /// Anything else the platform reported
    #[error("platform error: {0}")]
    Platform(String),
}

/// Error code for integration with rider-core error handling.
/// Range: 11xxx for location provider errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ProviderErrorCode {
    Unavailable = 11001,
    Timeout = 11002,
    PermissionDenied = 11003,
    ServicesDisabled = 11004,
    Platform = 11005,
}

impl ProviderError {
    /// Returns the error code for this error.
    #[must_use]
    pub fn code(&self) -> ProviderErrorCode {
        match self {
            ProviderError::Unavailable(_) => ProviderErrorCode::Unavailable,
            ProviderError::Timeout => ProviderErrorCode::Timeout,
            ProviderError::PermissionDenied => ProviderErrorCode::PermissionDenied,
            ProviderError::ServicesDisabled => ProviderErrorCode::ServicesDisabled,
            ProviderError::Platform(_) => ProviderErrorCode::Platform,
        }
    }
}

impl From<ProviderError> for rider_core::Error {
    fn from(err: ProviderError) -> Self {
        let code = match err {
            ProviderError::PermissionDenied => rider_core::ErrorCode::LocationPermissionDenied,
            ProviderError::ServicesDisabled => rider_core::ErrorCode::LocationServicesDisabled,
            _ => rider_core::ErrorCode::LocationError,
        };
        rider_core::Error::new(code, err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ProviderError::Timeout.code() as u32, 11002);
        assert_eq!(
            ProviderError::Platform("boom".into()).code(),
            ProviderErrorCode::Platform
        );
    }

    #[test]
    fn test_into_core_error() {
        let err: rider_core::Error = ProviderError::ServicesDisabled.into();
        assert_eq!(err.code, rider_core::ErrorCode::LocationServicesDisabled);
        assert_eq!(err.code.category(), "Location");
    }
}
