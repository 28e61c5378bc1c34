//! Error types for the geo crate.

use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur while decoding coordinates.
///
/// Distance math never fails; only ingestion of raw coordinate data does.
#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    /// Wrong number of components in a coordinate pair
    #[error("Invalid coordinate pair: expected 2 values, got {0}")]
    InvalidPair(usize),

    /// Values out of range for latitude/longitude
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

/// Error code for integration with rider-core error handling.
/// Range: 10xxx for geo errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoErrorCode {
    /// Wrong number of components
    InvalidPair = 10001,
    /// Out-of-range coordinate values
    InvalidCoordinate = 10002,
}

impl GeoError {
    /// Returns the error code for this error.
    pub fn code(&self) -> GeoErrorCode {
        match self {
            GeoError::InvalidPair(_) => GeoErrorCode::InvalidPair,
            GeoError::InvalidCoordinate(_) => GeoErrorCode::InvalidCoordinate,
        }
    }
}
