//! Core utilities shared by the rider delivery crates
//!
//! This crate provides the pieces every other crate leans on:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based configuration for location watching,
//!   arrival detection, and telemetry, with validation
//!
//! # Example
//!
//! ```rust,no_run
//! use rider_core::config::Config;
//!
//! let config = Config::load(None).expect("invalid configuration");
//! println!("re-checking every {} ms", config.schema.location.poll_interval_ms);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

pub use error::{Error, ErrorCode, Result, ResultExt, exit_codes};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        AccuracyTier, ArrivalConfig, Config, ConfigSchema, LocationConfig, TelemetrySettings,
    };
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_exit_codes_at_crate_root() {
        assert_eq!(crate::exit_codes::CONFIG_ERROR, 3);
        assert_eq!(crate::exit_codes::DATA_ERROR, 4);
    }
}
