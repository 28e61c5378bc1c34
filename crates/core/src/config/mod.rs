//! Configuration loading and schema definitions
//!
//! Shared configuration types used by the location, arrival, and telemetry crates.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
