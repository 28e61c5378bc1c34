//! Location status monitoring for the rider app
//!
//! Reconciles the OS location permission and location-services switch with a
//! live position feed, and publishes exactly one [`LocationStatus`] plus, while
//! ready, the latest [`LocatedReading`](rider_geo::LocatedReading).
//!
//! # Features
//!
//! - **Injectable provider**: the platform is reached only through [`LocationProvider`]
//! - **Single re-check path**: poll timer, foreground events and explicit calls
//!   all run the same serialized re-check
//! - **One watch at most**: starting a running watch is a no-op, stopping is idempotent
//! - **Scoped cleanup**: [`LocationStatusMonitor::stop`] releases the watch, the
//!   timer and the app-state listener
//!
//! # Example
//!
//! ```rust,no_run
//! use rider_location::{AppState, LocationProvider, LocationStatusMonitor, MonitorConfig};
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! async fn run(provider: Arc<dyn LocationProvider>) {
//!     let (app_tx, app_rx) = mpsc::channel(8);
//!     let mut monitor = LocationStatusMonitor::new(provider, MonitorConfig::default());
//!     monitor.start(app_rx);
//!
//!     let mut location = monitor.subscribe_location();
//!     while location.changed().await.is_ok() {
//!         println!("{:?} {:?}", monitor.status(), *location.borrow());
//!     }
//!
//!     app_tx.send(AppState::Active).await.ok();
//!     monitor.stop().await;
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod monitor;
pub mod provider;
pub mod status;

pub use error::{ProviderError, ProviderErrorCode};
pub use monitor::{AppState, LocationStatusMonitor, MonitorConfig};
pub use provider::{
    Accuracy, LocationProvider, PermissionStatus, PositionWatch, WatchOptions, WatchSubscription,
};
pub use status::{LocationStatus, resolve_status};
