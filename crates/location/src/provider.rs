//! The device location capability the monitor is built on.
//!
//! Platform bindings implement [`LocationProvider`]; tests and the simulator
//! plug in scripted providers.

use crate::error::ProviderError;
use async_trait::async_trait;
use rider_core::config::LocationConfig;
use rider_geo::LocatedReading;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

pub use rider_core::config::AccuracyTier as Accuracy;

/// Foreground location permission as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// The app may read the location while in the foreground
    Granted,
    /// The user refused
    Denied,
    /// The user has not been asked yet
    Undetermined,
}

impl PermissionStatus {
    /// True only for [`PermissionStatus::Granted`]
    #[must_use]
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Parameters for a continuous position watch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    /// Accuracy tier requested from the platform
    pub accuracy: Accuracy,
    /// Minimum movement in meters between updates
    pub distance_interval_m: f64,
    /// Minimum time between updates
    pub time_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self::from(&LocationConfig::default())
    }
}

impl From<&LocationConfig> for WatchOptions {
    fn from(config: &LocationConfig) -> Self {
        Self {
            accuracy: config.accuracy,
            distance_interval_m: config.distance_interval_m,
            time_interval: Duration::from_millis(config.time_interval_ms),
        }
    }
}

/// Handle that cancels a platform position subscription
pub trait WatchSubscription: Send + Sync {
    /// Stop delivering updates. Called exactly once by [`PositionWatch`].
    fn remove(&mut self);
}

/// A live position subscription.
///
/// Dropping it removes the underlying platform subscription, so a watch can
/// never outlive its owner.
pub struct PositionWatch {
    updates: mpsc::Receiver<LocatedReading>,
    subscription: Box<dyn WatchSubscription>,
}

impl PositionWatch {
    /// Wraps a stream of readings and the handle that cancels it
    pub fn new(
        updates: mpsc::Receiver<LocatedReading>,
        subscription: impl WatchSubscription + 'static,
    ) -> Self {
        Self {
            updates,
            subscription: Box::new(subscription),
        }
    }

    /// Next reading, `None` once the provider closed the stream
    pub async fn next(&mut self) -> Option<LocatedReading> {
        self.updates.recv().await
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.updates.close();
        self.subscription.remove();
    }
}

impl fmt::Debug for PositionWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionWatch").finish_non_exhaustive()
    }
}

/// Platform location capability.
///
/// Every call may fail transiently; the monitor treats failures as "no news"
/// and relies on its next re-check.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Whether the device location services switch is on
    async fn services_enabled(&self) -> Result<bool, ProviderError>;

    /// Current foreground permission, without prompting
    async fn foreground_permission(&self) -> Result<PermissionStatus, ProviderError>;

    /// Prompt for foreground permission and return the outcome
    async fn request_foreground_permission(&self) -> Result<PermissionStatus, ProviderError>;

    /// A single position fix
    async fn current_position(&self, accuracy: Accuracy) -> Result<LocatedReading, ProviderError>;

    /// Start a continuous watch
    async fn watch_position(&self, options: WatchOptions) -> Result<PositionWatch, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rider_geo::GeoPoint;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(Arc<AtomicUsize>);

    impl WatchSubscription for Counting {
        fn remove(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_default_watch_options() {
        let options = WatchOptions::default();
        assert_eq!(options.accuracy, Accuracy::BestForNavigation);
        assert_eq!(options.distance_interval_m, 5.0);
        assert_eq!(options.time_interval, Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_drop_removes_subscription_once() {
        let removed = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel(4);
        let mut watch = PositionWatch::new(rx, Counting(removed.clone()));

        let reading = LocatedReading::new(GeoPoint::new(28.46, 77.03), 5.0, 1);
        tx.send(reading).await.unwrap();
        assert_eq!(watch.next().await, Some(reading));

        drop(watch);
        assert_eq!(removed.load(Ordering::SeqCst), 1);
        assert!(tx.is_closed());
    }

    #[test]
    fn test_watch_is_shareable_across_tasks() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn WatchSubscription>();
        assert_send_sync::<PositionWatch>();
    }

    #[test]
    fn test_permission_granted() {
        assert!(PermissionStatus::Granted.is_granted());
        assert!(!PermissionStatus::Undetermined.is_granted());
    }
}
