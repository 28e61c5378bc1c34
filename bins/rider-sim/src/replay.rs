//! Trace replay: a scripted location provider driving a real monitor and session.

use async_trait::async_trait;
use rider_core::config::ConfigSchema;
use rider_geo::{GeoPoint, LocatedReading};
use rider_location::{
    Accuracy, AppState, LocationProvider, LocationStatus, LocationStatusMonitor, MonitorConfig,
    PermissionStatus, PositionWatch, ProviderError, WatchOptions, WatchSubscription,
};
use rider_proximity::{ArrivalDetector, DeliverySession, Order, ScreenView};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// How long to wait for the monitor to publish a pushed fix
const FIX_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracePermission {
    Granted,
    Denied,
    Undetermined,
}

impl From<TracePermission> for PermissionStatus {
    fn from(permission: TracePermission) -> Self {
        match permission {
            TracePermission::Granted => PermissionStatus::Granted,
            TracePermission::Denied => PermissionStatus::Denied,
            TracePermission::Undetermined => PermissionStatus::Undetermined,
        }
    }
}

/// One scripted step
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// The user changed the permission in system settings
    Permission { status: TracePermission },
    /// The location services switch was flipped
    Services { enabled: bool },
    /// The app came back to the foreground
    Foreground,
    /// The device reported a position
    Fix {
        lat: f64,
        lng: f64,
        #[serde(default)]
        accuracy: f64,
        #[serde(default)]
        timestamp: i64,
    },
}

impl TraceEvent {
    fn describe(&self) -> String {
        match self {
            TraceEvent::Permission { status } => format!("permission {:?}", status).to_lowercase(),
            TraceEvent::Services { enabled } => {
                format!("services {}", if *enabled { "on" } else { "off" })
            }
            TraceEvent::Foreground => "foreground".to_string(),
            TraceEvent::Fix { lat, lng, accuracy, .. } => {
                format!("fix {:.5},{:.5} ±{:.0} m", lat, lng, accuracy)
            }
        }
    }
}

/// Parse a JSON array of trace events
pub fn parse_trace(json: &str) -> serde_json::Result<Vec<TraceEvent>> {
    serde_json::from_str(json)
}

struct TraceSubscription;

impl WatchSubscription for TraceSubscription {
    fn remove(&mut self) {
        debug!("trace watch removed");
    }
}

/// Provider whose device state is set by the trace
pub struct ReplayProvider {
    permission: Mutex<PermissionStatus>,
    services: AtomicBool,
    feed: Mutex<Option<mpsc::Sender<LocatedReading>>>,
    last_fix: Mutex<Option<LocatedReading>>,
}

impl ReplayProvider {
    /// Services on, permission not yet asked
    pub fn new() -> Self {
        Self {
            permission: Mutex::new(PermissionStatus::Undetermined),
            services: AtomicBool::new(true),
            feed: Mutex::new(None),
            last_fix: Mutex::new(None),
        }
    }

    pub fn set_permission(&self, permission: PermissionStatus) {
        *self.permission.lock().unwrap_or_else(PoisonError::into_inner) = permission;
    }

    pub fn set_services(&self, enabled: bool) {
        self.services.store(enabled, Ordering::SeqCst);
    }

    /// Deliver a fix to the active watch; false when nobody is watching
    pub async fn push_fix(&self, reading: LocatedReading) -> bool {
        *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner) = Some(reading);

        let feed = self.feed.lock().unwrap_or_else(PoisonError::into_inner).clone();
        match feed {
            Some(feed) => feed.send(reading).await.is_ok(),
            None => false,
        }
    }
}

impl Default for ReplayProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for ReplayProvider {
    async fn services_enabled(&self) -> Result<bool, ProviderError> {
        Ok(self.services.load(Ordering::SeqCst))
    }

    async fn foreground_permission(&self) -> Result<PermissionStatus, ProviderError> {
        Ok(*self.permission.lock().unwrap_or_else(PoisonError::into_inner))
    }

    async fn request_foreground_permission(&self) -> Result<PermissionStatus, ProviderError> {
        self.foreground_permission().await
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<LocatedReading, ProviderError> {
        if !self.services.load(Ordering::SeqCst) {
            return Err(ProviderError::ServicesDisabled);
        }
        self.last_fix
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ok_or_else(|| ProviderError::Unavailable("no fix in trace yet".into()))
    }

    async fn watch_position(&self, options: WatchOptions) -> Result<PositionWatch, ProviderError> {
        let (tx, rx) = mpsc::channel(64);
        *self.feed.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        debug!(?options, "trace watch started");
        Ok(PositionWatch::new(rx, TraceSubscription))
    }
}

/// What the screen showed after one step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub event: String,
    pub status: LocationStatus,
    pub location: Option<LocatedReading>,
    pub nearest: Option<String>,
    pub arrived: bool,
    pub delivered: Option<String>,
}

/// Outcome of a full replay
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    pub delivered: Vec<String>,
    pub remaining: Vec<String>,
    /// Registry snapshot taken when the replay finished
    pub metrics: serde_json::Value,
}

/// Run `events` through a monitor and a delivery session.
///
/// Device-state events force a re-check instead of waiting for the poll
/// interval. An order is marked delivered as soon as the rider arrives at it.
pub async fn run(
    events: Vec<TraceEvent>,
    orders: Vec<Order>,
    config: &ConfigSchema,
) -> anyhow::Result<ReplayReport> {
    let provider = Arc::new(ReplayProvider::new());
    let (app_tx, app_rx) = mpsc::channel(8);
    let mut monitor = LocationStatusMonitor::new(provider.clone(), MonitorConfig::from(&config.location));
    monitor.start(app_rx);

    let mut session = DeliverySession::new(orders, ArrivalDetector::from(&config.arrival));
    let mut location = monitor.subscribe_location();
    let mut report = ReplayReport::default();

    for (step, event) in events.into_iter().enumerate() {
        let description = event.describe();
        match event {
            TraceEvent::Permission { status } => {
                provider.set_permission(status.into());
                monitor.recheck().await;
            }
            TraceEvent::Services { enabled } => {
                provider.set_services(enabled);
                monitor.recheck().await;
            }
            TraceEvent::Foreground => {
                app_tx.send(AppState::Active).await?;
                monitor.recheck().await;
            }
            TraceEvent::Fix { lat, lng, accuracy, timestamp } => {
                let reading = LocatedReading::new(GeoPoint::new(lat, lng), accuracy, timestamp);
                location.borrow_and_update();
                if !provider.push_fix(reading).await {
                    warn!(step, "fix dropped: no active position watch");
                } else if !matches!(tokio::time::timeout(FIX_TIMEOUT, location.changed()).await, Ok(Ok(()))) {
                    warn!(step, "monitor did not publish the fix in time");
                }
            }
        }

        let status = monitor.status();
        let current = monitor.current_location();
        let (nearest, arrived) = match session.view(status, current.as_ref()) {
            ScreenView::Orders { nearest, arrived, .. } => (nearest.map(|o| o.id), arrived),
            _ => (None, false),
        };

        let delivered = match (&nearest, arrived) {
            (Some(id), true) => session.mark_delivered(id).map(|o| o.id),
            _ => None,
        };
        if let Some(id) = &delivered {
            report.delivered.push(id.clone());
        }

        report.steps.push(StepReport {
            step,
            event: description,
            status,
            location: current,
            nearest,
            arrived,
            delivered,
        });
    }

    monitor.stop().await;
    report.remaining = session.ranking().orders().iter().map(|o| o.id.clone()).collect();
    report.metrics = rider_telemetry::metrics().export_json();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rider_proximity::OrderStatus;

    fn orders() -> Vec<Order> {
        vec![
            Order::new("tower-b", OrderStatus::OnTheWay, GeoPoint::new(28.4677, 77.0714)),
            Order::new("sector-14", OrderStatus::Assigned, GeoPoint::new(28.4700, 77.0400)),
        ]
    }

    #[test]
    fn test_parse_trace() {
        let events = parse_trace(
            r#"[
                {"event": "permission", "status": "granted"},
                {"event": "services", "enabled": false},
                {"event": "foreground"},
                {"event": "fix", "lat": 28.46, "lng": 77.03, "accuracy": 9.5}
            ]"#,
        )
        .unwrap();

        assert_eq!(events.len(), 4);
        assert!(matches!(events[1], TraceEvent::Services { enabled: false }));
        assert!(matches!(events[3], TraceEvent::Fix { timestamp: 0, .. }));
        assert_eq!(events[0].describe(), "permission granted");
    }

    #[tokio::test]
    async fn test_replay_delivers_on_arrival() {
        let events = vec![
            TraceEvent::Permission { status: TracePermission::Denied },
            TraceEvent::Fix { lat: 28.4595, lng: 77.0266, accuracy: 5.0, timestamp: 1 },
            TraceEvent::Permission { status: TracePermission::Granted },
            TraceEvent::Fix { lat: 28.4595, lng: 77.0266, accuracy: 5.0, timestamp: 2 },
            TraceEvent::Fix { lat: 28.4700, lng: 77.0401, accuracy: 8.0, timestamp: 3 },
            TraceEvent::Services { enabled: false },
            TraceEvent::Services { enabled: true },
            TraceEvent::Fix { lat: 28.4677, lng: 77.0714, accuracy: 4.0, timestamp: 4 },
        ];

        let report = run(events, orders(), &ConfigSchema::default()).await.unwrap();

        assert_eq!(report.steps[0].status, LocationStatus::NoPermission);
        assert!(report.steps[1].location.is_none());
        assert_eq!(report.steps[2].status, LocationStatus::Ready);
        assert_eq!(report.steps[3].nearest.as_deref(), Some("sector-14"));
        assert!(!report.steps[3].arrived);
        assert_eq!(report.steps[4].delivered.as_deref(), Some("sector-14"));
        assert_eq!(report.steps[5].status, LocationStatus::GpsOff);
        assert!(report.steps[5].location.is_none());
        assert_eq!(report.steps[7].delivered.as_deref(), Some("tower-b"));
        assert_eq!(report.delivered, vec!["sector-14", "tower-b"]);
        assert!(report.remaining.is_empty());

        // Granted, then services off and back on: two watches, two deliveries.
        let counters = &report.metrics["counters"];
        assert!(counters["location.watch_started"].as_u64() >= Some(2));
        assert!(counters["location.watch_stopped"].as_u64() >= Some(1));
        assert!(counters["orders.delivered"].as_u64() >= Some(2));
    }

    #[tokio::test]
    async fn test_lost_fix_clears_nearest() {
        let events = vec![
            TraceEvent::Permission { status: TracePermission::Granted },
            TraceEvent::Fix { lat: 28.4595, lng: 77.0266, accuracy: 5.0, timestamp: 1 },
            TraceEvent::Services { enabled: false },
            TraceEvent::Services { enabled: true },
        ];

        let report = run(events, orders(), &ConfigSchema::default()).await.unwrap();

        assert_eq!(report.steps[1].nearest.as_deref(), Some("sector-14"));
        assert_eq!(report.steps[3].status, LocationStatus::Ready);
        assert!(report.steps[3].location.is_none());
        assert!(report.steps[3].nearest.is_none());
    }
}
