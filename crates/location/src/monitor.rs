//! Continuous reconciliation of permission, services and position.
//!
//! A monitor owns one driver task. The poll timer, foreground transitions and
//! explicit calls all funnel into the same `recheck`, so two re-checks never
//! race and at most one position watch is ever active.

use crate::error::ProviderError;
use crate::provider::{Accuracy, LocationProvider, PermissionStatus, PositionWatch, WatchOptions};
use crate::status::{LocationStatus, resolve_status};
use rider_core::config::LocationConfig;
use rider_geo::LocatedReading;
use rider_telemetry::metrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Application lifecycle state, as reported by the host UI framework
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// In the foreground
    Active,
    /// Backgrounded
    Background,
    /// Transitioning, e.g. behind a system dialog
    Inactive,
}

/// Monitor timing and watch parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    /// Period of the permission/services re-check
    pub poll_interval: Duration,
    /// Options for the continuous watch started on entering `Ready`
    pub watch: WatchOptions,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from(&LocationConfig::default())
    }
}

impl From<&LocationConfig> for MonitorConfig {
    fn from(config: &LocationConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            watch: WatchOptions::from(config),
        }
    }
}

enum Command {
    Recheck(oneshot::Sender<LocationStatus>),
    RequestPermission(oneshot::Sender<LocationStatus>),
    Shutdown,
}

struct Driver {
    commands: mpsc::UnboundedSender<Command>,
    handle: JoinHandle<()>,
}

/// Publishes the current [`LocationStatus`] and, while ready, the latest reading.
///
/// The published location is `None` whenever the status is not `Ready`; it is
/// never left stale. Call [`stop`](Self::stop) on teardown; dropping a running
/// monitor aborts its driver as a fallback.
pub struct LocationStatusMonitor {
    provider: Arc<dyn LocationProvider>,
    config: MonitorConfig,
    status: Arc<watch::Sender<LocationStatus>>,
    location: Arc<watch::Sender<Option<LocatedReading>>>,
    driver: Option<Driver>,
}

impl LocationStatusMonitor {
    /// Create an idle monitor in the `Checking` state
    pub fn new(provider: Arc<dyn LocationProvider>, config: MonitorConfig) -> Self {
        let (status, _) = watch::channel(LocationStatus::Checking);
        let (location, _) = watch::channel(None);

        Self {
            provider,
            config,
            status: Arc::new(status),
            location: Arc::new(location),
            driver: None,
        }
    }

    /// Spawn the driver: an immediate re-check, then one per poll interval and
    /// one per transition to [`AppState::Active`] on `app_states`.
    ///
    /// Must be called inside a tokio runtime. A no-op while already running.
    pub fn start(&mut self, app_states: mpsc::Receiver<AppState>) {
        if self.is_running() {
            debug!("location monitor already running");
            return;
        }

        let (commands, command_rx) = mpsc::unbounded_channel();
        let state = DriverState {
            provider: Arc::clone(&self.provider),
            config: self.config,
            status: Arc::clone(&self.status),
            location: Arc::clone(&self.location),
            watch: None,
        };
        let handle = tokio::spawn(state.run(app_states, command_rx));
        self.driver = Some(Driver { commands, handle });

        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "location monitor started"
        );
    }

    /// Whether the driver task is alive
    pub fn is_running(&self) -> bool {
        self.driver.as_ref().is_some_and(|d| !d.handle.is_finished())
    }

    /// Release the position watch, the poll timer and the app-state listener.
    ///
    /// Idempotent. Waits for the driver to exit, so no callback fires after
    /// this returns.
    pub async fn stop(&mut self) {
        let Some(driver) = self.driver.take() else {
            return;
        };

        let _ = driver.commands.send(Command::Shutdown);
        if let Err(err) = driver.handle.await {
            warn!(error = %err, "location monitor driver did not exit cleanly");
        }

        self.location.send_if_modified(|location| location.take().is_some());
        info!("location monitor stopped");
    }

    /// Re-evaluate permission and services now.
    ///
    /// Returns the resulting status; when the monitor is not running this is
    /// the last published status and the provider is not queried.
    pub async fn recheck(&self) -> LocationStatus {
        self.ask(Command::Recheck).await
    }

    /// Prompt for foreground permission, then re-check.
    ///
    /// Same not-running behaviour as [`recheck`](Self::recheck).
    pub async fn request_permission(&self) -> LocationStatus {
        self.ask(Command::RequestPermission).await
    }

    /// A single fix outside the continuous watch.
    ///
    /// Checks services and requests permission first. Any failure is logged and
    /// reported as `None`.
    pub async fn current_position(&self, high_accuracy: bool) -> Option<LocatedReading> {
        match self.provider.services_enabled().await {
            Ok(true) => {}
            Ok(false) => {
                debug!("one-shot position skipped: location services disabled");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "one-shot position: services query failed");
                return None;
            }
        }

        match self.provider.request_foreground_permission().await {
            Ok(permission) if permission.is_granted() => {}
            Ok(permission) => {
                debug!(?permission, "one-shot position skipped: permission not granted");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "one-shot position: permission request failed");
                return None;
            }
        }

        let accuracy = if high_accuracy { Accuracy::High } else { Accuracy::Balanced };
        match self.provider.current_position(accuracy).await {
            Ok(reading) => Some(reading),
            Err(err) => {
                warn!(error = %err, ?accuracy, "one-shot position failed");
                None
            }
        }
    }

    /// Last published status
    pub fn status(&self) -> LocationStatus {
        *self.status.borrow()
    }

    /// Last published reading, `None` unless ready
    pub fn current_location(&self) -> Option<LocatedReading> {
        *self.location.borrow()
    }

    /// Receiver notified on every status change
    pub fn subscribe_status(&self) -> watch::Receiver<LocationStatus> {
        self.status.subscribe()
    }

    /// Receiver notified on every new reading and when the location is cleared
    pub fn subscribe_location(&self) -> watch::Receiver<Option<LocatedReading>> {
        self.location.subscribe()
    }

    async fn ask(&self, command: fn(oneshot::Sender<LocationStatus>) -> Command) -> LocationStatus {
        let Some(driver) = &self.driver else {
            return self.status();
        };

        let (reply, response) = oneshot::channel();
        if driver.commands.send(command(reply)).is_err() {
            return self.status();
        }
        response.await.unwrap_or_else(|_| self.status())
    }
}

impl Drop for LocationStatusMonitor {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.handle.abort();
            debug!("location monitor dropped while running, driver aborted");
        }
        self.location.send_if_modified(|location| location.take().is_some());
    }
}

/// State owned by the driver task
struct DriverState {
    provider: Arc<dyn LocationProvider>,
    config: MonitorConfig,
    status: Arc<watch::Sender<LocationStatus>>,
    location: Arc<watch::Sender<Option<LocatedReading>>>,
    watch: Option<PositionWatch>,
}

impl DriverState {
    async fn run(
        mut self,
        mut app_states: mpsc::Receiver<AppState>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        let mut ticker = time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut listening = true;

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Recheck(reply)) => {
                        let status = self.recheck().await;
                        let _ = reply.send(status);
                    }
                    Some(Command::RequestPermission(reply)) => {
                        self.request_permission().await;
                        let status = self.recheck().await;
                        let _ = reply.send(status);
                    }
                    Some(Command::Shutdown) | None => break,
                },

                _ = ticker.tick() => {
                    self.recheck().await;
                }

                app_state = app_states.recv(), if listening => match app_state {
                    Some(AppState::Active) => {
                        debug!("app returned to foreground");
                        self.recheck().await;
                    }
                    Some(state) => debug!(?state, "app left foreground"),
                    None => {
                        listening = false;
                        debug!("app state listener closed");
                    }
                },

                reading = next_reading(&mut self.watch) => match reading {
                    Some(reading) => self.publish(reading),
                    None => {
                        warn!("position watch closed by provider");
                        self.stop_watching();
                    }
                },
            }
        }

        self.stop_watching();
        debug!("location monitor driver exited");
    }

    async fn recheck(&mut self) -> LocationStatus {
        metrics().increment("location.rechecks");

        let (services_enabled, permission) = match self.observe().await {
            Ok(observed) => observed,
            Err(err) => {
                let status = self.current();
                warn!(error = %err, %status, "location re-check failed, keeping last status");
                return status;
            }
        };

        let next = resolve_status(permission, services_enabled);
        if next.is_ready() {
            if let Err(err) = self.start_watching().await {
                let status = self.current();
                warn!(error = %err, %status, "could not start position watch, keeping last status");
                return status;
            }
        } else {
            self.stop_watching();
        }

        self.set_status(next);
        next
    }

    async fn observe(&self) -> Result<(bool, PermissionStatus), ProviderError> {
        let services_enabled = self.provider.services_enabled().await?;
        let permission = self.provider.foreground_permission().await?;
        Ok((services_enabled, permission))
    }

    async fn request_permission(&self) {
        match self.provider.request_foreground_permission().await {
            Ok(permission) => info!(?permission, "location permission requested"),
            Err(err) => warn!(error = %err, "location permission request failed"),
        }
    }

    async fn start_watching(&mut self) -> Result<(), ProviderError> {
        if self.watch.is_some() {
            return Ok(());
        }

        let options = self.config.watch;
        self.watch = Some(self.provider.watch_position(options).await?);
        metrics().increment("location.watch_started");
        info!(
            accuracy = ?options.accuracy,
            distance_interval_m = options.distance_interval_m,
            time_interval_ms = options.time_interval.as_millis() as u64,
            "position watch started"
        );
        Ok(())
    }

    fn stop_watching(&mut self) {
        if self.watch.take().is_some() {
            metrics().increment("location.watch_stopped");
            info!("position watch stopped");
        }
        self.location.send_if_modified(|location| location.take().is_some());
    }

    fn publish(&self, reading: LocatedReading) {
        metrics().increment("location.readings");
        debug!(
            lat = reading.point.lat,
            lng = reading.point.lng,
            accuracy = reading.accuracy,
            "position update"
        );
        self.location.send_replace(Some(reading));
    }

    fn set_status(&self, next: LocationStatus) {
        self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            info!(from = %current, to = %next, "location status changed");
            metrics().increment("location.status_changed");
            *current = next;
            true
        });
    }

    fn current(&self) -> LocationStatus {
        *self.status.borrow()
    }
}

async fn next_reading(watch: &mut Option<PositionWatch>) -> Option<LocatedReading> {
    match watch {
        Some(watch) => watch.next().await,
        None => std::future::pending().await,
    }
}
