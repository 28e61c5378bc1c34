//! Location availability states.

use crate::provider::PermissionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether live location can be used, and if not, why.
///
/// ```text
/// checking ──(permission denied)──────────────────> no_permission
/// checking ──(granted, services off)──────────────> gps_off
/// checking ──(granted, services on)───────────────> ready
/// no_permission ──(granted)───────────────────────> gps_off | ready
/// gps_off ──(services on)─────────────────────────> ready
/// ready ──(revoked / services off)────────────────> no_permission | gps_off
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationStatus {
    /// No re-check has completed yet
    #[default]
    Checking,
    /// Foreground permission is missing
    NoPermission,
    /// Permission granted but location services are off
    GpsOff,
    /// Live location updates are flowing
    Ready,
}

impl LocationStatus {
    /// Only `Ready` delivers live readings
    #[must_use]
    pub fn is_ready(self) -> bool {
        matches!(self, LocationStatus::Ready)
    }

    /// Stable lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LocationStatus::Checking => "checking",
            LocationStatus::NoPermission => "no_permission",
            LocationStatus::GpsOff => "gps_off",
            LocationStatus::Ready => "ready",
        }
    }
}

impl fmt::Display for LocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status implied by one permission/services observation.
///
/// Permission is evaluated first: a denied app reports `NoPermission` even
/// when services are also off.
#[must_use]
pub fn resolve_status(permission: PermissionStatus, services_enabled: bool) -> LocationStatus {
    if !permission.is_granted() {
        LocationStatus::NoPermission
    } else if !services_enabled {
        LocationStatus::GpsOff
    } else {
        LocationStatus::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_is_always_no_permission() {
        for services in [true, false] {
            assert_eq!(
                resolve_status(PermissionStatus::Denied, services),
                LocationStatus::NoPermission
            );
            assert_eq!(
                resolve_status(PermissionStatus::Undetermined, services),
                LocationStatus::NoPermission
            );
        }
    }

    #[test]
    fn test_granted_services_off() {
        assert_eq!(resolve_status(PermissionStatus::Granted, false), LocationStatus::GpsOff);
    }

    #[test]
    fn test_granted_services_on() {
        assert_eq!(resolve_status(PermissionStatus::Granted, true), LocationStatus::Ready);
        assert!(LocationStatus::Ready.is_ready());
        assert!(!LocationStatus::GpsOff.is_ready());
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(LocationStatus::default(), LocationStatus::Checking);
        assert_eq!(
            serde_json::to_string(&LocationStatus::NoPermission).unwrap(),
            "\"no_permission\""
        );
        assert_eq!(LocationStatus::GpsOff.to_string(), "gps_off");
    }
}
