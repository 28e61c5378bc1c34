//! Order model and ingestion of backend order snapshots.
//!
//! [`OrderRecord`] mirrors the aggregate JSON the order backend returns.
//! [`Order::try_from`] is the only place coordinates are validated; everything
//! downstream (arrival, ranking) assumes a well-formed delivery location.

use chrono::{DateTime, Utc};
use rider_geo::{CoordinateOrder, GeoError, GeoJsonPoint, GeoPoint, Positioned, point_from_pair};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Lifecycle of an order as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    /// Assigned to the rider, not yet picked up
    Assigned,
    /// Rider is heading to the shop
    PickingUp,
    /// Packed and waiting at the shop
    Ready,
    /// Picked up, heading to the customer
    OnTheWay,
    /// Last leg of the delivery
    OutForDelivery,
    /// Rider is at the delivery address
    Arrived,
    /// Handed over
    Delivered,
    /// Cancelled by the shop or the customer
    Cancelled,
    /// Any status this build does not know about
    Other(String),
}

impl OrderStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Assigned => "assigned",
            OrderStatus::PickingUp => "picking_up",
            OrderStatus::Ready => "ready",
            OrderStatus::OnTheWay => "on_the_way",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Arrived => "arrived",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Other(other) => other,
        }
    }

    /// Delivered or cancelled; no further work for the rider
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// One of the known in-progress states
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Assigned
                | OrderStatus::PickingUp
                | OrderStatus::Ready
                | OrderStatus::OnTheWay
                | OrderStatus::OutForDelivery
                | OrderStatus::Arrived
        )
    }
}

impl From<&str> for OrderStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "assigned" => OrderStatus::Assigned,
            "picking_up" => OrderStatus::PickingUp,
            "ready" => OrderStatus::Ready,
            "on_the_way" => OrderStatus::OnTheWay,
            "out_for_delivery" => OrderStatus::OutForDelivery,
            "arrived" => OrderStatus::Arrived,
            "delivered" => OrderStatus::Delivered,
            "cancelled" | "canceled" => OrderStatus::Cancelled,
            _ => OrderStatus::Other(value.to_string()),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        OrderStatus::from(value.as_str())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Shop the order is collected from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pickup {
    /// Shop name
    pub name: Option<String>,
    /// Where the rider collects the order
    pub location: GeoPoint,
    /// Shop street address
    pub address: Option<String>,
}

/// Person receiving the order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    /// Display name
    pub name: Option<String>,
    /// Contact number for the rider
    pub phone: Option<String>,
}

/// A validated order in the rider's working set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Backend order id
    pub id: String,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Validated drop-off point
    pub delivery_location: GeoPoint,
    /// Formatted drop-off address
    pub delivery_address: Option<String>,
    /// Shop to collect from, if it has a usable location
    pub pickup: Option<Pickup>,
    /// Recipient details
    pub customer: Option<Customer>,
    /// Order total in rupees
    pub total_amount: f64,
    /// e.g. `"cod"` or `"upi"`
    pub payment_method: Option<String>,
    /// When the customer placed the order
    pub created_at: Option<DateTime<Utc>>,
    /// When the order was assigned to the rider
    pub assigned_at: Option<DateTime<Utc>>,
    /// When the order was handed over
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// An order with only the fields ranking needs
    pub fn new(id: impl Into<String>, status: OrderStatus, delivery_location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            status,
            delivery_location,
            delivery_address: None,
            pickup: None,
            customer: None,
            total_amount: 0.0,
            payment_method: None,
            created_at: None,
            assigned_at: None,
            delivered_at: None,
        }
    }
}

impl Positioned for Order {
    fn position(&self) -> GeoPoint {
        self.delivery_location
    }
}

/// One order as returned by the backend aggregate
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    /// Address snapshots; the first entry is the delivery target
    #[serde(default)]
    pub delivery_address: Vec<AddressRecord>,
    #[serde(default)]
    pub shop: Option<ShopRecord>,
    #[serde(default)]
    pub user: Option<UserRecord>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Delivery address entry, coordinates as `[lat, lng]`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    #[serde(default)]
    pub coordinates: Vec<f64>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

/// Shop entry, location as a GeoJSON point
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub shop_location: Option<GeoJsonPoint>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

/// Customer entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Errors raised while ingesting order data
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    /// Record without an id
    #[error("order record has an empty id")]
    MissingId,

    /// No delivery address entry, or one without coordinates
    #[error("order {id} has no delivery location")]
    MissingDeliveryLocation { id: String },

    /// Delivery coordinates present but unusable
    #[error("order {id} has an invalid delivery location: {source}")]
    InvalidDeliveryLocation { id: String, source: GeoError },

    /// The snapshot is not the expected JSON shape
    #[error("malformed order snapshot: {0}")]
    Malformed(String),
}

/// Error code for integration with rider-core error handling.
/// Range: 12xxx for order errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderErrorCode {
    /// Record without an id
    MissingId = 12001,
    /// No delivery coordinates at all
    MissingDeliveryLocation = 12002,
    /// Delivery coordinates out of range or mis-shaped
    InvalidDeliveryLocation = 12003,
    /// Snapshot is not the expected JSON
    Malformed = 12004,
}

impl OrderError {
    /// Returns the error code for this error.
    pub fn code(&self) -> OrderErrorCode {
        match self {
            OrderError::MissingId => OrderErrorCode::MissingId,
            OrderError::MissingDeliveryLocation { .. } => OrderErrorCode::MissingDeliveryLocation,
            OrderError::InvalidDeliveryLocation { .. } => OrderErrorCode::InvalidDeliveryLocation,
            OrderError::Malformed(_) => OrderErrorCode::Malformed,
        }
    }
}

impl From<OrderError> for rider_core::Error {
    fn from(err: OrderError) -> Self {
        let code = match err {
            OrderError::Malformed(_) => rider_core::ErrorCode::OrderDataError,
            _ => rider_core::ErrorCode::InvalidOrderRecord,
        };
        rider_core::Error::new(code, err.to_string())
            .with_suggestion("Check the order snapshot against the backend aggregate format")
            .with_source(err)
    }
}

impl TryFrom<OrderRecord> for Order {
    type Error = OrderError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        if record.id.trim().is_empty() {
            return Err(OrderError::MissingId);
        }
        let id = record.id;

        let mut addresses = record.delivery_address.into_iter();
        let Some(address) = addresses.next().filter(|a| !a.coordinates.is_empty()) else {
            return Err(OrderError::MissingDeliveryLocation { id });
        };
        let delivery_location = match point_from_pair(&address.coordinates, CoordinateOrder::LatLng) {
            Ok(point) => point,
            Err(source) => return Err(OrderError::InvalidDeliveryLocation { id, source }),
        };

        // A bad shop location only costs the navigation origin, not the order.
        let pickup = record.shop.and_then(|shop| {
            let location = match shop.shop_location.as_ref().map(GeoJsonPoint::to_geo_point) {
                Some(Ok(point)) => point,
                Some(Err(err)) => {
                    warn!(order_id = %id, error = %err, "ignoring invalid shop location");
                    return None;
                }
                None => return None,
            };
            Some(Pickup {
                name: shop.name,
                location,
                address: shop.formatted_address,
            })
        });

        let customer = record.user.map(|user| Customer {
            name: user.full_name,
            phone: user.phone,
        });

        Ok(Order {
            id,
            status: record.status.map_or(OrderStatus::Assigned, OrderStatus::from),
            delivery_location,
            delivery_address: address.formatted_address,
            pickup,
            customer,
            total_amount: record.total_amount.unwrap_or(0.0),
            payment_method: record.payment_method,
            created_at: record.created_at,
            assigned_at: record.assigned_at,
            delivered_at: record.delivered_at,
        })
    }
}

/// Parse and validate a JSON array of backend order records.
///
/// Fails on the first record without a usable delivery location.
pub fn load_orders(json: &str) -> Result<Vec<Order>, OrderError> {
    let records: Vec<OrderRecord> =
        serde_json::from_str(json).map_err(|e| OrderError::Malformed(e.to_string()))?;

    let orders = records
        .into_iter()
        .map(Order::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = orders.len(), "loaded order snapshot");
    Ok(orders)
}

/// Orders that still need the rider, in snapshot order
pub fn open_orders(orders: impl IntoIterator<Item = Order>) -> Vec<Order> {
    orders.into_iter().filter(|o| !o.status.is_terminal()).collect()
}
