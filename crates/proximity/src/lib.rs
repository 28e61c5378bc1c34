//! Proximity logic for a rider's delivery run
//!
//! - [`orders`]: the order model and backend snapshot ingestion
//! - [`arrival`]: accuracy-aware arrival detection
//! - [`ranker`]: live nearest-order selection and the sort-once ordering
//! - [`session`]: the rendering contract of the current-orders screen
//! - [`history`]: delivery history summaries
//!
//! # Example
//!
//! ```
//! use rider_geo::{GeoPoint, LocatedReading};
//! use rider_location::LocationStatus;
//! use rider_proximity::{ArrivalDetector, DeliverySession, Order, OrderStatus, ScreenView};
//!
//! let orders = vec![
//!     Order::new("ord-1", OrderStatus::OnTheWay, GeoPoint::new(28.4677, 77.0714)),
//!     Order::new("ord-2", OrderStatus::Assigned, GeoPoint::new(28.4600, 77.0270)),
//! ];
//! let mut session = DeliverySession::new(orders, ArrivalDetector::default());
//!
//! let fix = LocatedReading::new(GeoPoint::new(28.4595, 77.0266), 8.0, 0);
//! let ScreenView::Orders { nearest, .. } = session.view(LocationStatus::Ready, Some(&fix)) else {
//!     unreachable!();
//! };
//! assert_eq!(nearest.unwrap().id, "ord-2");
//! ```

#![warn(clippy::all)]

pub mod arrival;
pub mod history;
pub mod orders;
pub mod ranker;
pub mod session;

pub use arrival::ArrivalDetector;
pub use history::{
    DayCount, HistoryFilter, average_delivery_minutes, filter_history, group_by_day,
    group_by_status, minutes_between, total_earnings, weekly_counts,
};
pub use orders::{
    Customer, Order, OrderError, OrderErrorCode, OrderRecord, OrderStatus, Pickup, load_orders,
    open_orders,
};
pub use ranker::{RankingState, SortLatch, select_nearest};
pub use session::{DeliverySession, OrderAction, OrderCard, ScreenView};
