//! What the current-orders screen renders for a given status and fix.

use crate::arrival::ArrivalDetector;
use crate::orders::{Order, open_orders};
use crate::ranker::RankingState;
use rider_geo::{GeoPoint, LocatedReading, format_distance, haversine_meters};
use rider_location::LocationStatus;
use serde::Serialize;

/// What the rider can do from an order card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderAction {
    /// Hand off to turn-by-turn navigation
    Navigate {
        /// Pickup point, else the rider's fix
        from: Option<GeoPoint>,
        /// Drop-off point
        to: GeoPoint,
    },
    /// The rider is at the nearest drop-off
    MarkDelivered,
}

/// One row of the order list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderCard {
    /// The order this card renders
    pub order: Order,
    /// Live distance from the rider, absent without a fix
    pub distance_m: Option<f64>,
    /// `distance_m` formatted for display
    pub distance: Option<String>,
    /// First card of the frozen ordering
    pub active: bool,
    /// Primary button
    pub action: OrderAction,
}

/// Rendering branch for the current-orders screen
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ScreenView {
    /// Status still being determined
    Blank,
    /// Ask for location permission
    PermissionPrompt,
    /// Ask to switch location services on
    EnableGpsPrompt,
    /// Ready, nothing to deliver
    NoActiveOrders,
    /// Ready with work
    Orders {
        /// Closest open order to the current fix, absent without one
        nearest: Option<Order>,
        /// Whether the rider is at `nearest`
        arrived: bool,
        /// Frozen ordering, or snapshot order before the first fix
        cards: Vec<OrderCard>,
    },
}

/// One rider's delivery run: open orders, ranking and arrival state.
#[derive(Debug, Clone)]
pub struct DeliverySession {
    ranking: RankingState,
    arrival: ArrivalDetector,
}

impl DeliverySession {
    /// Start a session; terminal orders are dropped from the working set
    pub fn new(orders: Vec<Order>, arrival: ArrivalDetector) -> Self {
        Self {
            ranking: RankingState::new(open_orders(orders)),
            arrival,
        }
    }

    /// Working set and ranking views
    pub fn ranking(&self) -> &RankingState {
        &self.ranking
    }

    /// Apply a wholesale snapshot refresh
    pub fn replace_orders(&mut self, orders: Vec<Order>) {
        self.ranking.replace_orders(open_orders(orders));
    }

    /// Remove a delivered order from the run
    pub fn mark_delivered(&mut self, id: &str) -> Option<Order> {
        self.ranking.mark_delivered(id)
    }

    /// Whether the current fix is within the arrival radius of the nearest order
    pub fn arrived(&self, location: Option<&LocatedReading>) -> bool {
        let target = self.ranking.nearest().map(|o| &o.delivery_location);
        self.arrival.has_arrived(location, target)
    }

    /// Feed one status/location observation and build the screen.
    pub fn view(&mut self, status: LocationStatus, location: Option<&LocatedReading>) -> ScreenView {
        match status {
            LocationStatus::Checking => return ScreenView::Blank,
            LocationStatus::NoPermission => return ScreenView::PermissionPrompt,
            LocationStatus::GpsOff => return ScreenView::EnableGpsPrompt,
            LocationStatus::Ready => {}
        }

        if self.ranking.orders().is_empty() {
            return ScreenView::NoActiveOrders;
        }

        self.ranking.update(location);
        let arrived = self.arrived(location);
        let nearest = self.ranking.nearest().cloned();
        let nearest_id = nearest.as_ref().map(|o| o.id.as_str());

        // Before the first fix there is no frozen ordering; show the snapshot order.
        let list = if self.ranking.sorted().is_empty() {
            self.ranking.orders()
        } else {
            self.ranking.sorted()
        };

        let cards = list
            .iter()
            .enumerate()
            .map(|(index, order)| {
                let distance_m = location.map(|l| haversine_meters(&l.point, &order.delivery_location));
                let action = if arrived && nearest_id == Some(order.id.as_str()) {
                    OrderAction::MarkDelivered
                } else {
                    OrderAction::Navigate {
                        from: order
                            .pickup
                            .as_ref()
                            .map(|p| p.location)
                            .or_else(|| location.map(|l| l.point)),
                        to: order.delivery_location,
                    }
                };
                OrderCard {
                    order: order.clone(),
                    distance_m,
                    distance: distance_m.map(format_distance),
                    active: index == 0,
                    action,
                }
            })
            .collect();

        ScreenView::Orders {
            nearest,
            arrived,
            cards,
        }
    }
}
