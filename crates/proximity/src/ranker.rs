//! Proximity ranking of the rider's open orders.
//!
//! Two views over the same working set:
//! - [`select_nearest`] is recomputed on every location tick
//! - [`RankingState::sort_by_proximity_once`] sorts once and then freezes
//!   until an order is delivered, so the list does not reshuffle as the
//!   fix wobbles

use crate::orders::Order;
use rider_geo::{Positioned, haversine_meters};
use rider_telemetry::{Timer, metrics};
use tracing::{debug, info};

/// The order closest to `location`, first-seen on exact ties.
///
/// `None` without a location or without orders.
pub fn select_nearest<'a, P>(location: Option<&P>, orders: &'a [Order]) -> Option<&'a Order>
where
    P: Positioned + ?Sized,
{
    let here = location?.position();
    let mut best: Option<(&Order, f64)> = None;

    for order in orders {
        let distance = haversine_meters(&here, &order.delivery_location);
        if best.is_none_or(|(_, nearest)| distance < nearest) {
            best = Some((order, distance));
        }
    }

    best.map(|(order, _)| order)
}

/// One-shot sort latch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortLatch {
    /// The next location + order-set pairing produces a fresh sort
    #[default]
    Armed,
    /// The current ordering is frozen
    Sorted,
}

/// Working set of open orders plus the derived nearest/sorted views
#[derive(Debug, Clone, Default)]
pub struct RankingState {
    orders: Vec<Order>,
    sorted: Vec<Order>,
    nearest_id: Option<String>,
    latch: SortLatch,
}

impl RankingState {
    /// Start a session over `orders`; nothing is ranked until the first fix
    pub fn new(orders: Vec<Order>) -> Self {
        metrics().gauge("orders.open", orders.len() as u64);
        Self {
            orders,
            ..Self::default()
        }
    }

    /// The working set, in snapshot order
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// The frozen proximity ordering, empty until the first sort
    pub fn sorted(&self) -> &[Order] {
        &self.sorted
    }

    /// Nearest order as of the last [`update`](Self::update)
    pub fn nearest(&self) -> Option<&Order> {
        let id = self.nearest_id.as_deref()?;
        self.orders.iter().find(|o| o.id == id)
    }

    /// Current state of the sort latch
    pub fn latch(&self) -> SortLatch {
        self.latch
    }

    /// Apply a location tick: refresh the nearest order and, if armed, sort.
    ///
    /// A missing location clears the nearest order; the frozen ordering stays.
    pub fn update<P>(&mut self, location: Option<&P>)
    where
        P: Positioned + ?Sized,
    {
        let Some(location) = location else {
            self.nearest_id = None;
            return;
        };

        self.nearest_id = select_nearest(Some(location), &self.orders).map(|o| o.id.clone());
        self.sort_by_proximity_once(Some(location));
    }

    /// Ascending-distance ordering, computed once per epoch.
    ///
    /// Later calls return the frozen ordering no matter how the location moves,
    /// until [`mark_delivered`](Self::mark_delivered) re-arms the latch.
    pub fn sort_by_proximity_once<P>(&mut self, location: Option<&P>) -> &[Order]
    where
        P: Positioned + ?Sized,
    {
        let Some(location) = location else {
            return &self.sorted;
        };

        if self.orders.is_empty() {
            self.sorted.clear();
            return &self.sorted;
        }

        if self.latch == SortLatch::Sorted {
            return &self.sorted;
        }

        let timer = Timer::start("orders.sort_ms");
        let here = location.position();
        let mut ranked: Vec<(f64, &Order)> = self
            .orders
            .iter()
            .map(|order| (haversine_meters(&here, &order.delivery_location), order))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        self.sorted = ranked.into_iter().map(|(_, order)| order.clone()).collect();
        self.latch = SortLatch::Sorted;
        timer.stop();

        metrics().increment("orders.sorted");
        debug!(
            count = self.sorted.len(),
            first = self.sorted.first().map(|o| o.id.as_str()),
            "orders sorted by proximity"
        );

        &self.sorted
    }

    /// Remove a completed order and re-arm the sort.
    ///
    /// Returns the removed order; an unknown id changes nothing. Informing the
    /// backend is the caller's job.
    pub fn mark_delivered(&mut self, id: &str) -> Option<Order> {
        let index = self.orders.iter().position(|o| o.id == id)?;
        let order = self.orders.remove(index);

        self.sorted.retain(|o| o.id != id);
        if self.nearest_id.as_deref() == Some(id) {
            self.nearest_id = None;
        }
        self.latch = SortLatch::Armed;

        metrics().increment("orders.delivered");
        metrics().gauge("orders.open", self.orders.len() as u64);
        info!(order_id = %id, remaining = self.orders.len(), "order marked delivered");
        Some(order)
    }

    /// Swap in a fresh snapshot of the working set.
    ///
    /// Never re-arms the sort. Within a frozen epoch, orders that vanished from
    /// the snapshot drop out of the ordering and new ones are appended after it
    /// in snapshot order.
    pub fn replace_orders(&mut self, orders: Vec<Order>) {
        let mut sorted: Vec<Order> = self
            .sorted
            .iter()
            .filter_map(|kept| orders.iter().find(|o| o.id == kept.id).cloned())
            .collect();
        if self.latch == SortLatch::Sorted {
            let added: Vec<Order> = orders
                .iter()
                .filter(|o| !sorted.iter().any(|kept| kept.id == o.id))
                .cloned()
                .collect();
            if !added.is_empty() {
                debug!(added = added.len(), "new orders appended to frozen ordering");
            }
            sorted.extend(added);
        }
        self.sorted = sorted;

        if self
            .nearest_id
            .as_deref()
            .is_some_and(|id| !orders.iter().any(|o| o.id == id))
        {
            self.nearest_id = None;
        }
        self.orders = orders;
        metrics().gauge("orders.open", self.orders.len() as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderStatus;
    use rider_geo::{EARTH_RADIUS_M, GeoPoint, LocatedReading};

    const ORIGIN: GeoPoint = GeoPoint::new(28.4595, 77.0266);

    fn north_of(origin: GeoPoint, meters: f64) -> GeoPoint {
        GeoPoint::new(origin.lat + (meters / EARTH_RADIUS_M).to_degrees(), origin.lng)
    }

    fn order(id: &str, at: GeoPoint) -> Order {
        Order::new(id, OrderStatus::OnTheWay, at)
    }

    fn ids_of(orders: &[Order]) -> Vec<&str> {
        orders.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_select_nearest() {
        let orders = vec![order("o1", north_of(ORIGIN, 100.0)), order("o2", north_of(ORIGIN, 50.0))];
        let nearest = select_nearest(Some(&ORIGIN), &orders).unwrap();
        assert_eq!(nearest.id, "o2");
    }

    #[test]
    fn test_select_nearest_first_seen_wins_ties() {
        let spot = north_of(ORIGIN, 75.0);
        let orders = vec![order("first", spot), order("second", spot)];
        assert_eq!(select_nearest(Some(&ORIGIN), &orders).unwrap().id, "first");
    }

    #[test]
    fn test_select_nearest_without_inputs() {
        let orders = vec![order("o1", ORIGIN)];
        assert!(select_nearest(None::<&GeoPoint>, &orders).is_none());
        assert!(select_nearest(Some(&ORIGIN), &[]).is_none());
    }

    #[test]
    fn test_sort_once_is_sticky() {
        // A is 2 km north, B 500 m north: B first from the origin.
        let a = north_of(ORIGIN, 2000.0);
        let b = north_of(ORIGIN, 500.0);
        let mut state = RankingState::new(vec![order("A", a), order("B", b)]);

        assert_eq!(ids_of(state.sort_by_proximity_once(Some(&ORIGIN))), ["B", "A"]);
        assert_eq!(state.latch(), SortLatch::Sorted);

        // Standing on A would flip the order, but the epoch is frozen.
        assert_eq!(ids_of(state.sort_by_proximity_once(Some(&a))), ["B", "A"]);

        let removed = state.mark_delivered("A").unwrap();
        assert_eq!(removed.id, "A");
        assert_eq!(state.latch(), SortLatch::Armed);
        assert_eq!(ids_of(state.sort_by_proximity_once(Some(&a))), ["B"]);
    }

    #[test]
    fn test_fresh_sort_after_delivery() {
        let far = north_of(ORIGIN, 3000.0);
        let mid = north_of(ORIGIN, 1500.0);
        let near = north_of(ORIGIN, 200.0);
        let mut state = RankingState::new(vec![order("far", far), order("mid", mid), order("near", near)]);

        assert_eq!(ids_of(state.sort_by_proximity_once(Some(&ORIGIN))), ["near", "mid", "far"]);
        state.mark_delivered("near");

        // Rider is now beyond `far`; the new epoch reflects that.
        let beyond = north_of(ORIGIN, 3500.0);
        assert_eq!(ids_of(state.sort_by_proximity_once(Some(&beyond))), ["far", "mid"]);
    }

    #[test]
    fn test_missing_location_keeps_sorted() {
        let mut state = RankingState::new(vec![order("x", north_of(ORIGIN, 10.0))]);
        assert!(state.sort_by_proximity_once(None::<&GeoPoint>).is_empty());
        assert_eq!(state.latch(), SortLatch::Armed);

        state.sort_by_proximity_once(Some(&ORIGIN));
        state.update(None::<&LocatedReading>);
        assert_eq!(ids_of(state.sorted()), ["x"]);
    }

    #[test]
    fn test_empty_working_set() {
        let mut state = RankingState::new(Vec::new());
        let fix = LocatedReading::new(ORIGIN, 5.0, 0);
        state.update(Some(&fix));

        assert!(state.sorted().is_empty());
        assert!(state.nearest().is_none());
    }

    #[test]
    fn test_update_tracks_nearest_live() {
        let a = north_of(ORIGIN, 2000.0);
        let b = north_of(ORIGIN, 500.0);
        let mut state = RankingState::new(vec![order("A", a), order("B", b)]);

        state.update(Some(&LocatedReading::new(ORIGIN, 5.0, 0)));
        assert_eq!(state.nearest().unwrap().id, "B");

        state.update(Some(&LocatedReading::new(a, 5.0, 1)));
        assert_eq!(state.nearest().unwrap().id, "A");
        assert_eq!(ids_of(state.sorted()), ["B", "A"]);
    }

    #[test]
    fn test_unknown_delivery_is_noop() {
        let mut state = RankingState::new(vec![order("A", ORIGIN)]);
        state.sort_by_proximity_once(Some(&ORIGIN));

        assert!(state.mark_delivered("missing").is_none());
        assert_eq!(state.latch(), SortLatch::Sorted);
        assert_eq!(state.orders().len(), 1);
    }

    #[test]
    fn test_lost_fix_clears_nearest_keeps_sorted() {
        let a = north_of(ORIGIN, 2000.0);
        let b = north_of(ORIGIN, 500.0);
        let mut state = RankingState::new(vec![order("A", a), order("B", b)]);

        state.update(Some(&LocatedReading::new(a, 5.0, 0)));
        assert_eq!(state.nearest().unwrap().id, "A");

        state.update(None::<&LocatedReading>);
        assert!(state.nearest().is_none());
        assert_eq!(ids_of(state.sorted()), ["A", "B"]);
        assert_eq!(state.latch(), SortLatch::Sorted);
    }

    #[test]
    fn test_replace_orders() {
        let a = north_of(ORIGIN, 2000.0);
        let b = north_of(ORIGIN, 500.0);
        let mut state = RankingState::new(vec![order("A", a), order("B", b)]);
        state.sort_by_proximity_once(Some(&ORIGIN));

        let mut refreshed = vec![order("A", a), order("B", b)];
        refreshed[1].status = OrderStatus::Arrived;
        state.replace_orders(refreshed);
        assert_eq!(state.latch(), SortLatch::Sorted);
        assert_eq!(state.sorted()[0].status, OrderStatus::Arrived);

        state.replace_orders(vec![order("A", a)]);
        assert_eq!(state.latch(), SortLatch::Sorted);
        assert_eq!(ids_of(state.sorted()), ["A"]);
    }

    #[test]
    fn test_new_orders_join_frozen_epoch_at_end() {
        let a = north_of(ORIGIN, 2000.0);
        let b = north_of(ORIGIN, 500.0);
        let c = north_of(ORIGIN, 100.0);
        let mut state = RankingState::new(vec![order("A", a), order("B", b)]);
        assert_eq!(ids_of(state.sort_by_proximity_once(Some(&ORIGIN))), ["B", "A"]);

        state.replace_orders(vec![order("A", a), order("B", b), order("C", c)]);
        assert_eq!(state.latch(), SortLatch::Sorted);

        // A fresh sort from A would put A first; the epoch stays frozen.
        assert_eq!(ids_of(state.sort_by_proximity_once(Some(&a))), ["B", "A", "C"]);
        assert_eq!(state.orders().len(), 3);
    }

    #[test]
    fn test_open_orders_gauge() {
        let mut state = RankingState::new(vec![order("A", ORIGIN), order("B", ORIGIN)]);
        state.mark_delivered("A");
        // Other tests share the global registry, so only check the gauge exists.
        assert!(metrics().export_json()["gauges"].get("orders.open").is_some());
    }
}
