use shared::domain::{Order, OrderId};
use tokio::sync::Mutex;

/// The single owned snapshot of remote orders. Callers only ever get clones
/// out; nothing holds a reference into the store.
///
/// Snapshot installs are gated by a monotonic fetch generation: `replace`
/// and `clear` apply only when their generation is newer than the installed
/// one, so an older fetch resolving late is discarded instead of clobbering
/// fresher data.
pub struct OrderStore {
    inner: Mutex<StoreState>,
}

struct StoreState {
    orders: Vec<Order>,
    generation: u64,
}

impl OrderStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreState {
                orders: Vec::new(),
                generation: 0,
            }),
        }
    }

    pub async fn snapshot(&self) -> Vec<Order> {
        self.inner.lock().await.orders.clone()
    }

    pub async fn get(&self, order_id: &OrderId) -> Option<Order> {
        self.inner
            .lock()
            .await
            .orders
            .iter()
            .find(|order| &order.id == order_id)
            .cloned()
    }

    /// Installs a fetched snapshot wholesale. Returns false (and leaves the
    /// snapshot untouched) when `generation` is not newer than the installed
    /// one.
    pub async fn replace(&self, generation: u64, orders: Vec<Order>) -> bool {
        let mut inner = self.inner.lock().await;
        if generation <= inner.generation {
            return false;
        }
        inner.generation = generation;
        inner.orders = orders;
        true
    }

    /// Empties the snapshot under the same generation gate as `replace`.
    pub async fn clear(&self, generation: u64) -> bool {
        self.replace(generation, Vec::new()).await
    }

    /// Applies an in-place edit to one order. Returns the installed
    /// generation together with a clone of the pre-edit order (the rollback
    /// value), or None when the id is not in the snapshot.
    pub async fn mutate(
        &self,
        order_id: &OrderId,
        edit: impl FnOnce(&mut Order),
    ) -> Option<(u64, Order)> {
        let mut inner = self.inner.lock().await;
        let generation = inner.generation;
        let order = inner.orders.iter_mut().find(|order| &order.id == order_id)?;
        let previous = order.clone();
        edit(order);
        Some((generation, previous))
    }

    /// Puts a rollback value back, but only while the snapshot it was
    /// captured from is still installed. A newer snapshot is server truth
    /// and wins over the stale capture.
    pub async fn restore(&self, generation: u64, order: Order) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            return false;
        }
        match inner.orders.iter_mut().find(|slot| slot.id == order.id) {
            Some(slot) => *slot = order,
            None => inner.orders.push(order),
        }
        true
    }

    /// Removes one order, returning it for the caller's recovery path.
    pub async fn remove(&self, order_id: &OrderId) -> Option<Order> {
        let mut inner = self.inner.lock().await;
        let index = inner
            .orders
            .iter()
            .position(|order| &order.id == order_id)?;
        Some(inner.orders.remove(index))
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}
