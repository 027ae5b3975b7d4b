use std::cmp::Ordering;

use shared::domain::{Order, OrderId, Role, Viewer};

/// Which half of the board a view shows. Active covers everything still
/// moving; completed covers both terminal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Active,
    Completed,
}

impl Tab {
    pub fn includes(self, order: &Order) -> bool {
        match self {
            Tab::Active => !order.status.is_terminal(),
            Tab::Completed => order.status.is_terminal(),
        }
    }
}

/// Caller inputs to the view derivation. `search` is expected to already be
/// debounced (see `debounce`); this function treats it as settled.
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub tab: Tab,
    pub search: String,
    pub isolated: Option<OrderId>,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            tab: Tab::Active,
            search: String::new(),
            isolated: None,
        }
    }
}

/// Derives a rendered list from the snapshot: role scope, tab scope,
/// case-insensitive search over ticket number or customer name, optional
/// single-order isolation, then the board sort. Pure and recomputed per
/// call; nothing is cached between calls.
pub fn derive_view(orders: &[Order], viewer: &Viewer, filter: &OrderFilter) -> Vec<Order> {
    let query = filter.search.to_lowercase();
    let mut view: Vec<Order> = orders
        .iter()
        .filter(|order| viewer_can_see(viewer, order))
        .filter(|order| filter.tab.includes(order))
        .filter(|order| matches_search(order, &query))
        .cloned()
        .collect();

    if let Some(isolated) = &filter.isolated {
        view.retain(|order| &order.id == isolated);
    }

    view.sort_by(board_ordering);
    view
}

fn viewer_can_see(viewer: &Viewer, order: &Order) -> bool {
    match viewer.role {
        Role::Customer => viewer
            .customer_id
            .as_ref()
            .is_some_and(|customer_id| &order.customer_id == customer_id),
        _ => true,
    }
}

fn matches_search(order: &Order, query: &str) -> bool {
    query.is_empty()
        || order.ticket_number.to_lowercase().contains(query)
        || order.customer_name.to_lowercase().contains(query)
}

/// Status priority descending, then `created_at` descending. The tie-break
/// compares the whole `Option` so the comparator stays a total order:
/// undated orders rank below dated ones, compare equal to each other, and
/// the stable sort keeps their incoming order.
fn board_ordering(a: &Order, b: &Order) -> Ordering {
    b.status
        .priority()
        .cmp(&a.status.priority())
        .then_with(|| b.created_at.cmp(&a.created_at))
}
