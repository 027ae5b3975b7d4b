use crate::domain::{OrderStatus, Role};

/// Forward edges of the order lifecycle. `cancelled` is reachable from any
/// non-terminal state; terminal states have no outgoing edges.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    if from.is_terminal() {
        return false;
    }
    matches!(
        (from, to),
        (OrderStatus::Pending, OrderStatus::Preparing)
            | (OrderStatus::Preparing, OrderStatus::Ready)
            | (OrderStatus::Ready, OrderStatus::Completed)
            | (_, OrderStatus::Cancelled)
    )
}

/// The statuses `role` may move an order in `current` to. This is the single
/// copy of the role table; every transition control is derived from it. The
/// gating is advisory only and the remote API re-validates each request.
pub fn allowed_transitions(role: Role, current: OrderStatus) -> Vec<OrderStatus> {
    OrderStatus::ALL
        .into_iter()
        .filter(|next| can_transition(current, *next) && role_may_trigger(role, current, *next))
        .collect()
}

pub fn can_archive(role: Role, status: OrderStatus) -> bool {
    status.is_terminal() && matches!(role, Role::Manager | Role::Cashier)
}

fn role_may_trigger(role: Role, from: OrderStatus, to: OrderStatus) -> bool {
    match (from, to) {
        (OrderStatus::Pending, OrderStatus::Preparing) => {
            matches!(role, Role::Manager | Role::Cashier | Role::Employee)
        }
        (OrderStatus::Preparing, OrderStatus::Ready) => {
            matches!(role, Role::Manager | Role::Cook | Role::Employee)
        }
        (OrderStatus::Ready, OrderStatus::Completed) => {
            matches!(role, Role::Manager | Role::Cashier | Role::Employee)
        }
        (_, OrderStatus::Cancelled) => matches!(role, Role::Manager | Role::Cashier),
        _ => false,
    }
}
