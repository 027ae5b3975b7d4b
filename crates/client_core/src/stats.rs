use shared::domain::{Order, OrderStatus};

/// Locally aggregated order statistics for the dashboard view. Derived per
/// call from the current snapshot, same as the board views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub preparing: usize,
    pub ready: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub active: usize,
    pub completed_revenue: f64,
    pub average_order_value: f64,
}

impl DashboardStats {
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut stats = Self {
            total: orders.len(),
            ..Self::default()
        };
        for order in orders {
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Preparing => stats.preparing += 1,
                OrderStatus::Ready => stats.ready += 1,
                OrderStatus::Completed => {
                    stats.completed += 1;
                    stats.completed_revenue += order.total;
                }
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats.active = stats.pending + stats.preparing + stats.ready;
        if stats.completed > 0 {
            stats.average_order_value = stats.completed_revenue / stats.completed as f64;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::domain::{CustomerId, OrderId};

    fn order(id: &str, status: OrderStatus, total: f64) -> Order {
        Order {
            id: OrderId::new(id),
            ticket_number: format!("T{id}"),
            customer_id: CustomerId::new("cus_1"),
            customer_name: "Sam".to_string(),
            items: Vec::new(),
            total,
            status,
            timestamp: Utc::now(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn aggregates_counts_and_completed_revenue() {
        let orders = vec![
            order("1", OrderStatus::Pending, 4.0),
            order("2", OrderStatus::Ready, 6.0),
            order("3", OrderStatus::Completed, 10.0),
            order("4", OrderStatus::Completed, 6.0),
            order("5", OrderStatus::Cancelled, 3.0),
        ];
        let stats = DashboardStats::from_orders(&orders);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.ready, 1);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.active, 2);
        assert!((stats.completed_revenue - 16.0).abs() < f64::EPSILON);
        assert!((stats.average_order_value - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_is_zero_without_completed_orders() {
        let stats = DashboardStats::from_orders(&[order("1", OrderStatus::Pending, 4.0)]);
        assert_eq!(stats.completed_revenue, 0.0);
        assert_eq!(stats.average_order_value, 0.0);
    }
}
