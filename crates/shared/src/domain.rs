use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(OrderId);
id_newtype!(CustomerId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Fixed ranking used by the board sort; higher sorts first.
    pub fn priority(self) -> u8 {
        match self {
            OrderStatus::Ready => 4,
            OrderStatus::Preparing => 3,
            OrderStatus::Pending => 2,
            OrderStatus::Completed => 1,
            OrderStatus::Cancelled => 0,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Manager,
    Cashier,
    Cook,
    Employee,
    Customer,
}

impl Role {
    pub fn is_staff(self) -> bool {
        !matches!(self, Role::Customer)
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Cashier => "cashier",
            Role::Cook => "cook",
            Role::Employee => "employee",
            Role::Customer => "customer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCustomization {
    pub group: String,
    pub option: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub customizations: Vec<ItemCustomization>,
}

/// An order as the remote API reports it. Identifiers and timestamps are
/// assigned remotely; this client only relays them, never invents them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub ticket_number: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Who the client is acting as. Staff viewers see the full board; customer
/// viewers are scoped to their own orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewer {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
}

impl Viewer {
    pub fn staff(role: Role) -> Self {
        Self {
            role,
            customer_id: None,
        }
    }

    pub fn customer(customer_id: CustomerId) -> Self {
        Self {
            role: Role::Customer,
            customer_id: Some(customer_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_orders_from_camel_case_wire_json() {
        let raw = r#"{
            "id": "ord_1001",
            "ticketNumber": "T42",
            "customerId": "cus_9",
            "customerName": "Ali Reyes",
            "items": [
                {
                    "name": "flat white",
                    "quantity": 2,
                    "customizations": [{"group": "milk", "option": "oat"}]
                }
            ],
            "total": 9.5,
            "status": "preparing",
            "timestamp": "2025-03-01T09:15:00Z",
            "createdAt": "2025-03-01T09:14:58Z"
        }"#;

        let order: Order = serde_json::from_str(raw).expect("wire order");
        assert_eq!(order.id, OrderId::new("ord_1001"));
        assert_eq!(order.ticket_number, "T42");
        assert_eq!(order.customer_name, "Ali Reyes");
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].customizations[0].option, "oat");
        assert!(order.created_at.is_some());
        assert!(order.updated_at.is_none());
    }

    #[test]
    fn unknown_status_values_fail_to_decode() {
        let err = serde_json::from_str::<OrderStatus>(r#""refunded""#).expect_err("must fail");
        assert!(err.to_string().contains("refunded"));
    }

    #[test]
    fn status_priorities_rank_open_work_above_closed_orders() {
        assert!(OrderStatus::Ready.priority() > OrderStatus::Preparing.priority());
        assert!(OrderStatus::Preparing.priority() > OrderStatus::Pending.priority());
        assert!(OrderStatus::Pending.priority() > OrderStatus::Completed.priority());
        assert!(OrderStatus::Completed.priority() > OrderStatus::Cancelled.priority());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }
}
