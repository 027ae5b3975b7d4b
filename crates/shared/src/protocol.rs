use serde::{Deserialize, Serialize};

use crate::domain::OrderStatus;

/// Query string shared by both order collection endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersQuery {
    pub limit: u32,
}

/// Body of `PATCH /orders/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

/// Best-effort shape of a rejection body. The remote API sometimes includes
/// `message`; everything else about the body is unspecified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_update_body_uses_the_snake_case_wire_form() {
        let body = serde_json::to_string(&StatusUpdateRequest {
            status: OrderStatus::Preparing,
        })
        .expect("encode");
        assert_eq!(body, r#"{"status":"preparing"}"#);
    }

    #[test]
    fn error_bodies_decode_with_or_without_a_message() {
        let with: ErrorBody = serde_json::from_str(r#"{"message":"order already completed"}"#)
            .expect("decode");
        assert_eq!(with.message.as_deref(), Some("order already completed"));

        let without: ErrorBody = serde_json::from_str(r#"{"code":"conflict"}"#).expect("decode");
        assert!(without.message.is_none());
    }
}
