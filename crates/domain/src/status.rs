//! Order status lifecycle.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// pending ──► processing ──► shipped ──► delivered ──►(refunded)
///    │             │            │
///    └─────────────┴────────────┴──► cancelled ──►(refunded)
/// ```
///
/// `cancelled` and `refunded` can be force-set from any non-terminal
/// status by an authorized operator; `delivered`, `cancelled`, and
/// `refunded` are terminal for stock purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order placed, stock reserved, awaiting processing.
    #[default]
    Pending,

    /// Order is being prepared.
    Processing,

    /// Order has left the store.
    Shipped,

    /// Order reached the customer (terminal).
    Delivered,

    /// Order was cancelled and its stock restored (terminal).
    Cancelled,

    /// Payment was returned to the customer (terminal).
    Refunded,
}

impl OrderStatus {
    /// Returns true if a customer cancellation is still permitted.
    ///
    /// Only `pending` orders hold reserved stock that has not entered
    /// fulfilment, so only they can be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is a terminal status (no transitions out).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    /// Returns true if the lifecycle permits moving to `target`.
    ///
    /// Forward progression advances one step at a time; `cancelled` and
    /// `refunded` are reachable from any non-terminal status, and
    /// `refunded` additionally from `delivered` and `cancelled`.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;

        match (self, target) {
            (Pending, Processing) | (Processing, Shipped) | (Shipped, Delivered) => true,
            (Delivered | Cancelled, Refunded) => true,
            (from, Cancelled | Refunded) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status literal.
#[derive(Debug, Clone, Error)]
#[error("invalid order status: {0}")]
pub struct InvalidStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_only_pending_can_cancel() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(!OrderStatus::Processing.can_cancel());
        assert!(!OrderStatus::Shipped.can_cancel());
        assert!(!OrderStatus::Delivered.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
        assert!(!OrderStatus::Refunded.can_cancel());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
    }

    #[test]
    fn test_forward_progression_is_single_step() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));

        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn test_cancel_and_refund_from_non_terminal() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            assert!(status.can_transition_to(OrderStatus::Cancelled));
            assert!(status.can_transition_to(OrderStatus::Refunded));
        }

        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Refunded.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_refund_after_delivery_or_cancellation() {
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Refunded));
        assert!(OrderStatus::Cancelled.can_transition_to(OrderStatus::Refunded));
        assert!(!OrderStatus::Refunded.can_transition_to(OrderStatus::Refunded));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn test_parse_and_display_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }

        assert!("packed".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serializes_as_lowercase_literal() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");
    }
}
