//! Order status and its transitions.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a customer order.
///
/// Orders arrive as `New`, are marked `Served` once handed over, and end up
/// in `Past` when the owner archives them. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed by a customer, waiting to be served.
    #[default]
    New,
    /// Handed over to the customer.
    Served,
    /// Archived.
    Past,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 3] = [Self::New, Self::Served, Self::Past];

    /// Whether an order in this status may move to `next`.
    ///
    /// ```
    /// use mobile_order_core::OrderStatus;
    ///
    /// assert!(OrderStatus::New.can_transition_to(OrderStatus::Served));
    /// assert!(!OrderStatus::Past.can_transition_to(OrderStatus::New));
    /// ```
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::Served | Self::Past) | (Self::Served, Self::Past)
        )
    }

    /// Lowercase name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Served => "served",
            Self::Past => "past",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "served" => Ok(Self::Served),
            "past" => Ok(Self::Past),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
