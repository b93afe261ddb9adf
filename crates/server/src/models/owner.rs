//! Owner account types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mobile_order_core::{Email, OwnerId};

/// A shop-owning account. Every other record is scoped to one owner.
#[derive(Debug, Clone, Serialize)]
pub struct Owner {
    /// Unique owner ID.
    pub id: OwnerId,
    /// Login email (normalized).
    pub email: Email,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// The owner authenticated by the request's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentOwner {
    /// Owner the token was issued to.
    pub id: OwnerId,
}
