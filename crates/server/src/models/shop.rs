//! Shop profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mobile_order_core::{OwnerId, ShopId};

use super::{ValidationError, optional_text, required_text};

/// A shop profile. Each owner has at most one.
#[derive(Debug, Clone, Serialize)]
pub struct Shop {
    pub id: ShopId,
    pub owner_id: OwnerId,
    pub name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<String>,
    /// Storage key of the shop image, served under `/images/`.
    pub image_path: Option<String>,
    /// Whether customers can currently place orders.
    pub accepting_orders: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /api/shop`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<String>,
    /// `true` for a new shop when omitted; an existing shop keeps its value.
    #[serde(default)]
    pub accepting_orders: Option<bool>,
}

impl ShopInput {
    /// Trim and length-check every field.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the first invalid field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", &self.name, 100)?,
            description: optional_text("description", self.description.as_deref(), 1000)?,
            phone: optional_text("phone", self.phone.as_deref(), 32)?,
            address: optional_text("address", self.address.as_deref(), 255)?,
            opening_hours: optional_text("opening_hours", self.opening_hours.as_deref(), 255)?,
            accepting_orders: self.accepting_orders,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_input_defaults_and_trimming() {
        let input: ShopInput =
            serde_json::from_str(r#"{"name": " Corner Cafe ", "phone": ""}"#).unwrap();
        let input = input.validate().unwrap();
        assert_eq!(input.name, "Corner Cafe");
        assert_eq!(input.phone, None);
        assert_eq!(input.accepting_orders, None);
    }

    #[test]
    fn test_shop_input_requires_name() {
        let input: ShopInput = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert_eq!(
            input.validate().unwrap_err(),
            ValidationError("name is required".to_string())
        );
    }
}
