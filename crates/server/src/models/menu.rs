//! Menu types: categories, products and their display sequences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mobile_order_core::{CategoryId, OwnerId, Price, ProductId};

use super::{ValidationError, optional_text, required_text};

/// A menu category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub owner_id: OwnerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/categories` and `PUT /api/categories/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
}

impl CategoryInput {
    /// Return the trimmed category name.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the name is blank or longer than 100
    /// characters.
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", &self.name, 100)?,
        })
    }
}

/// A product on the menu.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub owner_id: OwnerId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    /// Storage key of the product image, served under `/images/`.
    pub image_path: Option<String>,
    /// Unavailable products stay on the owner's menu but cannot be ordered.
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/products` and `PUT /api/products/{id}`.
///
/// Updates replace every field except the image.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

const fn default_available() -> bool {
    true
}

impl ProductInput {
    /// Trim and length-check the text fields.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the first invalid field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", &self.name, 100)?,
            description: optional_text("description", self.description.as_deref(), 1000)?,
            ..self
        })
    }
}

/// A full display order, as read from and written to the sequence endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceBody<T> {
    pub sequence: Vec<T>,
}

impl<T> From<Vec<T>> for SequenceBody<T> {
    fn from(sequence: Vec<T>) -> Self {
        Self { sequence }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_input_accepts_number_or_string_price() {
        let from_number: ProductInput =
            serde_json::from_str(r#"{"category_id": 1, "name": "Latte", "price": 4.5}"#).unwrap();
        let from_string: ProductInput =
            serde_json::from_str(r#"{"category_id": 1, "name": "Latte", "price": "4.50"}"#)
                .unwrap();
        assert_eq!(from_number.price, from_string.price);
        assert!(from_number.is_available);
    }

    #[test]
    fn test_product_input_rejects_negative_price() {
        let result = serde_json::from_str::<ProductInput>(
            r#"{"category_id": 1, "name": "Latte", "price": "-1"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_product_input_validate() {
        let input: ProductInput = serde_json::from_str(
            r#"{"category_id": 2, "name": "  Mocha ", "description": " ", "price": 5, "is_available": false}"#,
        )
        .unwrap();
        let input = input.validate().unwrap();
        assert_eq!(input.name, "Mocha");
        assert_eq!(input.description, None);
        assert!(!input.is_available);
        assert_eq!(input.category_id, CategoryId::new(2));
    }

    #[test]
    fn test_category_input_validate() {
        let input = CategoryInput {
            name: " Drinks ".to_string(),
        };
        assert_eq!(input.validate().unwrap().name, "Drinks");
        assert!(
            CategoryInput {
                name: String::new()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_sequence_body_shape() {
        let body: SequenceBody<ProductId> = serde_json::from_str(r#"{"sequence": [3, 1, 2]}"#).unwrap();
        assert_eq!(
            body.sequence,
            vec![ProductId::new(3), ProductId::new(1), ProductId::new(2)]
        );
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"sequence":[3,1,2]}"#
        );
    }
}
