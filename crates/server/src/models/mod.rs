//! Domain models.
//!
//! Request input types live next to the domain types they produce and are
//! checked with `validate()` before anything touches the database.

pub mod menu;
pub mod order;
pub mod owner;
pub mod shop;

pub use menu::{Category, CategoryInput, Product, ProductInput, SequenceBody};
pub use order::{Order, OrderItems, StatusUpdate};
pub use owner::{CurrentOwner, Owner};
pub use shop::{Shop, ShopInput};

use thiserror::Error;

/// A request field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Trim a required text field and check its length.
pub(crate) fn required_text(field: &str, value: &str, max: usize) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ValidationError(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Trim an optional text field; blank values become `None`.
pub(crate) fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => required_text(field, value, max).map(Some),
    }
}
