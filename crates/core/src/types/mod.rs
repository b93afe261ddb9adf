//! Core types for Mobile Order.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod sequence;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use sequence::{SequenceError, order_by_sequence, validate_permutation};
pub use status::*;
