//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Owner signup/login with Argon2id passwords and signed bearer tokens
//! - `menu` - Public menu assembly in owner-chosen order
//! - `orders` - Order placement and status transitions

pub mod auth;
pub mod menu;
pub mod orders;

pub use auth::{AuthError, AuthService, IssuedToken, TokenSigner};
pub use menu::{Menu, MenuCategory, MenuService};
pub use orders::{OrderService, PlaceOrderInput};
