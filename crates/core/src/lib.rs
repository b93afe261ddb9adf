//! Mobile Order Core - Shared types library.
//!
//! This crate provides common types used across all Mobile Order components:
//! - `server` - JSON API for shop owners and ordering customers
//! - `cli` - Command-line tools for migrations, accounts and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Database encoding is available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, prices, order statuses and sequence ordering

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
