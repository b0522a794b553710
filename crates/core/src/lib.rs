//! Bazaar Core - Domain types and cart/stock rules.
//!
//! This crate provides the pieces shared by every Bazaar component:
//! - `server` - JSON HTTP API for customers and admins
//! - `cli` - Command-line tools for migrations, admin users and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. Storage and transport live in `bazaar-server`, which loads
//! documents, applies the rules defined here and persists the result.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, prices, quantities and roles
//! - [`inventory`] - The per-item stock ledger (reserve / release)
//! - [`cart`] - The per-user cart aggregate
//! - [`orders`] - Immutable order snapshots and the checkout transition
//! - [`catalog`] - Item documents, patches and search filters
//! - [`accounts`] - User documents and the protected root admin
//! - [`error`] - Business rule violations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod orders;
pub mod types;

pub use accounts::{NewUser, RootAdmin, User};
pub use cart::{Cart, CartLine};
pub use catalog::{Item, ItemFilter, ItemPatch, NewItem};
pub use error::{CommerceError, Entity};
pub use inventory::Stock;
pub use orders::{Order, OrderLine, ShippingAddress};
pub use types::*;
