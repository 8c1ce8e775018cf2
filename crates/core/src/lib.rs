//! FanatikJersey Core - Shared types library.
//!
//! This crate provides the domain types used by every FanatikJersey component:
//! - `api` - The HTTP service (catalog, accounts, cart and orders)
//! - `cli` - Command-line tools for migrations and role management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Database mappings are compiled in behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, patch sets and statuses
//! - [`catalog`] - Jersey filters, sort keys and pagination math

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod types;

pub use catalog::{CatalogQueryError, JerseyFilter, Page, PageRequest, SortKey};
pub use types::*;
