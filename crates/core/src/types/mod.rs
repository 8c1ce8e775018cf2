//! Core types for FanatikJersey.
//!
//! Type-safe wrappers for IDs, emails, money, patch sets and statuses.

pub mod email;
pub mod id;
pub mod money;
pub mod patches;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use patches::PatchSet;
pub use status::*;
