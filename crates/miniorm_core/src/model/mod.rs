//! Record-side mapping model.
//!
//! # Responsibility
//! - Define the value kinds a mapped field can carry.
//! - Define how record types declare their storage mapping.
//!
//! # Invariants
//! - Record types never expose storage details beyond their declaration.
//! - Field access goes through declared accessors, never reflection.

pub mod declaration;
pub mod value;
