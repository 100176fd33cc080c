//! Repository layer: generic CRUD execution and repository production.
//!
//! # Responsibility
//! - Execute CRUD statements for any resolved entity.
//! - Produce contract-typed repositories that route into that executor.
//!
//! # Invariants
//! - One statement execution per repository call; no caching of entities
//!   or connections between calls.
//! - Errors surface to the caller of the triggering call and are never
//!   logged-and-swallowed.

pub mod contract;
pub mod factory;
pub mod generic_repo;
pub mod proxy;
pub mod sql;
