//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, errors, the
//!   `StateMachine` trait)
//! - `catalog` - Static entity catalog (candidate names, region/district map)
//! - `tally` - The tally value object being collaboratively built
//! - `extraction` - Free-text vote extraction with fuzzy name matching
//! - `session` - Per-user workflow session aggregate and stage machine

pub mod catalog;
pub mod extraction;
pub mod foundation;
pub mod session;
pub mod tally;
