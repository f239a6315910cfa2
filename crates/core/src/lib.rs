//! Tribal Market Core - Shared types library.
//!
//! This crate provides the domain types used across the marketplace:
//! - `api` - REST API consumed by the buyer and artist portals
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. Order and payment lifecycles live here so the
//! transition rules can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Ids, emails, prices, ratings, statuses and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
