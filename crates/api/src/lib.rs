//! Tribal Market API library.
//!
//! The REST API behind the tribal crafts storefront: accounts for buyers and
//! artists, the product catalog, carts, wishlists, reviews and orders.
//! Built as a library so the binary, the CLI and the integration tests share
//! one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use app::build_router;
