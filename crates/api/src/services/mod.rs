//! Business logic services for the marketplace API.
//!
//! # Services
//!
//! - `auth` - Registration, login, password changes, JWTs and Google sign-in
//! - `google` - Google OAuth client
//! - `media` - Product image uploads (Cloudinary)
//! - `orders` - Order request validation

pub mod auth;
pub mod google;
pub mod media;
pub mod orders;
