//! Session-related types.
//!
//! Server-side sessions only carry short-lived OAuth handshake state; API
//! authentication itself uses bearer tokens.

/// Session keys.
pub mod keys {
    /// Key for Google OAuth state (CSRF protection).
    pub const GOOGLE_OAUTH_STATE: &str = "google_oauth_state";

    /// Key for the storefront path to return to after Google sign-in.
    pub const GOOGLE_OAUTH_RETURN_TO: &str = "google_oauth_return_to";
}
