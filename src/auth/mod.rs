//! Authentication module for the Strava API
//!
//! Implements the OAuth2 authorization-code flow with a cached refresh
//! token. The first run needs the user to approve access in a browser and
//! paste back the resulting code; later runs only refresh.

pub mod oauth;
pub mod tokens;

pub use oauth::{status, CredentialManager, StdinCodeProvider, StravaOAuth};
pub use tokens::{FileTokenStore, StoredToken, TokenStore};

/// Scopes requested on authorization (Strava expects them comma-joined)
pub const SCOPES: &str = "profile:read_all,activity:read_all";
