//! Session authentication core: password hashing, the signed session token
//! codec, and the session cookie policy.
//!
//! Everything here is local computation. No function performs I/O, and the
//! verification paths are total: malformed input yields a negative result
//! (`false`/`None`) instead of an error, so callers must handle the reject
//! path explicitly.

pub mod cookie;
pub mod password;
pub mod state;
pub mod token;

pub use cookie::SESSION_COOKIE_NAME;
pub use state::{AuthConfig, AuthState};
pub use token::{SessionClaims, TokenCodec};
