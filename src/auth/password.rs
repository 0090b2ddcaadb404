//! One-way password hashing for persisted credentials.

use anyhow::{Context, Result};

/// bcrypt work factor. Deliberate CPU-cost knob balancing brute-force
/// resistance against login latency; hashing takes tens of milliseconds,
/// so callers offload it to a blocking thread.
pub const BCRYPT_COST: u32 = 10;

/// Hash a password for storage. Each call uses a fresh random salt, so the
/// same password never produces the same hash twice.
///
/// # Errors
/// Returns an error if bcrypt fails to produce a hash.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST).context("failed to hash password")
}

/// Check a password against a stored hash.
///
/// Total: a malformed stored hash is a verification failure, not an error.
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}
