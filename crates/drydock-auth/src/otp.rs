//! One-time verification codes
//!
//! Six-digit codes for provider email verification and password reset.
//! Only a SHA-256 digest of the code is persisted; the plaintext exists in
//! the outbound email alone.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

/// How long a code stays valid after it was sent
pub const OTP_TTL_MINUTES: i64 = 15;

/// Generate a six-digit code
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(100_000..1_000_000).to_string()
}

/// Digest of a code as stored at rest
pub fn code_digest(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a submitted code against a stored digest
pub fn code_matches(code: &str, digest: &str) -> bool {
    code_digest(code) == digest
}

/// Whether a code sent at `sent_at` has expired by `now`
pub fn is_expired(sent_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - sent_at > Duration::minutes(OTP_TTL_MINUTES)
}
