//! Authentication configuration.

use chrono::TimeDelta;

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Optional pepper prepended to passwords before Argon2id verification.
    /// Must match the pepper the user repository hashes with.
    pub pepper: Option<String>,
    /// Password reset lifetime in seconds (default: 3600 = 1 hour).
    pub reset_token_lifetime_secs: u64,
}

impl AuthConfig {
    /// The reset lifetime as a duration, or `None` when it is zero or
    /// too large to represent.
    pub fn reset_lifetime(&self) -> Option<TimeDelta> {
        reset_lifetime_from_secs(self.reset_token_lifetime_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pepper: None,
            reset_token_lifetime_secs: 3600,
        }
    }
}

/// Convert a lifetime in seconds into a positive [`TimeDelta`].
pub fn reset_lifetime_from_secs(secs: u64) -> Option<TimeDelta> {
    if secs == 0 {
        return None;
    }
    i64::try_from(secs).ok().and_then(TimeDelta::try_seconds)
}
