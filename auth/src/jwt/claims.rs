use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Identity claims carried by an access token.
///
/// Every field is required when decoding, so a token missing `user_id`,
/// `authorized` or a timestamp fails to deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject account identifier
    pub user_id: u64,

    /// Always true for tokens minted by this service
    pub authorized: bool,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for an account, valid from `now` for `validity`.
    ///
    /// Returns `None` when the expiration falls outside the representable
    /// date range.
    pub fn for_account(user_id: u64, now: DateTime<Utc>, validity: Duration) -> Option<Self> {
        let expires_at = now.checked_add_signed(validity)?;

        Some(Self {
            user_id,
            authorized: true,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// Check if token is expired.
    ///
    /// A token is only live strictly before its expiration second.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }
}
