//! In-memory credential storage

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use gqlink_core::AuthStore;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Tokens {
    auth: Option<String>,
    refresh: Option<String>,
}

/// [`AuthStore`] backed by process memory
///
/// Expiry is read from the access token's `exp` claim. Tokens whose payload
/// cannot be decoded, or that carry no `exp`, are treated as expired so the
/// refresh link replaces them.
#[derive(Debug)]
pub struct MemoryAuthStore {
    tokens: RwLock<Tokens>,
    leeway: Duration,
}

impl Default for MemoryAuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthStore {
    /// Empty store with no leeway
    pub fn new() -> Self {
        Self { tokens: RwLock::new(Tokens::default()), leeway: Duration::zero() }
    }

    /// Consider tokens expired `seconds` before their `exp`.
    ///
    /// Values chrono cannot represent are ignored (no leeway).
    pub fn with_leeway(mut self, seconds: i64) -> Self {
        match Duration::try_seconds(seconds) {
            Some(leeway) => self.leeway = leeway,
            None => warn!(seconds, "Expiry leeway out of range, ignoring"),
        }
        self
    }

    /// Seed the stored access and refresh tokens
    pub fn with_tokens(self, auth: Option<String>, refresh: Option<String>) -> Self {
        *self.tokens.write() = Tokens { auth, refresh };
        self
    }

    /// Whether `token` expires before `now` plus the configured leeway
    pub fn is_expired_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        match token_expiry(token) {
            // A deadline past chrono's range is certainly after `exp`.
            Some(expiry) => now
                .checked_add_signed(self.leeway)
                .map_or(true, |deadline| deadline >= expiry),
            None => {
                debug!("Access token has no readable exp claim");
                true
            }
        }
    }
}

impl AuthStore for MemoryAuthStore {
    fn get_auth_token(&self) -> Option<String> {
        self.tokens.read().auth.clone()
    }

    fn is_token_expired(&self, token: &str) -> bool {
        self.is_expired_at(token, Utc::now())
    }

    fn get_refresh_token(&self) -> Option<String> {
        self.tokens.read().refresh.clone()
    }

    fn set_auth_token(&self, token: String) {
        self.tokens.write().auth = Some(token);
    }

    fn set_refresh_token(&self, token: String) {
        self.tokens.write().refresh = Some(token);
    }

    fn delete_jwt(&self) {
        self.tokens.write().auth = None;
    }

    fn clear(&self) {
        *self.tokens.write() = Tokens::default();
    }
}

/// Expiry encoded in a JWT's `exp` claim
///
/// The signature is not checked; the server remains the authority on
/// validity.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    let exp = match claims.get("exp")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        _ => return None,
    };
    DateTime::from_timestamp(exp, 0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn jwt(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn reads_exp_claim() {
        let token = jwt(&json!({ "exp": 1_700_000_000 }));
        assert_eq!(token_expiry(&token).unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn expiry_honours_leeway() {
        let now = Utc::now();
        let token = jwt(&json!({ "exp": (now + Duration::seconds(30)).timestamp() }));

        assert!(!MemoryAuthStore::new().is_expired_at(&token, now));
        assert!(MemoryAuthStore::new().with_leeway(60).is_expired_at(&token, now));
    }

    #[test]
    fn out_of_range_leeway_does_not_panic() {
        let now = Utc::now();
        let token = jwt(&json!({ "exp": (now + Duration::hours(1)).timestamp() }));

        let store = MemoryAuthStore::new().with_leeway(i64::MAX);
        assert!(!store.is_expired_at(&token, now));
    }

    #[test]
    fn deadline_overflow_counts_as_expired() {
        let token = jwt(&json!({ "exp": 1_700_000_000 }));
        let store = MemoryAuthStore::new().with_leeway(60);

        assert!(store.is_expired_at(&token, DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn past_exp_is_expired() {
        let token = jwt(&json!({ "exp": (Utc::now() - Duration::minutes(5)).timestamp() }));
        assert!(MemoryAuthStore::new().is_token_expired(&token));
    }

    #[test]
    fn undecodable_tokens_are_expired() {
        let store = MemoryAuthStore::new();
        assert!(store.is_token_expired("not-a-jwt"));
        assert!(store.is_token_expired(&jwt(&json!({ "sub": "no exp" }))));
    }

    #[test]
    fn delete_jwt_keeps_refresh_token() {
        let store =
            MemoryAuthStore::new().with_tokens(Some("access".into()), Some("refresh".into()));

        store.delete_jwt();
        assert_eq!(store.get_auth_token(), None);
        assert_eq!(store.get_refresh_token().as_deref(), Some("refresh"));

        store.clear();
        assert_eq!(store.get_refresh_token(), None);
    }
}
