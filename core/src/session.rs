//! Bearer token held for the API client, with pluggable persistence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use tracing::{info, warn};

use crate::error::ApiError;

/// Where the token survives between runs.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn save(&self, token: &str) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

struct Inner {
    token: RwLock<Option<String>>,
    store: Box<dyn TokenStore>,
    expired: AtomicBool,
}

/// Cheap to clone; all clones see the same token.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new(store: Box<dyn TokenStore>) -> Self {
        let token = store.load().filter(|t| !t.trim().is_empty());
        Self {
            inner: Arc::new(Inner { token: RwLock::new(token), store, expired: AtomicBool::new(false) }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::<MemoryTokenStore>::default())
    }

    pub fn token(&self) -> Option<String> {
        self.inner.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    /// Token usable at `now`. An expired token is dropped on the spot and the
    /// expiry signal raised, same as a 401 from the server.
    pub fn valid_token(&self, now: DateTime<Utc>) -> Result<String, ApiError> {
        let token = self.token().ok_or(ApiError::AuthenticationRequired)?;
        match token_expiry(&token) {
            Some(exp) if exp <= now => {
                info!("stored token expired at {}", exp);
                self.expire();
                Err(ApiError::AuthenticationRequired)
            }
            _ => Ok(token),
        }
    }

    pub fn set_token(&self, token: &str) {
        *self.inner.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        self.inner.store.save(token);
        self.inner.expired.store(false, Ordering::SeqCst);
        info!("session started");
    }

    pub fn clear(&self) {
        *self.inner.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.store.clear();
    }

    /// Server rejected the token: forget it and raise the signal the UI polls.
    pub fn expire(&self) {
        if self.is_logged_in() {
            warn!("session rejected by server");
        }
        self.clear();
        self.inner.expired.store(true, Ordering::SeqCst);
    }

    /// Returns true once per `expire()`.
    pub fn take_expired_signal(&self) -> bool {
        self.inner.expired.swap(false, Ordering::SeqCst)
    }
}

/// `exp` claim of a JWT, if the token is one and carries it.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?;
    let secs = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"neo@example.com","exp":{}}}"#, exp));
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn expiry_is_read_from_payload() {
        let exp = 1_900_000_000;
        assert_eq!(token_expiry(&jwt(exp)).map(|t| t.timestamp()), Some(exp));
        assert_eq!(token_expiry("opaque-token"), None);
        assert_eq!(token_expiry("a.!!!.c"), None);
    }

    #[test]
    fn expired_token_is_cleared() {
        let session = Session::in_memory();
        session.set_token(&jwt(1_000));
        let now = Utc.timestamp_opt(2_000, 0).single().unwrap();
        assert_eq!(session.valid_token(now), Err(ApiError::AuthenticationRequired));
        assert!(!session.is_logged_in());
        assert!(session.take_expired_signal());
    }

    #[test]
    fn live_and_opaque_tokens_pass() {
        let session = Session::in_memory();
        let now = Utc.timestamp_opt(2_000, 0).single().unwrap();
        session.set_token(&jwt(3_000));
        assert!(session.valid_token(now).is_ok());
        session.set_token("opaque");
        assert_eq!(session.valid_token(now).as_deref(), Ok("opaque"));
    }

    #[test]
    fn expire_raises_signal_once() {
        let session = Session::in_memory();
        session.set_token("t");
        session.expire();
        assert!(!session.is_logged_in());
        assert!(session.take_expired_signal());
        assert!(!session.take_expired_signal());
    }

    #[test]
    fn token_persists_through_store() {
        let store = MemoryTokenStore::default();
        store.save("saved");
        let session = Session::new(Box::new(store));
        assert_eq!(session.token().as_deref(), Some("saved"));
        let clone = session.clone();
        clone.clear();
        assert_eq!(session.token(), None);
    }
}
