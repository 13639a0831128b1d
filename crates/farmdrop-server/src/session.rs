//! Server-side login sessions.
//!
//! Sessions live in memory and are lost on restart. The browser only holds
//! `<token>.<signature>` in the `farmdrop_session` cookie; the signature is a
//! SHA-256 over the session secret and token, checked in constant time before
//! the store is consulted.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "farmdrop_session";

#[derive(Debug)]
struct SessionEntry {
    user_id: i64,
    flash: Vec<String>,
    expires_at: Instant,
}

/// A session resolved from a request cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
}

#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<Mutex<HashMap<String, SessionEntry>>>,
    secret: Arc<str>,
    ttl: Duration,
    secure_cookie: bool,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("secret", &"[redacted]")
            .field("ttl", &self.ttl)
            .field("secure_cookie", &self.secure_cookie)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(secret: &str, ttl: Duration, secure_cookie: bool) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            secret: Arc::from(secret),
            ttl,
            secure_cookie,
        }
    }

    /// Starts a session for `user_id`.
    pub async fn create(&self, user_id: i64) -> Session {
        let token = Uuid::new_v4().simple().to_string();
        let entry = SessionEntry {
            user_id,
            flash: Vec::new(),
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().await.insert(token.clone(), entry);
        Session { token, user_id }
    }

    /// Signed cookie value for `session`.
    #[must_use]
    pub fn cookie_value(&self, session: &Session) -> String {
        format!("{}.{}", session.token, self.sign(&session.token))
    }

    /// Resolves a signed cookie value to a live session.
    ///
    /// Returns `None` for tampered, unknown, or expired values. Expired
    /// entries are evicted on lookup.
    pub async fn resolve(&self, cookie_value: &str) -> Option<Session> {
        let token = self.verify(cookie_value)?;
        let mut entries = self.entries.lock().await;
        let entry = entries.get(token)?;
        if entry.expires_at <= Instant::now() {
            entries.remove(token);
            return None;
        }
        Some(Session {
            token: token.to_owned(),
            user_id: entry.user_id,
        })
    }

    /// Queues a one-shot message for the next profile response.
    pub async fn push_flash(&self, token: &str, message: impl Into<String>) {
        if let Some(entry) = self.entries.lock().await.get_mut(token) {
            entry.flash.push(message.into());
        }
    }

    /// Drains queued flash messages.
    pub async fn take_flash(&self, token: &str) -> Vec<String> {
        self.entries
            .lock()
            .await
            .get_mut(token)
            .map(|entry| std::mem::take(&mut entry.flash))
            .unwrap_or_default()
    }

    pub async fn destroy(&self, token: &str) {
        self.entries.lock().await.remove(token);
    }

    /// Drops every session belonging to `user_id`.
    pub async fn destroy_user(&self, user_id: i64) {
        self.entries
            .lock()
            .await
            .retain(|_, entry| entry.user_id != user_id);
    }

    /// Evicts expired sessions and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// `Set-Cookie` value that installs `session`.
    #[must_use]
    pub fn cookie_header(&self, session: &Session) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_value(session),
            self.ttl.as_secs()
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that removes the session cookie.
    #[must_use]
    pub fn clear_cookie_header(&self) -> String {
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }

    fn sign(&self, token: &str) -> String {
        let digest = Sha256::new()
            .chain_update(self.secret.as_bytes())
            .chain_update(b".")
            .chain_update(token.as_bytes())
            .finalize();
        format!("{digest:x}")
    }

    fn verify<'a>(&self, cookie_value: &'a str) -> Option<&'a str> {
        let (token, signature) = cookie_value.split_once('.')?;
        let expected = self.sign(token);
        if expected.as_bytes().ct_eq(signature.as_bytes()).into() {
            Some(token)
        } else {
            None
        }
    }
}

/// Extracts the session cookie value from a `Cookie` header.
#[must_use]
pub fn session_cookie_value(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ttl: Duration) -> SessionStore {
        SessionStore::new("test-secret", ttl, false)
    }

    #[tokio::test]
    async fn created_session_resolves() {
        let sessions = store(Duration::from_secs(60));
        let created = sessions.create(7).await;
        let cookie = sessions.cookie_value(&created);
        let session = sessions.resolve(&cookie).await.expect("session");
        assert_eq!(session, created);
        assert!(cookie.starts_with(&session.token));
    }

    #[tokio::test]
    async fn tampered_signature_is_rejected() {
        let sessions = store(Duration::from_secs(60));
        let cookie = sessions.cookie_value(&sessions.create(7).await);
        let (token, _) = cookie.split_once('.').expect("signed cookie");
        assert!(sessions.resolve(&format!("{token}.deadbeef")).await.is_none());
        assert!(sessions.resolve(token).await.is_none());
    }

    #[tokio::test]
    async fn cookie_from_other_secret_is_rejected() {
        let a = store(Duration::from_secs(60));
        let b = SessionStore::new("other-secret", Duration::from_secs(60), false);
        let cookie = a.cookie_value(&a.create(1).await);
        assert!(b.resolve(&cookie).await.is_none());
    }

    #[tokio::test]
    async fn expired_session_is_evicted() {
        let sessions = store(Duration::ZERO);
        let cookie = sessions.cookie_value(&sessions.create(3).await);
        assert!(sessions.resolve(&cookie).await.is_none());
        assert_eq!(sessions.purge_expired().await, 0, "already evicted on lookup");
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let live = store(Duration::from_secs(60));
        live.create(1).await;
        assert_eq!(live.purge_expired().await, 0);

        let dead = store(Duration::ZERO);
        dead.create(1).await;
        dead.create(2).await;
        assert_eq!(dead.purge_expired().await, 2);
    }

    #[tokio::test]
    async fn flash_messages_drain_once() {
        let sessions = store(Duration::from_secs(60));
        let session = sessions.create(5).await;

        sessions.push_flash(&session.token, "first").await;
        sessions.push_flash(&session.token, "second").await;
        assert_eq!(sessions.take_flash(&session.token).await, ["first", "second"]);
        assert!(sessions.take_flash(&session.token).await.is_empty());
    }

    #[tokio::test]
    async fn destroy_user_ends_all_their_sessions() {
        let sessions = store(Duration::from_secs(60));
        let a = sessions.cookie_value(&sessions.create(9).await);
        let b = sessions.cookie_value(&sessions.create(9).await);
        let other = sessions.cookie_value(&sessions.create(10).await);

        sessions.destroy_user(9).await;
        assert!(sessions.resolve(&a).await.is_none());
        assert!(sessions.resolve(&b).await.is_none());
        assert!(sessions.resolve(&other).await.is_some());
    }

    #[test]
    fn cookie_header_sets_flags() {
        let sessions = store(Duration::from_secs(86_400));
        let session = Session {
            token: "abc".to_owned(),
            user_id: 1,
        };
        let header = sessions.cookie_header(&session);
        assert!(header.starts_with("farmdrop_session=abc."), "{header}");
        assert!(header.ends_with("; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400"));

        let secure = SessionStore::new("s", Duration::from_secs(1), true).cookie_header(&session);
        assert!(secure.ends_with("; Secure"));
    }

    #[test]
    fn session_cookie_value_finds_named_cookie() {
        assert_eq!(
            session_cookie_value("theme=dark; farmdrop_session=abc.def; other=1"),
            Some("abc.def")
        );
        assert_eq!(session_cookie_value("theme=dark"), None);
        assert_eq!(session_cookie_value("farmdrop_session="), None);
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", store(Duration::from_secs(1)));
        assert!(!rendered.contains("test-secret"));
    }
}
