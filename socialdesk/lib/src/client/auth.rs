//! Authentication stage of the request pipeline.
//!
//! Every request, whichever client path sent it, passes through
//! [`AuthStage`]: it drops expired sessions before the network call, decides
//! whether the target gets a bearer token, learns new sessions from login
//! responses and drops the session when the server answers `401`.

use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::error::ConfigError;
use crate::events::{UnauthorizedEvent, UnauthorizedEvents};
use crate::session::{AuthModel, SessionStore, SessionTokens};

/// What a request URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    /// The email login endpoint.
    Login,
    /// Any other URL under the API base URL.
    Api,
    /// Anything else.
    External,
}

#[derive(Clone)]
pub(crate) struct AuthStage {
    store: Arc<dyn SessionStore>,
    events: UnauthorizedEvents,
    api_base: String,
    login_url: String,
}

impl AuthStage {
    pub(crate) fn new(
        store: Arc<dyn SessionStore>,
        events: UnauthorizedEvents,
        api_base: &str,
        login_url: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            events,
            api_base: normalize(api_base)?,
            login_url: normalize(login_url)?,
        })
    }

    pub(crate) fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub(crate) fn events(&self) -> &UnauthorizedEvents {
        &self.events
    }

    /// Classifies a URL by its scheme, host and path; query and fragment are
    /// ignored.
    pub(crate) fn classify(&self, url: &Url) -> Target {
        let bare = bare_url(url);
        if bare == self.login_url {
            Target::Login
        } else if bare == self.api_base
            || bare
                .strip_prefix(&self.api_base)
                .is_some_and(|rest| rest.starts_with('/'))
        {
            Target::Api
        } else {
            Target::External
        }
    }

    /// Returns the live session, discarding it first if it has expired.
    pub(crate) fn current_session(&self) -> Option<AuthModel> {
        let session = self.store.get()?;
        if session.is_expired_at(now_millis()) {
            info!("stored session expired, signing out");
            self.discard(&UnauthorizedEvent::expired());
            return None;
        }
        Some(session)
    }

    /// Returns the bearer token for a request to `target`.
    ///
    /// The expiry check runs for every request so an expired session never
    /// outlives the next call.
    pub(crate) fn bearer_for(&self, target: Target) -> Option<String> {
        let session = self.current_session();
        match target {
            Target::Api => session.map(|s| s.access_token),
            Target::Login | Target::External => None,
        }
    }

    /// Persists the session carried by a successful login response.
    ///
    /// Only the token fields are read; the `user` object is left to the
    /// session owner.
    pub(crate) fn capture_login(&self, body: &[u8]) {
        let tokens: SessionTokens = match serde_json::from_slice(body) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "login response did not contain a session");
                return;
            }
        };

        if let Err(e) = self.store.set(&tokens.to_auth_model()) {
            warn!(error = %e, "failed to persist session");
        }
    }

    /// Drops the session after the server rejected it.
    pub(crate) fn reject(&self, message: Option<String>) {
        self.discard(&UnauthorizedEvent::rejected(message));
    }

    fn discard(&self, event: &UnauthorizedEvent) {
        if let Err(e) = self.store.remove() {
            warn!(error = %e, "failed to remove session");
        }
        self.events.emit(event);
    }
}

/// Current time as epoch milliseconds.
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn normalize(url: &str) -> Result<String, ConfigError> {
    Ok(bare_url(&Url::parse(url)?))
}

fn bare_url(url: &Url) -> String {
    let mut bare = url.clone();
    bare.set_query(None);
    bare.set_fragment(None);
    bare.as_str().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn stage(store: Arc<dyn SessionStore>) -> (AuthStage, Arc<AtomicUsize>) {
        let events = UnauthorizedEvents::new();
        let emitted = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&emitted);
        events.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let stage = AuthStage::new(
            store,
            events,
            "https://API.example.com/v2",
            "https://api.example.com/v2/auth/email/login",
        )
        .unwrap();
        (stage, emitted)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn classifies_targets() {
        let (stage, _) = stage(Arc::new(MemorySessionStore::new()));
        assert_eq!(stage.classify(&url("https://api.example.com/v2/auth/email/login?x=1")), Target::Login);
        assert_eq!(stage.classify(&url("https://api.example.com/v2/accounts?page=1")), Target::Api);
        assert_eq!(stage.classify(&url("https://api.example.com/v2")), Target::Api);
        assert_eq!(stage.classify(&url("https://api.example.com/v2x/accounts")), Target::External);
        assert_eq!(stage.classify(&url("https://cdn.example.com/v2/a.png")), Target::External);
    }

    #[test]
    fn bearer_only_for_api_targets() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::with_session(AuthModel::new("tok")));
        let (stage, emitted) = stage(store);
        assert_eq!(stage.bearer_for(Target::Api).as_deref(), Some("tok"));
        assert_eq!(stage.bearer_for(Target::Login), None);
        assert_eq!(stage.bearer_for(Target::External), None);
        assert_eq!(emitted.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn expired_session_is_discarded_once() {
        let store: Arc<dyn SessionStore> =
            Arc::new(MemorySessionStore::with_session(AuthModel::new("tok").expiring_at(1)));
        let (stage, emitted) = stage(Arc::clone(&store));

        assert_eq!(stage.bearer_for(Target::Api), None);
        assert!(store.get().is_none());
        assert_eq!(emitted.load(Ordering::SeqCst), 1);

        assert_eq!(stage.bearer_for(Target::Api), None);
        assert_eq!(emitted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn capture_login_persists_token_bundle() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let (stage, _) = stage(Arc::clone(&store));

        stage.capture_login(br#"{"token":"new","refreshToken":"r","tokenExpires":"4102444800000","user":{"id":1}}"#);
        let session = store.get().unwrap();
        assert_eq!(session.access_token, "new");
        assert_eq!(session.token_expires, Some(4_102_444_800_000));
    }

    #[test]
    fn capture_login_stores_tokens_whatever_the_user_shape() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let (stage, _) = stage(Arc::clone(&store));

        stage.capture_login(br#"{"token":"tok-1","refreshToken":"r","user":{"role":"admin","status":[1]}}"#);
        let session = store.get().unwrap();
        assert_eq!(session.access_token, "tok-1");
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn capture_login_ignores_malformed_body() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let (stage, _) = stage(Arc::clone(&store));

        stage.capture_login(b"<html>");
        assert!(store.get().is_none());
        assert!(logs_contain("login response did not contain a session"));
    }

    #[test]
    fn reject_removes_and_emits() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::with_session(AuthModel::new("tok")));
        let (stage, emitted) = stage(Arc::clone(&store));

        stage.reject(Some("revoked".to_string()));
        assert!(store.get().is_none());
        assert_eq!(emitted.load(Ordering::SeqCst), 1);
    }
}
