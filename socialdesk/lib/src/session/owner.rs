//! Session lifecycle owner.
//!
//! [`SessionOwner`] is the single place that decides what signing in and out
//! means for the application. It subscribes to the client's unauthorized
//! events and reacts to the first one after a sign-in; later events are
//! ignored until the next successful login, so a burst of concurrent `401`s
//! signs the user out exactly once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::client::{ApiClient, ApiRequest, RequestConfig};
use crate::error::{ApiError, AuthError, ValidationError};
use crate::events::{SubscriptionId, UnauthorizedEvent};
use crate::response::{payload, BinaryFormat, JsonFormat};
use crate::session::{AuthModel, LoginResponse, SessionStore, SessionTokens, UserModel};

const ME_PATH: &str = "auth/me";
const REFRESH_PATH: &str = "auth/refresh";
const LOGOUT_PATH: &str = "auth/logout";

type SignOutHook = Box<dyn Fn(&UnauthorizedEvent) + Send + Sync>;

struct OwnerState {
    store: Arc<dyn SessionStore>,
    user: Mutex<Option<UserModel>>,
    signed_out: AtomicBool,
    sign_outs: AtomicUsize,
    on_sign_out: Option<SignOutHook>,
}

impl OwnerState {
    fn user(&self) -> MutexGuard<'_, Option<UserModel>> {
        self.user.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, event: &UnauthorizedEvent) {
        if self.signed_out.swap(true, Ordering::SeqCst) {
            debug!(reason = ?event.reason, "already signed out, ignoring unauthorized event");
            return;
        }

        info!(reason = ?event.reason, message = ?event.message, "signing out");
        if let Err(e) = self.store.remove() {
            warn!(error = %e, "failed to remove session");
        }
        *self.user() = None;
        self.sign_outs.fetch_add(1, Ordering::SeqCst);

        if let Some(hook) = &self.on_sign_out {
            hook(event);
        }
    }
}

/// Owns the signed-in user and the sign-out reaction.
///
/// ## Examples
///
/// ```rust,ignore
/// use socialdesk_lib::session::SessionOwner;
///
/// let owner = SessionOwner::with_sign_out_hook(client.clone(), |event| {
///     eprintln!("{}", event.message.as_deref().unwrap_or("Signed out"));
/// });
/// let user = owner.login("admin@example.com", "secret").await?;
/// ```
pub struct SessionOwner {
    client: ApiClient,
    state: Arc<OwnerState>,
    subscription: SubscriptionId,
}

impl std::fmt::Debug for SessionOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOwner")
            .field("user", &*self.state.user())
            .field("signed_out", &self.state.signed_out.load(Ordering::SeqCst))
            .field("sign_outs", &self.sign_out_count())
            .finish_non_exhaustive()
    }
}

impl SessionOwner {
    /// Creates an owner that subscribes to `client`'s unauthorized events.
    pub fn new(client: ApiClient) -> Self {
        Self::build(client, None)
    }

    /// Creates an owner that also calls `hook` whenever it signs out because
    /// of an unauthorized event.
    pub fn with_sign_out_hook<F>(client: ApiClient, hook: F) -> Self
    where
        F: Fn(&UnauthorizedEvent) + Send + Sync + 'static,
    {
        Self::build(client, Some(Box::new(hook)))
    }

    fn build(client: ApiClient, on_sign_out: Option<SignOutHook>) -> Self {
        let store = Arc::clone(client.store());
        // A persisted session counts as signed in until an event says otherwise.
        let signed_in = store.get().is_some();
        let state = Arc::new(OwnerState {
            store,
            user: Mutex::new(None),
            signed_out: AtomicBool::new(!signed_in),
            sign_outs: AtomicUsize::new(0),
            on_sign_out,
        });

        let handler_state = Arc::clone(&state);
        let subscription = client
            .events()
            .subscribe(move |event| handler_state.handle(event));

        Self {
            client,
            state,
            subscription,
        }
    }

    /// Signs in with email and password.
    ///
    /// The pipeline persists the returned token bundle; this caches the user.
    /// Unauthorized events raised while the login is in flight, such as the
    /// discard of an expired stored session, do not trigger a sign-out.
    ///
    /// ## Errors
    ///
    /// Returns [`AuthError::AuthenticationFailed`] with the server's message
    /// when the credentials are rejected, or a transport / decoding error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserModel, ApiError> {
        self.state.signed_out.store(true, Ordering::SeqCst);

        match self.exchange_credentials(email, password).await {
            Ok(user) => {
                *self.state.user() = Some(user.clone());
                self.state.signed_out.store(false, Ordering::SeqCst);
                info!(user = %user.display_name(), "signed in");
                Ok(user)
            }
            Err(e) => {
                let signed_out = self.state.store.get().is_none();
                self.state.signed_out.store(signed_out, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn exchange_credentials(&self, email: &str, password: &str) -> Result<UserModel, ApiError> {
        let request = ApiRequest::post(self.client.config().login_url()?)
            .json(&json!({ "email": email, "password": password }))?;
        let response = self.client.send(request).await?;

        if !response.is_success() {
            let body = payload::parse(&response.body);
            return Err(AuthError::AuthenticationFailed {
                message: payload::select_message(body.as_ref(), response.status),
            }
            .into());
        }

        let login: LoginResponse = response.json()?;
        Ok(login.user.ok_or(ValidationError::MissingField {
            record: "login response",
            field: "user",
        })?)
    }

    /// Confirms the stored session with the server and refreshes the cached
    /// user.
    ///
    /// Returns `None` without a request when no live session is stored, and
    /// `None` when the server rejects the session.
    ///
    /// ## Errors
    ///
    /// Returns transport and decoding errors, and non-`401` failures.
    #[instrument(skip(self))]
    pub async fn verify(&self) -> Result<Option<UserModel>, ApiError> {
        if !self.client.has_session() {
            *self.state.user() = None;
            return Ok(None);
        }

        match self
            .client
            .get::<JsonFormat<UserModel>>(ME_PATH, RequestConfig::new())
            .await
        {
            Ok(response) => {
                let user = response.into_data()?;
                *self.state.user() = Some(user.clone());
                self.state.signed_out.store(false, Ordering::SeqCst);
                Ok(Some(user))
            }
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Exchanges the refresh token for a new token bundle and stores it.
    ///
    /// The refresh token is sent as the bearer credential. When the server
    /// does not rotate the refresh token, the current one is kept.
    ///
    /// ## Errors
    ///
    /// - [`AuthError::NotSignedIn`] when no session is stored
    /// - [`AuthError::TokenExpired`] when the access token already expired
    /// - [`AuthError::MissingRefreshToken`] when the session has none
    /// - transport, status and store errors
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<AuthModel, ApiError> {
        let session = self.state.store.get().ok_or(AuthError::NotSignedIn)?;
        if !self.client.has_session() {
            return Err(AuthError::TokenExpired.into());
        }
        let refresh_token = session
            .refresh_token
            .ok_or(AuthError::MissingRefreshToken)?;

        let config =
            RequestConfig::new().header("Authorization", format!("Bearer {refresh_token}"))?;
        let tokens = self
            .client
            .post::<JsonFormat<SessionTokens>>(REFRESH_PATH, config)
            .await?
            .into_data()?;

        let mut model = tokens.to_auth_model();
        if model.refresh_token.is_none() {
            model.refresh_token = Some(refresh_token);
        }
        self.state.store.set(&model)?;
        debug!("session refreshed");
        Ok(model)
    }

    /// Signs out.
    ///
    /// The server is told with a best-effort `POST auth/logout`; its failure
    /// is logged and the local session is cleared regardless. The sign-out
    /// hook is not called.
    ///
    /// ## Errors
    ///
    /// Returns an error only if the stored session cannot be removed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.state.signed_out.store(true, Ordering::SeqCst);

        if self.client.has_session() {
            if let Err(e) = self
                .client
                .post::<BinaryFormat>(LOGOUT_PATH, RequestConfig::new())
                .await
            {
                warn!(error = %e, "logout request failed, clearing local session anyway");
            }
        }

        self.state.store.remove()?;
        *self.state.user() = None;
        info!("signed out");
        Ok(())
    }

    /// Returns the cached user from the last login or verify.
    pub fn current_user(&self) -> Option<UserModel> {
        self.state.user().clone()
    }

    /// Returns `true` when a live session is stored.
    pub fn is_authenticated(&self) -> bool {
        self.client.has_session()
    }

    /// Returns how many times an unauthorized event signed the user out.
    pub fn sign_out_count(&self) -> usize {
        self.state.sign_outs.load(Ordering::SeqCst)
    }

    /// Returns the client this owner signs in with.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl Drop for SessionOwner {
    fn drop(&mut self) {
        self.client.events().unsubscribe(self.subscription);
    }
}
