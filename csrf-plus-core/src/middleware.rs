use crate::config::{CsrfConfig, Mode};
use crate::cookie::{CookieAttributes, CookieSink, render_set_cookie};
use crate::crypto::{constant_time_eq, random_bytes};
use crate::encoding;
use crate::error::{CsrfError, Rejection, Result, VerifyError};
use crate::mask::{mask_token, unmask_token};
use crate::request::CsrfRequest;
use crate::stateless::{create_stateless_token, verify_signed_token};
use chrono::Utc;
use csrf_plus_store::{SecretStore, StoreError};
use futures::FutureExt;
use http::Uri;
use http::uri::Authority;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// A freshly minted token, plus the session it was bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Value to embed in forms or echo in the request header
    pub token: String,
    /// Session key the secret is stored under (stateful mode only)
    pub session_key: Option<String>,
    /// Whether `session_key` was generated by this call and must be sent to
    /// the client in the session-id cookie
    pub new_session: bool,
}

/// Why [`CsrfMiddleware::evaluate`] stopped short of accepting
enum Failure {
    Rejected(Rejection),
    Fault(CsrfError),
}

impl From<Rejection> for Failure {
    fn from(rejection: Rejection) -> Self {
        Failure::Rejected(rejection)
    }
}

impl From<CsrfError> for Failure {
    fn from(error: CsrfError) -> Self {
        Failure::Fault(error)
    }
}

impl From<StoreError> for Failure {
    fn from(error: StoreError) -> Self {
        Failure::Fault(error.into())
    }
}

/// CSRF protection middleware
#[derive(Debug, Clone)]
pub struct CsrfMiddleware {
    config: Arc<CsrfConfig>,
}

impl CsrfMiddleware {
    /// Create new CSRF middleware
    pub fn new(config: CsrfConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// Check if request needs CSRF protection
    pub fn needs_protection<R: CsrfRequest + ?Sized>(&self, request: &R) -> bool {
        !self.config.is_allowed_method(request.method())
            && !self.config.is_excluded_path(request.path())
    }

    /// Mint a token for the request.
    ///
    /// Stateless mode signs a fresh token on every call. Stateful mode
    /// resolves the session key (generating one if the request carries none),
    /// reuses the stored secret or provisions a new one, and encodes it.
    pub async fn generate_token<R: CsrfRequest + ?Sized>(&self, request: &R) -> Result<IssuedToken> {
        match self.config.mode() {
            Mode::Stateless { key, ttl_ms } => Ok(IssuedToken {
                token: create_stateless_token(*ttl_ms, key)?,
                session_key: None,
                new_session: false,
            }),
            Mode::Stateful { store } => {
                let (session_key, new_session) = match self.session_key(request) {
                    Some(key) => (key, false),
                    None => (generate_session_id(), true),
                };

                let secret = self.provision_secret(store.as_ref(), &session_key).await?;
                let token = if self.config.mask() {
                    mask_token(&secret)
                } else {
                    encoding::encode(&secret)
                };

                Ok(IssuedToken {
                    token,
                    session_key: Some(session_key),
                    new_session,
                })
            }
        }
    }

    /// `Set-Cookie` value delivering the token to the client
    pub fn token_cookie(&self, issued: &IssuedToken) -> String {
        let attrs = CookieAttributes {
            http_only: self.config.cookie_http_only(),
            ..self.cookie_attributes()
        };
        render_set_cookie(self.config.cookie_name(), &issued.token, &attrs)
    }

    /// `Set-Cookie` value for a session key generated while minting
    pub fn session_cookie(&self, issued: &IssuedToken) -> Option<String> {
        if !issued.new_session {
            return None;
        }
        let session_key = issued.session_key.as_deref()?;

        let ttl = self.config.ttl();
        let attrs = CookieAttributes {
            http_only: true,
            max_age: (ttl > 0).then_some(ttl),
            ..self.cookie_attributes()
        };
        Some(render_set_cookie(
            self.config.cookie_sid_name(),
            session_key,
            &attrs,
        ))
    }

    /// Write the token cookie, and the session-id cookie when one was
    /// generated. Failures are logged and swallowed.
    pub fn deliver<S: CookieSink + ?Sized>(&self, issued: &IssuedToken, sink: &mut S) {
        let cookies = std::iter::once(self.token_cookie(issued)).chain(self.session_cookie(issued));

        for cookie in cookies {
            if let Err(e) = sink.append_set_cookie(cookie) {
                if !self.config.production() {
                    warn!(error = %e, "Failed to set CSRF cookie");
                }
            }
        }
    }

    /// Validate CSRF token from request
    pub async fn validate_request<R: CsrfRequest + ?Sized>(
        &self,
        request: &R,
    ) -> std::result::Result<(), VerifyError> {
        if !self.needs_protection(request) {
            trace!(method = %request.method(), path = %request.path(), "CSRF check bypassed");
            return Ok(());
        }

        let outcome = AssertUnwindSafe(self.evaluate(request))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {
                trace!(path = %request.path(), "CSRF token accepted");
                Ok(())
            }
            Ok(Err(Failure::Rejected(rejection))) => {
                debug!(reason = rejection.code(), "CSRF request rejected");
                Err(VerifyError::Rejected(rejection))
            }
            Ok(Err(Failure::Fault(e))) => {
                if !self.config.production() {
                    error!(error = %e, "CSRF validation failed");
                }
                Err(VerifyError::Internal)
            }
            Err(_) => {
                if !self.config.production() {
                    error!("CSRF validation panicked");
                }
                Err(VerifyError::Internal)
            }
        }
    }

    /// Delete the secret bound to the request's session, forcing a re-mint.
    ///
    /// Returns `false` when there is nothing to revoke: stateless mode, or no
    /// resolvable session.
    pub async fn revoke<R: CsrfRequest + ?Sized>(&self, request: &R) -> Result<bool> {
        let Mode::Stateful { store } = self.config.mode() else {
            return Ok(false);
        };
        let Some(session_key) = self.session_key(request) else {
            return Ok(false);
        };

        store.del(&session_key).await?;
        debug!("CSRF secret revoked");
        Ok(true)
    }

    async fn evaluate<R: CsrfRequest + ?Sized>(&self, request: &R) -> std::result::Result<(), Failure> {
        if self.config.origin_check() {
            self.check_origin(request)?;
        }

        let token = self.extract_token(request).ok_or(Rejection::TokenMissing)?;

        match self.config.mode() {
            Mode::Stateless { key, .. } => Ok(Self::verify_stateless(&token, key)?),
            Mode::Stateful { store } => self.verify_stateful(request, store.as_ref(), &token).await,
        }
    }

    fn check_origin<R: CsrfRequest + ?Sized>(&self, request: &R) -> std::result::Result<(), Rejection> {
        let expected = request
            .host()
            .and_then(|h| h.parse::<Authority>().ok())
            .map(|a| a.host().to_ascii_lowercase());

        let claimed = request
            .header("origin")
            .and_then(origin_host)
            .or_else(|| request.header("referer").and_then(origin_host));

        match (expected, claimed) {
            (Some(expected), Some(claimed)) if expected == claimed => Ok(()),
            _ => Err(Rejection::OriginMismatch),
        }
    }

    fn extract_token<R: CsrfRequest + ?Sized>(&self, request: &R) -> Option<String> {
        let field = self.config.field_name();

        request
            .header(self.config.header_name())
            .map(str::to_string)
            .filter(|t| !t.is_empty())
            .or_else(|| request.body_field(field).filter(|t| !t.is_empty()))
            .or_else(|| request.query_param(field).filter(|t| !t.is_empty()))
    }

    fn session_key<R: CsrfRequest + ?Sized>(&self, request: &R) -> Option<String> {
        request
            .session_id()
            .filter(|k| !k.is_empty())
            .or_else(|| {
                request
                    .header(self.config.session_header_name())
                    .filter(|k| !k.is_empty())
            })
            .map(str::to_string)
            .or_else(|| {
                request
                    .cookie(self.config.cookie_sid_name())
                    .filter(|k| !k.is_empty())
            })
    }

    fn verify_stateless(token: &str, key: &[u8]) -> std::result::Result<(), Rejection> {
        let payload = verify_signed_token(token, key)
            .into_payload()
            .ok_or(Rejection::TokenInvalid)?;

        if let Some(exp) = payload.get("exp") {
            let exp = exp.as_f64().ok_or(Rejection::TokenInvalid)?;
            if Utc::now().timestamp_millis() as f64 > exp {
                return Err(Rejection::TokenExpired);
            }
        }

        Ok(())
    }

    async fn verify_stateful<R: CsrfRequest + ?Sized>(
        &self,
        request: &R,
        store: &dyn SecretStore,
        token: &str,
    ) -> std::result::Result<(), Failure> {
        let session_key = self.session_key(request).ok_or(Rejection::SessionMissing)?;

        let stored = store
            .get(&session_key)
            .await?
            .ok_or(Rejection::SecretMissing)?;
        let secret = encoding::decode(&stored).map_err(CsrfError::from)?;

        let candidate = if self.config.mask() {
            unmask_token(token)
        } else {
            encoding::decode(token)
        }
        .map_err(|_| Rejection::TokenMalformed)?;

        if candidate.len() != secret.len() {
            return Err(Rejection::LengthMismatch.into());
        }

        if !constant_time_eq(&candidate, &secret) {
            return Err(Rejection::ValueMismatch.into());
        }

        Ok(())
    }

    async fn provision_secret(&self, store: &dyn SecretStore, session_key: &str) -> Result<Vec<u8>> {
        let secret_len = self.config.secret_len();

        let existing = store
            .get(session_key)
            .await?
            .and_then(|stored| encoding::decode(&stored).ok())
            .filter(|secret| secret.len() == secret_len);

        if let Some(secret) = existing {
            return Ok(secret);
        }

        let secret = random_bytes(secret_len);
        store
            .set(session_key, encoding::encode(&secret), self.config.ttl())
            .await?;
        debug!(store = store.store_type(), "Provisioned CSRF secret");

        Ok(secret)
    }

    fn cookie_attributes(&self) -> CookieAttributes {
        CookieAttributes {
            path: self.config.cookie_path().to_string(),
            domain: self.config.cookie_domain().map(str::to_string),
            secure: self.config.cookie_secure(),
            http_only: false,
            same_site: self.config.cookie_same_site(),
            max_age: None,
        }
    }
}

/// Generate a new random session identifier
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Host component of an absolute `Origin` or `Referer` value
fn origin_host(value: &str) -> Option<String> {
    let uri = value.trim().parse::<Uri>().ok()?;
    uri.scheme()?;
    uri.host().map(|h| h.to_ascii_lowercase())
}
