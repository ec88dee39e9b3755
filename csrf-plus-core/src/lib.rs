//! # csrf-plus core
//!
//! Anti-forgery token issuance and verification.
//!
//! ## Features
//!
//! - **Synchronizer tokens** - per-session secret held in a [`SecretStore`](csrf_plus_store::SecretStore)
//! - **Masking** - a fresh random pad on every render, same secret underneath
//! - **Stateless tokens** - HMAC-SHA256 signed `iat`/`exp` payloads, no storage
//! - **Origin defense** - optional `Origin`/`Referer` host check
//! - **Configurable** - cookie, header and field names, bypass methods, excluded paths
//!
//! ## Quick Start
//!
//! ```rust
//! use csrf_plus_core::{CsrfConfig, CsrfMiddleware, RequestInfo};
//! use csrf_plus_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CsrfConfig::builder()
//!     .store(Arc::new(MemoryStore::new()))
//!     .build()?;
//! let csrf = CsrfMiddleware::new(config);
//!
//! // Form render: mint a token for the session
//! let form = RequestInfo::new("GET", "/form").with_session_id("session-1");
//! let issued = csrf.generate_token(&form).await?;
//!
//! // Form submit: the token comes back in the body
//! let submit = RequestInfo::new("POST", "/form")
//!     .with_session_id("session-1")
//!     .with_body(format!("_csrf={}", issued.token));
//! csrf.validate_request(&submit).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Stateless Mode
//!
//! ```rust
//! use csrf_plus_core::{CsrfConfig, CsrfMiddleware, RequestInfo};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CsrfConfig::builder()
//!     .stateless(CsrfConfig::generate_key())
//!     .with_stateless_ttl(15 * 60 * 1000)
//!     .build()?;
//! let csrf = CsrfMiddleware::new(config);
//!
//! let issued = csrf.generate_token(&RequestInfo::new("GET", "/")).await?;
//! let submit = RequestInfo::new("POST", "/").with_header("x-csrf-plus", issued.token);
//! csrf.validate_request(&submit).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod cookie;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod mask;
pub mod middleware;
pub mod request;
pub mod stateless;

pub use config::{CsrfConfig, CsrfConfigBuilder, CsrfOptions, Mode, SameSite};
pub use cookie::{CookieAttributes, CookieSink};
pub use error::{
    CodecError, ConfigError, CookieError, CsrfError, Rejection, Result, VerifyError,
};
pub use mask::{mask_token, unmask_token};
pub use middleware::{CsrfMiddleware, IssuedToken, generate_session_id};
pub use request::{CsrfRequest, RequestInfo};
pub use stateless::{
    SignatureCheck, StatelessClaims, create_stateless_token, create_stateless_token_with_claims,
    sign_payload, verify_signed_token,
};
