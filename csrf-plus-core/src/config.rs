use crate::error::ConfigError;
use csrf_plus_store::SecretStore;
use http::HeaderName;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Default cookie carrying the token to the client
pub const DEFAULT_COOKIE_NAME: &str = "CSRF_PLUS_TOKEN";
/// Default cookie carrying the generated session identifier
pub const DEFAULT_COOKIE_SID_NAME: &str = "CSRF_PLUS_SID";
/// Default request header carrying the token
pub const DEFAULT_HEADER_NAME: &str = "x-csrf-plus";
/// Default request header carrying the session identifier
pub const DEFAULT_SESSION_HEADER_NAME: &str = "x-csrf-plus-sid";
/// Default body/query field carrying the token
pub const DEFAULT_FIELD_NAME: &str = "_csrf";
/// Default stored secret lifetime, seconds
pub const DEFAULT_TTL: u64 = 86_400;
/// Default secret length, bytes
pub const DEFAULT_SECRET_LEN: usize = 32;
/// Default stateless token lifetime, milliseconds
pub const DEFAULT_STATELESS_TTL_MS: i64 = 3_600_000;

/// Environment variable marking a production deployment
pub const ENV_VAR: &str = "CSRF_PLUS_ENV";

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// How tokens are bound to the client
#[derive(Clone)]
pub enum Mode {
    /// Synchronizer tokens backed by a per-session secret in a store
    Stateful {
        store: Arc<dyn SecretStore>,
    },
    /// Self-contained HMAC-signed tokens
    Stateless {
        key: Arc<[u8]>,
        ttl_ms: i64,
    },
}

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Stateful { store } => f
                .debug_struct("Stateful")
                .field("store", &store.store_type())
                .finish(),
            Mode::Stateless { ttl_ms, .. } => f
                .debug_struct("Stateless")
                .field("key", &"<redacted>")
                .field("ttl_ms", ttl_ms)
                .finish(),
        }
    }
}

/// CSRF protection configuration.
///
/// Immutable once built; obtain one through [`CsrfConfig::builder`].
#[derive(Debug, Clone)]
pub struct CsrfConfig {
    mode: Mode,
    cookie_name: String,
    cookie_sid_name: String,
    header_name: String,
    session_header_name: String,
    field_name: String,
    ttl: u64,
    secret_len: usize,
    mask: bool,
    origin_check: bool,
    allowed_methods: Vec<String>,
    exclude_paths: Vec<String>,
    cookie_path: String,
    cookie_domain: Option<String>,
    cookie_secure: bool,
    cookie_http_only: bool,
    cookie_same_site: SameSite,
    production: bool,
}

impl CsrfConfig {
    /// Start building a configuration from defaults
    pub fn builder() -> CsrfConfigBuilder {
        CsrfConfigBuilder::new()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_stateless(&self) -> bool {
        matches!(self.mode, Mode::Stateless { .. })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn cookie_sid_name(&self) -> &str {
        &self.cookie_sid_name
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    pub fn session_header_name(&self) -> &str {
        &self.session_header_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Stored secret lifetime in seconds; `0` means no expiry
    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    pub fn secret_len(&self) -> usize {
        self.secret_len
    }

    pub fn mask(&self) -> bool {
        self.mask
    }

    pub fn origin_check(&self) -> bool {
        self.origin_check
    }

    pub fn allowed_methods(&self) -> &[String] {
        &self.allowed_methods
    }

    pub fn exclude_paths(&self) -> &[String] {
        &self.exclude_paths
    }

    pub fn cookie_path(&self) -> &str {
        &self.cookie_path
    }

    pub fn cookie_domain(&self) -> Option<&str> {
        self.cookie_domain.as_deref()
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    pub fn cookie_http_only(&self) -> bool {
        self.cookie_http_only
    }

    pub fn cookie_same_site(&self) -> SameSite {
        self.cookie_same_site
    }

    /// Whether internal failures are kept out of the logs
    pub fn production(&self) -> bool {
        self.production
    }

    /// Whether `method` bypasses verification
    pub fn is_allowed_method(&self, method: &str) -> bool {
        self.allowed_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method))
    }

    /// Whether `path` is excluded from verification
    pub fn is_excluded_path(&self, path: &str) -> bool {
        self.exclude_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Generate a random signing key for stateless mode
    pub fn generate_key() -> Vec<u8> {
        crate::crypto::random_bytes(32)
    }
}

/// Option set as it appears in configuration files.
///
/// Field names follow the camelCase option names. The secret store cannot be
/// deserialized; inject it with [`CsrfConfigBuilder::store`].
///
/// ```
/// use csrf_plus_core::{CsrfConfigBuilder, CsrfOptions};
///
/// let options: CsrfOptions = serde_json::from_str(
///     r#"{"stateless": true, "statelessKey": "0123456789abcdef0123456789abcdef", "statelessTTL": 60000}"#,
/// ).unwrap();
///
/// let config = CsrfConfigBuilder::from_options(options).build().unwrap();
/// assert!(config.is_stateless());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CsrfOptions {
    pub cookie_name: Option<String>,
    pub cookie_sid_name: Option<String>,
    pub header_name: Option<String>,
    pub session_header_name: Option<String>,
    pub field_name: Option<String>,
    pub ttl: Option<u64>,
    pub secret_len: Option<usize>,
    pub mask: Option<bool>,
    pub origin_check: Option<bool>,
    pub allowed_methods: Option<Vec<String>>,
    pub exclude_paths: Option<Vec<String>>,
    pub stateless: Option<bool>,
    pub stateless_key: Option<String>,
    #[serde(rename = "statelessTTL")]
    pub stateless_ttl: Option<i64>,
    pub cookie_path: Option<String>,
    pub cookie_domain: Option<String>,
    pub cookie_secure: Option<bool>,
    pub cookie_http_only: Option<bool>,
    pub cookie_same_site: Option<SameSite>,
    pub production: Option<bool>,
}

/// Builder for [`CsrfConfig`]
#[derive(Clone)]
pub struct CsrfConfigBuilder {
    store: Option<Arc<dyn SecretStore>>,
    stateless: bool,
    stateless_key: Option<Vec<u8>>,
    stateless_ttl_ms: i64,
    cookie_name: String,
    cookie_sid_name: String,
    header_name: String,
    session_header_name: String,
    field_name: String,
    ttl: u64,
    secret_len: usize,
    mask: bool,
    origin_check: bool,
    allowed_methods: Vec<String>,
    exclude_paths: Vec<String>,
    cookie_path: String,
    cookie_domain: Option<String>,
    cookie_secure: bool,
    cookie_http_only: bool,
    cookie_same_site: SameSite,
    production: bool,
}

impl CsrfConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            store: None,
            stateless: false,
            stateless_key: None,
            stateless_ttl_ms: DEFAULT_STATELESS_TTL_MS,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_sid_name: DEFAULT_COOKIE_SID_NAME.to_string(),
            header_name: DEFAULT_HEADER_NAME.to_string(),
            session_header_name: DEFAULT_SESSION_HEADER_NAME.to_string(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            ttl: DEFAULT_TTL,
            secret_len: DEFAULT_SECRET_LEN,
            mask: true,
            origin_check: false,
            allowed_methods: vec!["GET".to_string(), "HEAD".to_string(), "OPTIONS".to_string()],
            exclude_paths: Vec::new(),
            cookie_path: "/".to_string(),
            cookie_domain: None,
            cookie_secure: true,
            cookie_http_only: false,
            cookie_same_site: SameSite::Lax,
            production: false,
        }
    }

    /// Defaults, with the production flag read from `CSRF_PLUS_ENV`
    pub fn from_env() -> Self {
        let production = std::env::var(ENV_VAR)
            .map(|v| is_production_env(&v))
            .unwrap_or(false);
        Self::new().with_production(production)
    }

    /// Defaults overlaid with every option that is set
    pub fn from_options(options: CsrfOptions) -> Self {
        let mut builder = Self::new();

        if let Some(v) = options.cookie_name {
            builder.cookie_name = v;
        }
        if let Some(v) = options.cookie_sid_name {
            builder.cookie_sid_name = v;
        }
        if let Some(v) = options.header_name {
            builder.header_name = v;
        }
        if let Some(v) = options.session_header_name {
            builder.session_header_name = v;
        }
        if let Some(v) = options.field_name {
            builder.field_name = v;
        }
        if let Some(v) = options.ttl {
            builder.ttl = v;
        }
        if let Some(v) = options.secret_len {
            builder.secret_len = v;
        }
        if let Some(v) = options.mask {
            builder.mask = v;
        }
        if let Some(v) = options.origin_check {
            builder.origin_check = v;
        }
        if let Some(v) = options.allowed_methods {
            builder = builder.with_allowed_methods(v);
        }
        if let Some(v) = options.exclude_paths {
            builder.exclude_paths = v;
        }
        if let Some(v) = options.stateless {
            builder.stateless = v;
        }
        if let Some(v) = options.stateless_key {
            builder.stateless_key = Some(v.into_bytes());
        }
        if let Some(v) = options.stateless_ttl {
            builder.stateless_ttl_ms = v;
        }
        if let Some(v) = options.cookie_path {
            builder.cookie_path = v;
        }
        if options.cookie_domain.is_some() {
            builder.cookie_domain = options.cookie_domain;
        }
        if let Some(v) = options.cookie_secure {
            builder.cookie_secure = v;
        }
        if let Some(v) = options.cookie_http_only {
            builder.cookie_http_only = v;
        }
        if let Some(v) = options.cookie_same_site {
            builder.cookie_same_site = v;
        }
        if let Some(v) = options.production {
            builder.production = v;
        }

        builder
    }

    /// Secret store for stateful mode
    pub fn store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Switch to stateless mode, signing tokens with `key`
    pub fn stateless(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.stateless = true;
        self.stateless_key = Some(key.into());
        self
    }

    /// Set stateless token lifetime in milliseconds
    pub fn with_stateless_ttl(mut self, ttl_ms: i64) -> Self {
        self.stateless_ttl_ms = ttl_ms;
        self
    }

    /// Set cookie name
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set session-id cookie name
    pub fn with_cookie_sid_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_sid_name = name.into();
        self
    }

    /// Set header name
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Set session-id header name
    pub fn with_session_header_name(mut self, name: impl Into<String>) -> Self {
        self.session_header_name = name.into();
        self
    }

    /// Set field name
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Set stored secret TTL in seconds
    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl = ttl_seconds;
        self
    }

    /// Set secret length in bytes
    pub fn with_secret_len(mut self, len: usize) -> Self {
        self.secret_len = len;
        self
    }

    /// Enable or disable token masking
    pub fn with_mask(mut self, mask: bool) -> Self {
        self.mask = mask;
        self
    }

    /// Enable or disable the Origin/Referer check
    pub fn with_origin_check(mut self, enabled: bool) -> Self {
        self.origin_check = enabled;
        self
    }

    /// Replace the methods that bypass verification
    pub fn with_allowed_methods(mut self, methods: Vec<String>) -> Self {
        self.allowed_methods = methods.into_iter().map(|m| m.to_ascii_uppercase()).collect();
        self
    }

    /// Set excluded paths
    pub fn with_exclude_paths(mut self, paths: Vec<String>) -> Self {
        self.exclude_paths = paths;
        self
    }

    /// Set cookie path
    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie_path = path.into();
        self
    }

    /// Set cookie domain
    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    /// Set cookie secure flag
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Set HttpOnly on the token cookie
    pub fn with_cookie_http_only(mut self, http_only: bool) -> Self {
        self.cookie_http_only = http_only;
        self
    }

    /// Set cookie SameSite policy
    pub fn with_cookie_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    /// Mark the deployment as production
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<CsrfConfig, ConfigError> {
        let mode = if self.stateless {
            let key = self
                .stateless_key
                .filter(|k| !k.is_empty())
                .ok_or(ConfigError::MissingStatelessKey)?;
            if self.stateless_ttl_ms <= 0 {
                return Err(ConfigError::InvalidTtl(self.stateless_ttl_ms));
            }
            Mode::Stateless {
                key: key.into(),
                ttl_ms: self.stateless_ttl_ms,
            }
        } else {
            let store = self.store.ok_or(ConfigError::MissingStore)?;
            if self.secret_len == 0 {
                return Err(ConfigError::InvalidSecretLength(self.secret_len));
            }
            Mode::Stateful { store }
        };

        validate_cookie_name(&self.cookie_name, "cookie name")?;
        validate_cookie_name(&self.cookie_sid_name, "session cookie name")?;
        validate_header_name(&self.header_name, "header name")?;
        validate_header_name(&self.session_header_name, "session header name")?;
        if self.field_name.is_empty() {
            return Err(ConfigError::InvalidName("field name"));
        }

        Ok(CsrfConfig {
            mode,
            cookie_name: self.cookie_name,
            cookie_sid_name: self.cookie_sid_name,
            header_name: self.header_name,
            session_header_name: self.session_header_name,
            field_name: self.field_name,
            ttl: self.ttl,
            secret_len: self.secret_len,
            mask: self.mask,
            origin_check: self.origin_check,
            allowed_methods: self.allowed_methods,
            exclude_paths: self.exclude_paths,
            cookie_path: self.cookie_path,
            cookie_domain: self.cookie_domain,
            cookie_secure: self.cookie_secure,
            cookie_http_only: self.cookie_http_only,
            cookie_same_site: self.cookie_same_site,
            production: self.production,
        })
    }
}

impl Default for CsrfConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a `CSRF_PLUS_ENV` value names a production deployment
fn is_production_env(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("production") || value.eq_ignore_ascii_case("prod")
}

fn validate_header_name(name: &str, what: &'static str) -> Result<(), ConfigError> {
    HeaderName::from_bytes(name.as_bytes())
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidName(what))
}

fn validate_cookie_name(name: &str, what: &'static str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidName(what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csrf_plus_store::MemoryStore;

    fn store() -> Arc<dyn SecretStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_defaults() {
        let config = CsrfConfig::builder().store(store()).build().unwrap();

        assert!(!config.is_stateless());
        assert_eq!(config.cookie_name(), "CSRF_PLUS_TOKEN");
        assert_eq!(config.cookie_sid_name(), "CSRF_PLUS_SID");
        assert_eq!(config.header_name(), "x-csrf-plus");
        assert_eq!(config.field_name(), "_csrf");
        assert_eq!(config.secret_len(), 32);
        assert!(config.mask());
        assert!(!config.origin_check());
        assert!(config.is_allowed_method("GET"));
        assert!(config.is_allowed_method("head"));
        assert!(config.is_allowed_method("OPTIONS"));
        assert!(!config.is_allowed_method("POST"));
    }

    #[test]
    fn test_stateful_without_store_fails() {
        let result = CsrfConfig::builder().build();
        assert_eq!(result.unwrap_err(), ConfigError::MissingStore);
    }

    #[test]
    fn test_stateless_without_key_fails() {
        let result = CsrfConfigBuilder::from_options(CsrfOptions {
            stateless: Some(true),
            ..Default::default()
        })
        .build();
        assert_eq!(result.unwrap_err(), ConfigError::MissingStatelessKey);

        let result = CsrfConfig::builder().stateless(Vec::new()).build();
        assert_eq!(result.unwrap_err(), ConfigError::MissingStatelessKey);
    }

    #[test]
    fn test_stateless_does_not_need_store() {
        let config = CsrfConfig::builder()
            .stateless(CsrfConfig::generate_key())
            .with_stateless_ttl(5_000)
            .build()
            .unwrap();

        assert!(config.is_stateless());
        assert!(matches!(config.mode(), Mode::Stateless { ttl_ms: 5_000, .. }));
    }

    #[test]
    fn test_invalid_values() {
        let result = CsrfConfig::builder().store(store()).with_secret_len(0).build();
        assert_eq!(result.unwrap_err(), ConfigError::InvalidSecretLength(0));

        let result = CsrfConfig::builder()
            .stateless(b"key".to_vec())
            .with_stateless_ttl(0)
            .build();
        assert_eq!(result.unwrap_err(), ConfigError::InvalidTtl(0));

        let result = CsrfConfig::builder()
            .store(store())
            .with_header_name("bad header")
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidName(_))));

        let result = CsrfConfig::builder()
            .store(store())
            .with_cookie_name("a;b")
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidName(_))));

        let result = CsrfConfig::builder().store(store()).with_field_name("").build();
        assert!(matches!(result, Err(ConfigError::InvalidName(_))));
    }

    #[test]
    fn test_options_from_json() {
        let options: CsrfOptions = serde_json::from_str(
            r#"{
                "cookieName": "_csrf_cookie",
                "headerName": "X-XSRF-TOKEN",
                "fieldName": "token",
                "ttl": 600,
                "secretLen": 24,
                "mask": false,
                "originCheck": true,
                "allowedMethods": ["get", "trace"],
                "cookieSameSite": "Strict"
            }"#,
        )
        .unwrap();

        let config = CsrfConfigBuilder::from_options(options)
            .store(store())
            .build()
            .unwrap();

        assert_eq!(config.cookie_name(), "_csrf_cookie");
        assert_eq!(config.header_name(), "X-XSRF-TOKEN");
        assert_eq!(config.field_name(), "token");
        assert_eq!(config.ttl(), 600);
        assert_eq!(config.secret_len(), 24);
        assert!(!config.mask());
        assert!(config.origin_check());
        assert!(config.is_allowed_method("TRACE"));
        assert!(!config.is_allowed_method("HEAD"));
        assert_eq!(config.cookie_same_site(), SameSite::Strict);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let result = serde_json::from_str::<CsrfOptions>(r#"{"secretLength": 10}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_excluded_paths() {
        let config = CsrfConfig::builder()
            .store(store())
            .with_exclude_paths(vec!["/api/webhook".to_string()])
            .build()
            .unwrap();

        assert!(config.is_excluded_path("/api/webhook/github"));
        assert!(!config.is_excluded_path("/api/submit"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = CsrfConfig::builder()
            .stateless(b"super-secret-signing-key".to_vec())
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_production_env_values() {
        assert!(is_production_env("production"));
        assert!(is_production_env("PRODUCTION"));
        assert!(is_production_env("prod"));
        assert!(is_production_env(" production\n"));

        assert!(!is_production_env(""));
        assert!(!is_production_env("development"));
        assert!(!is_production_env("staging"));
        assert!(!is_production_env("production-like"));
    }

    #[test]
    fn test_same_site_enum() {
        assert_eq!(SameSite::Strict.as_str(), "Strict");
        assert_eq!(SameSite::Lax.as_str(), "Lax");
        assert_eq!(SameSite::None.as_str(), "None");
    }
}
