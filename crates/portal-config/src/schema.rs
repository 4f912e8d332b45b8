// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for the portal.
//!
//! Every section is optional in the file and falls back to its defaults,
//! except the session token secret which must be provided before the
//! configuration validates.
//!
//! # Schema Structure
//!
//! ```text
//! PortalConfig
//! ├── server: ServerConfig
//! │   └── cors: CorsConfig
//! ├── security: SecurityConfig
//! │   ├── jwt: JwtConfig
//! │   ├── rate_limit: RateLimitConfig
//! │   └── audit: AuditConfig
//! ├── sso: SsoConfig
//! ├── ai: AiConfig
//! ├── matching: MatchingConfig
//! └── logging: LoggingConfig
//! ```

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Default API port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default session token lifetime in seconds (1 hour).
pub const DEFAULT_JWT_EXPIRATION_SECS: u64 = 3600;

/// Secrets shorter than this are accepted with a warning.
pub const RECOMMENDED_SECRET_LENGTH: usize = 32;

/// Default number of requests allowed per rate-limit window.
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 30;

/// Default rate-limit window in seconds.
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Default minimum student identifier length.
pub const DEFAULT_STUDENT_MIN_LENGTH: usize = 10;

/// Default minimum staff identifier length.
pub const DEFAULT_STAFF_MIN_LENGTH: usize = 8;

/// Signing algorithms accepted for SSO identity tokens.
pub const SUPPORTED_SSO_ALGORITHMS: &[&str] = &[
    "RS256", "RS384", "RS512", "PS256", "PS384", "PS512", "ES256", "ES384",
];

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration structure for the portal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortalConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Security configuration.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Single sign-on configuration.
    #[serde(default)]
    pub sso: SsoConfig,

    /// AI proxy configuration.
    #[serde(default)]
    pub ai: AiConfig,

    /// Identity matching configuration.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PortalConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.security.validate()?;
        self.sso.validate()?;
        self.ai.validate()?;
        self.matching.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Returns non-fatal findings worth logging at startup.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(secret) = &self.security.jwt.secret {
            if secret.len() < RECOMMENDED_SECRET_LENGTH {
                warnings.push(format!(
                    "security.jwt.secret is shorter than {} bytes",
                    RECOMMENDED_SECRET_LENGTH
                ));
            }
        }
        if !self.security.rate_limit.enabled {
            warnings.push("security.rate_limit is disabled".to_string());
        }
        if self.server.environment.is_development() {
            warnings.push(
                "development environment: AI and audit endpoints accept anonymous callers"
                    .to_string(),
            );
        }
        warnings
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production: every non-public endpoint requires a session.
    #[default]
    Production,
    /// Development: the AI and audit endpoints are reachable anonymously.
    Development,
}

impl Environment {
    /// Returns `true` for the production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Returns `true` for the development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    /// Returns the environment name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(ConfigError::validation(
                "server.environment",
                format!("unknown environment '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    2 * 1024 * 1024 // 2MB
}

impl ServerConfig {
    /// Validates the server configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout_secs",
                "cannot be zero",
            ));
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::validation(
                "server.max_body_size",
                "cannot be zero",
            ));
        }
        self.cors.validate()?;
        Ok(())
    }

    /// Returns the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: DEFAULT_PORT,
            environment: Environment::default(),
            request_timeout_secs: default_request_timeout(),
            max_body_size: default_max_body_size(),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins (use "*" for all).
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Allowed methods.
    #[serde(default = "default_methods")]
    pub allowed_methods: Vec<String>,

    /// Allowed headers.
    #[serde(default = "default_headers")]
    pub allowed_headers: Vec<String>,

    /// Allow credentials.
    #[serde(default)]
    pub allow_credentials: bool,

    /// Max age in seconds.
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

fn default_methods() -> Vec<String> {
    vec![
        "GET".to_string(),
        "POST".to_string(),
        "PUT".to_string(),
        "DELETE".to_string(),
    ]
}

fn default_headers() -> Vec<String> {
    vec!["Content-Type".to_string(), "Authorization".to_string()]
}

fn default_max_age() -> u64 {
    3600
}

impl CorsConfig {
    /// Validates the CORS configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.allow_credentials && self.allowed_origins.iter().any(|o| o == "*") {
            return Err(ConfigError::validation(
                "server.cors.allowed_origins",
                "wildcard origin cannot be combined with allow_credentials",
            ));
        }
        Ok(())
    }

    /// Returns `true` if any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: default_methods(),
            allowed_headers: default_headers(),
            allow_credentials: false,
            max_age_secs: default_max_age(),
        }
    }
}

// =============================================================================
// Security Configuration
// =============================================================================

/// Security configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Session token configuration.
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Rate limiting configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Audit trail configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl SecurityConfig {
    /// Validates the security configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.jwt.validate()?;
        self.rate_limit.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}

/// Session token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JwtConfig {
    /// HMAC secret used to sign session tokens.
    #[serde(default)]
    pub secret: Option<SecretValue>,

    /// Token issuer.
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,

    /// Token lifetime in seconds.
    #[serde(default = "default_jwt_expiration")]
    pub expiration_secs: u64,

    /// Clock skew tolerance in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

fn default_jwt_issuer() -> String {
    "portal".to_string()
}

fn default_jwt_expiration() -> u64 {
    DEFAULT_JWT_EXPIRATION_SECS
}

fn default_leeway() -> u64 {
    30
}

impl JwtConfig {
    /// Validates the session token configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        match &self.secret {
            None => return Err(ConfigError::missing_field("security.jwt.secret")),
            Some(secret) if secret.is_empty() => {
                return Err(ConfigError::validation(
                    "security.jwt.secret",
                    "cannot be empty",
                ))
            }
            Some(_) => {}
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::validation("security.jwt.issuer", "cannot be empty"));
        }
        if self.expiration_secs == 0 {
            return Err(ConfigError::validation(
                "security.jwt.expiration_secs",
                "cannot be zero",
            ));
        }
        Ok(())
    }

    /// Returns the expiration as a Duration.
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            issuer: default_jwt_issuer(),
            expiration_secs: DEFAULT_JWT_EXPIRATION_SECS,
            leeway_secs: default_leeway(),
        }
    }
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests allowed per key within one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds.
    #[serde(default = "default_window")]
    pub window_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_requests() -> u32 {
    DEFAULT_RATE_LIMIT_MAX_REQUESTS
}

fn default_window() -> u64 {
    DEFAULT_RATE_LIMIT_WINDOW_SECS
}

impl RateLimitConfig {
    /// Validates the rate limit configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.enabled && self.max_requests == 0 {
            return Err(ConfigError::validation(
                "security.rate_limit.max_requests",
                "cannot be zero when rate limiting is enabled",
            ));
        }
        if self.enabled && self.window_secs == 0 {
            return Err(ConfigError::validation(
                "security.rate_limit.window_secs",
                "cannot be zero when rate limiting is enabled",
            ));
        }
        Ok(())
    }

    /// Returns the window as a Duration.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

/// Audit trail configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Whether audit entries are recorded.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entries retained by the in-memory trail.
    #[serde(default = "default_audit_entries")]
    pub max_entries: usize,
}

fn default_audit_entries() -> usize {
    10_000
}

impl AuditConfig {
    /// Validates the audit configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.enabled && self.max_entries == 0 {
            return Err(ConfigError::validation(
                "security.audit.max_entries",
                "cannot be zero when audit is enabled",
            ));
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_audit_entries(),
        }
    }
}

// =============================================================================
// SSO Configuration
// =============================================================================

/// Federated identity provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SsoConfig {
    /// Whether SSO login is offered.
    #[serde(default)]
    pub enabled: bool,

    /// Expected `iss` claim.
    #[serde(default)]
    pub issuer: String,

    /// Expected `aud` claim.
    #[serde(default)]
    pub audience: String,

    /// JWKS endpoint of the identity provider.
    #[serde(default)]
    pub jwks_url: String,

    /// Accepted signing algorithms.
    #[serde(default = "default_sso_algorithms")]
    pub algorithms: Vec<String>,

    /// Claim carrying the provider-side role, if any.
    #[serde(default = "default_role_claim")]
    pub role_claim: String,

    /// Claim carrying the display name.
    #[serde(default = "default_name_claim")]
    pub name_claim: String,

    /// Timeout for JWKS fetches in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// How long a fetched key set stays fresh, in seconds. `0` keeps it for
    /// the process lifetime; an unknown key id still forces one refresh.
    #[serde(default = "default_jwks_ttl")]
    pub jwks_cache_ttl_secs: u64,
}

fn default_sso_algorithms() -> Vec<String> {
    vec!["RS256".to_string()]
}

fn default_role_claim() -> String {
    "role".to_string()
}

fn default_name_claim() -> String {
    "name".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

fn default_jwks_ttl() -> u64 {
    0
}

impl SsoConfig {
    /// Validates the SSO configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::missing_field("sso.issuer"));
        }
        if self.audience.trim().is_empty() {
            return Err(ConfigError::missing_field("sso.audience"));
        }
        if !self.jwks_url.starts_with("http://") && !self.jwks_url.starts_with("https://") {
            return Err(ConfigError::validation(
                "sso.jwks_url",
                "must be an http(s) URL",
            ));
        }
        if self.algorithms.is_empty() {
            return Err(ConfigError::validation(
                "sso.algorithms",
                "at least one algorithm is required",
            ));
        }
        for alg in &self.algorithms {
            if !SUPPORTED_SSO_ALGORITHMS.contains(&alg.as_str()) {
                return Err(ConfigError::validation(
                    "sso.algorithms",
                    format!("unsupported algorithm '{}'", alg),
                ));
            }
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "sso.http_timeout_secs",
                "cannot be zero",
            ));
        }
        Ok(())
    }

    /// Returns the JWKS fetch timeout as a Duration.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Returns the key set freshness, or `None` when it never expires.
    pub fn jwks_cache_ttl(&self) -> Option<Duration> {
        (self.jwks_cache_ttl_secs > 0).then(|| Duration::from_secs(self.jwks_cache_ttl_secs))
    }
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            issuer: String::new(),
            audience: String::new(),
            jwks_url: String::new(),
            algorithms: default_sso_algorithms(),
            role_claim: default_role_claim(),
            name_claim: default_name_claim(),
            http_timeout_secs: default_http_timeout(),
            jwks_cache_ttl_secs: default_jwks_ttl(),
        }
    }
}

// =============================================================================
// AI Proxy Configuration
// =============================================================================

/// Upstream generative-AI proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AiConfig {
    /// Whether the proxy endpoint is served.
    #[serde(default)]
    pub enabled: bool,

    /// Upstream endpoint the request body is forwarded to.
    #[serde(default)]
    pub upstream_url: String,

    /// Upstream API key, sent as `x-goog-api-key`.
    #[serde(default)]
    pub api_key: Option<SecretValue>,

    /// Model name appended to the upstream path.
    #[serde(default = "default_model")]
    pub model: String,

    /// Upstream timeout in seconds.
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_ai_timeout() -> u64 {
    30
}

impl AiConfig {
    /// Validates the AI proxy configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if !self.upstream_url.starts_with("http://") && !self.upstream_url.starts_with("https://")
        {
            return Err(ConfigError::validation(
                "ai.upstream_url",
                "must be an http(s) URL",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::validation("ai.model", "cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::validation("ai.timeout_secs", "cannot be zero"));
        }
        Ok(())
    }

    /// Returns the upstream timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the full upstream URL for content generation.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.upstream_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            upstream_url: String::new(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_ai_timeout(),
        }
    }
}

// =============================================================================
// Matching Configuration
// =============================================================================

/// Identity matching thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    /// Minimum trimmed length of a student identifier.
    #[serde(default = "default_student_min")]
    pub student_min_length: usize,

    /// Minimum trimmed length of a staff identifier.
    #[serde(default = "default_staff_min")]
    pub staff_min_length: usize,
}

fn default_student_min() -> usize {
    DEFAULT_STUDENT_MIN_LENGTH
}

fn default_staff_min() -> usize {
    DEFAULT_STAFF_MIN_LENGTH
}

impl MatchingConfig {
    /// Validates the matching configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.student_min_length == 0 {
            return Err(ConfigError::validation(
                "matching.student_min_length",
                "cannot be zero",
            ));
        }
        if self.staff_min_length == 0 {
            return Err(ConfigError::validation(
                "matching.staff_min_length",
                "cannot be zero",
            ));
        }
        Ok(())
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            student_min_length: DEFAULT_STUDENT_MIN_LENGTH,
            staff_min_length: DEFAULT_STAFF_MIN_LENGTH,
        }
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Validates the logging configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the level as an `EnvFilter` directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parses a level name, accepting `warning` for `warn`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Text,
    /// Compact single-line format.
    Compact,
    /// JSON format for log shippers.
    Json,
}

impl LogFormat {
    /// Returns the format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

// =============================================================================
// Secret Value
// =============================================================================

/// A secret string that never prints its contents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Creates a new secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the secret length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PortalConfig {
        let mut config = PortalConfig::default();
        config.security.jwt.secret = Some(SecretValue::new("0123456789abcdef0123456789abcdef"));
        config
    }

    #[test]
    fn test_portal_config_default() {
        let config = PortalConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.environment.is_production());
        assert_eq!(config.security.jwt.issuer, "portal");
        assert_eq!(config.security.rate_limit.max_requests, 30);
        assert_eq!(config.security.rate_limit.window_secs, 60);
        assert_eq!(config.matching.student_min_length, 10);
        assert_eq!(config.matching.staff_min_length, 8);
        assert_eq!(config.sso.algorithms, vec!["RS256".to_string()]);
    }

    #[test]
    fn test_secret_required() {
        let config = PortalConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { .. })
        ));
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_warns() {
        let mut config = valid_config();
        assert!(config.warnings().is_empty());

        config.security.jwt.secret = Some(SecretValue::new("short"));
        assert!(config.validate().is_ok());
        assert!(config.warnings().iter().any(|w| w.contains("shorter")));
    }

    #[test]
    fn test_sso_validation() {
        let mut config = valid_config();
        config.sso.enabled = true;
        assert!(config.validate().is_err());

        config.sso.issuer = "https://accounts.example.com".to_string();
        config.sso.audience = "portal-web".to_string();
        config.sso.jwks_url = "https://accounts.example.com/jwks".to_string();
        assert!(config.validate().is_ok());

        config.sso.algorithms = vec!["HS256".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limit_validation() {
        let mut config = valid_config();
        config.security.rate_limit.window_secs = 0;
        assert!(config.validate().is_err());

        config.security.rate_limit.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cors_wildcard_with_credentials() {
        let mut config = valid_config();
        config.server.cors.allowed_origins = vec!["*".to_string()];
        config.server.cors.allow_credentials = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!(
            "Production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_ai_endpoint() {
        let ai = AiConfig {
            enabled: true,
            upstream_url: "https://ai.example.com/v1beta/".to_string(),
            ..AiConfig::default()
        };
        assert_eq!(
            ai.endpoint(),
            "https://ai.example.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_secret_value_redacted() {
        let secret = SecretValue::new("super-secret");
        assert_eq!(format!("{}", secret), "***");
        assert!(!format!("{:?}", secret).contains("super"));
        assert_eq!(secret.expose(), "super-secret");
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
    }
}
