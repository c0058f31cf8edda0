use chrono::Duration;

/// Default lifetime of an access token when the caller does not pick one.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;

/// Runtime configuration for token issuance and verification.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Lifetime applied by the issuer when no explicit duration is given.
    pub default_ttl: Duration,
    /// Allowable clock skew in seconds when validating exp. Zero by default.
    pub leeway_seconds: u64,
}

impl JwtConfig {
    pub fn new() -> Self {
        Self {
            default_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            leeway_seconds: 0,
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::new()
    }
}
