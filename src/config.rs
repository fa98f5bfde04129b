//! OTP Configuration
//!
//! Server-wide settings for code generation and validation. The server
//! secret should come from the environment in production; the built-in
//! default exists for development only.

use serde::{Deserialize, Serialize};

use crate::error::KeymatchResult;
use crate::otp::{self, DEFAULT_DRIFT_WINDOW, DEFAULT_TIME_STEP, SIMPLE_OTP_TTL_SECS};

/// Environment variable overriding the server-wide secret
pub const SERVER_SECRET_ENV: &str = "OTP_SERVER_SECRET";

const DEFAULT_SERVER_SECRET: &str = "keymatch-otp-secret-change-in-production";

/// OTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    /// Server-wide secret mixed into every derived user secret. Rotating
    /// it invalidates all derived secrets at once.
    #[serde(default = "default_server_secret")]
    pub server_secret: String,

    /// TOTP window length in seconds
    #[serde(default = "default_time_step")]
    pub time_step: u64,

    /// Windows of clock drift tolerated on each side
    #[serde(default = "default_drift_window")]
    pub drift_window: u64,

    /// Simple-code lifetime in seconds
    #[serde(default = "default_code_ttl")]
    pub code_ttl_secs: i64,
}

fn default_server_secret() -> String {
    std::env::var(SERVER_SECRET_ENV).unwrap_or_else(|_| DEFAULT_SERVER_SECRET.to_string())
}

fn default_time_step() -> u64 {
    DEFAULT_TIME_STEP
}

fn default_drift_window() -> u64 {
    DEFAULT_DRIFT_WINDOW
}

fn default_code_ttl() -> i64 {
    SIMPLE_OTP_TTL_SECS
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            server_secret: default_server_secret(),
            time_step: DEFAULT_TIME_STEP,
            drift_window: DEFAULT_DRIFT_WINDOW,
            code_ttl_secs: SIMPLE_OTP_TTL_SECS,
        }
    }
}

impl OtpConfig {
    /// Build a config from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Derive the stable secret for `user_id`
    pub fn user_secret(&self, user_id: &str) -> String {
        otp::generate_user_secret(user_id, &self.server_secret)
    }

    /// Generate a TOTP for `user_id` with this config's time step
    pub fn totp_for(&self, user_id: &str) -> KeymatchResult<String> {
        otp::generate_totp(&self.user_secret(user_id), self.time_step)
    }

    /// Validate a submitted TOTP for `user_id` with this config's time
    /// step and drift window
    pub fn validate_totp_for(&self, user_id: &str, code: &str) -> bool {
        otp::validate_totp(
            code,
            &self.user_secret(user_id),
            self.time_step,
            self.drift_window,
        )
    }
}
