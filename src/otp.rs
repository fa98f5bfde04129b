//! OTP/TOTP Generator
//!
//! Time-based one-time passwords in the Google Authenticator style
//! (HMAC-SHA1, 30-second windows) plus simple random codes with a fixed
//! expiry. All codes are six decimal digits.
//!
//! The TOTP secret is used as raw bytes; base32-encoded secrets must be
//! decoded by the caller first.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::error::{KeymatchError, KeymatchResult};

type HmacSha1 = Hmac<Sha1>;

/// Default TOTP window length in seconds
pub const DEFAULT_TIME_STEP: u64 = 30;

/// Windows of clock drift tolerated on each side during validation
pub const DEFAULT_DRIFT_WINDOW: u64 = 1;

/// Lifetime of a simple code in seconds
pub const SIMPLE_OTP_TTL_SECS: i64 = 300;

lazy_static! {
    static ref CODE_PATTERN: Regex = Regex::new(r"^[0-9]{6}$").expect("static pattern");
}

/// A randomly generated code with its expiry.
///
/// Expiry enforcement is the caller's job; see `store::OtpStore` for the
/// in-memory variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Normalize a submitted code: trim whitespace and require exactly six
/// ASCII digits. Returns `None` for anything else.
pub fn normalize_code(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if CODE_PATTERN.is_match(trimmed) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Generate a TOTP for the current time window.
///
/// Rejects an empty secret, which would otherwise key the HMAC with an
/// empty byte sequence and produce a predictable code.
pub fn generate_totp(secret: &str, time_step: u64) -> KeymatchResult<String> {
    generate_totp_at(secret, time_step, unix_now())
}

/// Generate a TOTP for the window containing `unix_secs`.
///
/// Pure function of (secret, time_step, unix_secs); exposed so validation
/// and tests can pin the clock.
pub fn generate_totp_at(secret: &str, time_step: u64, unix_secs: u64) -> KeymatchResult<String> {
    if secret.is_empty() {
        return Err(KeymatchError::InvalidSecret(
            "secret must not be empty".to_string(),
        ));
    }
    let counter = unix_secs / time_step.max(1);
    hotp(secret.as_bytes(), counter)
}

/// Check a submitted code against the current window and `window` windows
/// on either side (2*window + 1 candidates). Returns `false` for
/// malformed codes or an empty secret; never fails.
pub fn validate_totp(code: &str, secret: &str, time_step: u64, window: u64) -> bool {
    validate_totp_at(code, secret, time_step, window, unix_now())
}

/// Drift-window validation with a pinned clock.
pub fn validate_totp_at(
    code: &str,
    secret: &str,
    time_step: u64,
    window: u64,
    unix_secs: u64,
) -> bool {
    let code = match normalize_code(code) {
        Some(c) => c,
        None => return false,
    };
    if secret.is_empty() {
        warn!("TOTP validation attempted with an empty secret");
        return false;
    }

    let counter = (unix_secs / time_step.max(1)) as i64;
    let window = window as i64;

    for drift in -window..=window {
        let candidate_counter = counter + drift;
        if candidate_counter < 0 {
            continue;
        }
        if let Ok(candidate) = hotp(secret.as_bytes(), candidate_counter as u64) {
            if constant_time_eq(candidate.as_bytes(), code.as_bytes()) {
                return true;
            }
        }
    }

    false
}

/// Derive a stable per-user secret from the user id and the server-wide
/// secret: base64(SHA-256("{user_id}:{server_secret}")) truncated to 32
/// characters.
///
/// Deterministic, so nothing needs to be stored per user. The trade-off is
/// rotation: changing the server secret invalidates every derived secret
/// at once.
pub fn generate_user_secret(user_id: &str, server_secret: &str) -> String {
    let combined = format!("{}:{}", user_id, server_secret);
    let digest = Sha256::digest(combined.as_bytes());
    let mut encoded = BASE64.encode(digest);
    encoded.truncate(32);
    encoded
}

/// Generate a random 6-digit code expiring in five minutes.
///
/// Codes are drawn from 100000..=999999, so they are always six digits
/// without padding.
pub fn generate_simple_otp() -> SimpleOtp {
    let mut rng = rand::thread_rng();
    let code: u32 = rng.gen_range(100_000..=999_999);
    SimpleOtp {
        code: code.to_string(),
        expires_at: Utc::now() + Duration::seconds(SIMPLE_OTP_TTL_SECS),
    }
}

/// RFC 4226 HOTP: HMAC-SHA1 over the big-endian counter, dynamic
/// truncation to 31 bits, reduced modulo 10^6 and zero-padded.
fn hotp(secret: &[u8], counter: u64) -> KeymatchResult<String> {
    let mut mac = HmacSha1::new_from_slice(secret)
        .map_err(|e| KeymatchError::InvalidSecret(e.to_string()))?;
    mac.update(&counter.to_be_bytes());
    let hash = mac.finalize().into_bytes();

    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let binary = ((hash[offset] & 0x7f) as u32) << 24
        | (hash[offset + 1] as u32) << 16
        | (hash[offset + 2] as u32) << 8
        | hash[offset + 3] as u32;

    Ok(format!("{:06}", binary % 1_000_000))
}

// Comparison that does not short-circuit on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
