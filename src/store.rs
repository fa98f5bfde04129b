//! OTP Code Store
//!
//! In-memory store of issued simple codes, one live code per user.
//! Redeeming a code consumes it; expired entries are rejected and removed
//! on contact. Durable persistence stays with the caller.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{KeymatchError, KeymatchResult};
use crate::otp::{generate_simple_otp, normalize_code, SimpleOtp};

#[derive(Debug, Clone)]
struct IssuedCode {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Thread-safe store of live simple-OTP codes keyed by user id
#[derive(Debug, Default)]
pub struct OtpStore {
    codes: Mutex<HashMap<String, IssuedCode>>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh code for `user_id`, replacing any live one
    pub fn issue(&self, user_id: &str) -> KeymatchResult<SimpleOtp> {
        let otp = generate_simple_otp();
        let mut codes = self.codes.lock()?;
        codes.insert(
            user_id.to_string(),
            IssuedCode {
                code: otp.code.clone(),
                expires_at: otp.expires_at,
            },
        );
        info!("🔑 Issued code for user {} (expires {})", user_id, otp.expires_at);
        Ok(otp)
    }

    /// Redeem a submitted code, consuming it on success.
    ///
    /// Returns the id of the user the code was issued to. An expired match
    /// is removed and reported as `CodeExpired`.
    pub fn redeem(&self, submitted: &str) -> KeymatchResult<String> {
        let code = normalize_code(submitted)
            .ok_or_else(|| KeymatchError::InvalidCode(submitted.trim().to_string()))?;

        let mut codes = self.codes.lock()?;
        let user_id = match codes
            .iter()
            .find(|(_, issued)| issued.code == code)
            .map(|(user, _)| user.clone())
        {
            Some(user) => user,
            None => {
                warn!("No matching code for submitted OTP");
                return Err(KeymatchError::CodeNotFound);
            }
        };

        // A matched code leaves the store either way
        let issued = codes.remove(&user_id);
        let expired = issued
            .map(|i| i.expires_at < Utc::now())
            .unwrap_or(true);

        if expired {
            warn!("Code matched but expired for user {}", user_id);
            return Err(KeymatchError::CodeExpired(user_id));
        }

        info!("✅ Code redeemed for user {}", user_id);
        Ok(user_id)
    }

    /// Drop a user's live code, if any
    pub fn revoke(&self, user_id: &str) -> KeymatchResult<bool> {
        let mut codes = self.codes.lock()?;
        Ok(codes.remove(user_id).is_some())
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> KeymatchResult<usize> {
        let now = Utc::now();
        let mut codes = self.codes.lock()?;
        let before = codes.len();
        codes.retain(|_, issued| issued.expires_at >= now);
        let removed = before - codes.len();
        if removed > 0 {
            debug!("Purged {} expired codes", removed);
        }
        Ok(removed)
    }

    /// Number of live entries (expired-but-unpurged included)
    pub fn len(&self) -> KeymatchResult<usize> {
        Ok(self.codes.lock()?.len())
    }

    pub fn is_empty(&self) -> KeymatchResult<bool> {
        Ok(self.codes.lock()?.is_empty())
    }

    #[cfg(test)]
    fn insert_raw(&self, user_id: &str, code: &str, expires_at: DateTime<Utc>) {
        self.codes.lock().unwrap().insert(
            user_id.to_string(),
            IssuedCode {
                code: code.to_string(),
                expires_at,
            },
        );
    }
}
