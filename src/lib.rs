//! Keymatch Library
//!
//! Shared verification utilities for the platform: fuzzy search
//! scoring/ranking for client-side search boxes, and one-time codes
//! (TOTP and simple expiring codes) for lightweight sign-in flows.

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod otp;
pub mod store;
