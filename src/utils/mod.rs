//! Utility functions and helpers
//!
//! This module contains the digest function, the clock used for block
//! timestamps, and serde helpers for the wire encoding of digests.

pub mod crypto;
pub mod serialization;
pub mod time;

pub use crypto::{sha256_digest, sha256_digest_parts, DIGEST_LEN};
pub use serialization::{base64_bytes, base64_nullable};
pub use time::{current_timestamp, Clock, SystemClock};
