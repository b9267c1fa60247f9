//! Serde helpers for digests on the wire.
//!
//! Digests travel as standard padded base64 strings. An empty digest is
//! written as `null`, and both `null` and `""` read back as empty.

use data_encoding::BASE64;
use serde::{Deserialize, Deserializer, Serializer};

/// Required digest: always a base64 string
pub mod base64_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        decode(&encoded)
    }
}

/// Digest that may be absent, as the genesis block's predecessor link is
pub mod base64_nullable {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if bytes.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_str(&BASE64.encode(bytes))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => decode(&encoded),
            None => Ok(Vec::new()),
        }
    }
}

fn decode<E: serde::de::Error>(encoded: &str) -> Result<Vec<u8>, E> {
    BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| E::custom(format!("invalid base64 digest: {e}")))
}
