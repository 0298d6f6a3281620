//! serde helpers: binary fields travel as base64 strings inside JSON records

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serializer};

/// `#[serde(with = "b64")]` for `Vec<u8>`
pub mod b64 {
    use super::*;

    pub fn serialize<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "b64_array")]` for fixed-size keys
pub mod b64_array {
    use super::*;

    pub fn serialize<S: Serializer, const N: usize>(data: &[u8; N], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(d: D) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(d)?;
        let bytes = STANDARD.decode(s).map_err(serde::de::Error::custom)?;
        let len = bytes.len();
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom(format!("expected {N} bytes, got {len}")))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super::b64")]
        data: Vec<u8>,
        #[serde(with = "super::b64_array")]
        key: [u8; 4],
    }

    #[test]
    fn test_wrong_array_length_rejected() {
        let json = r#"{"data":"","key":"AAAAAAAA"}"#;
        let result: Result<Holder, _> = serde_json::from_str(json);
        assert!(result.is_err(), "6 decoded bytes must not fit a 4-byte key");
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let json = r#"{"data":"!!!","key":"AAAAAA=="}"#;
        let result: Result<Holder, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
