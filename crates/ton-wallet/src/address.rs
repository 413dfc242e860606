//! TON account addresses in raw (`wc:hex`) and user-friendly (base64, 36 bytes) form.
//!
//! User-friendly layout: `tag(1) | workchain(1) | hash(32) | crc16-xmodem(2, big-endian)`.
//! Tag `0x11` is bounceable, `0x51` non-bounceable; `0x80` marks test-only addresses.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::WalletError;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TEST_ONLY: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub workchain: i8,
    pub hash: [u8; 32],
}

/// How to render a user-friendly address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendlyFormat {
    pub bounceable: bool,
    pub test_only: bool,
    pub url_safe: bool,
}

impl Default for FriendlyFormat {
    fn default() -> Self {
        Self {
            bounceable: false,
            test_only: false,
            url_safe: true,
        }
    }
}

impl Address {
    pub fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Parses either representation.
    pub fn parse(s: &str) -> Result<Self, WalletError> {
        let s = s.trim();
        if s.contains(':') {
            Self::parse_raw(s)
        } else {
            Self::parse_friendly(s)
        }
    }

    pub fn parse_raw(s: &str) -> Result<Self, WalletError> {
        let invalid = || WalletError::InvalidAddress(s.to_string());
        let (wc, hash_hex) = s.split_once(':').ok_or_else(invalid)?;
        let workchain: i8 = wc.parse().map_err(|_| invalid())?;
        let bytes = hex::decode(hash_hex).map_err(|_| invalid())?;
        let hash: [u8; 32] = bytes.try_into().map_err(|_| invalid())?;
        Ok(Self { workchain, hash })
    }

    pub fn parse_friendly(s: &str) -> Result<Self, WalletError> {
        let invalid = || WalletError::InvalidAddress(s.to_string());
        if s.len() != 48 {
            return Err(invalid());
        }
        let bytes = if s.contains('-') || s.contains('_') {
            URL_SAFE.decode(s)
        } else {
            STANDARD.decode(s)
        }
        .map_err(|_| invalid())?;
        if bytes.len() != 36 {
            return Err(invalid());
        }

        let expected = crc16_xmodem(&bytes[..34]);
        let actual = u16::from_be_bytes([bytes[34], bytes[35]]);
        if expected != actual {
            return Err(invalid());
        }

        let tag = bytes[0] & !TAG_TEST_ONLY;
        if tag != TAG_BOUNCEABLE && tag != TAG_NON_BOUNCEABLE {
            return Err(invalid());
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);
        Ok(Self {
            workchain: bytes[1] as i8,
            hash,
        })
    }

    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    pub fn to_friendly(&self, format: FriendlyFormat) -> String {
        let mut tag = if format.bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if format.test_only {
            tag |= TAG_TEST_ONLY;
        }

        let mut payload = Vec::with_capacity(36);
        payload.push(tag);
        payload.push(self.workchain as u8);
        payload.extend_from_slice(&self.hash);
        let crc = crc16_xmodem(&payload);
        payload.extend_from_slice(&crc.to_be_bytes());

        if format.url_safe {
            URL_SAFE.encode(payload)
        } else {
            STANDARD.encode(payload)
        }
    }
}

/// Non-bounceable, url-safe mainnet form.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_friendly(FriendlyFormat::default()))
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_raw())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// CRC-16/XMODEM (poly 0x1021, init 0).
pub fn crc16_xmodem(payload: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in payload {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
