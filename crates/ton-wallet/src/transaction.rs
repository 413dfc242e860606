//! Transfer requests created by the bot and the transaction payload handed to the bridge.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::WalletError;

/// Nanotons per TON.
pub const NANOTONS: i64 = 1_000_000_000;

/// Text comments must fit in a single cell: 1023 bits minus the 32-bit zero opcode.
pub const MAX_COMMENT_BYTES: usize = 123;

/// What the caller wants to send. Transient: validated once and consumed per send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub destination: String,
    /// Amount in nanotons.
    pub amount: i64,
    pub comment: Option<String>,
}

impl TransactionRequest {
    pub fn new(destination: impl Into<String>, amount: i64) -> Self {
        Self {
            destination: destination.into(),
            amount,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Checks amount, destination and comment; returns the parsed destination.
    pub fn validate(&self) -> Result<Address, WalletError> {
        if self.amount <= 0 {
            return Err(WalletError::NonPositiveAmount);
        }
        let address = Address::parse(&self.destination)?;
        if let Some(comment) = &self.comment {
            if comment.len() > MAX_COMMENT_BYTES {
                return Err(WalletError::CommentTooLong {
                    len: comment.len(),
                    max: MAX_COMMENT_BYTES,
                });
            }
        }
        Ok(address)
    }

    /// Validates and builds the bridge payload, valid until `valid_until` (unix seconds).
    pub fn into_transaction(self, valid_until: i64) -> Result<Transaction, WalletError> {
        let address = self.validate()?;
        let payload = match self.comment.as_deref() {
            Some(comment) if !comment.is_empty() => Some(comment_payload(comment)?),
            _ => None,
        };
        Ok(Transaction {
            valid_until,
            network: None,
            from: None,
            messages: vec![TransactionMessage {
                address: address.to_raw(),
                amount: self.amount.to_string(),
                payload,
                state_init: None,
            }],
        })
    }
}

/// `sendTransaction` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub valid_until: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub messages: Vec<TransactionMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMessage {
    pub address: String,
    /// Nanotons as a decimal string.
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(rename = "stateInit", skip_serializing_if = "Option::is_none")]
    pub state_init: Option<String>,
}

/// What the wallet returned after signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Signed external message, base64 bag of cells.
    pub boc: String,
}

/// Parses a user-typed TON amount ("1.5", "1,5", "0.000000001") into nanotons.
/// Zero and negative values parse; [`TransactionRequest::validate`] rejects them.
pub fn parse_ton_amount(input: &str) -> Result<i64, WalletError> {
    let invalid = || WalletError::InvalidAmount(input.to_string());
    let text = input.trim().replace(',', ".");
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, text),
    };
    if text.is_empty() {
        return Err(invalid());
    }

    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > 9 {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let frac_nanos: i64 = if frac.is_empty() {
        0
    } else {
        format!("{:0<9}", frac).parse().map_err(|_| invalid())?
    };

    let nanos = whole
        .checked_mul(NANOTONS)
        .and_then(|n| n.checked_add(frac_nanos))
        .ok_or_else(invalid)?;
    Ok(if negative { -nanos } else { nanos })
}

/// Formats nanotons as a TON decimal without trailing zeros ("1.5", "0.000000001", "2").
pub fn format_ton_amount(nanos: i64) -> String {
    let sign = if nanos < 0 { "-" } else { "" };
    let abs = nanos.unsigned_abs();
    let whole = abs / NANOTONS as u64;
    let frac = abs % NANOTONS as u64;
    if frac == 0 {
        format!("{}{}", sign, whole)
    } else {
        let frac = format!("{:09}", frac);
        format!("{}{}.{}", sign, whole, frac.trim_end_matches('0'))
    }
}

/// Serializes a text comment (opcode 0 + UTF-8) as a single-cell bag of cells, url-safe base64.
pub fn comment_payload(comment: &str) -> Result<String, WalletError> {
    let bytes = comment.as_bytes();
    if bytes.len() > MAX_COMMENT_BYTES {
        return Err(WalletError::CommentTooLong {
            len: bytes.len(),
            max: MAX_COMMENT_BYTES,
        });
    }

    let mut data = Vec::with_capacity(4 + bytes.len());
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(bytes);

    // Byte-aligned data needs no completion tag: d2 = 2 * bytes.
    let mut cell = Vec::with_capacity(2 + data.len());
    cell.push(0); // d1: no refs, ordinary, level 0
    cell.push((data.len() * 2) as u8);
    cell.extend_from_slice(&data);

    let mut boc = Vec::with_capacity(11 + cell.len());
    boc.extend_from_slice(&[0xb5, 0xee, 0x9c, 0x72]);
    boc.push(0x01); // no index, no crc32c, ref size 1
    boc.push(0x01); // offset size 1
    boc.push(1); // cells
    boc.push(1); // roots
    boc.push(0); // absent
    boc.push(cell.len() as u8); // total cells size
    boc.push(0); // root index
    boc.extend_from_slice(&cell);

    Ok(URL_SAFE.encode(boc))
}
