//! `ton_proof` payloads: issue one on connect, verify the wallet's signature over it.
//!
//! Payload: `random(8) | expiry_unix_secs(8, big-endian)`, hex encoded (32 chars).
//! Signed message (ton-proof-item-v2):
//! `"ton-proof-item-v2/" | wc(i32 LE) | hash(32) | domain_len(u32 LE) | domain | timestamp(u64 LE) | payload`,
//! then `ed25519(sha256(0xffff | "ton-connect" | sha256(message)))`.

use chrono::Utc;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::address::Address;
use crate::error::ProofError;
use crate::wallet_app::WalletInfo;

const PAYLOAD_HEX_LEN: usize = 32;

/// Issues a payload that expires `ttl_secs` from now.
pub fn generate_payload(ttl_secs: i64) -> String {
    generate_payload_at(Utc::now().timestamp(), ttl_secs)
}

pub fn generate_payload_at(now: i64, ttl_secs: i64) -> String {
    let mut payload = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut payload[..8]);
    let expires_at = now.saturating_add(ttl_secs).max(0) as u64;
    payload[8..].copy_from_slice(&expires_at.to_be_bytes());
    hex::encode(payload)
}

/// Expiry encoded in an issued payload.
pub fn payload_expiry(payload: &str) -> Result<i64, ProofError> {
    if payload.len() < PAYLOAD_HEX_LEN || !payload.is_char_boundary(16) {
        return Err(ProofError::MalformedPayload);
    }
    let ts = u64::from_str_radix(&payload[16..PAYLOAD_HEX_LEN], 16)
        .map_err(|_| ProofError::MalformedPayload)?;
    Ok(ts as i64)
}

/// Checks that `info` carries a valid proof of `payload` that has not expired.
pub fn check_payload(payload: &str, info: &WalletInfo) -> Result<(), ProofError> {
    check_payload_at(payload, info, Utc::now().timestamp())
}

pub fn check_payload_at(payload: &str, info: &WalletInfo, now: i64) -> Result<(), ProofError> {
    let expires_at = payload_expiry(payload)?;
    verify_proof(payload, info)?;
    if now > expires_at {
        return Err(ProofError::Expired);
    }
    Ok(())
}

/// Verifies the wallet signature over `payload`.
///
/// The key checked against is the `public_key` the wallet reports; it is not derived from the
/// account's `state_init`, so the check shows the wallet holds *a* key that signed this payload
/// for this address, not that the key controls the address on chain. `proof.domain` is signed
/// but not compared with the manifest's domain.
pub fn verify_proof(payload: &str, info: &WalletInfo) -> Result<(), ProofError> {
    let proof = info.ton_proof.as_ref().ok_or(ProofError::Missing)?;
    if proof.payload != payload {
        return Err(ProofError::PayloadMismatch);
    }

    let address = Address::parse_raw(&info.account.address)
        .map_err(|e| ProofError::InvalidKey(e.to_string()))?;
    let public_key = info
        .account
        .public_key
        .as_deref()
        .ok_or_else(|| ProofError::InvalidKey("missing public key".to_string()))?;
    let key_bytes: [u8; 32] = hex::decode(public_key)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| ProofError::InvalidKey("public key must be 32 hex bytes".to_string()))?;
    let key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| ProofError::InvalidKey(e.to_string()))?;
    let sig_bytes: [u8; 64] = hex::decode(&proof.signature)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| ProofError::InvalidKey("signature must be 64 hex bytes".to_string()))?;
    let signature = Signature::from_bytes(&sig_bytes);

    let digest = signing_digest(&address, &proof.domain, proof.timestamp, payload);
    key.verify(&digest, &signature).map_err(|e| {
        debug!(error = %e, address = %info.account.address, "ton_proof signature rejected");
        ProofError::BadSignature
    })
}

/// The 32 bytes the wallet signs.
pub fn signing_digest(address: &Address, domain: &str, timestamp: u64, payload: &str) -> [u8; 32] {
    let mut message = Vec::with_capacity(18 + 4 + 32 + 4 + domain.len() + 8 + payload.len());
    message.extend_from_slice(b"ton-proof-item-v2/");
    message.extend_from_slice(&(address.workchain as i32).to_le_bytes());
    message.extend_from_slice(&address.hash);
    message.extend_from_slice(&(domain.len() as u32).to_le_bytes());
    message.extend_from_slice(domain.as_bytes());
    message.extend_from_slice(&timestamp.to_le_bytes());
    message.extend_from_slice(payload.as_bytes());

    let mut outer = Vec::with_capacity(2 + 11 + 32);
    outer.extend_from_slice(&[0xff, 0xff]);
    outer.extend_from_slice(b"ton-connect");
    outer.extend_from_slice(&Sha256::digest(&message));

    Sha256::digest(&outer).into()
}
