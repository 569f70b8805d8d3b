//! Credential digests for login accounts.
//!
//! A stored digest has the form `"{salt_hex}${mac_hex}"`, where `mac` is
//! HMAC-SHA256 keyed by a random 16-byte salt over the UTF-8 secret.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const SALT_LEN: usize = 16;

/// Digest a secret with a fresh random salt.
pub fn hash_password(secret: &str) -> Result<String, AppError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let mac = compute_mac(&salt, secret)?;
    Ok(format!("{}${}", hex::encode(salt), hex::encode(mac)))
}

/// Check a secret against a stored digest.
///
/// Malformed digests never match. The MAC comparison is constant-time.
pub fn verify_password(secret: &str, digest: &str) -> Result<bool, AppError> {
    let Some((salt_hex, mac_hex)) = digest.split_once('$') else {
        return Ok(false);
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(mac_hex)) else {
        return Ok(false);
    };
    if salt.is_empty() {
        return Ok(false);
    }

    let computed = compute_mac(&salt, secret)?;
    Ok(computed.ct_eq(expected.as_slice()).into())
}

fn compute_mac(salt: &[u8], secret: &str) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(salt)
        .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
    mac.update(secret.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}
