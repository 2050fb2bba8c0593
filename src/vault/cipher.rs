//! AES-256-CTR, HMAC-SHA256 and PKCS7 padding for vault payloads.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::VaultError;
use super::kdf::DerivedKeyMaterial;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// AES block size; padding always brings the plaintext to a multiple of it.
pub const BLOCK_SIZE: usize = 16;

/// PKCS7: append `n` bytes of value `n`, 1 <= n <= 16.
pub fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let padding = BLOCK_SIZE - data.len() % BLOCK_SIZE;
    let mut padded = Vec::with_capacity(data.len() + padding);
    padded.extend_from_slice(data);
    padded.resize(data.len() + padding, padding as u8);
    padded
}

/// Remove and validate PKCS7 padding.
pub fn pkcs7_unpad(mut data: Vec<u8>) -> Result<Vec<u8>, VaultError> {
    let padding = usize::from(*data.last().ok_or(VaultError::InvalidPadding)?);
    if padding == 0 || padding > BLOCK_SIZE || padding > data.len() {
        return Err(VaultError::InvalidPadding);
    }
    let body_len = data.len() - padding;
    if !data[body_len..].iter().all(|&b| usize::from(b) == padding) {
        return Err(VaultError::InvalidPadding);
    }
    data.truncate(body_len);
    Ok(data)
}

/// XOR `data` with the AES-256-CTR keystream (encrypts and decrypts).
pub fn apply_keystream(keys: &DerivedKeyMaterial, data: &mut [u8]) -> Result<(), VaultError> {
    let mut cipher = Aes256Ctr::new_from_slices(keys.key1(), keys.iv())
        .map_err(|e| VaultError::Cipher(format!("{e}")))?;
    cipher.apply_keystream(data);
    Ok(())
}

/// HMAC-SHA256 of the ciphertext under `key2`.
pub fn hmac_tag(keys: &DerivedKeyMaterial, ciphertext: &[u8]) -> Result<Vec<u8>, VaultError> {
    let mut mac = HmacSha256::new_from_slice(keys.key2())
        .map_err(|e| VaultError::Cipher(format!("{e}")))?;
    mac.update(ciphertext);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time check of a hex-encoded tag.
pub fn verify_hmac(
    keys: &DerivedKeyMaterial,
    ciphertext: &[u8],
    expected_hex: &str,
) -> Result<(), VaultError> {
    let expected = hex::decode(expected_hex).map_err(|_| VaultError::InvalidHmac)?;
    let mut mac = HmacSha256::new_from_slice(keys.key2())
        .map_err(|e| VaultError::Cipher(format!("{e}")))?;
    mac.update(ciphertext);
    mac.verify_slice(&expected).map_err(|_| VaultError::InvalidHmac)
}

/// Drop every 0x03 byte from decrypted plaintext.
///
/// Existing callers depend on this. Plaintext that legitimately contains
/// byte 3 does not survive decryption.
pub fn strip_etx(data: &mut Vec<u8>) {
    data.retain(|&b| b != 0x03);
}
