//! Ansible Vault 1.1/1.2 encryption, byte-compatible with `ansible-vault`.
//!
//! - [`encrypt`] / [`encrypt_with_label`] - plaintext to vault text
//! - [`decrypt`] - vault text to plaintext, HMAC checked first
//! - [`VaultEnvelope`] - the text format on its own
//!
//! Every call derives fresh key material from the secret and salt, so the
//! functions share no state.

mod cipher;
mod envelope;
mod error;
mod kdf;

use std::path::Path;

use rand::rngs::OsRng;
use rand::RngCore;

pub use envelope::{is_vault, VaultEnvelope, VaultHeader, CIPHER_AES256, LINE_WIDTH, VAULT_MARKER};
pub use error::VaultError;
pub use kdf::{DerivedKeyMaterial, KDF_ITERATIONS};

/// Salt length used for new vaults.
pub const SALT_LEN: usize = 32;

/// Encrypt `plaintext` into a `$ANSIBLE_VAULT;1.1;AES256` envelope.
pub fn encrypt(plaintext: &[u8], secret: &str, chunked: bool) -> Result<String, VaultError> {
    seal(plaintext, secret, VaultHeader::new(), &random_salt(), chunked)
}

/// Encrypt into a `$ANSIBLE_VAULT;1.2;AES256;<label>` envelope.
pub fn encrypt_with_label(
    plaintext: &[u8],
    secret: &str,
    label: &str,
    chunked: bool,
) -> Result<String, VaultError> {
    if label.is_empty() || label.contains(';') || label.contains('\n') {
        return Err(VaultError::InvalidHeader(format!("bad vault-id label {label:?}")));
    }
    seal(plaintext, secret, VaultHeader::with_label(label), &random_salt(), chunked)
}

fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

fn seal(
    plaintext: &[u8],
    secret: &str,
    header: VaultHeader,
    salt: &[u8],
    chunked: bool,
) -> Result<String, VaultError> {
    let keys = DerivedKeyMaterial::derive(secret.as_bytes(), salt);
    let mut ciphertext = cipher::pkcs7_pad(plaintext);
    cipher::apply_keystream(&keys, &mut ciphertext)?;
    let tag = cipher::hmac_tag(&keys, &ciphertext)?;

    let envelope = VaultEnvelope {
        header,
        salt: salt.to_vec(),
        hmac: hex::encode(tag),
        ciphertext,
    };
    log::debug!(
        "Encrypted {} bytes into {} (chunked={chunked})",
        plaintext.len(),
        envelope.header
    );
    Ok(envelope.to_vaulttext(chunked))
}

/// Decrypt vault text.
///
/// The HMAC is verified before anything is decrypted; a wrong secret or a
/// modified payload yields [`VaultError::InvalidHmac`] and no plaintext.
pub fn decrypt(vaulttext: &str, secret: &str) -> Result<Vec<u8>, VaultError> {
    let envelope = VaultEnvelope::parse(vaulttext)?;
    let keys = DerivedKeyMaterial::derive(secret.as_bytes(), &envelope.salt);

    if let Err(e) = cipher::verify_hmac(&keys, &envelope.ciphertext, &envelope.hmac) {
        log::warn!("Vault HMAC verification failed ({})", envelope.header);
        return Err(e);
    }

    let mut plaintext = envelope.ciphertext;
    cipher::apply_keystream(&keys, &mut plaintext)?;
    let mut plaintext = cipher::pkcs7_unpad(plaintext)?;
    cipher::strip_etx(&mut plaintext);
    log::debug!("Decrypted {} bytes from {}", plaintext.len(), envelope.header);
    Ok(plaintext)
}

/// Read a vault password file; trailing line breaks are not part of the
/// password.
pub fn read_password_file(path: &Path) -> Result<String, VaultError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| VaultError::PasswordUnreadable(format!("{}: {e}", path.display())))?;
    let password = content.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(VaultError::PasswordUnreadable(format!(
            "{}: file is empty",
            path.display()
        )));
    }
    Ok(password.to_string())
}
