//! PBKDF2 key derivation for vault payloads.
//! One derivation yields the AES key, the HMAC key and the CTR IV, in that
//! order, so the salt alone fixes every secret used for a payload.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

pub const KDF_ITERATIONS: u32 = 10_000;
pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;
const DERIVED_LEN: usize = 2 * KEY_LEN + IV_LEN;

/// `key1` (AES-256), `key2` (HMAC-SHA256) and `iv` (AES-CTR).
pub struct DerivedKeyMaterial {
    key1: [u8; KEY_LEN],
    key2: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl DerivedKeyMaterial {
    /// PBKDF2-HMAC-SHA256 over `(secret, salt)`, split key1|key2|iv.
    pub fn derive(secret: &[u8], salt: &[u8]) -> Self {
        let mut output = [0u8; DERIVED_LEN];
        pbkdf2_hmac::<Sha256>(secret, salt, KDF_ITERATIONS, &mut output);

        let mut material = DerivedKeyMaterial {
            key1: [0u8; KEY_LEN],
            key2: [0u8; KEY_LEN],
            iv: [0u8; IV_LEN],
        };
        material.key1.copy_from_slice(&output[..KEY_LEN]);
        material.key2.copy_from_slice(&output[KEY_LEN..2 * KEY_LEN]);
        material.iv.copy_from_slice(&output[2 * KEY_LEN..]);
        output.zeroize();
        material
    }

    pub fn key1(&self) -> &[u8; KEY_LEN] {
        &self.key1
    }

    pub fn key2(&self) -> &[u8; KEY_LEN] {
        &self.key2
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }
}

impl std::fmt::Debug for DerivedKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeyMaterial").finish_non_exhaustive()
    }
}

impl Drop for DerivedKeyMaterial {
    fn drop(&mut self) {
        self.key1.zeroize();
        self.key2.zeroize();
        self.iv.zeroize();
    }
}
