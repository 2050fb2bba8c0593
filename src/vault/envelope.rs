//! The vault text envelope.
//!
//! ```text
//! $ANSIBLE_VAULT;1.1;AES256
//! <hex(hex(salt) \n hex(hmac) \n hex(ciphertext)), wrapped at 80 columns>
//! ```
//!
//! The HMAC is kept as the hex string found in the inner blob; it is only
//! ever compared, never used as bytes on its own.

use itertools::Itertools;

use super::error::VaultError;

pub const VAULT_MARKER: &str = "$ANSIBLE_VAULT";
pub const CIPHER_AES256: &str = "AES256";
/// Payload line width used by `ansible-vault`.
pub const LINE_WIDTH: usize = 80;

const VERSION_1_1: &str = "1.1";
const VERSION_1_2: &str = "1.2";

/// First line of a vault: marker, format version, cipher and, for 1.2, the
/// vault-id label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultHeader {
    pub version: String,
    pub cipher: String,
    pub label: Option<String>,
}

impl VaultHeader {
    pub fn new() -> Self {
        VaultHeader {
            version: VERSION_1_1.to_string(),
            cipher: CIPHER_AES256.to_string(),
            label: None,
        }
    }

    /// A 1.2 header carrying a vault-id label.
    pub fn with_label(label: &str) -> Self {
        VaultHeader {
            version: VERSION_1_2.to_string(),
            cipher: CIPHER_AES256.to_string(),
            label: Some(label.to_string()),
        }
    }

    pub fn parse(line: &str) -> Result<Self, VaultError> {
        let parts: Vec<&str> = line.trim().split(';').map(str::trim).collect();
        if parts.len() < 3 || parts.len() > 4 || parts[0] != VAULT_MARKER {
            return Err(VaultError::InvalidHeader(line.to_string()));
        }

        let label = match (parts[1], parts.get(3)) {
            (VERSION_1_1, None) => None,
            (VERSION_1_2, Some(label)) if !label.is_empty() => Some(label.to_string()),
            (VERSION_1_1 | VERSION_1_2, _) => {
                return Err(VaultError::InvalidHeader(line.to_string()))
            }
            (other, _) => return Err(VaultError::UnsupportedVersion(other.to_string())),
        };
        if parts[2] != CIPHER_AES256 {
            return Err(VaultError::UnsupportedCipher(parts[2].to_string()));
        }

        Ok(VaultHeader {
            version: parts[1].to_string(),
            cipher: parts[2].to_string(),
            label,
        })
    }
}

impl Default for VaultHeader {
    fn default() -> Self {
        VaultHeader::new()
    }
}

impl std::fmt::Display for VaultHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{VAULT_MARKER};{};{}", self.version, self.cipher)?;
        if let Some(label) = &self.label {
            write!(f, ";{label}")?;
        }
        Ok(())
    }
}

/// A parsed vault: header plus the three payload parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEnvelope {
    pub header: VaultHeader,
    pub salt: Vec<u8>,
    /// Hex-encoded HMAC-SHA256 of `ciphertext`.
    pub hmac: String,
    pub ciphertext: Vec<u8>,
}

impl VaultEnvelope {
    pub fn parse(vaulttext: &str) -> Result<Self, VaultError> {
        let mut lines = vaulttext.trim_start().lines();
        let header_line = lines
            .next()
            .ok_or_else(|| VaultError::InvalidHeader("empty vault".to_string()))?;
        let header = VaultHeader::parse(header_line)?;

        let payload: String = lines.map(str::trim).collect();
        if payload.is_empty() {
            return Err(VaultError::MalformedPayload(
                "no payload after header".to_string(),
            ));
        }

        let inner = hex::decode(payload)?;
        let parts: Vec<&[u8]> = inner.split(|&b| b == b'\n').collect();
        let [salt_hex, hmac_hex, ciphertext_hex] = parts.as_slice() else {
            return Err(VaultError::MalformedPayload(format!(
                "expected salt, hmac and ciphertext, found {} part(s)",
                parts.len()
            )));
        };

        let salt = hex::decode(salt_hex)?;
        let hmac = std::str::from_utf8(hmac_hex)
            .map_err(|e| VaultError::MalformedPayload(format!("hmac is not text: {e}")))?
            .to_string();
        let ciphertext = hex::decode(ciphertext_hex)?;
        if salt.is_empty() || hmac.is_empty() || ciphertext.is_empty() {
            return Err(VaultError::MalformedPayload(
                "empty salt, hmac or ciphertext".to_string(),
            ));
        }

        Ok(VaultEnvelope {
            header,
            salt,
            hmac,
            ciphertext,
        })
    }

    /// Render the envelope. With `chunked` the payload is wrapped at
    /// [`LINE_WIDTH`] columns and ends with a newline, as `ansible-vault`
    /// writes it.
    pub fn to_vaulttext(&self, chunked: bool) -> String {
        let inner = [
            hex::encode(&self.salt),
            self.hmac.clone(),
            hex::encode(&self.ciphertext),
        ]
        .join("\n");
        let payload = hex::encode(inner);

        let mut out = format!("{}\n", self.header);
        if chunked {
            let body = payload
                .as_bytes()
                .chunks(LINE_WIDTH)
                .map(String::from_utf8_lossy)
                .join("\n");
            out.push_str(&body);
            out.push('\n');
        } else {
            out.push_str(&payload);
        }
        out
    }
}

/// True when the first line carries the vault marker.
pub fn is_vault(text: &str) -> bool {
    text.trim_start()
        .lines()
        .next()
        .map_or(false, |line| line.starts_with(VAULT_MARKER))
}
