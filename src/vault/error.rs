use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("invalid vault header: {0}")]
    InvalidHeader(String),
    #[error("unsupported vault format version: {0}")]
    UnsupportedVersion(String),
    #[error("unsupported vault cipher: {0}")]
    UnsupportedCipher(String),
    #[error("malformed vault payload: {0}")]
    MalformedPayload(String),
    #[error("hex decoding failed: {0}")]
    HexDecode(#[from] hex::FromHexError),
    #[error("Invalid HMAC")]
    InvalidHmac,
    #[error("invalid padding after decryption")]
    InvalidPadding,
    #[error("cipher setup failed: {0}")]
    Cipher(String),
    #[error("password source unreadable: {0}")]
    PasswordUnreadable(String),
}
