use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed canonical string or non-UTF-8 decrypted payload.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Key material could not be parsed as an RSA key.
    #[error("invalid key material: {0}")]
    Key(String),

    /// The sign operation itself failed (e.g. unusable private key).
    ///
    /// A signature that does not verify is reported as `false` by
    /// [`crypto::verify`](crate::crypto::verify), never as an error.
    #[error("signing failed: {0}")]
    Signature(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// A ciphertext block could not be decrypted with the supplied key.
    /// Fatal; never masked as an empty result.
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Opaque failure from a custom [`HttpTransport`](crate::transport::HttpTransport).
    #[error("transport error: {0}")]
    Transport(String),

    #[cfg(feature = "fetch")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
