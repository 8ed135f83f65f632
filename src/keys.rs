//! Key material loading.
//!
//! The client holds exactly one pair: the application's own RSA private key
//! (signs requests, decrypts responses) and the Zhima platform's public key
//! (encrypts outgoing payloads, verifies incoming signatures). Keys are
//! accepted in PKCS#8 (`BEGIN PRIVATE KEY` / `BEGIN PUBLIC KEY`) or PKCS#1
//! (`BEGIN RSA PRIVATE KEY` / `BEGIN RSA PUBLIC KEY`) PEM form, since the
//! open platform hands out both.

use std::path::Path;

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::Error;

/// The two keys a client instance operates with.
#[derive(Debug, Clone)]
pub struct ClientKeys {
    /// Application private key: signs canonical strings, decrypts responses.
    pub app_private_key: RsaPrivateKey,
    /// Zhima platform public key: encrypts payloads, verifies response signs.
    pub zmxy_public_key: RsaPublicKey,
}

impl ClientKeys {
    pub fn from_pem(app_private_pem: &str, zmxy_public_pem: &str) -> Result<Self, Error> {
        Ok(Self {
            app_private_key: load_private_key_pem(app_private_pem)?,
            zmxy_public_key: load_public_key_pem(zmxy_public_pem)?,
        })
    }

    pub fn from_files(
        app_private_path: impl AsRef<Path>,
        zmxy_public_path: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        let private_pem = std::fs::read_to_string(app_private_path)?;
        let public_pem = std::fs::read_to_string(zmxy_public_path)?;
        Self::from_pem(&private_pem, &public_pem)
    }
}

/// Parse an RSA private key from PEM, trying PKCS#8 then PKCS#1.
pub fn load_private_key_pem(pem: &str) -> Result<RsaPrivateKey, Error> {
    if let Ok(key) = RsaPrivateKey::from_pkcs8_pem(pem) {
        return Ok(key);
    }
    RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| Error::Key(e.to_string()))
}

/// Parse an RSA public key from PEM, trying SPKI then PKCS#1.
pub fn load_public_key_pem(pem: &str) -> Result<RsaPublicKey, Error> {
    if let Ok(key) = RsaPublicKey::from_public_key_pem(pem) {
        return Ok(key);
    }
    RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| Error::Key(e.to_string()))
}
