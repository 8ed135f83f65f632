//! Signature and chunked-cipher primitives.
//!
//! Both schemes are mandated by the Zhima open platform and are not
//! configurable: detached RSA signatures over SHA-1 digests, and RSA
//! PKCS#1 v1.5 encryption applied independently to fixed-size slices of
//! the payload. Payloads routinely exceed one RSA block, so ciphertexts
//! are a concatenation of 128-byte blocks.

use base64::{engine::general_purpose, Engine as _};
use rand::rngs::OsRng;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};

use crate::error::Error;

/// RSA block size in bytes for this scheme (1024-bit keys).
pub const BLOCK_SIZE: usize = 128;

/// PKCS#1 v1.5 padding overhead per block.
pub const PADDING_OVERHEAD: usize = 11;

/// Usable plaintext bytes per encrypted block.
pub const CHUNK_SIZE: usize = BLOCK_SIZE - PADDING_OVERHEAD;

/// Sign the UTF-8 bytes of a canonical string, returning base64.
pub fn sign(input: &str, key: &RsaPrivateKey) -> Result<String, Error> {
    let digest = Sha1::digest(input.as_bytes());
    let signature = key
        .sign(Pkcs1v15Sign::new::<Sha1>(), digest.as_slice())
        .map_err(|e| Error::Signature(e.to_string()))?;
    Ok(general_purpose::STANDARD.encode(signature))
}

/// Verify a base64 signature over the UTF-8 bytes of `expected`.
///
/// Returns `false` on malformed signatures, mismatched content, or a wrong
/// key; never errors. A `false` here is a trust boundary violation, not a
/// soft warning.
pub fn verify(expected: &str, signature_b64: &str, key: &RsaPublicKey) -> bool {
    let Ok(signature) = general_purpose::STANDARD.decode(signature_b64) else {
        return false;
    };
    let digest = Sha1::digest(expected.as_bytes());
    key.verify(Pkcs1v15Sign::new::<Sha1>(), digest.as_slice(), &signature)
        .is_ok()
}

/// Encrypt an arbitrary-length payload, returning base64 ciphertext.
///
/// The plaintext is split into chunks of at most [`CHUNK_SIZE`] bytes, each
/// encrypted into exactly one [`BLOCK_SIZE`]-byte block, so the raw
/// ciphertext length is always `ceil(len / 117) * 128`.
pub fn encrypt(plaintext: &[u8], key: &RsaPublicKey) -> Result<String, Error> {
    let mut rng = OsRng;
    let blocks = (plaintext.len() + CHUNK_SIZE - 1) / CHUNK_SIZE;
    let mut out = Vec::with_capacity(blocks * BLOCK_SIZE);
    for chunk in plaintext.chunks(CHUNK_SIZE) {
        let block = key
            .encrypt(&mut rng, Pkcs1v15Encrypt, chunk)
            .map_err(|e| Error::Encryption(e.to_string()))?;
        out.extend_from_slice(&block);
    }
    Ok(general_purpose::STANDARD.encode(out))
}

/// Decrypt a base64 ciphertext produced by [`encrypt`].
///
/// The decoded bytes are split into consecutive 128-byte blocks; a short
/// final block is passed through to the cipher rather than rejected up
/// front. A block that does not decrypt under `key` fails the whole call
/// with [`Error::Decryption`].
pub fn decrypt(ciphertext_b64: &str, key: &RsaPrivateKey) -> Result<Vec<u8>, Error> {
    let raw = general_purpose::STANDARD.decode(ciphertext_b64)?;
    let mut out = Vec::with_capacity(raw.len());
    for block in raw.chunks(BLOCK_SIZE) {
        let plain = key
            .decrypt(Pkcs1v15Encrypt, block)
            .map_err(|e| Error::Decryption(e.to_string()))?;
        out.extend_from_slice(&plain);
    }
    Ok(out)
}
