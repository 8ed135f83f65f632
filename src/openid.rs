//! Callback token decoding.
//!
//! After the user completes authorization, the platform redirects back with
//! an encrypted `params` token. Decrypting it yields a form-encoded string
//! carrying the user's `open_id`. No signature is verified on this path;
//! confidentiality under the app private key is the only integrity
//! mechanism the upstream exercises here.

use std::collections::BTreeMap;

use rsa::RsaPrivateKey;

use crate::crypto;
use crate::error::Error;
use crate::params::deserialize_params;

/// Decrypt a callback token and decode it into its key/value fields.
pub fn decode_open_id(
    callback: &str,
    private_key: &RsaPrivateKey,
) -> Result<BTreeMap<String, String>, Error> {
    let plain = crypto::decrypt(callback, private_key)?;
    let text = String::from_utf8(plain).map_err(|e| Error::Encoding(e.to_string()))?;
    deserialize_params(&text)
}
