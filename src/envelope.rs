//! Request/response envelope.
//!
//! [`build`] composes the three codec primitives into an outgoing wire
//! request: canonicalize, sign the canonical string with the app private
//! key, encrypt the same string with the platform public key, then attach
//! the static query fields. [`parse`] is the inverse for responses,
//! applying decryption only when the response declares itself encrypted.

use serde::Deserialize;
use serde_json::Value;

use crate::crypto;
use crate::error::Error;
use crate::keys::ClientKeys;
use crate::params::{serialize_params, ParameterSet};

/// Immutable per-client configuration.
///
/// `version` and `platform` are fixed by the upstream service; changing
/// `platform` is rejected with `ZMOP.invalid_platform_param`. There is no
/// test environment, so `api_url` rarely changes either.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app_id: String,
    pub api_url: String,
    pub version: String,
    pub platform: String,
    pub charset: String,
    pub channel: String,
}

impl ClientConfig {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            api_url: "https://zmopenapi.zmxy.com.cn/openapi.do".into(),
            version: "1.0".into(),
            platform: "zmop".into(),
            charset: "UTF-8".into(),
            channel: "apppc".into(),
        }
    }
}

/// A raw (unencrypted) multipart attachment.
#[derive(Debug, Clone)]
pub struct FileAttachment {
    /// Multipart field name.
    pub field: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Body of an outgoing request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// `params=<base64 ciphertext>`, form-encoded.
    Form { params: String },
    /// Multipart: the encrypted blob as one field plus raw file parts.
    Multipart {
        params: String,
        files: Vec<FileAttachment>,
    },
}

/// Fully-formed outgoing request description, handed to the transport.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub url: String,
    /// Query-level fields in wire order:
    /// `method, sign, version, platform, channel, charset, app_id`.
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl WireRequest {
    /// Look up a query field by name.
    pub fn query_field(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Render the query as a percent-encoded string.
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Incoming wire-level response structure.
///
/// The signature fields (`sign`, `biz_response_sign`) are present on the
/// wire but deliberately not verified here; they are surfaced for callers
/// that opt into checking them. Auto-enforcing them could reject live
/// responses the upstream currently accepts.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// Whether `biz_response` is ciphertext.
    #[serde(default)]
    pub encrypted: bool,
    /// Ciphertext (when `encrypted`) or a JSON string.
    #[serde(default)]
    pub biz_response: Option<String>,
    /// Detached signature over the business payload, unverified.
    #[serde(default)]
    pub biz_response_sign: Option<String>,
    /// Outer signature block (`signSource`/`signResult`), unverified.
    #[serde(default)]
    pub sign: Option<Value>,
}

/// Assemble a signed, encrypted wire request for `operation`.
pub fn build(
    config: &ClientConfig,
    keys: &ClientKeys,
    operation: &str,
    params: &ParameterSet,
    files: Vec<FileAttachment>,
) -> Result<WireRequest, Error> {
    let canonical = serialize_params(params);
    let sign = crypto::sign(&canonical, &keys.app_private_key)?;
    let cipher = crypto::encrypt(canonical.as_bytes(), &keys.zmxy_public_key)?;

    let query = vec![
        ("method".into(), operation.to_string()),
        ("sign".into(), sign),
        ("version".into(), config.version.clone()),
        ("platform".into(), config.platform.clone()),
        ("channel".into(), config.channel.clone()),
        ("charset".into(), config.charset.clone()),
        ("app_id".into(), config.app_id.clone()),
    ];
    let body = if files.is_empty() {
        RequestBody::Form { params: cipher }
    } else {
        RequestBody::Multipart {
            params: cipher,
            files,
        }
    };
    Ok(WireRequest {
        url: config.api_url.clone(),
        query,
        body,
    })
}

/// Decode a response envelope into the business result.
///
/// Decrypts `biz_response` with the app private key when the envelope says
/// so, then parses the plaintext as JSON. A decryption failure propagates;
/// it is never softened into an empty result.
pub fn parse(envelope: &ResponseEnvelope, private_key: &rsa::RsaPrivateKey) -> Result<Value, Error> {
    let raw = envelope
        .biz_response
        .as_deref()
        .ok_or_else(|| Error::Encoding("response carries no biz_response".into()))?;
    let text = if envelope.encrypted {
        let plain = crypto::decrypt(raw, private_key)?;
        String::from_utf8(plain).map_err(|e| Error::Encoding(e.to_string()))?
    } else {
        raw.to_string()
    };
    Ok(serde_json::from_str(&text)?)
}
