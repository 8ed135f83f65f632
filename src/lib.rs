//! # zmxy - Zhima Credit open-platform client
//!
//! Client-side implementation of the signed-and-encrypted request/response
//! protocol used by the Zhima Credit (zmxy) scoring and verification
//! service.
//!
//! ## Protocol
//!
//! Every API call goes through the same codec pipeline:
//!
//! 1. **Canonicalize** the flat parameter set into a deterministic string
//!    (sorted keys, null/empty entries dropped, values percent-encoded).
//! 2. **Sign** the canonical string with the application's RSA private key
//!    (SHA-1, PKCS#1 v1.5 - legacy schemes mandated by the service).
//! 3. **Encrypt** the same canonical string with the platform's public key,
//!    chunked into 117-byte slices so payloads may exceed one RSA block.
//! 4. **POST** the encrypted blob with the signature and static fields in
//!    the query string, and decode the response, decrypting `biz_response`
//!    when the envelope says it is encrypted.
//!
//! The authorization redirect URL and the callback `open_id` token reuse the
//! same primitives without touching the HTTP transport.
//!
//! ## Quick start
//!
//! ```no_run
//! use zmxy::{AuthChannel, AuthIdentity, ClientConfig, ClientKeys, ZmxyClient};
//!
//! # async fn run() -> Result<(), zmxy::Error> {
//! let keys = ClientKeys::from_files("app_private_key.pem", "zmxy_public_key.pem")?;
//! let client = ZmxyClient::with_default_transport(ClientConfig::new("1000980"), keys);
//!
//! // Build a browser redirect for authorization.
//! let auth = client.authorize_url(
//!     &AuthIdentity::Mobile { mobile: "12345678901".into() },
//!     Some("my-state"),
//!     AuthChannel::Pc,
//! )?;
//! println!("redirect to {}", auth.url);
//!
//! // After the callback, decode the open id and look up the score.
//! let fields = client.open_id("...callback params token...")?;
//! let res = client.credit_score(&fields["open_id"], None).await?;
//! println!("score: {}", res.result["zm_score"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! - `fetch` (default): the reqwest-backed [`transport::ReqwestTransport`].
//!   Disable it to bring your own [`transport::HttpTransport`].
//!
//! ## Security notes
//!
//! - RSA PKCS#1 v1.5 with a fixed 128-byte block size and RSA-SHA1
//!   signatures are the only schemes the upstream accepts; they are not
//!   configurable.
//! - Response signature fields are exposed on
//!   [`envelope::ResponseEnvelope`] but never auto-verified; see the field
//!   docs.
//! - Decryption failures are fatal and propagate as
//!   [`Error::Decryption`]; they are never reported as empty results.

pub mod authorize;
pub mod client;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod openid;
pub mod params;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_util;

pub use authorize::{AuthChannel, AuthIdentity, AuthorizeUrl};
pub use client::{ApiResponse, ZmxyClient};
pub use envelope::{ClientConfig, FileAttachment, RequestBody, ResponseEnvelope, WireRequest};
pub use error::Error;
pub use keys::ClientKeys;
pub use transport::{HttpTransport, TransportResponse};

#[cfg(feature = "fetch")]
pub use transport::ReqwestTransport;
