//! The Zhima Credit client.
//!
//! Composes configuration, the key pair, and an injectable HTTP transport
//! into the core `request` operation, and layers the catalogue of named
//! business operations on top as thin parameter templates.

use std::collections::BTreeMap;
use std::sync::Arc;

use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::Value;
use tracing::debug;

use crate::authorize::{build_authorize_url, AuthChannel, AuthIdentity, AuthorizeUrl};
use crate::crypto;
use crate::envelope::{self, ClientConfig, FileAttachment, ResponseEnvelope, WireRequest};
use crate::error::Error;
use crate::keys::ClientKeys;
use crate::openid::decode_open_id;
use crate::params::{random_transaction_id, ParameterSet, TRANSACTION_ID_LEN};
use crate::transport::{HttpTransport, TransportResponse};

// Fixed product codes of the catalogued operations.
const PRODUCT_IVS_VERIFY: &str = "w1010100000000002859";
const PRODUCT_IVS_SCORE: &str = "w1010100003000001100";
const PRODUCT_WATCHLIST: &str = "w1010100100000000022";
const PRODUCT_CREDIT_SCORE: &str = "w1010100100000000001";
const PRODUCT_CERTIFICATION: &str = "w1010100000000002978";

/// Everything a single call produced, echoed back to the caller: the merged
/// parameters, the wire request (its query carries `sign` and `method`),
/// the transport response, and the decoded business result.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub params: ParameterSet,
    pub request: WireRequest,
    pub response: TransportResponse,
    pub result: Value,
}

impl ApiResponse {
    /// Whether the business result reports `success: true`.
    ///
    /// A `false` result is data, not a failure; callers inspect
    /// `result["error_code"]` for the upstream reason.
    pub fn is_success(&self) -> bool {
        self.result["success"] == Value::Bool(true)
    }
}

pub struct ZmxyClient {
    config: ClientConfig,
    keys: ClientKeys,
    transport: Arc<dyn HttpTransport>,
    random_fn: Box<dyn Fn(usize) -> String + Send + Sync>,
}

impl ZmxyClient {
    pub fn new(config: ClientConfig, keys: ClientKeys, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            keys,
            transport,
            random_fn: Box::new(random_transaction_id),
        }
    }

    /// Build a client on the default reqwest transport.
    #[cfg(feature = "fetch")]
    pub fn with_default_transport(config: ClientConfig, keys: ClientKeys) -> Self {
        Self::new(config, keys, Arc::new(crate::transport::ReqwestTransport::default()))
    }

    /// Replace the transaction-id generator.
    pub fn with_random_fn(mut self, f: impl Fn(usize) -> String + Send + Sync + 'static) -> Self {
        self.random_fn = Box::new(f);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // Key rotation is a configuration-time operation; it is not safe to
    // interleave with in-flight calls.
    pub fn set_app_private_key(&mut self, key: RsaPrivateKey) -> &mut Self {
        self.keys.app_private_key = key;
        self
    }

    pub fn set_zmxy_public_key(&mut self, key: RsaPublicKey) -> &mut Self {
        self.keys.zmxy_public_key = key;
        self
    }

    // -----------------------------------------------------------------------
    // Core request operation
    // -----------------------------------------------------------------------

    /// Issue a signed, encrypted API request.
    pub async fn request(&self, service: &str, params: ParameterSet) -> Result<ApiResponse, Error> {
        self.request_with_files(service, params, Vec::new()).await
    }

    /// Like [`request`](Self::request), with raw multipart file attachments
    /// alongside the encrypted blob.
    pub async fn request_with_files(
        &self,
        service: &str,
        params: ParameterSet,
        files: Vec<FileAttachment>,
    ) -> Result<ApiResponse, Error> {
        let request = envelope::build(&self.config, &self.keys, service, &params, files)?;
        debug!(method = service, url = %request.url, "sending zmxy request");
        let response = self.transport.execute(&request).await?;
        let parsed: ResponseEnvelope = serde_json::from_value(response.body.clone())?;
        let result = envelope::parse(&parsed, &self.keys.app_private_key)?;
        debug!(status = response.status, encrypted = parsed.encrypted, "decoded zmxy response");
        Ok(ApiResponse {
            params,
            request,
            response,
            result,
        })
    }

    // -----------------------------------------------------------------------
    // Redirect / callback paths (no transport involved)
    // -----------------------------------------------------------------------

    /// Build the authorization redirect URL for `identity`.
    pub fn authorize_url(
        &self,
        identity: &AuthIdentity,
        state: Option<&str>,
        channel: AuthChannel,
    ) -> Result<AuthorizeUrl, Error> {
        build_authorize_url(&self.config, &self.keys, identity, state, channel)
    }

    /// Decode the callback token into its fields (`open_id` among them).
    pub fn open_id(&self, callback: &str) -> Result<BTreeMap<String, String>, Error> {
        decode_open_id(callback, &self.keys.app_private_key)
    }

    // -----------------------------------------------------------------------
    // Crypto primitives with explicit key override
    // -----------------------------------------------------------------------
    //
    // `None` falls back to the instance keys; `Some` substitutes a key for
    // this call only.

    pub fn sign(&self, input: &str, key: Option<&RsaPrivateKey>) -> Result<String, Error> {
        crypto::sign(input, key.unwrap_or(&self.keys.app_private_key))
    }

    pub fn verify(&self, expected: &str, signature: &str, key: Option<&RsaPublicKey>) -> bool {
        crypto::verify(expected, signature, key.unwrap_or(&self.keys.zmxy_public_key))
    }

    pub fn encrypt(&self, text: &str, key: Option<&RsaPublicKey>) -> Result<String, Error> {
        crypto::encrypt(text.as_bytes(), key.unwrap_or(&self.keys.zmxy_public_key))
    }

    pub fn decrypt(&self, encrypted: &str, key: Option<&RsaPrivateKey>) -> Result<String, Error> {
        let plain = crypto::decrypt(encrypted, key.unwrap_or(&self.keys.app_private_key))?;
        String::from_utf8(plain).map_err(|e| Error::Encoding(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // Business operation catalogue
    // -----------------------------------------------------------------------

    /// Anti-fraud verification (`zhima.credit.antifraud.verify`).
    pub async fn verify_ivs(&self, params: ParameterSet) -> Result<ApiResponse, Error> {
        let params = self.with_defaults(params, PRODUCT_IVS_VERIFY, None);
        self.request("zhima.credit.antifraud.verify", params).await
    }

    /// Anti-fraud score (`zhima.credit.antifraud.score.get`).
    pub async fn ivs_score(&self, params: ParameterSet) -> Result<ApiResponse, Error> {
        let params = self.with_defaults(params, PRODUCT_IVS_SCORE, None);
        self.request("zhima.credit.antifraud.score.get", params).await
    }

    /// Industry watch-list check (`zhima.credit.watchlistii.get`).
    pub async fn verify_watchlist(
        &self,
        open_id: &str,
        transaction_id: Option<String>,
    ) -> Result<ApiResponse, Error> {
        let mut params = ParameterSet::new();
        params.insert("open_id".into(), Value::String(open_id.into()));
        let params = self.with_defaults(params, PRODUCT_WATCHLIST, transaction_id);
        self.request("zhima.credit.watchlistii.get", params).await
    }

    /// Credit score lookup (`zhima.credit.score.get`).
    pub async fn credit_score(
        &self,
        open_id: &str,
        transaction_id: Option<String>,
    ) -> Result<ApiResponse, Error> {
        let mut params = ParameterSet::new();
        params.insert("open_id".into(), Value::String(open_id.into()));
        let params = self.with_defaults(params, PRODUCT_CREDIT_SCORE, transaction_id);
        self.request("zhima.credit.score.get", params).await
    }

    /// Start an identity certification (`zhima.customer.certification.initialize`).
    ///
    /// The returned result carries the `biz_no` used to query the outcome.
    pub async fn init_certification(
        &self,
        name: &str,
        cert_no: &str,
        transaction_id: Option<String>,
    ) -> Result<ApiResponse, Error> {
        let identity = serde_json::json!({
            "identity_type": "CERT_INFO",
            "cert_type": "IDENTITY_CARD",
            "cert_name": name,
            "cert_no": cert_no,
        });
        let mut params = ParameterSet::new();
        params.insert("biz_code".into(), Value::String("FACE".into()));
        params.insert(
            "identity_param".into(),
            Value::String(serde_json::to_string(&identity)?),
        );
        let params = self.with_defaults(params, PRODUCT_CERTIFICATION, transaction_id);
        self.request("zhima.customer.certification.initialize", params)
            .await
    }

    /// Query a certification outcome (`zhima.customer.certification.query`).
    pub async fn query_certification(&self, biz_no: &str) -> Result<ApiResponse, Error> {
        let mut params = ParameterSet::new();
        params.insert("biz_no".into(), Value::String(biz_no.into()));
        params.insert(
            "product_code".into(),
            Value::String(PRODUCT_CERTIFICATION.into()),
        );
        self.request("zhima.customer.certification.query", params)
            .await
    }

    /// Feed back a batch of credit records (`zhima.data.batch.feedback`).
    ///
    /// `product_code` is the merchant-specific feedback scene code; `records`
    /// is the JSON array of record objects.
    pub async fn batch_feedback(
        &self,
        product_code: &str,
        records: &Value,
    ) -> Result<ApiResponse, Error> {
        let count = records.as_array().map(|a| a.len()).unwrap_or(1);
        let mut params = ParameterSet::new();
        params.insert("file_type".into(), Value::String("json_data".into()));
        params.insert("records".into(), Value::from(count));
        params.insert("datas".into(), Value::String(serde_json::to_string(records)?));
        let params = self.with_defaults(params, product_code, None);
        self.request("zhima.data.batch.feedback", params).await
    }

    /// Merge the fixed template fields into caller params. Caller-supplied
    /// `product_code`/`transaction_id` win over the template.
    fn with_defaults(
        &self,
        mut params: ParameterSet,
        product_code: &str,
        transaction_id: Option<String>,
    ) -> ParameterSet {
        if !params.contains_key("product_code") {
            params.insert("product_code".into(), Value::String(product_code.into()));
        }
        if !params.contains_key("transaction_id") {
            let id = transaction_id.unwrap_or_else(|| (self.random_fn)(TRANSACTION_ID_LEN));
            params.insert("transaction_id".into(), Value::String(id));
        }
        params
    }
}
