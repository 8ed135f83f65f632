//! HTTP transport abstraction.
//!
//! The core imposes no timeout or retry policy; cancellation and pooling
//! belong to the transport. Implementations can wrap any HTTP stack; the
//! default [`ReqwestTransport`] is gated behind the `fetch` feature.

use serde_json::Value;

use crate::envelope::WireRequest;
use crate::error::Error;

#[cfg(feature = "fetch")]
use crate::envelope::RequestBody;

/// What a transport hands back to the envelope layer.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Effective request URL including the query string, so callers can
    /// inspect the `sign` and `method` fields.
    pub url: String,
    /// Raw response body; the envelope layer extracts `encrypted` and
    /// `biz_response` from it.
    pub body: Value,
}

/// Injectable HTTP client seam.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST a fully-formed wire request and return the structured response.
    async fn execute(&self, request: &WireRequest) -> Result<TransportResponse, Error>;
}

// ---------------------------------------------------------------------------
// Default reqwest-backed transport (fetch-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "fetch")]
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "fetch")]
impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "fetch")]
#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &WireRequest) -> Result<TransportResponse, Error> {
        let mut builder = self.client.post(&request.url).query(&request.query);
        builder = match &request.body {
            RequestBody::Form { params } => builder.form(&[("params", params.as_str())]),
            RequestBody::Multipart { params, files } => {
                let mut form = reqwest::multipart::Form::new().text("params", params.clone());
                for file in files {
                    form = form.part(
                        file.field.clone(),
                        reqwest::multipart::Part::bytes(file.content.clone())
                            .file_name(file.file_name.clone()),
                    );
                }
                builder.multipart(form)
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.json().await?;
        Ok(TransportResponse { status, url, body })
    }
}
