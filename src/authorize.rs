//! Authorization redirect URL builder.
//!
//! Uses the same canonicalize/sign/encrypt primitives as the request
//! envelope, but renders a GET URL for the browser redirect instead of
//! issuing an HTTP call.

use serde_json::{json, Map, Value};

use crate::crypto;
use crate::envelope::ClientConfig;
use crate::error::Error;
use crate::keys::ClientKeys;
use crate::params::{serialize_params, ParameterSet};

/// Operation name carried in the redirect URL.
pub const AUTHORIZE_METHOD: &str = "zhima.auth.info.authorize";

/// Which end the user authorizes from. Unrecognized input falls back to PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthChannel {
    #[default]
    Pc,
    H5,
}

impl AuthChannel {
    /// Parse a caller-supplied channel name, case-insensitively.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "h5" => AuthChannel::H5,
            _ => AuthChannel::Pc,
        }
    }

    fn wire_channel(self) -> &'static str {
        match self {
            AuthChannel::Pc => "apppc",
            AuthChannel::H5 => "app",
        }
    }
}

/// Identity the authorization is requested for. The two kinds are mutually
/// exclusive on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthIdentity {
    /// Full name plus national identity card number.
    Cert { name: String, cert_no: String },
    /// Mobile phone number.
    Mobile { mobile: String },
}

impl AuthIdentity {
    fn identity_type(&self) -> &'static str {
        match self {
            AuthIdentity::Cert { .. } => "2",
            AuthIdentity::Mobile { .. } => "1",
        }
    }

    fn identity_param(&self) -> Value {
        match self {
            AuthIdentity::Cert { name, cert_no } => json!({
                "name": name,
                "certNo": cert_no,
                "certType": "IDENTITY_CARD",
            }),
            AuthIdentity::Mobile { mobile } => json!({ "mobileNo": mobile }),
        }
    }
}

// Auth code is determined jointly by the user's end (PC or H5) and the
// verification method (cert or mobile).
fn auth_code(channel: AuthChannel, identity: &AuthIdentity) -> &'static str {
    match (channel, identity) {
        (AuthChannel::Pc, AuthIdentity::Mobile { .. }) => "M_MOBILE_APPPC",
        (AuthChannel::Pc, AuthIdentity::Cert { .. }) => "M_APPPC_CERT",
        (AuthChannel::H5, _) => "M_H5",
    }
}

/// The built redirect plus the structured values embedded in it, echoed so
/// callers can display them before redirecting.
#[derive(Debug, Clone)]
pub struct AuthorizeUrl {
    pub identity_type: String,
    pub identity_param: Value,
    pub biz_params: Value,
    pub url: String,
}

/// Build the authorization redirect URL.
pub fn build_authorize_url(
    config: &ClientConfig,
    keys: &ClientKeys,
    identity: &AuthIdentity,
    state: Option<&str>,
    channel: AuthChannel,
) -> Result<AuthorizeUrl, Error> {
    let identity_param = identity.identity_param();
    let mut biz = Map::new();
    biz.insert("auth_code".into(), json!(auth_code(channel, identity)));
    if let Some(state) = state {
        biz.insert("state".into(), json!(state));
    }
    let biz_params = Value::Object(biz);

    let mut params = ParameterSet::new();
    params.insert("identity_type".into(), json!(identity.identity_type()));
    params.insert(
        "identity_param".into(),
        Value::String(serde_json::to_string(&identity_param)?),
    );
    params.insert(
        "biz_params".into(),
        Value::String(serde_json::to_string(&biz_params)?),
    );

    let canonical = serialize_params(&params);
    let sign = crypto::sign(&canonical, &keys.app_private_key)?;
    let cipher = crypto::encrypt(canonical.as_bytes(), &keys.zmxy_public_key)?;

    let query = [
        ("method", AUTHORIZE_METHOD),
        ("params", cipher.as_str()),
        ("sign", sign.as_str()),
        ("version", config.version.as_str()),
        ("platform", config.platform.as_str()),
        ("channel", channel.wire_channel()),
        ("charset", config.charset.as_str()),
        ("app_id", config.app_id.as_str()),
    ]
    .iter()
    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
    .collect::<Vec<_>>()
    .join("&");

    Ok(AuthorizeUrl {
        identity_type: identity.identity_type().to_string(),
        identity_param,
        biz_params,
        url: format!("{}?{}", config.api_url, query),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::deserialize_params;
    use crate::test_util::app_keys;
    use serde_json::json;

    fn config() -> ClientConfig {
        ClientConfig::new("1000980")
    }

    fn mobile() -> AuthIdentity {
        AuthIdentity::Mobile {
            mobile: "12345678901".into(),
        }
    }

    fn cert() -> AuthIdentity {
        AuthIdentity::Cert {
            name: "张三".into(),
            cert_no: "111111111111111111".into(),
        }
    }

    #[test]
    fn test_mobile_on_pc() {
        let auth =
            build_authorize_url(&config(), &app_keys(), &mobile(), None, AuthChannel::Pc).unwrap();
        assert_eq!(auth.identity_type, "1");
        assert_eq!(auth.identity_param["mobileNo"], json!("12345678901"));
        assert_eq!(auth.biz_params["auth_code"], json!("M_MOBILE_APPPC"));
        assert!(auth.url.starts_with("https://zmopenapi.zmxy.com.cn/openapi.do?method=zhima.auth.info.authorize&params="));
        assert!(auth.url.contains("&channel=apppc&"));
    }

    #[test]
    fn test_mobile_on_h5() {
        let auth =
            build_authorize_url(&config(), &app_keys(), &mobile(), None, AuthChannel::H5).unwrap();
        assert_eq!(auth.identity_type, "1");
        assert_eq!(auth.biz_params["auth_code"], json!("M_H5"));
        assert!(auth.url.contains("&channel=app&"));
    }

    #[test]
    fn test_cert_on_pc() {
        let auth =
            build_authorize_url(&config(), &app_keys(), &cert(), None, AuthChannel::Pc).unwrap();
        assert_eq!(auth.identity_type, "2");
        assert_eq!(auth.identity_param["name"], json!("张三"));
        assert_eq!(auth.identity_param["certNo"], json!("111111111111111111"));
        assert_eq!(auth.identity_param["certType"], json!("IDENTITY_CARD"));
        assert_eq!(auth.biz_params["auth_code"], json!("M_APPPC_CERT"));
    }

    #[test]
    fn test_cert_on_h5() {
        let auth =
            build_authorize_url(&config(), &app_keys(), &cert(), None, AuthChannel::H5).unwrap();
        assert_eq!(auth.identity_type, "2");
        assert_eq!(auth.biz_params["auth_code"], json!("M_H5"));
    }

    #[test]
    fn test_unrecognized_channel_falls_back_to_pc() {
        assert_eq!(AuthChannel::parse("strange"), AuthChannel::Pc);
        assert_eq!(AuthChannel::parse("PC"), AuthChannel::Pc);
        assert_eq!(AuthChannel::parse("H5"), AuthChannel::H5);
        let auth = build_authorize_url(
            &config(),
            &app_keys(),
            &cert(),
            None,
            AuthChannel::parse("strange"),
        )
        .unwrap();
        assert_eq!(auth.biz_params["auth_code"], json!("M_APPPC_CERT"));
    }

    #[test]
    fn test_state_carried_in_biz_params() {
        let auth = build_authorize_url(
            &config(),
            &app_keys(),
            &mobile(),
            Some("order-42"),
            AuthChannel::Pc,
        )
        .unwrap();
        assert_eq!(auth.biz_params["state"], json!("order-42"));

        let without = build_authorize_url(&config(), &app_keys(), &mobile(), None, AuthChannel::Pc)
            .unwrap();
        assert!(without.biz_params.get("state").is_none());
    }

    #[test]
    fn test_url_params_decrypt_and_sign_verifies() {
        let keys = app_keys();
        let auth = build_authorize_url(&config(), &keys, &mobile(), Some("s"), AuthChannel::Pc)
            .unwrap();
        let query = auth.url.split_once('?').unwrap().1;
        let fields = deserialize_params(query).unwrap();
        assert_eq!(fields["method"], AUTHORIZE_METHOD);
        assert_eq!(fields["app_id"], "1000980");
        assert_eq!(fields["version"], "1.0");
        assert_eq!(fields["platform"], "zmop");
        assert_eq!(fields["charset"], "UTF-8");

        let canonical_bytes =
            crate::crypto::decrypt(&fields["params"], &keys.app_private_key).unwrap();
        let canonical = String::from_utf8(canonical_bytes).unwrap();
        assert!(crate::crypto::verify(&canonical, &fields["sign"], &keys.zmxy_public_key));
        let inner = deserialize_params(&canonical).unwrap();
        assert_eq!(inner["identity_type"], "1");
    }
}
