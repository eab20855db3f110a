//! `bce-auth-v1` request signing

use super::canonical::canonical_request;
use crate::error::{QianfanError, QianfanResult};
use crate::transport::PreparedRequest;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Source of the signing timestamp
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

pub const AUTH_VERSION: &str = "bce-auth-v1";
pub const DATE_HEADER: &str = "x-bce-date";

/// `YYYY-MM-DDTHH:MM:SSZ`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub(crate) fn hmac_sha256_hex(key: &[u8], data: &str) -> QianfanResult<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| QianfanError::validation(format!("invalid signing key: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Signs requests with an access key / secret key pair
#[derive(Clone)]
pub struct BceSigner {
    access_key: String,
    secret_key: String,
    expiration_secs: u64,
    clock: Clock,
}

impl BceSigner {
    /// Create a signer; both keys must be non-empty
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        expiration_secs: u64,
    ) -> QianfanResult<Self> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();
        if access_key.trim().is_empty() {
            return Err(QianfanError::validation_field(
                "access key is empty",
                "access_key",
            ));
        }
        if secret_key.trim().is_empty() {
            return Err(QianfanError::validation_field(
                "secret key is empty",
                "secret_key",
            ));
        }
        Ok(Self {
            access_key,
            secret_key,
            expiration_secs,
            clock: system_clock(),
        })
    }

    /// Replace the clock, e.g. to pin the timestamp
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// `bce-auth-v1/{ak}/{timestamp}/{ttl}`
    pub fn auth_prefix(&self, timestamp: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            AUTH_VERSION, self.access_key, timestamp, self.expiration_secs
        )
    }

    /// Compute the `Authorization` value for a request already carrying its
    /// `Host` and `x-bce-date` headers
    pub fn authorization(&self, request: &PreparedRequest, timestamp: &str) -> QianfanResult<String> {
        let prefix = self.auth_prefix(timestamp);
        let signing_key = hmac_sha256_hex(self.secret_key.as_bytes(), &prefix)?;

        let url = request.parsed_url()?;
        let (canonical, signed_names) = canonical_request(request, url.path());
        let signature = hmac_sha256_hex(signing_key.as_bytes(), &canonical)?;

        Ok(format!("{}/{}/{}", prefix, signed_names, signature))
    }

    /// Add `Host`, `x-bce-date` and `Authorization` to the request
    pub fn sign(&self, request: &mut PreparedRequest) -> QianfanResult<()> {
        let timestamp = format_timestamp((self.clock)());
        request.set_header("Host", request.host()?);
        request.set_header(DATE_HEADER, timestamp.as_str());

        let authorization = self.authorization(request, &timestamp)?;
        request.set_header("Authorization", authorization);
        Ok(())
    }
}

impl fmt::Debug for BceSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BceSigner")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("expiration_secs", &self.expiration_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_clock(secs: i64) -> Clock {
        Arc::new(move || Utc.timestamp_opt(secs, 0).unwrap())
    }

    fn signer(secs: i64) -> BceSigner {
        BceSigner::new("ak-test", "sk-test", 300)
            .unwrap()
            .with_clock(fixed_clock(secs))
    }

    fn request() -> PreparedRequest {
        PreparedRequest::post(
            "https://aip.baidubce.com/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/completions",
        )
        .unwrap()
        .with_query("b", "2")
        .with_query("a", "")
    }

    #[test]
    fn test_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(at), "2024-01-02T03:04:05Z");
    }

    #[test]
    fn test_signing_is_deterministic() {
        let mut first = request();
        let mut second = request();
        signer(1_700_000_000).sign(&mut first).unwrap();
        signer(1_700_000_000).sign(&mut second).unwrap();

        assert_eq!(first.header("Authorization"), second.header("Authorization"));
    }

    #[test]
    fn test_signature_changes_with_timestamp() {
        let mut first = request();
        let mut second = request();
        signer(1_700_000_000).sign(&mut first).unwrap();
        signer(1_700_000_001).sign(&mut second).unwrap();

        assert_ne!(first.header("Authorization"), second.header("Authorization"));
    }

    #[test]
    fn test_authorization_layout() {
        let mut req = request();
        signer(1_700_000_000).sign(&mut req).unwrap();

        let timestamp = "2023-11-14T22:13:20Z";
        assert_eq!(req.header("x-bce-date"), Some(timestamp));
        assert_eq!(req.header("host"), Some("aip.baidubce.com"));

        let auth = req.header("authorization").unwrap();
        let prefix = format!("bce-auth-v1/ak-test/{}/300/host;x-bce-date/", timestamp);
        assert!(auth.starts_with(&prefix), "{auth}");

        let signature = &auth[prefix.len()..];
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_matches_manual_derivation() {
        let mut req = request();
        signer(1_700_000_000).sign(&mut req).unwrap();

        let prefix = "bce-auth-v1/ak-test/2023-11-14T22:13:20Z/300";
        let signing_key = hmac_sha256_hex(b"sk-test", prefix).unwrap();
        let canonical = "POST\n\
            /rpc/2.0/ai_custom/v1/wenxinworkshop/chat/completions\n\
            a=&b=2\n\
            host:aip.baidubce.com\n\
            x-bce-date:2023-11-14T22%3A13%3A20Z";
        let signature = hmac_sha256_hex(signing_key.as_bytes(), canonical).unwrap();

        assert_eq!(
            req.header("authorization").unwrap(),
            format!("{}/host;x-bce-date/{}", prefix, signature)
        );
    }

    #[test]
    fn test_hmac_known_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            hmac_sha256_hex(b"Jefe", "what do ya want for nothing?").unwrap(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_empty_credentials_rejected() {
        assert!(BceSigner::new("", "sk", 300).unwrap_err().is_validation());
        assert!(BceSigner::new("ak", " ", 300).unwrap_err().is_validation());
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let rendered = format!("{:?}", signer(0));
        assert!(!rendered.contains("sk-test"));
    }
}
