//! Tests for token caching and signing strategies

use super::exchange::MockTokenExchange;
use super::*;
use crate::error::{QianfanError, QianfanResult};
use crate::transport::PreparedRequest;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Exchange that counts calls and takes a while to answer
struct SlowExchange {
    calls: AtomicU32,
    delay: Duration,
    expires_in: Duration,
}

impl SlowExchange {
    fn new(delay: Duration, expires_in: Duration) -> Self {
        Self {
            calls: AtomicU32::new(0),
            delay,
            expires_in,
        }
    }
}

#[async_trait]
impl TokenExchange for SlowExchange {
    async fn exchange(&self) -> QianfanResult<IssuedToken> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        Ok(IssuedToken {
            value: format!("token-{}", n),
            expires_in: self.expires_in,
        })
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

#[tokio::test]
async fn test_concurrent_callers_trigger_single_exchange() {
    let exchange = Arc::new(SlowExchange::new(
        Duration::from_millis(50),
        Duration::from_secs(3600),
    ));
    let cache = Arc::new(TokenCache::new(exchange.clone()));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "token-1");
    }
    assert_eq!(exchange.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    // Lifetime shorter than the safety offset: expired right away
    let exchange = Arc::new(SlowExchange::new(Duration::ZERO, Duration::from_secs(5)));
    let cache = TokenCache::new(exchange.clone());

    assert_eq!(cache.get_token().await.unwrap(), "token-1");
    assert!(cache.snapshot().is_none());
    assert_eq!(cache.get_token().await.unwrap(), "token-2");
    assert_eq!(exchange.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_expiry_accounts_for_safety_offset() {
    let exchange = Arc::new(SlowExchange::new(Duration::ZERO, Duration::from_secs(100)));
    let cache = TokenCache::new(exchange).with_safety_offset(Duration::from_secs(30));

    cache.get_token().await.unwrap();
    let token = cache.snapshot().unwrap();
    let lifetime = (token.expires_at - token.issued_at).num_seconds();
    assert_eq!(lifetime, 70);
}

#[tokio::test]
async fn test_exchange_failure_leaves_state_unchanged() {
    let mut exchange = MockTokenExchange::new();
    exchange.expect_name().return_const("mock");
    exchange
        .expect_exchange()
        .times(1)
        .returning(|| Err(QianfanError::auth("invalid client")));

    let cache = TokenCache::new(Arc::new(exchange));
    let error = cache.get_token().await.unwrap_err();

    assert!(matches!(error, QianfanError::Auth { .. }));
    assert!(cache.snapshot().is_none());
}

#[tokio::test]
async fn test_invalidate_respects_min_interval() {
    let exchange = Arc::new(SlowExchange::new(Duration::ZERO, Duration::from_secs(3600)));

    let guarded = TokenCache::new(exchange.clone()).with_min_refresh_interval(Duration::from_secs(3600));
    guarded.get_token().await.unwrap();
    assert!(!guarded.invalidate());
    assert!(guarded.snapshot().is_some());

    let open = TokenCache::new(exchange.clone());
    open.get_token().await.unwrap();
    assert!(open.invalidate());
    assert!(open.snapshot().is_none());
    assert_eq!(open.get_token().await.unwrap(), "token-3");
}

#[tokio::test]
async fn test_bearer_header_placement() {
    let signer = Signer::Bearer {
        source: TokenSource::Static("abc".into()),
        placement: TokenPlacement::Header,
    };
    let mut request = PreparedRequest::post("https://host/x").unwrap();
    signer.sign(&mut request).await.unwrap();

    assert_eq!(request.header("authorization"), Some("Bearer abc"));
    assert!(request.query.is_empty());
}

#[tokio::test]
async fn test_bearer_query_placement() {
    let mut exchange = MockTokenExchange::new();
    exchange.expect_name().return_const("mock");
    exchange.expect_exchange().times(1).returning(|| {
        Ok(IssuedToken {
            value: "24.oauth".into(),
            expires_in: Duration::from_secs(2_592_000),
        })
    });

    let signer = Signer::Bearer {
        source: TokenSource::Cached(Arc::new(TokenCache::new(Arc::new(exchange)))),
        placement: TokenPlacement::Query,
    };
    let mut request = PreparedRequest::post("https://host/x?access_token=stale").unwrap();
    signer.sign(&mut request).await.unwrap();
    signer.sign(&mut request).await.unwrap();

    assert_eq!(request.query_param(ACCESS_TOKEN_PARAM), Some("24.oauth"));
    assert_eq!(request.query.len(), 1);
    assert!(request.header("authorization").is_none());
}

#[tokio::test]
async fn test_empty_static_token_fails_fast() {
    let signer = Signer::Bearer {
        source: TokenSource::Static(String::new()),
        placement: TokenPlacement::Header,
    };
    let mut request = PreparedRequest::post("https://host/x").unwrap();

    assert!(signer.sign(&mut request).await.unwrap_err().is_validation());
    assert!(request.header("authorization").is_none());
}

#[tokio::test]
async fn test_hmac_signer_sets_headers() {
    let signer = Signer::Hmac(BceSigner::new("ak", "sk", 300).unwrap());
    let mut request = PreparedRequest::get("https://iam.bj.baidubce.com/v1/x").unwrap();
    signer.sign(&mut request).await.unwrap();

    assert!(
        request
            .header("authorization")
            .unwrap()
            .starts_with("bce-auth-v1/ak/")
    );
    assert!(request.header("x-bce-date").is_some());
    assert!(!signer.invalidate_token());
}
