//! Tests for the GitHub resolver.
//!
//! These tests use mock servers to verify resolver behavior without
//! touching the real GitHub API.

use mirror_core::{MirrorError, RateLimit, ReleaseResolver, RepoId, ResponseMeta};
use mirror_github::{GithubConfig, GithubResolver};
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver_for(server: &MockServer) -> GithubResolver {
    GithubResolver::new(GithubConfig::with_api_base(server.uri())).unwrap()
}

fn release_body(tag: &str, name: &str) -> serde_json::Value {
    json!({
        "tag_name": tag,
        "name": name,
        "assets": [
            {
                "name": "demo-arm64.apk",
                "browser_download_url": "https://github.com/demo/demo/releases/download/1.1.0/demo-arm64.apk",
                "size": 4096
            },
            {
                "name": "demo-x86.apk",
                "browser_download_url": "https://github.com/demo/demo/releases/download/1.1.0/demo-x86.apk",
                "size": 10240
            }
        ]
    })
}

// =============================================================================
// Latest Release Tests
// =============================================================================

mod latest_release {
    use super::*;

    #[tokio::test]
    async fn test_fetch_latest_release() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/demo/demo/releases/latest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(release_body("1.1.0", "Demo 1.1"))
                    .insert_header("x-ratelimit-limit", "60")
                    .insert_header("x-ratelimit-remaining", "59"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver_for(&server);
        let (release, meta) = resolver
            .fetch_latest_release(&CancellationToken::new(), &RepoId::new("demo", "demo"))
            .await
            .unwrap();

        assert_eq!(release.version, "1.1.0");
        assert_eq!(release.assets.len(), 2);
        assert_eq!(release.assets[0].name, "demo-arm64.apk");
        assert_eq!(release.assets[1].size, 10240);
        assert_eq!(meta.status, 200);
        assert_eq!(meta.rate_limit.unwrap().remaining, Some(59));
    }

    #[tokio::test]
    async fn test_version_falls_back_to_release_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/demo/demo/releases/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(release_body("", "Nightly 7")))
            .mount(&server)
            .await;

        let (release, _) = resolver_for(&server)
            .fetch_latest_release(&CancellationToken::new(), &RepoId::new("demo", "demo"))
            .await
            .unwrap();

        assert_eq!(release.version, "Nightly 7");
    }

    #[tokio::test]
    async fn test_token_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/demo/demo/releases/latest"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(release_body("1.0.0", "")))
            .expect(1)
            .mount(&server)
            .await;

        let config = GithubConfig::with_api_base(server.uri()).token("secret-token");
        let resolver = GithubResolver::new(config).unwrap();

        let result = resolver
            .fetch_latest_release(&CancellationToken::new(), &RepoId::new("demo", "demo"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_missing_release_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/demo/empty/releases/latest"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .fetch_latest_release(&CancellationToken::new(), &RepoId::new("demo", "empty"))
            .await
            .unwrap_err();

        match err {
            MirrorError::Provider { message, .. } => assert!(message.contains("demo/empty")),
            other => panic!("Expected Provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_keeps_response_meta() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/demo/demo/releases/latest"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .fetch_latest_release(&CancellationToken::new(), &RepoId::new("demo", "demo"))
            .await
            .unwrap_err();

        assert!(!err.is_rate_limited());
        assert_eq!(err.response_meta().map(|m| m.status), Some(502));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/demo/demo/releases/latest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(release_body("1.0.0", ""))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let resolver = resolver_for(&server);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = resolver
            .fetch_latest_release(&cancel, &RepoId::new("demo", "demo"))
            .await
            .unwrap_err();
        assert!(matches!(err, MirrorError::Cancelled));
    }
}

// =============================================================================
// Rate Limit Tests
// =============================================================================

mod rate_limiting {
    use super::*;

    #[tokio::test]
    async fn test_exhausted_limit_is_reported() {
        let reset = chrono::Utc::now().timestamp() + 120;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/demo/demo/releases/latest"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string(r#"{"message":"API rate limit exceeded"}"#)
                    .insert_header("x-ratelimit-limit", "60")
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", reset.to_string().as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .fetch_latest_release(&CancellationToken::new(), &RepoId::new("demo", "demo"))
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        let meta = err.response_meta().unwrap();
        let rate_limit = meta.rate_limit.as_ref().unwrap();
        assert_eq!(rate_limit.remaining, Some(0));
        assert_eq!(rate_limit.reset_at.unwrap().timestamp(), reset);
    }

    #[tokio::test]
    async fn test_too_many_requests_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/demo/demo/releases/latest"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .fetch_latest_release(&CancellationToken::new(), &RepoId::new("demo", "demo"))
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(
            err.response_meta()
                .and_then(|m| m.rate_limit.as_ref())
                .and_then(|rl| rl.retry_after),
            Some(Duration::from_secs(30))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_blocks_until_reset() {
        let config = GithubConfig {
            max_rate_limit_wait: Duration::from_secs(600),
            ..GithubConfig::default()
        };
        let resolver = GithubResolver::new(config).unwrap();
        let meta = ResponseMeta::new(403).with_rate_limit(RateLimit {
            limit: Some(60),
            remaining: Some(0),
            reset_at: Some(chrono::Utc::now() + chrono::Duration::seconds(90)),
            retry_after: None,
        });

        let start = tokio::time::Instant::now();
        let waited = resolver.handle_rate_limit(&meta).await;

        assert!(waited >= Duration::from_secs(89));
        assert!(start.elapsed() >= waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_bounded_by_ceiling() {
        let config = GithubConfig {
            max_rate_limit_wait: Duration::from_secs(5),
            ..GithubConfig::default()
        };
        let resolver = GithubResolver::new(config).unwrap();
        let meta = ResponseMeta::new(403).with_rate_limit(RateLimit {
            limit: Some(60),
            remaining: Some(0),
            reset_at: Some(chrono::Utc::now() + chrono::Duration::hours(1)),
            retry_after: None,
        });

        let waited = resolver.handle_rate_limit(&meta).await;
        assert_eq!(waited, Duration::from_secs(5));
    }
}

// =============================================================================
// Repository Location Tests
// =============================================================================

mod repository_location {
    use super::*;

    #[tokio::test]
    async fn test_repository_url_used_directly() {
        let resolver = GithubResolver::new(GithubConfig::default()).unwrap();
        let url = resolver
            .resolve_repository_url("https://github.com/HMCL-dev/HMCL.git", "ignored")
            .await
            .unwrap();
        assert_eq!(url, "https://github.com/HMCL-dev/HMCL");
    }

    #[tokio::test]
    async fn test_repository_found_on_source_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/launcher"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="https://github.com/MobileGL-Dev/MobileGlues-release/releases">Get it</a>
                   <a href="https://github.com/MobileGL-Dev/MobileGlues-plugin">Plugin</a>"#,
            ))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server);
        let source = format!("{}/launcher", server.uri());

        let first = resolver.resolve_repository_url(&source, "").await.unwrap();
        assert_eq!(first, "https://github.com/MobileGL-Dev/MobileGlues-release");

        let plugin = resolver
            .resolve_repository_url(&source, "plugin")
            .await
            .unwrap();
        assert_eq!(plugin, "https://github.com/MobileGL-Dev/MobileGlues-plugin");

        let repo = resolver.parse_identity(&plugin).unwrap();
        assert_eq!(repo, RepoId::new("MobileGL-Dev", "MobileGlues-plugin"));
    }

    #[tokio::test]
    async fn test_no_matching_link_is_resolution_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/launcher"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>coming soon</p>"))
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .resolve_repository_url(&format!("{}/launcher", server.uri()), "")
            .await
            .unwrap_err();
        assert!(matches!(err, MirrorError::Resolution(_)));
    }

    #[tokio::test]
    async fn test_unreachable_page_is_resolution_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/launcher"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .resolve_repository_url(&format!("{}/launcher", server.uri()), "")
            .await
            .unwrap_err();
        assert!(matches!(err, MirrorError::Resolution(_)));
    }

    #[test]
    fn test_parse_identity_rejects_foreign_hosts() {
        let resolver = GithubResolver::new(GithubConfig::default()).unwrap();
        let err = resolver
            .parse_identity("https://gitee.com/owner/repo")
            .unwrap_err();
        assert!(matches!(err, MirrorError::Parse(_)));
    }
}
