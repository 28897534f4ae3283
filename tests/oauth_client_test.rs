//! Token exchange against a mocked identity platform token endpoint.

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use graph_mail_oauth::{AuthClient, Error, OAuthConfig};

fn config_for(server: &MockServer) -> OAuthConfig {
    OAuthConfig::new(
        "client-123",
        "s3cr3t",
        "contoso",
        "http://localhost:3000/auth/callback".parse().unwrap(),
    )
    .with_authority_host(server.uri().parse().unwrap())
}

fn token_response_body() -> serde_json::Value {
    serde_json::json!({
        "token_type": "Bearer",
        "scope": "User.Read Mail.Read openid profile",
        "expires_in": 3599,
        "access_token": "abc",
        "refresh_token": "refresh-xyz"
    })
}

#[tokio::test]
async fn exchange_code_posts_confidential_client_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contoso/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=valid123"))
        .and(body_string_contains("client_id=client-123"))
        .and(body_string_contains("client_secret=s3cr3t"))
        .and(body_string_contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback",
        ))
        .and(body_string_contains(
            "scope=user.read+mail.read+openid+profile+offline_access",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = AuthClient::new(config.clone());

    let token = client
        .exchange_code(&config.token_request("valid123"))
        .await
        .expect("exchange should succeed");

    assert_eq!(token.access_token, "abc");
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.expires_in, Some(3599));
}

#[tokio::test]
async fn rejected_code_maps_to_oauth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contoso/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "AADSTS70008: The provided authorization code has expired."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = AuthClient::new(config.clone())
        .exchange_code(&config.token_request("bad"))
        .await
        .unwrap_err();

    match err {
        Error::OAuth {
            operation,
            status,
            detail,
        } => {
            assert_eq!(operation, "token exchange");
            assert_eq!(status, Some(400));
            assert!(detail.starts_with("invalid_grant"));
        }
        other => panic!("expected OAuth error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_is_not_echoed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contoso/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = AuthClient::new(config.clone())
        .exchange_code(&config.token_request("valid123"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::OAuth { status: Some(502), .. }));
    assert!(!err.to_string().contains("<html>"));
}

#[tokio::test]
async fn missing_access_token_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contoso/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "access_token": ""
        })))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = AuthClient::new(config.clone())
        .exchange_code(&config.token_request("valid123"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::OAuth { status: None, .. }));
}

#[tokio::test]
async fn unreachable_provider_is_http_error() {
    let config = OAuthConfig::new(
        "client-123",
        "s3cr3t",
        "contoso",
        "http://localhost:3000/auth/callback".parse().unwrap(),
    )
    .with_authority_host("http://127.0.0.1:1".parse().unwrap());

    let err = AuthClient::new(config.clone())
        .exchange_code(&config.token_request("valid123"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(_)));
}
