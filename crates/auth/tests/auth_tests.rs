use reqwest::Client;
use serde_json::json;
use trip_planner_auth::{Auth, AuthError, AuthOptions};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_json(access_token: &str, refresh_token: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": 4_102_444_800i64,
        "refresh_token": refresh_token,
        "user": {
            "id": "test_user_id",
            "email": "test@example.com",
            "role": "authenticated"
        }
    })
}

#[tokio::test]
async fn test_sign_in_then_get_user() {
    // モックサーバーの起動
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_json(json!({
            "email": "test@example.com",
            "password": "password123"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json("test_access_token", "test_refresh_token")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer test_access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "test_user_id",
            "email": "test@example.com",
            "user_metadata": { "name": "Ada" }
        })))
        .mount(&mock_server)
        .await;

    let auth = Auth::new(
        &mock_server.uri(),
        "test_anon_key",
        Client::new(),
        AuthOptions::default(),
    );

    let session = auth
        .sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(session.user.id, "test_user_id");
    assert!(!session.is_expired());

    let user = auth.get_user().await.unwrap();
    assert_eq!(user.email.as_deref(), Some("test@example.com"));
    assert_eq!(user.display_name(), Some("Ada"));
}

#[tokio::test]
async fn test_get_user_without_session() {
    let auth = Auth::new(
        "http://localhost:1",
        "test_anon_key",
        Client::new(),
        AuthOptions::default(),
    );

    assert!(matches!(
        auth.get_user().await,
        Err(AuthError::MissingSession)
    ));
}

#[tokio::test]
async fn test_refresh_session() {
    // モックサーバーの起動
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({ "refresh_token": "old_refresh_token" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json("new_access_token", "new_refresh_token")),
        )
        .mount(&mock_server)
        .await;

    let auth = Auth::new(
        &mock_server.uri(),
        "test_anon_key",
        Client::new(),
        AuthOptions::default(),
    );
    let old = serde_json::from_value(session_json("old_access_token", "old_refresh_token")).unwrap();
    auth.set_session(old);

    let refreshed = auth.refresh_session().await.unwrap();
    assert_eq!(refreshed.access_token, "new_access_token");
    assert_eq!(refreshed.refresh_token, "new_refresh_token");
    assert_eq!(
        auth.get_session().map(|s| s.access_token),
        Some("new_access_token".to_string())
    );
}
