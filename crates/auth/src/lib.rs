//! Trip Planner auth client
//!
//! This crate talks to the GoTrue-compatible `/auth/v1` API that backs the
//! trip planner: email/password sign up and sign in, session refresh,
//! current-user lookup and sign out.

use jsonwebtoken::{decode, DecodingKey, Validation};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// エラー型
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing session")]
    MissingSession,
}

impl AuthError {
    /// バックエンドが返したメッセージ部分だけを取り出す
    ///
    /// GoTrue returns bodies such as `{"msg": "Invalid login credentials"}` or
    /// `{"error_description": "..."}`; anything else is passed through verbatim.
    pub fn message(&self) -> String {
        match self {
            AuthError::ApiError(body) => serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| {
                    ["msg", "message", "error_description", "error"]
                        .iter()
                        .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
                })
                .unwrap_or_else(|| body.clone()),
            other => other.to_string(),
        }
    }
}

/// ユーザー情報
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl User {
    /// 表示名（`user_metadata` の `display_name` または `name`）
    pub fn display_name(&self) -> Option<&str> {
        ["display_name", "name"]
            .iter()
            .find_map(|key| self.user_metadata.get(*key).and_then(|v| v.as_str()))
            .filter(|name| !name.is_empty())
    }
}

/// セッション情報
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub token_type: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: i64,
}

impl Session {
    /// 有効期限（UNIX秒）
    ///
    /// Falls back to the `exp` claim of the access token when the server did
    /// not send `expires_at`. The signature is not checked here; the backend
    /// verifies it on every request.
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at.or_else(|| {
            let mut validation = Validation::default();
            validation.insecure_disable_signature_validation();
            validation.validate_exp = false;
            validation.validate_aud = false;
            validation.required_spec_claims.clear();
            decode::<Claims>(&self.access_token, &DecodingKey::from_secret(&[]), &validation)
                .ok()
                .map(|data| data.claims.exp)
        })
    }

    /// セッションが期限切れかどうか
    pub fn is_expired(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        match self.expires_at() {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}

/// クライアントオプション
#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub persist_session: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
        }
    }
}

/// Auth クライアント
pub struct Auth {
    url: String,
    key: String,
    http_client: Client,
    options: AuthOptions,
    current_session: Arc<RwLock<Option<Session>>>,
}

impl Auth {
    /// 新しい Auth クライアントを作成
    pub fn new(url: &str, key: &str, http_client: Client, options: AuthOptions) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
        }
    }

    /// ベースURL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// ユーザー登録
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/signup", self.url);

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        debug!("signing up {}", email);
        let session = self.post_for_session(&url, &payload).await?;
        self.store_session(&session);

        Ok(session)
    }

    /// メール・パスワードでログイン
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.url);

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        debug!("signing in {}", email);
        let session = self.post_for_session(&url, &payload).await?;
        self.store_session(&session);

        Ok(session)
    }

    /// 現在のセッションを取得
    pub fn get_session(&self) -> Option<Session> {
        self.current_session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 保存済みセッションを復元
    pub fn set_session(&self, session: Session) {
        *self
            .current_session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// 現在のユーザーを取得
    pub async fn get_user(&self) -> Result<User, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let url = format!("{}/auth/v1/user", self.url);

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let user: User = response.json().await?;

        Ok(user)
    }

    /// セッションをリフレッシュ
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.url);

        let payload = serde_json::json!({
            "refresh_token": session.refresh_token,
        });

        debug!("refreshing session for {}", session.user.id);
        let new_session = self.post_for_session(&url, &payload).await?;
        self.store_session(&new_session);

        Ok(new_session)
    }

    /// サインアウト
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let url = format!("{}/auth/v1/logout", self.url);

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        // セッションはサーバーの応答に関わらずクリア
        self.clear_session();

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        Ok(())
    }

    /// ローカルのセッションを破棄
    pub fn clear_session(&self) {
        *self
            .current_session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    async fn post_for_session(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<Session, AuthError> {
        let response = self
            .http_client
            .post(url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        Ok(response.json::<Session>().await?)
    }

    fn store_session(&self, session: &Session) {
        if self.options.persist_session {
            self.set_session(session.clone());
        }
    }
}
