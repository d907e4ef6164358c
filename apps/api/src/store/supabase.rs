//! REST client for the hosted row/auth service.
//!
//! Rows go through the PostgREST-style `/rest/v1/{table}` endpoints with
//! `col=eq.value` / `col=lte.value` query predicates; auth goes through the
//! GoTrue-style `/auth/v1/*` endpoints. One client serves both concerns so
//! the base URL and service key are configured once.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::{AuthError, AuthProvider, AuthSession, AuthUser};
use crate::store::{Op, RowFilter, RowStore, StoreError};

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct SupabaseClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    /// Renders filter predicates as PostgREST query parameters.
    fn query_pairs(filter: &RowFilter) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = filter
            .predicates
            .iter()
            .map(|p| {
                let op = match p.op {
                    Op::Eq => "eq",
                    Op::Lte => "lte",
                };
                (p.column.clone(), format!("{op}.{}", literal(&p.value)))
            })
            .collect();
        if let Some(limit) = filter.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }

    async fn check_rows(response: reqwest::Response) -> Result<Vec<Value>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

/// Predicate values are rendered bare: strings without JSON quoting,
/// everything else via its JSON form.
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RowStore for SupabaseClient {
    async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError> {
        let response = self
            .http
            .post(self.rest_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;
        let rows = Self::check_rows(response).await?;
        rows.into_iter().next().ok_or(StoreError::EmptyInsert)
    }

    async fn select(&self, table: &str, filter: &RowFilter) -> Result<Vec<Value>, StoreError> {
        let mut pairs = Self::query_pairs(filter);
        pairs.push(("select".to_string(), "*".to_string()));
        let response = self
            .http
            .get(self.rest_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&pairs)
            .send()
            .await?;
        Self::check_rows(response).await
    }

    async fn update(
        &self,
        table: &str,
        filter: &RowFilter,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let response = self
            .http
            .patch(self.rest_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .query(&Self::query_pairs(filter))
            .json(&patch)
            .send()
            .await?;
        Self::check_rows(response).await
    }

    async fn delete(&self, table: &str, filter: &RowFilter) -> Result<u64, StoreError> {
        let response = self
            .http
            .delete(self.rest_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .query(&Self::query_pairs(filter))
            .send()
            .await?;
        let rows = Self::check_rows(response).await?;
        Ok(rows.len() as u64)
    }
}

#[derive(Debug, Deserialize)]
struct GotrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<GotrueUser> for AuthUser {
    fn from(user: GotrueUser) -> Self {
        let full_name = user.user_metadata["full_name"]
            .as_str()
            .map(str::to_string);
        let role = user.user_metadata["role"].as_str().map(str::to_string);
        AuthUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
            full_name,
            role,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    user: GotrueUser,
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(AuthSession {
            user: token.user.into(),
            access_token: token.access_token,
            token_type: token.token_type,
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        let response = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name, "role": "admin" }
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // The signup payload is the user object, nested under "user" when a
        // session is issued alongside it.
        let body: Value = response.json().await?;
        let user_value = if body.get("user").map_or(false, Value::is_object) {
            body["user"].clone()
        } else {
            body
        };
        let user: GotrueUser = serde_json::from_value(user_value)?;
        Ok(user.into())
    }

    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let user: GotrueUser = response.json().await?;
        Ok(user.into())
    }
}
