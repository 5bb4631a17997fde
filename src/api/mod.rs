//! REST client for the production-management backend
//!
//! [`ApiClient`] owns the shared `reqwest::Client` and plays the part of the
//! request/response interceptors: it attaches the stored bearer token,
//! captures a token handed back by the backend, classifies failures into
//! [`ApiError`] and drops the session when the backend answers 401.
//! Resource wrappers live in the submodules as further `impl ApiClient`
//! blocks.

pub mod auth;
pub mod department;
pub mod factory;
pub mod personnel;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::UpstreamConfig;
use crate::entity::Employee;
use crate::error::ApiError;
use crate::store::{JsonStore, SessionState};

pub use department::{CreateDepartment, DepartmentQuery, UpdateDepartment};
pub use personnel::EmployeeQuery;

/// Empty query string for `get`/`delete`
pub const NO_QUERY: &[(&str, &str)] = &[];

/// Shared handle on the persisted session
pub type SessionHandle = Arc<RwLock<JsonStore<SessionState>>>;

/// Backend calls that must go out without a token
fn is_anonymous_path(path: &str) -> bool {
    path.contains("/auth/login") || path.contains("/auth/register") || path.contains("/auth/captcha")
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionHandle,
}

impl ApiClient {
    pub fn new(config: &UpstreamConfig, session: SessionHandle) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self::with_client(client, config.base_url.clone(), session))
    }

    /// Reuse an existing [`reqwest::Client`]
    pub fn with_client(client: reqwest::Client, base_url: String, session: SessionHandle) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.client.get(self.url(path)).query(query);
        self.send(builder, path).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.client.post(self.url(path)).json(body);
        self.send(builder, path).await
    }

    /// POST without a request body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.client.post(self.url(path));
        self.send(builder, path).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.client.put(self.url(path)).json(body);
        self.send(builder, path).await
    }

    pub async fn delete<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.client.delete(self.url(path)).query(query);
        self.send(builder, path).await
    }

    /// Authorized request builder for calls the typed wrappers do not cover
    pub async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.authorize(self.client.request(method, self.url(path)), path).await
    }

    async fn authorize(&self, builder: RequestBuilder, path: &str) -> RequestBuilder {
        if is_anonymous_path(path) {
            return builder;
        }
        match self.session.read().await.get().token.as_deref() {
            Some(token) if !token.is_empty() => builder.bearer_auth(token),
            _ => {
                tracing::debug!("No token stored, calling {} anonymously", path);
                builder
            }
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, path: &str) -> Result<T, ApiError> {
        let response = self.authorize(builder, path).await.send().await?;
        let status = response.status();
        tracing::debug!("Backend {} -> {}", path, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status.as_u16(), &body);
            self.observe_failure(&err).await;
            return Err(err);
        }

        let bytes = response.bytes().await?;
        let value: serde_json::Value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?
        };
        self.capture_token(&value).await;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
    }

    /// Store a token the backend hands back in a JSON body
    pub async fn capture_token(&self, body: &serde_json::Value) {
        let Some(token) = body.get("token").and_then(|t| t.as_str()) else {
            return;
        };
        let mut session = self.session.write().await;
        if let Err(e) = session.update(|s| s.set_token(token)) {
            tracing::error!("Failed to persist session token: {}", e);
        }
    }

    /// Side effects of a failed call: a rejected session is forgotten
    pub async fn observe_failure(&self, err: &ApiError) {
        if !err.is_unauthorized() {
            return;
        }
        tracing::warn!("Backend rejected the session, clearing stored credentials");
        let mut session = self.session.write().await;
        if let Err(e) = session.update(SessionState::clear) {
            tracing::error!("Failed to persist cleared session: {}", e);
        }
    }
}

/// The backend calls behind employee reassignment
#[async_trait]
pub trait Directory: Send + Sync {
    async fn employees(&self, query: &EmployeeQuery) -> Result<Vec<Employee>, ApiError>;

    /// Move employees into a department, returning how many were updated
    async fn assign_employees(&self, department_id: &str, employee_ids: &[String]) -> Result<u32, ApiError>;
}

#[async_trait]
impl Directory for ApiClient {
    async fn employees(&self, query: &EmployeeQuery) -> Result<Vec<Employee>, ApiError> {
        self.list_employees(query).await
    }

    async fn assign_employees(&self, department_id: &str, employee_ids: &[String]) -> Result<u32, ApiError> {
        ApiClient::assign_employees(self, department_id, employee_ids).await
    }
}
