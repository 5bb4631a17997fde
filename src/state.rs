use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::api::{ApiClient, DepartmentQuery, SessionHandle};
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::store::{self, DepartmentState, FactoryState, JsonStore, SessionState};
use crate::ws::{WsMessage, HUB};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient message for the operator (toast)
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Backend client
    pub api: ApiClient,
    /// Persisted operator session
    pub session: SessionHandle,
    /// Persisted factory selection
    pub factories: Arc<RwLock<JsonStore<FactoryState>>>,
    /// Cached department tree
    pub departments: Arc<RwLock<DepartmentState>>,
    /// Notice sender
    pub notice_sender: broadcast::Sender<Notice>,
}

impl AppState {
    /// Create new application state, loading the persisted stores
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let session: SessionHandle = Arc::new(RwLock::new(JsonStore::load(
            &config.store.dir,
            store::session::STORE_NAME,
        )));
        let factories = JsonStore::load(&config.store.dir, store::factory::STORE_NAME);
        let api = ApiClient::new(&config.upstream, session.clone())?;
        let (notice_sender, _) = broadcast::channel(256);

        Ok(Self {
            config: Arc::new(config),
            api,
            session,
            factories: Arc::new(RwLock::new(factories)),
            departments: Arc::new(RwLock::new(DepartmentState::default())),
            notice_sender,
        })
    }

    /// Push a notice to every connected console
    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            at: Utc::now(),
        };
        // Ignore send errors (no receivers is fine)
        let _ = self.notice_sender.send(notice);
    }

    /// Subscribe to notices
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notice_sender.subscribe()
    }

    /// Surface a failed operation. Backend-side classes (session, permission,
    /// missing resource, server, network) use their fixed text; anything else
    /// shows the backend's message or `fallback`.
    pub fn report(&self, err: &AppError, fallback: &str) {
        let message = match err {
            AppError::Upstream(api) => {
                if api.is_unauthorized() {
                    HUB.broadcast(WsMessage::SessionExpired);
                }
                match api {
                    ApiError::Status { .. } => api.backend_message().unwrap_or(fallback).to_string(),
                    _ => api.notice(),
                }
            }
            AppError::Forbidden(msg) | AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.clone(),
            _ => fallback.to_string(),
        };
        self.notify(NoticeLevel::Error, message);
    }

    pub async fn session_snapshot(&self) -> SessionState {
        self.session.read().await.get().clone()
    }

    /// Factory the console works on: the explicit selection, else the
    /// operator's own factory
    pub async fn current_factory_id(&self) -> Option<String> {
        if let Some(id) = self.factories.read().await.get().current_id() {
            return Some(id.to_string());
        }
        self.session.read().await.get().factory_id().map(str::to_string)
    }

    /// Refetch the department list and rebuild the cached tree
    pub async fn refresh_departments(&self) -> AppResult<()> {
        let factory_id = self
            .current_factory_id()
            .await
            .ok_or_else(|| AppError::BadRequest("请先选择厂区".to_string()))?;
        let include_deleted = {
            let mut departments = self.departments.write().await;
            departments.loading = true;
            departments.show_deleted
        };

        let query = DepartmentQuery {
            factory_id: Some(factory_id.clone()),
            include_deleted,
        };
        let result = self.api.list_departments(&query).await;

        let mut departments = self.departments.write().await;
        departments.loading = false;
        match result {
            Ok(list) => {
                tracing::debug!("Fetched {} departments for factory {}", list.len(), factory_id);
                departments.replace(Some(factory_id), list);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Refresh the tree unless the cache already covers the current factory
    pub async fn ensure_departments(&self) -> AppResult<()> {
        let factory_id = self.current_factory_id().await;
        if self.departments.read().await.is_fresh_for(factory_id.as_deref()) {
            return Ok(());
        }
        self.refresh_departments().await
    }
}
