use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Console error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error: {0}")]
    Upstream(#[from] ApiError),
}

/// Failure of a call to the external backend, classified by HTTP status
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("backend rejected the session")]
    Unauthorized { message: Option<String> },

    #[error("backend denied access")]
    Forbidden { message: Option<String> },

    #[error("backend resource not found")]
    NotFound { message: Option<String> },

    #[error("backend failed with status {status}")]
    Server { status: u16, message: Option<String> },

    #[error("backend returned status {status}")]
    Status { status: u16, message: Option<String> },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed backend response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success response. `body` is the raw response text; a
    /// JSON `message` field in it is kept for display.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.is_empty());

        match status {
            401 => ApiError::Unauthorized { message },
            403 => ApiError::Forbidden { message },
            404 => ApiError::NotFound { message },
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::Status { status, message },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Message supplied by the backend, if any
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::Forbidden { message }
            | ApiError::NotFound { message }
            | ApiError::Server { message, .. }
            | ApiError::Status { message, .. } => message.as_deref(),
            ApiError::Network(_) | ApiError::Decode(_) => None,
        }
    }

    /// Transient notification text shown to the operator
    pub fn notice(&self) -> String {
        match self {
            ApiError::Unauthorized { .. } => "未授权，请重新登录".to_string(),
            ApiError::Forbidden { .. } => "权限不足，无法访问该资源".to_string(),
            ApiError::NotFound { .. } => "请求的资源不存在".to_string(),
            ApiError::Server { .. } => "服务器内部错误，请稍后重试".to_string(),
            ApiError::Status { message, .. } => message
                .clone()
                .unwrap_or_else(|| "请求失败，请稍后重试".to_string()),
            ApiError::Network(_) => "网络连接失败，请检查网络设置".to_string(),
            ApiError::Decode(_) => "响应数据格式错误".to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Status { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ApiError::Server { .. } | ApiError::Network(_) | ApiError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

/// Error response body, the failure form of `ApiResponse`
#[derive(Serialize)]
struct ErrorResponse {
    code: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Io(err) => {
                tracing::error!("IO error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "IO Error".to_string(), None)
            }
            AppError::Upstream(err) => {
                tracing::warn!("Backend call failed: {}", err);
                let message = err
                    .backend_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| err.notice());
                (err.status_code(), message, Some(err.to_string()))
            }
        };

        let body = ErrorResponse {
            code: false,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for the console
pub type AppResult<T> = Result<T, AppError>;

/// Helper trait for converting Option to AppError::NotFound
pub trait OptionExt<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_response() {
        let err = AppError::NotFound("部门不存在".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], false);
        assert_eq!(body["message"], "部门不存在");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_option_ext() {
        let opt: Option<i32> = None;
        let result = opt.ok_or_not_found("Item not found");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_classify_statuses() {
        assert!(ApiError::from_status(401, "").is_unauthorized());
        assert!(matches!(ApiError::from_status(403, ""), ApiError::Forbidden { .. }));
        assert!(matches!(ApiError::from_status(404, ""), ApiError::NotFound { .. }));
        assert!(matches!(ApiError::from_status(500, ""), ApiError::Server { status: 500, .. }));
        assert!(matches!(ApiError::from_status(409, ""), ApiError::Status { status: 409, .. }));
    }

    #[test]
    fn test_backend_message_kept() {
        let err = ApiError::from_status(400, r#"{"message":"部门名称已存在"}"#);
        assert_eq!(err.backend_message(), Some("部门名称已存在"));
        assert_eq!(err.notice(), "部门名称已存在");

        let err = ApiError::from_status(418, "not json");
        assert_eq!(err.backend_message(), None);
        assert_eq!(err.notice(), "请求失败，请稍后重试");
    }

    #[test]
    fn test_upstream_status_mapping() {
        let response = AppError::from(ApiError::from_status(403, "")).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = AppError::from(ApiError::from_status(503, "")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = AppError::from(ApiError::from_status(422, "")).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
