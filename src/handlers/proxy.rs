//! Backend passthrough
//!
//! Every `/api/...` path the console does not handle itself (logistics,
//! attendance, salary, schedules, capacity, AI configuration and so on) is
//! forwarded to the backend unchanged, with the stored bearer token attached.
//! Failures are classified the same way as typed calls so the operator sees
//! the same notices.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, AppError};
use crate::state::AppState;

/// Request headers worth passing on
const FORWARDED_HEADERS: [header::HeaderName; 3] =
    [header::CONTENT_TYPE, header::ACCEPT, header::ACCEPT_LANGUAGE];

/// Response headers handed back to the console; exports and backups rely on
/// the disposition and caching ones
const RETURNED_HEADERS: [header::HeaderName; 6] = [
    header::CONTENT_TYPE,
    header::CONTENT_DISPOSITION,
    header::CACHE_CONTROL,
    header::CONTENT_LANGUAGE,
    header::ETAG,
    header::LAST_MODIFIED,
];

/// Fallback for unmatched `/api` paths
pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let mut request = state.api.request(method.clone(), path).await;
    for name in FORWARDED_HEADERS.iter() {
        if let Some(value) = headers.get(name) {
            request = request.header(name, value);
        }
    }
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Proxy {} {} failed: {}", method, path, e);
            let err = AppError::from(ApiError::from(e));
            state.report(&err, "请求失败，请稍后重试");
            return err.into_response();
        }
    };

    let status = upstream.status();
    let returned: Vec<_> = RETURNED_HEADERS
        .iter()
        .filter_map(|name| upstream.headers().get(name).map(|value| (name.clone(), value.clone())))
        .collect();
    let bytes = match upstream.bytes().await {
        Ok(b) => b,
        Err(e) => {
            let err = AppError::from(ApiError::from(e));
            state.report(&err, "请求失败，请稍后重试");
            return err.into_response();
        }
    };
    tracing::debug!("Proxy {} {} -> {}", method, path, status);

    if status.is_success() {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
            state.api.capture_token(&value).await;
        }
    } else {
        let err = ApiError::from_status(status.as_u16(), &String::from_utf8_lossy(&bytes));
        state.api.observe_failure(&err).await;
        state.report(&AppError::from(err), "请求失败，请稍后重试");
    }

    let mut response = Response::builder()
        .status(StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY));
    for (name, value) in returned {
        response = response.header(name, value);
    }
    response
        .body(Body::from(bytes))
        .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
}

#[cfg(test)]
mod tests {
    use crate::api::tests::spawn_backend;
    use crate::routes::create_router;
    use crate::state::tests::state_for;
    use axum::{
        body::Body,
        http::{HeaderMap, Request, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_forwards_with_token() {
        let backend = Router::new().route(
            "/api/logistics",
            get(|headers: HeaderMap, uri: axum::http::Uri| async move {
                Json(json!({
                    "auth": headers.get("authorization").and_then(|v| v.to_str().ok()),
                    "query": uri.query(),
                }))
            }),
        );
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(spawn_backend(backend).await, dir.path());
        state.session.write().await.update(|s| s.set_token("tok")).unwrap();

        let app = create_router(state);
        let response = app
            .oneshot(Request::get("/api/logistics?page=2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["auth"], "Bearer tok");
        assert_eq!(body["query"], "page=2");
    }

    #[tokio::test]
    async fn test_download_headers_returned() {
        let backend = Router::new().route(
            "/api/backup/export",
            get(|| async {
                (
                    [
                        ("content-type", "application/zip"),
                        ("content-disposition", "attachment; filename=\"backup.zip\""),
                        ("cache-control", "no-store"),
                        ("x-powered-by", "express"),
                    ],
                    vec![0x50u8, 0x4b, 0x03, 0x04],
                )
            }),
        );
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(spawn_backend(backend).await, dir.path());
        state.session.write().await.update(|s| s.set_token("tok")).unwrap();

        let response = create_router(state)
            .oneshot(Request::get("/api/backup/export").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["content-type"], "application/zip");
        assert_eq!(headers["content-disposition"], "attachment; filename=\"backup.zip\"");
        assert_eq!(headers["cache-control"], "no-store");
        assert!(headers.get("x-powered-by").is_none());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], &[0x50, 0x4b, 0x03, 0x04]);
    }

    #[tokio::test]
    async fn test_backend_401_logs_out() {
        let backend = Router::new().route("/api/salary", get(|| async { StatusCode::UNAUTHORIZED }));
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(spawn_backend(backend).await, dir.path());
        state.session.write().await.update(|s| s.set_token("tok")).unwrap();

        let app = create_router(state.clone());
        let response = app
            .oneshot(Request::get("/api/salary").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!state.session_snapshot().await.is_authenticated());
    }
}
