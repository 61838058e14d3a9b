//! HTTP surface: liveness probe and latest-configuration endpoint.
//!
//! Both handlers are read-only and never wait on the poll loop.

use crate::core::LatestConfig;
use axum::extract::State;
use axum::{Router, routing::any};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Build the router.
///
/// `/config` renders the current payload; `/` and every other path answer
/// the liveness probe. Any method is accepted.
pub fn router(config: LatestConfig) -> Router {
    Router::new()
        .route("/", any(liveness))
        .route("/config", any(latest_configuration))
        .fallback(liveness)
        .with_state(config)
}

/// Handler for the liveness probe.
async fn liveness() -> &'static str {
    "OK\n"
}

/// Handler for `/config`. Empty payload segment until the first poll lands.
async fn latest_configuration(State(config): State<LatestConfig>) -> String {
    format!("Latest Configuration: {}\n", config.get_string())
}

/// Serve the router on `listener` until `shutdown` fires.
///
/// In-flight requests are drained before returning.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve(
    listener: TcpListener,
    config: LatestConfig,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Starting server");
    }

    axum::serve(listener, router(config))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use bytes::Bytes;
    use tower::ServiceExt;

    async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_liveness() {
        let (_publisher, config) = LatestConfig::channel();
        let (status, body) = call(router(config), Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK\n");
    }

    #[tokio::test]
    async fn test_liveness_any_method_and_path() {
        let (_publisher, config) = LatestConfig::channel();
        let (status, body) = call(router(config.clone()), Method::POST, "/").await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "OK\n"));

        let (status, body) = call(router(config), Method::GET, "/healthz").await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "OK\n"));
    }

    #[tokio::test]
    async fn test_config_before_first_poll() {
        let (_publisher, config) = LatestConfig::channel();
        let (status, body) = call(router(config), Method::GET, "/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Latest Configuration: \n");
    }

    #[tokio::test]
    async fn test_config_reflects_latest_publish() {
        let (publisher, config) = LatestConfig::channel();
        let app = router(config);

        publisher.publish(Bytes::from_static(b"env=prod"));
        let (_, body) = call(app.clone(), Method::GET, "/config").await;
        assert_eq!(body, "Latest Configuration: env=prod\n");

        publisher.publish(Bytes::new());
        let (_, body) = call(app, Method::GET, "/config").await;
        assert_eq!(body, "Latest Configuration: env=prod\n");
    }
}
