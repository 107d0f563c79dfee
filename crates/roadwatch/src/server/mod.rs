//! HTTP binding for the advisory store.
//!
//! Two route sets share the same handlers' semantics:
//!
//! - `/api/advisories` is the resource-style API (`GET`, `POST`, `PUT`, `DELETE`).
//! - `/get_locations`, `/add_location`, `/update_location` and
//!   `/delete_location` keep the paths, field names and category values the
//!   map front end uses.
//!
//! Every failure, including a body that does not deserialize, is answered
//! with a JSON [`StatusResponse`].
//!
//! Store calls run on the blocking thread pool since the connection is
//! synchronous.

mod extract;
mod response;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::Result;
use crate::storage::AdvisoryStore;

pub use response::{ApiError, ApiResult, StatusResponse};

/// Shared state handed to every handler.
#[derive(Debug, Clone, FromRef)]
pub struct AppState {
    /// The injected store.
    pub store: Arc<AdvisoryStore>,
}

impl AppState {
    /// Wrap a store for use by the router.
    #[must_use]
    pub fn new(store: Arc<AdvisoryStore>) -> Self {
        Self { store }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/advisories",
            get(routes::list_advisories).post(routes::create_advisory),
        )
        .route(
            "/api/advisories/:id",
            get(routes::get_advisory)
                .put(routes::update_advisory)
                .delete(routes::delete_advisory),
        )
        .route("/get_locations", get(routes::list_locations))
        .route("/add_location", post(routes::add_location))
        .route("/update_location", post(routes::update_location))
        .route("/delete_location", post(routes::delete_location))
        .fallback(routes::route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `addr` until Ctrl-C is received.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(store: Arc<AdvisoryStore>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(AppState::new(store)).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let store = Arc::new(AdvisoryStore::open_in_memory().unwrap());
        router(AppState::new(store))
    }

    fn hospital() -> Value {
        json!({
            "category": "Hospital",
            "lat": 10.80,
            "lon": 79.10,
            "speedLimit": 30,
            "createdAt": "2024-01-01T00:00:00Z",
            "days": "Everyday",
            "timeFrom": "00:00",
            "timeTo": "23:59"
        })
    }

    fn front_end_school() -> Value {
        json!({
            "type": "schools",
            "lat": 10.78,
            "lon": 79.13,
            "speed": "25",
            "timestamp": "2024-05-01T07:00:00.000Z",
            "days": "Monday,Friday",
            "time_from": "08:00",
            "time_to": "09:30"
        })
    }

    async fn send_raw(
        app: &Router,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        match body {
            Some(body) => {
                send_raw(
                    app,
                    method,
                    uri,
                    Some("application/json"),
                    Body::from(body.to_string()),
                )
                .await
            }
            None => send_raw(app, method, uri, None, Body::empty()).await,
        }
    }

    fn assert_error_body(body: &Value) {
        assert_eq!(body["status"], "error");
        assert!(body["message"].is_string());
    }

    #[test]
    fn test_state_shares_store() {
        let store = Arc::new(AdvisoryStore::open_in_memory().unwrap());
        let state = AppState::new(store.clone());
        let extracted = <Arc<AdvisoryStore> as FromRef<AppState>>::from_ref(&state);
        assert!(Arc::ptr_eq(&store, &extracted));
    }

    #[tokio::test]
    async fn test_rest_lifecycle() {
        let app = test_app();

        let (status, body) = send(&app, Method::POST, "/api/advisories", Some(hospital())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "status": "success", "id": 1 }));

        let (status, body) = send(&app, Method::GET, "/api/advisories", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["category"], "Hospital");
        assert_eq!(body[0]["speedLimit"], 30.0);
        assert_eq!(body[0]["days"], "Everyday");
        assert_eq!(body[0]["timeFrom"], "00:00");
        assert_eq!(body[0]["timeTo"], "23:59");

        let mut changed = hospital();
        changed["speedLimit"] = json!(20);
        changed["days"] = json!("");
        changed["timeFrom"] = json!("");
        changed["timeTo"] = json!("");
        let (status, body) = send(&app, Method::PUT, "/api/advisories/1", Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "success" }));

        let (status, body) = send(&app, Method::GET, "/api/advisories/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["speedLimit"], 20.0);
        assert_eq!(body["days"], "");

        let (status, _) = send(&app, Method::DELETE, "/api/advisories/1", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::DELETE, "/api/advisories/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_error_body(&body);
    }

    #[tokio::test]
    async fn test_rest_missing_ids_are_not_found() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/api/advisories/9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_error_body(&body);

        let (status, body) = send(&app, Method::PUT, "/api/advisories/9", Some(hospital())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_error_body(&body);
    }

    #[tokio::test]
    async fn test_validation_failure_is_bad_request() {
        let app = test_app();

        let mut negative = hospital();
        negative["speedLimit"] = json!(-5);
        let (status, body) = send(&app, Method::POST, "/api/advisories", Some(negative)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body);

        let mut half_window = hospital();
        half_window["timeTo"] = json!("");
        let (status, body) = send(&app, Method::POST, "/api/advisories", Some(half_window)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body);

        let (_, body) = send(&app, Method::GET, "/api/advisories", None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_mistyped_body_is_bad_request() {
        let app = test_app();

        for (field, value) in [("speedLimit", json!(true)), ("days", json!(5))] {
            let mut body = hospital();
            body[field] = value;
            let (status, body) = send(&app, Method::POST, "/api/advisories", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "field {field}");
            assert_error_body(&body);
        }

        let (status, body) = send(
            &app,
            Method::POST,
            "/delete_location",
            Some(json!({ "id": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = test_app();

        let (status, body) = send_raw(
            &app,
            Method::POST,
            "/api/advisories",
            Some("application/json"),
            Body::from("{\"category\":"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body);

        let (status, body) = send_raw(
            &app,
            Method::POST,
            "/add_location",
            None,
            Body::from(hospital().to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body);
    }

    #[tokio::test]
    async fn test_non_numeric_path_id_is_bad_request() {
        let (status, body) = send(&test_app(), Method::DELETE, "/api/advisories/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_not_found() {
        let (status, body) = send(&test_app(), Method::GET, "/nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_error_body(&body);
    }

    #[tokio::test]
    async fn test_front_end_lifecycle() {
        let app = test_app();

        let (status, body) = send(&app, Method::POST, "/add_location", Some(front_end_school())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "success", "id": 1 }));

        let (status, body) = send(&app, Method::GET, "/get_locations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "id": 1,
                "type": "schools",
                "lat": 10.78,
                "lon": 79.13,
                "speed": 25.0,
                "timestamp": "2024-05-01T07:00:00.000Z",
                "days": "Monday,Friday",
                "time_from": "08:00",
                "time_to": "09:30"
            }])
        );

        let mut update = front_end_school();
        update["id"] = json!(1);
        update["type"] = json!("accidents");
        update["days"] = json!("");
        update["time_from"] = json!("");
        update["time_to"] = json!("");
        let (status, body) = send(&app, Method::POST, "/update_location", Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "success" }));

        let (_, body) = send(&app, Method::GET, "/get_locations", None).await;
        assert_eq!(body[0]["type"], "accidents");
        assert_eq!(body[0]["days"], "");
        assert_eq!(body[0]["time_from"], "");

        let (status, _) = send(&app, Method::POST, "/delete_location", Some(json!({ "id": 1 }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::POST, "/delete_location", Some(json!({ "id": 1 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_error_body(&body);

        let (_, body) = send(&app, Method::GET, "/get_locations", None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_front_end_update_without_id_is_bad_request() {
        let (status, body) = send(
            &test_app(),
            Method::POST,
            "/update_location",
            Some(front_end_school()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body);
    }
}
