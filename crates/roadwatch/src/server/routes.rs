use std::sync::Arc;

use axum::{
    extract::{OriginalUri, State},
    http::{Method, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::advisory::{Advisory, AdvisoryPayload, AdvisoryRecord, LocationRecord};
use crate::error::{Error, Result};
use crate::storage::AdvisoryStore;

use super::extract::{JsonBody, PathParam};
use super::response::{ApiError, ApiResult, StatusResponse};

/// Body of the legacy delete endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct IdPayload {
    id: Option<i64>,
}

/// Run a store operation off the async runtime.
async fn blocking<T, F>(store: Arc<AdvisoryStore>, op: F) -> Result<T>
where
    F: FnOnce(&AdvisoryStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
}

fn required_id(id: Option<i64>) -> Result<i64> {
    id.ok_or_else(|| Error::validation("id", "is required"))
}

// - REST routes -

pub(crate) async fn list_advisories(
    State(store): State<Arc<AdvisoryStore>>,
) -> ApiResult<Json<Vec<AdvisoryRecord>>> {
    let advisories = blocking(store, AdvisoryStore::list).await?;
    Ok(Json(
        advisories
            .iter()
            .filter_map(Advisory::to_record)
            .collect(),
    ))
}

pub(crate) async fn get_advisory(
    State(store): State<Arc<AdvisoryStore>>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<AdvisoryRecord>> {
    blocking(store, move |store| store.get(id))
        .await?
        .and_then(|advisory| advisory.to_record())
        .map(Json)
        .ok_or_else(|| Error::not_found(id).into())
}

pub(crate) async fn create_advisory(
    State(store): State<Arc<AdvisoryStore>>,
    JsonBody(payload): JsonBody<AdvisoryPayload>,
) -> ApiResult<(StatusCode, Json<StatusResponse>)> {
    let advisory = payload.into_advisory()?;
    let id = blocking(store, move |store| store.create(&advisory)).await?;
    Ok((StatusCode::CREATED, Json(StatusResponse::created(id))))
}

pub(crate) async fn update_advisory(
    State(store): State<Arc<AdvisoryStore>>,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<AdvisoryPayload>,
) -> ApiResult<Json<StatusResponse>> {
    let advisory = payload.into_advisory()?;
    blocking(store, move |store| store.update(id, &advisory)).await?;
    Ok(Json(StatusResponse::success()))
}

pub(crate) async fn delete_advisory(
    State(store): State<Arc<AdvisoryStore>>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<StatusResponse>> {
    blocking(store, move |store| store.delete(id)).await?;
    Ok(Json(StatusResponse::success()))
}

// - Routes used by the map front end -

pub(crate) async fn list_locations(
    State(store): State<Arc<AdvisoryStore>>,
) -> ApiResult<Json<Vec<LocationRecord>>> {
    let advisories = blocking(store, AdvisoryStore::list).await?;
    Ok(Json(
        advisories
            .iter()
            .filter_map(Advisory::to_location)
            .collect(),
    ))
}

pub(crate) async fn add_location(
    State(store): State<Arc<AdvisoryStore>>,
    JsonBody(payload): JsonBody<AdvisoryPayload>,
) -> ApiResult<Json<StatusResponse>> {
    let advisory = payload.into_advisory()?;
    let id = blocking(store, move |store| store.create(&advisory)).await?;
    Ok(Json(StatusResponse::created(id)))
}

pub(crate) async fn update_location(
    State(store): State<Arc<AdvisoryStore>>,
    JsonBody(payload): JsonBody<AdvisoryPayload>,
) -> ApiResult<Json<StatusResponse>> {
    let id = required_id(payload.id)?;
    let advisory = payload.into_advisory()?;
    blocking(store, move |store| store.update(id, &advisory)).await?;
    Ok(Json(StatusResponse::success()))
}

pub(crate) async fn delete_location(
    State(store): State<Arc<AdvisoryStore>>,
    JsonBody(payload): JsonBody<IdPayload>,
) -> ApiResult<Json<StatusResponse>> {
    let id = required_id(payload.id)?;
    blocking(store, move |store| store.delete(id)).await?;
    Ok(Json(StatusResponse::success()))
}

pub(crate) async fn route_not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found_route(&method, uri.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> Arc<AdvisoryStore> {
        Arc::new(AdvisoryStore::open_in_memory().unwrap())
    }

    fn payload(speed: serde_json::Value) -> JsonBody<AdvisoryPayload> {
        JsonBody(
            serde_json::from_value(serde_json::json!({
                "category": "Hospital",
                "lat": 10.80,
                "lon": 79.10,
                "speedLimit": speed,
                "createdAt": "2024-01-01T00:00:00Z",
                "days": "",
                "timeFrom": "",
                "timeTo": ""
            }))
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let store = test_store();

        let (status, Json(body)) = create_advisory(State(store.clone()), payload(30.into()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.id, Some(1));

        let Json(records) = list_advisories(State(store)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
        assert!((records[0].speed_limit - 30.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_create_negative_speed_writes_nothing() {
        let store = test_store();

        let err = create_advisory(State(store.clone()), payload((-5).into()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_then_get() {
        let store = test_store();
        let (_, Json(created)) = create_advisory(State(store.clone()), payload(30.into()))
            .await
            .unwrap();
        let id = created.id.unwrap();

        let Json(body) = update_advisory(State(store.clone()), PathParam(id), payload("40".into()))
            .await
            .unwrap();
        assert!(body.is_success());

        let Json(record) = get_advisory(State(store), PathParam(id)).await.unwrap();
        assert!((record.speed_limit - 40.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let store = test_store();
        let (_, Json(created)) = create_advisory(State(store.clone()), payload(30.into()))
            .await
            .unwrap();
        let id = created.id.unwrap();

        let Json(body) = delete_advisory(State(store.clone()), PathParam(id))
            .await
            .unwrap();
        assert!(body.is_success());

        let err = delete_advisory(State(store), PathParam(id))
            .await
            .unwrap_err();
        assert_eq!(err.status_code, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_location_requires_id() {
        let err = update_location(State(test_store()), payload(30.into()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_location_requires_id() {
        let err = delete_location(State(test_store()), JsonBody(IdPayload::default()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_locations_uses_front_end_values() {
        let store = test_store();
        let Json(created) = add_location(State(store.clone()), payload(30.into()))
            .await
            .unwrap();

        let Json(locations) = list_locations(State(store)).await.unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(Some(locations[0].id), created.id);
        assert_eq!(locations[0].category, "hospitals");
        assert!((locations[0].speed - 30.0).abs() < f64::EPSILON);
    }
}
