use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use mds_core::{BodyError, MetadataResult, MetadataService};
use mds_types::PartialDocument;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::response::{ApiError, SuccessResponse};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: MetadataService,
}

impl AppState {
    pub fn new(service: MetadataService) -> Self {
        Self { service }
    }

    /// Run a service call on the blocking pool.
    ///
    /// Store access is synchronous, so each request's transaction runs on its
    /// own blocking thread and concurrent requests proceed in parallel.
    async fn run<T, F>(&self, action: &str, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&MetadataService) -> MetadataResult<T> + Send + 'static,
    {
        let service = self.service.clone();
        let outcome = tokio::task::spawn_blocking(move || op(&service))
            .await
            .map_err(|e| {
                tracing::error!(action, error = %e, "metadata task failed");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to {action}"),
                    Some(e.to_string()),
                )
            })?;
        outcome.map_err(|err| ApiError::from_metadata(err, action))
    }
}

type ApiResult = Result<(StatusCode, Json<SuccessResponse>), ApiError>;

/// The `:key` path segment, with the rejection kept so it can be reported as JSON.
type KeyPath = Result<Path<String>, PathRejection>;

#[derive(Deserialize)]
struct KeyedValueBody {
    #[serde(default)]
    my_key: String,
    #[serde(default)]
    my_value: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct ValueBody {
    #[serde(default)]
    my_value: Option<Map<String, Value>>,
}

const KEYED_BODY_HINT: &str = "Request body must be valid JSON with my_key and my_value fields";

fn parse_keyed_body(body: &[u8]) -> Result<(String, Value), BodyError> {
    let parsed: KeyedValueBody =
        serde_json::from_slice(body).map_err(|_| BodyError::Malformed(KEYED_BODY_HINT))?;
    if parsed.my_key.is_empty() {
        return Err(BodyError::MissingField("my_key"));
    }
    let value = parsed.my_value.ok_or(BodyError::MissingField("my_value"))?;
    Ok((parsed.my_key, Value::Object(value)))
}

fn parse_value_body(body: &[u8]) -> Result<Value, BodyError> {
    let parsed: ValueBody = serde_json::from_slice(body).map_err(|_| {
        BodyError::Malformed("Request body must be valid JSON with my_value field")
    })?;
    let value = parsed.my_value.ok_or(BodyError::MissingField("my_value"))?;
    Ok(Value::Object(value))
}

fn parse_partial_body(body: &[u8]) -> Result<PartialDocument, BodyError> {
    let fields: Map<String, Value> = serde_json::from_slice(body)
        .map_err(|_| BodyError::Malformed("Request body must be a valid JSON object"))?;
    if fields.is_empty() {
        return Err(BodyError::EmptyUpdate);
    }
    Ok(PartialDocument::new(fields))
}

/// Extract the `:key` segment, turning extractor rejections (such as a
/// segment that is not valid UTF-8 once decoded) into JSON error bodies.
fn path_key(path: KeyPath) -> Result<String, ApiError> {
    let Path(key) =
        path.map_err(|rejection| ApiError::bad_request("Invalid key", &rejection.body_text()))?;
    if key.is_empty() {
        return Err(ApiError::missing_key());
    }
    Ok(key)
}

/// `POST /api/metadata`
pub async fn create_handler(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let (key, value) = parse_keyed_body(&body)?;
    let entry = state
        .run("create entry", move |svc| svc.create(&key, value))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::message("Entry created successfully").with_data(entry)),
    ))
}

/// `GET /api/metadata/:key`
pub async fn get_handler(State(state): State<AppState>, path: KeyPath) -> ApiResult {
    let key = path_key(path)?;
    let entry = state
        .run("retrieve entry", move |svc| svc.get(&key))
        .await?;
    Ok((StatusCode::OK, Json(SuccessResponse::data(entry))))
}

/// `PUT /api/metadata/:key`
pub async fn update_handler(
    State(state): State<AppState>,
    path: KeyPath,
    body: Bytes,
) -> ApiResult {
    let key = path_key(path)?;
    let value = parse_value_body(&body)?;
    let entry = state
        .run("update entry", move |svc| svc.update(&key, value))
        .await?;
    Ok((
        StatusCode::OK,
        Json(SuccessResponse::message("Entry updated successfully").with_data(entry)),
    ))
}

/// `PATCH /api/metadata/:key`
///
/// The returned entry comes from a separate read after the merge commits and
/// may already reflect a later write. If that read fails the merge still
/// succeeded, so the response is a plain success without data.
pub async fn patch_handler(
    State(state): State<AppState>,
    path: KeyPath,
    body: Bytes,
) -> ApiResult {
    let key = path_key(path)?;
    let partial = parse_partial_body(&body)?;
    let merged_key = key.clone();
    state
        .run("update entry", move |svc| svc.patch_update(&merged_key, &partial))
        .await?;

    let response = SuccessResponse::message("Entry updated successfully");
    let response = match state.run("retrieve entry", move |svc| svc.get(&key)).await {
        Ok(entry) => response.with_data(entry),
        Err(err) => {
            tracing::debug!(error = ?err.body, "re-read after patch failed");
            response
        }
    };
    Ok((StatusCode::OK, Json(response)))
}

/// `DELETE /api/metadata/:key`
pub async fn delete_handler(State(state): State<AppState>, path: KeyPath) -> ApiResult {
    let key = path_key(path)?;
    state
        .run("delete entry", move |svc| svc.delete(&key))
        .await
        .map_err(|err| {
            if err.status == StatusCode::NOT_FOUND {
                err.with_details("The specified key does not exist or was already deleted")
            } else {
                err
            }
        })?;
    Ok((
        StatusCode::OK,
        Json(SuccessResponse::message("Entry deleted successfully")),
    ))
}

/// `DELETE /api/metadata`
pub async fn delete_all_handler(State(state): State<AppState>) -> ApiResult {
    let removed = state
        .run("delete all entries", |svc| svc.delete_all())
        .await?;
    tracing::info!(removed, "deleted all metadata entries");
    Ok((
        StatusCode::OK,
        Json(SuccessResponse::message("All entries deleted successfully")),
    ))
}

/// `PUT /api/metadata`
pub async fn upsert_handler(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let (key, value) = parse_keyed_body(&body)?;
    let entry = state
        .run("upsert entry", move |svc| svc.upsert(&key, value))
        .await?;
    Ok((
        StatusCode::OK,
        Json(SuccessResponse::message("Entry upserted successfully").with_data(entry)),
    ))
}

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "mds-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_body_requires_both_fields() {
        assert!(parse_keyed_body(br#"{"my_key": "k", "my_value": {}}"#).is_ok());
        assert_eq!(
            parse_keyed_body(br#"{"my_value": {"a": 1}}"#).unwrap_err(),
            BodyError::MissingField("my_key")
        );
        assert_eq!(
            parse_keyed_body(br#"{"my_key": "k", "my_value": null}"#).unwrap_err(),
            BodyError::MissingField("my_value")
        );
    }

    #[test]
    fn keyed_body_rejects_malformed_json() {
        let bodies: [&[u8]; 3] = [
            b"not json",
            br#"{"my_key": 5}"#,
            br#"{"my_key": "k", "my_value": [1]}"#,
        ];
        for body in bodies {
            let err = ApiError::from(parse_keyed_body(body).unwrap_err());
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.body.error, "Invalid request format");
            assert_eq!(err.body.details.as_deref(), Some(KEYED_BODY_HINT));
        }
    }

    #[test]
    fn value_body_requires_object_value() {
        assert_eq!(
            parse_value_body(br#"{"my_value": {"a": 1}}"#).unwrap(),
            json!({"a": 1})
        );
        assert_eq!(
            parse_value_body(b"{}").unwrap_err(),
            BodyError::MissingField("my_value")
        );
        assert!(matches!(
            parse_value_body(br#"{"my_value": 3}"#).unwrap_err(),
            BodyError::Malformed(_)
        ));
    }

    #[test]
    fn partial_body_must_be_non_empty_object() {
        assert_eq!(parse_partial_body(br#"{"a": 1}"#).unwrap().len(), 1);
        assert_eq!(parse_partial_body(b"{}").unwrap_err(), BodyError::EmptyUpdate);
        assert!(matches!(
            parse_partial_body(b"[1, 2]").unwrap_err(),
            BodyError::Malformed(_)
        ));
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = path_key(Ok(Path(String::new()))).unwrap_err();
        assert_eq!(err.body.error, "Missing key parameter");
        assert_eq!(path_key(Ok(Path("k".into()))).unwrap(), "k");
    }
}
