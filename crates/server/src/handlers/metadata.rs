//! AU metadata endpoints.

use crate::auth::{authorize, require_principal};
use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{METADATA_STORE, with_timeout};
use crate::pager::{self, AuMetadataPage};
use crate::state::AppState;
use aumeta_core::{ItemMetadata, RoleRequirement};
use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use serde::Deserialize;

/// Query parameters for page requests. Values are kept raw so that bad
/// input is reported as a JSON 400 like every other error.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    #[serde(rename = "continuationToken")]
    pub continuation_token: Option<String>,
}

/// GET /metadata/aus/{auid} - One page of an AU's items.
pub async fn get_au_metadata(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
    req: Request,
) -> ApiResult<Json<AuMetadataPage>> {
    let principal = require_principal(&req)?;
    authorize(principal, RoleRequirement::AnyAuthenticated)?;
    let Path(au_id) = path?;
    let Query(query) = query?;

    let limit = pager::parse_limit(
        query.limit.as_deref(),
        state.config.server.default_page_size,
    )?;

    let page = pager::fetch_page(
        &state,
        &au_id,
        limit,
        query.continuation_token.as_deref(),
        req.uri().path(),
    )
    .await?;

    Ok(Json(page))
}

/// DELETE /metadata/aus/{auid} - Delete every item of an AU.
///
/// Returns the number of deleted items.
pub async fn delete_au_metadata(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    req: Request,
) -> ApiResult<Json<u64>> {
    let principal = require_principal(&req)?;
    authorize(principal, RoleRequirement::CONTENT_ADMIN)?;
    let Path(au_id) = path?;

    let deleted = with_timeout(&state, METADATA_STORE, state.metadata.delete_au(&au_id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("AU not found: {au_id}")))?;

    tracing::info!(
        au_id = %au_id,
        deleted,
        username = %principal.display_name(),
        "AU metadata deleted"
    );
    Ok(Json(deleted))
}

/// POST /metadata/aus - Store one item.
///
/// Returns the id assigned to the item.
pub async fn post_item(State(state): State<AppState>, req: Request) -> ApiResult<Json<i64>> {
    let principal = require_principal(&req)?;
    authorize(principal, RoleRequirement::CONTENT_ADMIN)?;
    let username = principal.display_name().to_string();

    let item: ItemMetadata = {
        let bytes = axum::body::to_bytes(req.into_body(), state.config.server.max_body_size)
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))?
    };
    let au_id = item.validate_for_insert()?.to_string();

    let item_id = with_timeout(&state, METADATA_STORE, state.metadata.insert_item(&item)).await?;

    tracing::debug!(au_id = %au_id, item_id, username = %username, "Item stored");
    Ok(Json(item_id))
}
