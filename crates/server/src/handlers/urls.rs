//! URL resolution endpoints.

use crate::auth::{authorize, require_principal};
use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{URL_RESOLVER, with_timeout};
use crate::metrics;
use crate::state::AppState;
use aumeta_core::RoleRequirement;
use aumeta_core::openurl::{OpenUrlParams, UrlInfo, aggregate_urls, doi_params, parse_params};
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, Request, State};
use serde::Deserialize;

/// Name of the repeated OpenURL query parameter.
const OPENURL_PARAM: &str = "params";

/// Query parameters for DOI lookups.
#[derive(Debug, Default, Deserialize)]
pub struct DoiQuery {
    pub doi: Option<String>,
}

/// GET /urls/doi?doi={doi} - Resolve a DOI.
///
/// An unknown DOI is not an error; it yields an empty `urls` list.
pub async fn get_doi_urls(
    State(state): State<AppState>,
    query: Result<Query<DoiQuery>, QueryRejection>,
    req: Request,
) -> ApiResult<Json<UrlInfo>> {
    let principal = require_principal(&req)?;
    authorize(principal, RoleRequirement::AnyAuthenticated)?;
    let Query(query) = query?;

    let doi = query
        .doi
        .as_deref()
        .map(str::trim)
        .filter(|doi| !doi.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing doi parameter".to_string()))?;

    let info = resolve(&state, doi_params(doi), "doi").await?;
    Ok(Json(info))
}

/// GET /urls/openurl?params=k=v&params=... - Resolve OpenURL parameters.
///
/// Malformed `key=value` entries are dropped; only an absent parameter list is
/// rejected.
pub async fn get_openurl_urls(
    State(state): State<AppState>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
    req: Request,
) -> ApiResult<Json<UrlInfo>> {
    let principal = require_principal(&req)?;
    authorize(principal, RoleRequirement::AnyAuthenticated)?;
    let Query(pairs) = pairs?;

    let raw: Vec<&str> = pairs
        .iter()
        .filter(|(key, _)| key == OPENURL_PARAM)
        .map(|(_, value)| value.as_str())
        .collect();
    if raw.is_empty() {
        return Err(ApiError::BadRequest(
            "at least one params=key=value entry is required".to_string(),
        ));
    }

    let params = parse_params(&raw);
    if params.len() < raw.len() {
        tracing::debug!(
            supplied = raw.len(),
            kept = params.len(),
            "Dropped malformed or duplicate OpenURL parameters"
        );
    }

    let info = resolve(&state, params, "openurl").await?;
    Ok(Json(info))
}

/// Pass parameters to the resolver and aggregate its candidates.
async fn resolve(
    state: &AppState,
    params: OpenUrlParams,
    kind: &'static str,
) -> ApiResult<UrlInfo> {
    metrics::URL_RESOLUTIONS.with_label_values(&[kind]).inc();

    let candidates = if state.config.resolver.enabled {
        with_timeout(state, URL_RESOLVER, state.metadata.resolve_urls(&params)).await?
    } else {
        Vec::new()
    };

    let urls = aggregate_urls(candidates);
    tracing::debug!(kind, params = params.len(), urls = urls.len(), "Resolved URLs");
    Ok(UrlInfo { params, urls })
}
