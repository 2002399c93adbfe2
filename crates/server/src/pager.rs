//! AU metadata pagination.
//!
//! A page request either starts a scan (no token) or resumes one from a
//! continuation token. Tokens are bound to the AU's extraction generation: a
//! token minted before a re-extraction is refused with 409, so a client never
//! mixes items from two generations.
//!
//! The store is asked for one item more than the page size. That lookahead
//! decides whether a continuation token is issued, so the token is present
//! exactly when more items remain.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{METADATA_STORE, with_timeout};
use crate::metrics;
use crate::state::AppState;
use aumeta_core::{ContinuationToken, ItemMetadata};
use serde::{Deserialize, Serialize};

/// Pagination metadata returned with each page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Number of items actually returned.
    pub results_per_page: usize,
    /// Legacy page number. Never set by this server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    /// Link reproducing this page.
    pub cur_link: String,
    /// Link to the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    /// Token for the next page; null on the last page.
    pub continuation_token: Option<String>,
}

/// One page of an AU's items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuMetadataPage {
    pub items: Vec<ItemMetadata>,
    pub page_info: PageInfo,
}

/// Parse the `limit` query parameter, falling back to `default` when absent.
pub fn parse_limit(raw: Option<&str>, default: u32) -> ApiResult<u32> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let limit: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("limit must be an integer, got {raw:?}")))?;
    if limit <= 0 {
        return Err(ApiError::BadRequest(format!(
            "limit must be greater than 0, got {limit}"
        )));
    }
    u32::try_from(limit)
        .map_err(|_| ApiError::BadRequest(format!("limit must be at most {}", u32::MAX)))
}

/// Build a page link: `<base><path>?limit=N[&continuationToken=T]`.
///
/// Tokens are URL-safe base64 and need no escaping.
pub fn page_link(base: Option<&str>, path: &str, limit: u32, token: Option<&str>) -> String {
    let base = base.unwrap_or("").trim_end_matches('/');
    match token {
        Some(token) => format!("{base}{path}?limit={limit}&continuationToken={token}"),
        None => format!("{base}{path}?limit={limit}"),
    }
}

/// Serve one page of `au_id`'s items.
///
/// `path` is the request path, echoed into the page links.
pub async fn fetch_page(
    state: &AppState,
    au_id: &str,
    limit: u32,
    token: Option<&str>,
    path: &str,
) -> ApiResult<AuMetadataPage> {
    let store = &state.metadata;

    let generation = with_timeout(state, METADATA_STORE, store.current_generation(au_id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("AU not found: {au_id}")))?;

    let after_id = match token {
        None => None,
        Some(raw) => {
            let cursor = ContinuationToken::decode(raw)?;
            if cursor.generation != generation {
                return Err(stale_token(au_id, cursor.generation, generation));
            }
            Some(cursor.last_item_seq)
        }
    };

    let mut items = with_timeout(
        state,
        METADATA_STORE,
        store.scan_items(au_id, after_id, limit.saturating_add(1)),
    )
    .await?;

    // A re-extraction that landed during the scan invalidates what was read.
    let after_scan = with_timeout(state, METADATA_STORE, store.current_generation(au_id)).await?;
    if after_scan != Some(generation) {
        return Err(stale_token(au_id, generation, after_scan.unwrap_or_default()));
    }

    let has_more = items.len() > limit as usize;
    items.truncate(limit as usize);

    let next_token = if has_more {
        let last_id = items
            .last()
            .and_then(|item| item.id)
            .ok_or_else(|| ApiError::Internal("store returned an item without an id".to_string()))?;
        Some(ContinuationToken::new(generation, last_id).encode())
    } else {
        None
    };

    let base = state.config.server.public_base_url.as_deref();
    let page_info = PageInfo {
        results_per_page: items.len(),
        current_page: None,
        cur_link: page_link(base, path, limit, token),
        next_link: next_token
            .as_deref()
            .map(|next| page_link(base, path, limit, Some(next))),
        continuation_token: next_token,
    };

    metrics::PAGES_SERVED.inc();
    metrics::ITEMS_SERVED.inc_by(items.len() as u64);
    tracing::debug!(
        au_id = %au_id,
        limit,
        generation,
        returned = items.len(),
        has_more,
        "Served metadata page"
    );

    Ok(AuMetadataPage { items, page_info })
}

fn stale_token(au_id: &str, token_generation: i64, current_generation: i64) -> ApiError {
    metrics::PAGINATION_CONFLICTS.inc();
    tracing::info!(
        au_id = %au_id,
        token_generation,
        current_generation,
        "Continuation token is stale"
    );
    ApiError::Conflict(format!(
        "metadata for AU {au_id} changed since pagination began; \
         restart without a continuation token"
    ))
}
