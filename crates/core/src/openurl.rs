//! OpenURL query parameters and URL aggregation.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// OpenURL parameters keyed by name. Later duplicates overwrite earlier values
/// but keep the position of the first occurrence.
pub type OpenUrlParams = IndexMap<String, String>;

/// Placeholder a resolver emits when it could not resolve anything.
pub const NULL_URL: &str = "null";

/// Parameter a DOI lookup is wrapped into.
pub const DOI_PARAM: &str = "rft_id";

/// Prefix of a DOI carried in `rft_id`.
pub const DOI_URI_PREFIX: &str = "info:doi/";

/// Result of resolving OpenURL parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlInfo {
    /// Parameters passed to the resolver.
    pub params: OpenUrlParams,
    /// Unique resolved URLs in first-seen order.
    pub urls: Vec<String>,
}

/// Split one raw `key=value` string on its first `=`.
///
/// Returns `None` when there is no `=`, the key is empty, or the value is empty.
pub fn parse_param(raw: &str) -> Option<(&str, &str)> {
    let (key, value) = raw.split_once('=')?;
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Build a parameter map from raw `key=value` strings, silently skipping
/// malformed entries.
pub fn parse_params<I, S>(raw: I) -> OpenUrlParams
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut params = OpenUrlParams::new();
    for entry in raw {
        if let Some((key, value)) = parse_param(entry.as_ref()) {
            params.insert(key.to_string(), value.to_string());
        }
    }
    params
}

/// Wrap a DOI into the single synthetic parameter used for DOI lookups.
pub fn doi_params(doi: &str) -> OpenUrlParams {
    let mut params = OpenUrlParams::new();
    params.insert(DOI_PARAM.to_string(), format!("{DOI_URI_PREFIX}{doi}"));
    params
}

/// Drop null placeholders and duplicates from resolver candidates, keeping
/// first-seen order.
pub fn aggregate_urls<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let unique: IndexSet<String> = candidates
        .into_iter()
        .map(Into::into)
        .filter(|url| {
            let trimmed = url.trim();
            !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(NULL_URL)
        })
        .collect();
    unique.into_iter().collect()
}
