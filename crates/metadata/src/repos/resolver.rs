//! OpenURL resolution over stored item metadata.

use crate::error::MetadataResult;
use async_trait::async_trait;
use aumeta_core::ItemMetadata;
use aumeta_core::item::keys;
use aumeta_core::openurl::{DOI_URI_PREFIX, NULL_URL, OpenUrlParams};

/// Resolves OpenURL parameters to candidate access URLs.
#[async_trait]
pub trait UrlResolver: Send + Sync {
    /// Return one candidate per matching item. Candidates may repeat, and a
    /// lone `"null"` means nothing could be resolved.
    async fn resolve_urls(&self, params: &OpenUrlParams) -> MetadataResult<Vec<String>>;
}

/// Item fields an OpenURL request can match on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionCriteria {
    /// Lowercased DOI.
    pub doi: Option<String>,
    /// Matches either the print or electronic ISSN.
    pub issn: Option<String>,
    pub isbn: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub start_page: Option<String>,
}

impl ResolutionCriteria {
    /// Extract recognised criteria. Unrecognised keys are ignored; when several
    /// keys name the same field, the first recognised key in parameter order wins.
    pub fn from_params(params: &OpenUrlParams) -> Self {
        let mut criteria = Self::default();
        for (key, value) in params {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "rft_id" => {
                    if let Some(doi) = strip_prefix_ignore_case(value, DOI_URI_PREFIX) {
                        set_once(&mut criteria.doi, doi.to_ascii_lowercase());
                    }
                }
                "id" => {
                    if let Some(doi) = strip_prefix_ignore_case(value, "doi:") {
                        set_once(&mut criteria.doi, doi.to_ascii_lowercase());
                    }
                }
                "rft.doi" | "doi" => set_once(&mut criteria.doi, value.to_ascii_lowercase()),
                "rft.issn" | "rft.eissn" | "issn" | "eissn" => {
                    set_once(&mut criteria.issn, value.to_string())
                }
                "rft.isbn" | "isbn" => set_once(&mut criteria.isbn, value.to_string()),
                "rft.volume" | "volume" => set_once(&mut criteria.volume, value.to_string()),
                "rft.issue" | "issue" => set_once(&mut criteria.issue, value.to_string()),
                "rft.spage" | "spage" => set_once(&mut criteria.start_page, value.to_string()),
                _ => {}
            }
        }
        criteria
    }

    /// True when no field would constrain a match.
    pub fn is_empty(&self) -> bool {
        self.doi.is_none()
            && self.issn.is_none()
            && self.isbn.is_none()
            && self.volume.is_none()
            && self.issue.is_none()
            && self.start_page.is_none()
    }

    /// Check an item against every present criterion.
    pub fn matches(&self, item: &ItemMetadata) -> bool {
        if self.is_empty() {
            return false;
        }
        if let Some(doi) = &self.doi
            && !item
                .scalar(keys::DOI)
                .is_some_and(|d| d.eq_ignore_ascii_case(doi))
        {
            return false;
        }
        if let Some(issn) = &self.issn
            && item.scalar(keys::ISSN) != Some(issn.as_str())
            && item.scalar(keys::EISSN) != Some(issn.as_str())
        {
            return false;
        }
        let exact = [
            (&self.isbn, keys::ISBN),
            (&self.volume, keys::VOLUME),
            (&self.issue, keys::ISSUE),
            (&self.start_page, keys::START_PAGE),
        ];
        exact
            .iter()
            .all(|(wanted, key)| wanted.as_deref().is_none_or(|w| item.scalar(key) == Some(w)))
    }
}

/// Candidate list returned when nothing was resolved.
pub fn unresolved() -> Vec<String> {
    vec![NULL_URL.to_string()]
}

fn set_once(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    if value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        let rest = &value[prefix.len()..];
        (!rest.is_empty()).then_some(rest)
    } else {
        None
    }
}
