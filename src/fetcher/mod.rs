//! Page fetching: the seam between the pagination engine and the MISP API.

use std::sync::Arc;

use crate::config::SearchFilters;
use crate::error::FetchError;
use crate::types::{Attribute, PageIndex};

mod misp;
mod response;

pub use misp::MispClient;
pub use response::attributes_from_response;

/// One page of an attribute search
#[derive(Clone, Debug)]
pub struct PageRequest {
    /// 1-based page index
    pub page: PageIndex,
    /// Page size; a page with fewer records marks the end of the data
    pub limit: u32,
    /// Search filters shared by every page of a run
    pub filters: Arc<SearchFilters>,
}

/// Abstraction over the remote attribute search, enabling testability.
///
/// Implementations perform exactly one request per call and never retry. The
/// engine calls `fetch_page` concurrently from several tasks against the same
/// instance.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the records on one page (possibly none)
    async fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> std::result::Result<Vec<Attribute>, FetchError>;
}
