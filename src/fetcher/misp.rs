//! MISP REST client issuing one `attributes/restSearch` call per page.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Serialize;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Error, FetchError, FetchErrorKind, Result};
use crate::types::Attribute;

use super::response::attributes_from_response;
use super::{PageFetcher, PageRequest};

/// Longest response body kept in a [`FetchErrorKind::Status`] error
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Production [`PageFetcher`] backed by a shared `reqwest` client.
///
/// The underlying connection pool is safe to use from many tasks at once, so a
/// single `MispClient` serves every concurrent page fetch of a run.
pub struct MispClient {
    http: reqwest::Client,
    search_url: Url,
    api_key: String,
}

/// JSON body of an attribute search
#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    #[serde(rename = "returnFormat")]
    return_format: &'static str,
    #[serde(rename = "type")]
    type_attribute: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_ids: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    publish_timestamp: Option<&'a str>,
    limit: u32,
    page: u32,
}

impl<'a> From<&'a PageRequest> for SearchBody<'a> {
    fn from(request: &'a PageRequest) -> Self {
        let filters = &request.filters;
        Self {
            return_format: "json",
            type_attribute: &filters.type_attribute,
            to_ids: filters.to_ids.then_some(1),
            tags: filters.tags.as_deref(),
            publish_timestamp: filters.publish_timestamp.as_deref(),
            limit: request.limit,
            page: request.page.get(),
        }
    }
}

impl MispClient {
    /// Build a client for the instance described by `config`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unusable URL and [`Error::Network`] if
    /// the HTTP client cannot be constructed (e.g. TLS backend failure).
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let search_url = search_url(&config.url)?;

        if !config.verify_tls {
            tracing::warn!(url = %config.url, "TLS certificate verification disabled");
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .user_agent(concat!("misp-ioc-export/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            search_url,
            api_key: config.api_key.clone(),
        })
    }
}

/// Resolve `attributes/restSearch` against the configured base URL
fn search_url(base: &str) -> Result<Url> {
    let mut base =
        Url::parse(base).map_err(|e| Error::config("api.url", format!("invalid MISP URL: {e}")))?;
    // Without a trailing slash, join() would replace the last path segment
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("attributes/restSearch")
        .map_err(|e| Error::config("api.url", format!("invalid MISP URL: {e}")))
}

#[async_trait::async_trait]
impl PageFetcher for MispClient {
    async fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> std::result::Result<Vec<Attribute>, FetchError> {
        let page = request.page;
        tracing::debug!(
            page = %page,
            limit = request.limit,
            type_attribute = %request.filters.type_attribute,
            "fetching page"
        );

        let response = self
            .http
            .post(self.search_url.clone())
            .header(AUTHORIZATION, self.api_key.as_str())
            .header(ACCEPT, "application/json")
            .json(&SearchBody::from(request))
            .send()
            .await
            .map_err(|e| FetchError::new(page, e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(FetchError::new(
                page,
                FetchErrorKind::Status {
                    status: status.as_u16(),
                    body,
                },
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::new(page, e.into()))?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::new(page, FetchErrorKind::Decode(e.to_string())))?;

        attributes_from_response(body)
            .map_err(|e| FetchError::new(page, FetchErrorKind::Decode(e.to_string())))
    }
}
