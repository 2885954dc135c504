use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::PlexError;
use super::types::{MetadataContainer, PlexResponse, SectionsContainer};
use crate::traits::{CatalogService, Episode, Library, MetadataPatch, Season, Show};

const PRODUCT: &str = "plexmeta";

/// Plex metadata type ids used by the bulk edit endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Season = 3,
    Episode = 4,
}

/// Plex Media Server HTTP client.
pub struct PlexClient {
    base_url: String,
    required_agent: String,
    http: Client,
}

impl PlexClient {
    /// Build a client for the server at `address` (e.g. `http://localhost:32400`).
    ///
    /// Libraries whose agent differs from `required_agent` are refused by
    /// [`CatalogService::find_library`]; pass an empty string to accept any.
    pub fn new(address: &str, token: &str, required_agent: &str) -> Result<Self, PlexError> {
        let url = Url::parse(address.trim())?;
        let base_url = url.as_str().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(PRODUCT));
        headers.insert("x-plex-product", HeaderValue::from_static(PRODUCT));
        let mut token = HeaderValue::from_str(token.trim())
            .map_err(|e| PlexError::Parse(format!("auth token: {e}")))?;
        token.set_sensitive(true);
        headers.insert("x-plex-token", token);

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            base_url,
            required_agent: required_agent.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, PlexError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "Plex API error");
            Err(PlexError::Api {
                status,
                message: body,
            })
        }
    }

    async fn get_container<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PlexError> {
        let resp = self
            .http
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let body: PlexResponse<T> = resp
            .json()
            .await
            .map_err(|e| PlexError::Parse(e.to_string()))?;
        Ok(body.media_container)
    }

    async fn put_metadata(
        &self,
        library_key: &str,
        item_type: ItemType,
        key: &str,
        patch: &MetadataPatch,
    ) -> Result<(), PlexError> {
        if patch.is_empty() {
            // Nothing to send.
            return Ok(());
        }

        let url = format!("{}/library/sections/{library_key}/all", self.base_url);
        let params = update_params(item_type, key, patch);
        tracing::debug!(url = %url, ?params, "PUT metadata update");

        let resp = self.http.put(&url).query(&params).send().await?;
        Self::check_response(resp).await?;
        Ok(())
    }
}

/// Query parameters for `PUT /library/sections/{key}/all`.
///
/// Values are left raw; reqwest percent-encodes them.
pub fn update_params(
    item_type: ItemType,
    key: &str,
    patch: &MetadataPatch,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("type", (item_type as u8).to_string()),
        ("id", key.to_string()),
        ("includeExternalMedia", "1".to_string()),
    ];
    if let Some(title) = patch.title.as_deref().filter(|t| !t.trim().is_empty()) {
        params.push(("title.value", title.to_string()));
    }
    if let Some(summary) = patch.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        params.push(("summary.value", summary.to_string()));
    }
    params
}

impl CatalogService for PlexClient {
    type Error = PlexError;

    async fn find_library(&self, name: &str) -> Result<Library, PlexError> {
        let sections: SectionsContainer = self.get_container("/library/sections", &[]).await?;

        let section = sections
            .directory
            .into_iter()
            .find(|s| s.title.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                tracing::error!(
                    library = %name,
                    server = sections.title.as_deref().unwrap_or_default(),
                    "Library not found"
                );
                PlexError::LibraryNotFound(name.to_string())
            })?;

        // Only touch libraries no agent is also writing metadata into.
        if !self.required_agent.is_empty()
            && !section.agent.eq_ignore_ascii_case(&self.required_agent)
        {
            return Err(PlexError::AgentMismatch {
                library: section.title,
                agent: section.agent,
                required: self.required_agent.clone(),
            });
        }

        Ok(section.into())
    }

    async fn list_shows(&self, library_key: &str) -> Result<Vec<Show>, PlexError> {
        let container: MetadataContainer = self
            .get_container(&format!("/library/sections/{library_key}/unwatched"), &[])
            .await?;
        Ok(container.metadata.into_iter().map(|m| m.into_show()).collect())
    }

    async fn list_seasons(&self, show_key: &str) -> Result<Vec<Season>, PlexError> {
        let container: MetadataContainer = self
            .get_container(
                &format!("/library/metadata/{show_key}/children"),
                &[("unwatched", "1")],
            )
            .await?;
        Ok(container.metadata.into_iter().map(|m| m.into_season()).collect())
    }

    async fn list_episodes(&self, season_key: &str) -> Result<Vec<Episode>, PlexError> {
        let container: MetadataContainer = self
            .get_container(
                &format!("/library/metadata/{season_key}/children"),
                &[("unwatched", "1")],
            )
            .await?;
        Ok(container.metadata.into_iter().map(|m| m.into_episode()).collect())
    }

    async fn update_season(
        &self,
        library_key: &str,
        season_key: &str,
        patch: &MetadataPatch,
    ) -> Result<(), PlexError> {
        self.put_metadata(library_key, ItemType::Season, season_key, patch)
            .await
    }

    async fn update_episode(
        &self,
        library_key: &str,
        episode_key: &str,
        patch: &MetadataPatch,
    ) -> Result<(), PlexError> {
        self.put_metadata(library_key, ItemType::Episode, episode_key, patch)
            .await
    }
}
