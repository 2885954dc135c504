//! Trait definitions for remote media catalogs.
//!
//! The reconciliation engine only talks to a catalog through
//! [`CatalogService`], so it can run against Plex or an in-memory fake.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// A browsable media catalog holding shows, seasons and episodes.
pub trait CatalogService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Find a library by name.
    fn find_library(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Library, Self::Error>> + Send;

    /// List the shows in a library that still have unwatched episodes.
    fn list_shows(
        &self,
        library_key: &str,
    ) -> impl Future<Output = Result<Vec<Show>, Self::Error>> + Send;

    /// List the seasons of a show.
    fn list_seasons(
        &self,
        show_key: &str,
    ) -> impl Future<Output = Result<Vec<Season>, Self::Error>> + Send;

    /// List the episodes of a season.
    fn list_episodes(
        &self,
        season_key: &str,
    ) -> impl Future<Output = Result<Vec<Episode>, Self::Error>> + Send;

    /// Apply a partial metadata update to a season.
    fn update_season(
        &self,
        library_key: &str,
        season_key: &str,
        patch: &MetadataPatch,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Apply a partial metadata update to an episode.
    fn update_episode(
        &self,
        library_key: &str,
        episode_key: &str,
        patch: &MetadataPatch,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A library ("section" in Plex terms).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub key: String,
    pub title: String,
    /// Metadata agent the library is configured with.
    pub agent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    pub key: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub key: String,
    pub title: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub key: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    /// Paths of every file backing this episode, as the server sees them.
    pub media_files: Vec<String>,
}

impl Episode {
    /// The first backing file, used for title parsing and override lookup.
    pub fn primary_file(&self) -> Option<&str> {
        self.media_files.first().map(String::as_str)
    }
}

/// Fields to change on a season or episode. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl MetadataPatch {
    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.summary.is_none()
    }

    /// Overlay this patch onto a current `(title, summary)` pair.
    pub fn apply_to(&self, title: &mut Option<String>, summary: &mut Option<String>) {
        if let Some(t) = &self.title {
            *title = Some(t.clone());
        }
        if let Some(s) = &self.summary {
            *summary = Some(s.clone());
        }
    }
}
