use serde::Deserialize;

use crate::traits::{Episode, Library, Season, Show};

// ── Response envelopes ───────────────────────────────────────────

/// Every Plex JSON response wraps its payload in a `MediaContainer`.
#[derive(Debug, Deserialize)]
pub struct PlexResponse<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: T,
}

/// `GET /library/sections`.
#[derive(Debug, Deserialize)]
pub struct SectionsContainer {
    #[serde(rename = "title1")]
    pub title: Option<String>,
    #[serde(rename = "Directory", default)]
    pub directory: Vec<PlexSection>,
}

/// `GET /library/sections/{key}/unwatched` and `/library/metadata/{key}/children`.
#[derive(Debug, Deserialize)]
pub struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<PlexMetadata>,
}

// ── Items ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlexSection {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub agent: String,
}

/// A show, season or episode; Plex uses one shape for all three.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlexMetadata {
    pub rating_key: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    #[serde(rename = "Media", default)]
    pub media: Vec<PlexMedia>,
}

#[derive(Debug, Deserialize)]
pub struct PlexMedia {
    pub id: Option<u64>,
    pub container: Option<String>,
    #[serde(rename = "Part", default)]
    pub part: Vec<PlexMediaPart>,
}

#[derive(Debug, Deserialize)]
pub struct PlexMediaPart {
    pub id: Option<u64>,
    pub file: Option<String>,
}

// ── Conversions ──────────────────────────────────────────────────

impl From<PlexSection> for Library {
    fn from(s: PlexSection) -> Self {
        Library {
            key: s.key,
            title: s.title,
            agent: s.agent,
        }
    }
}

impl PlexMetadata {
    pub fn into_show(self) -> Show {
        Show {
            key: self.rating_key,
            title: self.title.unwrap_or_default(),
        }
    }

    pub fn into_season(self) -> Season {
        Season {
            key: self.rating_key,
            title: self.title,
            summary: self.summary,
        }
    }

    /// Flatten every `Media[].Part[].file` into the episode's backing paths.
    pub fn into_episode(self) -> Episode {
        let media_files = self
            .media
            .into_iter()
            .flat_map(|m| m.part)
            .filter_map(|p| p.file)
            .filter(|f| !f.trim().is_empty())
            .collect();

        Episode {
            key: self.rating_key,
            title: self.title,
            summary: self.summary,
            media_files,
        }
    }
}
