//! Desired metadata per entity: overrides first, parsed titles second.

use plexmeta_api::{Episode, MetadataPatch};

use crate::overrides::{OverrideField, OverrideSet};

/// Metadata we want an entity to have. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredMetadata {
    pub title: Option<String>,
    pub summary: Option<String>,
}

impl DesiredMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.summary.is_none()
    }

    pub fn to_patch(&self) -> MetadataPatch {
        MetadataPatch {
            title: self.title.clone(),
            summary: self.summary.clone(),
        }
    }
}

/// Combine override fields with a parsed title.
///
/// The parser only runs when the override title is absent or blank. Summaries
/// have no parsed fallback.
pub fn resolve(
    title: &OverrideField,
    summary: &OverrideField,
    parse_title: impl FnOnce() -> Option<String>,
) -> DesiredMetadata {
    let title = match title.value() {
        Some(t) => Some(t.to_string()),
        None => parse_title(),
    };
    DesiredMetadata {
        title,
        summary: summary.value().map(str::to_string),
    }
}

/// Desired metadata for a season, given its episodes in catalog order.
///
/// The parsed title comes from the directory of the first episode's first file.
pub fn resolve_season(overrides: Option<&OverrideSet>, episodes: &[Episode]) -> DesiredMetadata {
    let season = overrides.and_then(|o| o.season.as_ref());
    let absent = OverrideField::Absent;
    let (title, summary) = match season {
        Some(s) => (&s.title, &s.summary),
        None => (&absent, &absent),
    };

    resolve(title, summary, || {
        episodes
            .first()
            .and_then(Episode::primary_file)
            .and_then(plexmeta_parse::season_title)
    })
}

/// Desired metadata for one episode.
///
/// The parsed title comes from the file name of the episode's first file.
pub fn resolve_episode(
    overrides: Option<&OverrideSet>,
    episode: &Episode,
    max_title_len: usize,
) -> DesiredMetadata {
    let entry = overrides.and_then(|o| o.episode_override(&episode.media_files));
    let absent = OverrideField::Absent;
    let (title, summary) = match entry {
        Some(e) => (&e.title, &e.summary),
        None => (&absent, &absent),
    };

    resolve(title, summary, || {
        episode
            .primary_file()
            .map(plexmeta_parse::file_name)
            .and_then(|name| plexmeta_parse::episode_title(name, max_title_len))
    })
}
