//! User-supplied metadata overrides.
//!
//! A season directory may hold a small JSON file (`.plexmeta` by default)
//! next to its episode files:
//!
//! ```json
//! {
//!   "season": { "title": "France", "summary": "Le Mans, round 7" },
//!   "episodes": [
//!     { "file": "s07e03.Race.MGP.mp4", "title": "Race", "summary": "27 laps" }
//!   ]
//! }
//! ```
//!
//! Every key is optional. A missing, `null` or blank value means "not set"
//! and lets the parsed value through; it never clears remote metadata.
//! Keys match case-insensitively and trailing commas are accepted.

use serde::Deserialize;

use crate::config::OverridesConfig;

/// One override value, keeping "blank" apart from "absent".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<String>")]
pub enum OverrideField {
    #[default]
    Absent,
    /// Present but empty or whitespace-only.
    Blank,
    Value(String),
}

impl OverrideField {
    /// The override value, if it is present and non-blank.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent | Self::Blank => None,
        }
    }
}

impl From<Option<String>> for OverrideField {
    fn from(value: Option<String>) -> Self {
        match value {
            None => Self::Absent,
            Some(v) if v.trim().is_empty() => Self::Blank,
            Some(v) => Self::Value(v),
        }
    }
}

impl From<&str> for OverrideField {
    fn from(value: &str) -> Self {
        Some(value.to_string()).into()
    }
}

/// Contents of one override file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OverrideSet {
    #[serde(default)]
    pub season: Option<SeasonOverride>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub episodes: Vec<EpisodeOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SeasonOverride {
    #[serde(default)]
    pub title: OverrideField,
    #[serde(default)]
    pub summary: OverrideField,
}

/// Override for the episode whose file path ends with `file`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EpisodeOverride {
    #[serde(default)]
    pub file: OverrideField,
    #[serde(default)]
    pub title: OverrideField,
    #[serde(default)]
    pub summary: OverrideField,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<EpisodeOverride>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<EpisodeOverride>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Drop commas that directly precede a closing `}` or `]`, outside strings.
fn strip_trailing_commas(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in content.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = content[i + 1..].trim_start().chars().next();
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn lowercase_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), lowercase_keys(v)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(lowercase_keys).collect())
        }
        other => other,
    }
}

impl OverrideSet {
    /// Parse an override file's contents.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(&strip_trailing_commas(content))?;
        serde_json::from_value(lowercase_keys(value))
    }

    /// First entry (in file order) whose key is a suffix of any backing path.
    ///
    /// Matching is plain `ends_with`, so `e03.mp4` also matches
    /// `s07e03.mp4`.
    pub fn episode_override(&self, media_files: &[String]) -> Option<&EpisodeOverride> {
        self.episodes.iter().find(|entry| {
            entry
                .file
                .value()
                .is_some_and(|key| media_files.iter().any(|path| path.ends_with(key)))
        })
    }
}

/// Where override sets come from.
pub trait OverrideSource {
    /// Overrides for the season containing `media_path`, or `None`.
    ///
    /// Must not fail: unreadable or malformed files count as absent.
    fn load(&self, media_path: &str) -> Option<OverrideSet>;
}

impl<F> OverrideSource for F
where
    F: Fn(&str) -> Option<OverrideSet>,
{
    fn load(&self, media_path: &str) -> Option<OverrideSet> {
        self(media_path)
    }
}

/// Reads override files from the season directory on disk.
#[derive(Debug, Clone)]
pub struct OverrideLoader {
    file_name: String,
    library_dir_prefix: String,
    local_dir_prefix: String,
}

impl OverrideLoader {
    pub fn new(config: &OverridesConfig) -> Self {
        Self {
            file_name: config.file_name.clone(),
            library_dir_prefix: config.library_dir_prefix.clone(),
            local_dir_prefix: config.local_dir_prefix.clone(),
        }
    }

    /// Local path of the override file for the season holding `media_path`.
    ///
    /// Uses the media path's own separator. A configured library prefix is
    /// swapped for the local prefix so server-side paths resolve here.
    pub fn location(&self, media_path: &str) -> Option<String> {
        let dir = plexmeta_parse::parent_dir(media_path)?;
        let sep = plexmeta_parse::separator(media_path);
        let path = format!("{dir}{sep}{}", self.file_name);

        if !self.library_dir_prefix.is_empty() {
            if let Some(rest) = path.strip_prefix(&self.library_dir_prefix) {
                return Some(format!("{}{rest}", self.local_dir_prefix));
            }
        }
        Some(path)
    }
}

impl OverrideSource for OverrideLoader {
    fn load(&self, media_path: &str) -> Option<OverrideSet> {
        let path = self.location(media_path)?;
        tracing::debug!(path = %path, "Looking for override file");

        // Blocking read on the pass's task: one small file per season.
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "No override file");
                return None;
            }
        };

        match OverrideSet::from_json(&content) {
            Ok(set) => {
                tracing::debug!(
                    path = %path,
                    episodes = set.episodes.len(),
                    "Loaded override file"
                );
                Some(set)
            }
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Ignoring malformed override file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(library_prefix: &str, local_prefix: &str) -> OverrideLoader {
        OverrideLoader::new(&OverridesConfig {
            file_name: ".plexmeta".into(),
            library_dir_prefix: library_prefix.into(),
            local_dir_prefix: local_prefix.into(),
        })
    }

    #[test]
    fn test_field_states() {
        assert_eq!(OverrideField::from(None), OverrideField::Absent);
        assert_eq!(OverrideField::from("   "), OverrideField::Blank);
        assert_eq!(OverrideField::from(""), OverrideField::Blank);
        assert_eq!(OverrideField::from("France").value(), Some("France"));
        assert_eq!(OverrideField::Blank.value(), None);
    }

    #[test]
    fn test_parse_full_file() {
        let set = OverrideSet::from_json(
            r#"{
                "season": { "title": "France", "summary": "Le Mans" },
                "episodes": [
                    { "file": "s07e03.Race.MGP.mp4", "title": "Race", "summary": null },
                    { "file": "s07e01.FP1.mp4", "title": "  " }
                ]
            }"#,
        )
        .unwrap();

        let season = set.season.as_ref().unwrap();
        assert_eq!(season.title.value(), Some("France"));
        assert_eq!(season.summary.value(), Some("Le Mans"));
        assert_eq!(set.episodes.len(), 2);
        assert_eq!(set.episodes[0].summary, OverrideField::Absent);
        assert_eq!(set.episodes[1].title, OverrideField::Blank);
        assert_eq!(set.episodes[1].summary, OverrideField::Absent);
    }

    #[test]
    fn test_parse_sparse_and_pascal_case() {
        let set = OverrideSet::from_json(r#"{ "Season": { "Title": "Italy" }, "Episodes": null }"#)
            .unwrap();
        assert_eq!(set.season.unwrap().title.value(), Some("Italy"));
        assert!(set.episodes.is_empty());

        assert_eq!(OverrideSet::from_json("{}").unwrap(), OverrideSet::default());
    }

    #[test]
    fn test_parse_trailing_commas() {
        let set = OverrideSet::from_json(r#"{"season":{"title":"France",},}"#).unwrap();
        assert_eq!(set.season.unwrap().title.value(), Some("France"));

        let set = OverrideSet::from_json(
            r#"{
                "episodes": [
                    { "file": "s07e03.Race.mp4", "title": "Race, wet", },
                ],
            }"#,
        )
        .unwrap();
        assert_eq!(set.episodes.len(), 1);
        // Commas inside strings are left alone.
        assert_eq!(set.episodes[0].title.value(), Some("Race, wet"));
    }

    #[test]
    fn test_parse_keys_case_insensitive() {
        let set = OverrideSet::from_json(r#"{"SEASON":{"TITLE":"France"}}"#).unwrap();
        assert_eq!(set.season.unwrap().title.value(), Some("France"));

        let set = OverrideSet::from_json(
            r#"{ "Episodes": [ { "FILE": "s07e01.FP1.mp4", "Summary": "Dry" } ] }"#,
        )
        .unwrap();
        assert_eq!(set.episodes[0].file.value(), Some("s07e01.FP1.mp4"));
        assert_eq!(set.episodes[0].summary.value(), Some("Dry"));
        assert_eq!(set.episodes[0].title, OverrideField::Absent);
    }

    #[test]
    fn test_parse_rejects_broken_json() {
        assert!(OverrideSet::from_json(r#"{ "season": "#).is_err());
        assert!(OverrideSet::from_json(r#"{ "season": { "title": 7 } }"#).is_err());
    }

    #[test]
    fn test_episode_override_suffix_match() {
        let set = OverrideSet {
            season: None,
            episodes: vec![
                EpisodeOverride {
                    file: OverrideField::Blank,
                    title: "never".into(),
                    ..Default::default()
                },
                EpisodeOverride {
                    file: "e03.Race.mp4".into(),
                    title: "first".into(),
                    ..Default::default()
                },
                EpisodeOverride {
                    file: "s07e03.Race.mp4".into(),
                    title: "second".into(),
                    ..Default::default()
                },
            ],
        };

        let files = vec!["/srv/MGP/07- France/s07e03.Race.mp4".to_string()];
        let entry = set.episode_override(&files).unwrap();
        assert_eq!(entry.title.value(), Some("first"));

        let other = vec!["/srv/MGP/07- France/s07e04.Race.mp4".to_string()];
        assert!(set.episode_override(&other).is_none());
        assert!(set.episode_override(&[]).is_none());
    }

    #[test]
    fn test_episode_override_any_backing_file() {
        let set = OverrideSet {
            season: None,
            episodes: vec![EpisodeOverride {
                file: "s07e03.Race.mkv".into(),
                title: "Race".into(),
                ..Default::default()
            }],
        };
        let files = vec![
            "/srv/a/s07e03.Race.mp4".to_string(),
            "/srv/a/s07e03.Race.mkv".to_string(),
        ];
        assert!(set.episode_override(&files).is_some());
    }

    #[test]
    fn test_location_uses_path_separator() {
        let l = loader("", "");
        assert_eq!(
            l.location(r"R:\sports\07- France\s07e03.mp4").as_deref(),
            Some(r"R:\sports\07- France\.plexmeta")
        );
        assert_eq!(
            l.location("/data/sports/07- France/s07e03.mp4").as_deref(),
            Some("/data/sports/07- France/.plexmeta")
        );
        assert_eq!(l.location("s07e03.mp4"), None);
    }

    #[test]
    fn test_location_prefix_rewrite() {
        let l = loader("/data/sports", "/mnt/nas/sports");
        assert_eq!(
            l.location("/data/sports/07- France/s07e03.mp4").as_deref(),
            Some("/mnt/nas/sports/07- France/.plexmeta")
        );
        // Paths outside the prefix are left alone.
        assert_eq!(
            l.location("/other/07- France/s07e03.mp4").as_deref(),
            Some("/other/07- France/.plexmeta")
        );
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let season_dir = dir.path().join("07- France");
        std::fs::create_dir(&season_dir).unwrap();
        std::fs::write(
            season_dir.join(".plexmeta"),
            r#"{ "season": { "title": "France" } }"#,
        )
        .unwrap();

        let media = season_dir.join("s07e03.Race.mp4");
        let set = loader("", "").load(media.to_str().unwrap()).unwrap();
        assert_eq!(set.season.unwrap().title.value(), Some("France"));
    }

    #[test]
    fn test_load_missing_or_malformed_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("s07e03.Race.mp4");
        assert!(loader("", "").load(media.to_str().unwrap()).is_none());

        std::fs::write(dir.path().join(".plexmeta"), "{ \"season\": ").unwrap();
        assert!(loader("", "").load(media.to_str().unwrap()).is_none());
    }
}
