use regex::Regex;
use std::sync::LazyLock;

/// Default cap on extracted episode title length, in characters.
pub const DEFAULT_MAX_TITLE_LEN: usize = 48;

/// Name of the filename convention below, used in diagnostics.
const SIMPLE_EPISODE_PATTERN: &str = "s##e##.Title (suffix).ext";

/// `s05e04.Sprint.Race.mp4`, `GP.s05e04-Sprint.Race (1080p).mp4`.
///
/// Falls apart when nothing separates the episode number from the title
/// (`s03e02SprintRace.mp4`), and keeps unbracketed release tags such as
/// `...Qualifying.WEB-DL.1080p.H264.English-DC46.mkv` in the title.
static RE_SIMPLE_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"s(\d+)e(\d+).(.*?)(\(.*\))?\.(avi|mkv|mp4|ts)$").unwrap()
});

/// Pieces recognised in an episode filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeName {
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Normalized title: separators turned into spaces, length capped, trimmed.
    pub title: String,
    /// Container extension, without the dot.
    pub extension: String,
}

/// Extract an episode title from a media filename (not a full path).
///
/// `.` and `_` in the title become spaces, the result is cut to `max_len`
/// characters and then trimmed. A trailing parenthesised suffix such as
/// `(1080p)` is left out.
///
/// # Example
/// ```
/// let title = plexmeta_parse::episode_title("s06e03.Race.MotoGP.mp4", 48);
/// assert_eq!(title.as_deref(), Some("Race MotoGP"));
/// ```
pub fn episode_title(filename: &str, max_len: usize) -> Option<String> {
    parse_episode_name(filename, max_len).map(|name| name.title)
}

/// Parse an episode filename into its numbered parts and title.
pub fn parse_episode_name(filename: &str, max_len: usize) -> Option<EpisodeName> {
    let Some(caps) = RE_SIMPLE_EPISODE.captures(filename) else {
        tracing::debug!(
            pattern = SIMPLE_EPISODE_PATTERN,
            filename = %filename,
            "Filename does not match episode pattern"
        );
        return None;
    };

    let raw_title = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
    let title = normalize_title(raw_title, max_len);
    if title.is_empty() {
        tracing::debug!(
            pattern = SIMPLE_EPISODE_PATTERN,
            filename = %filename,
            "Episode pattern matched but captured no title"
        );
        return None;
    }

    Some(EpisodeName {
        season: caps[1].parse().ok(),
        episode: caps[2].parse().ok(),
        title,
        extension: caps[5].to_string(),
    })
}

/// Separators to spaces, plain prefix cut, then trim.
fn normalize_title(raw: &str, max_len: usize) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| if c == '.' || c == '_' { ' ' } else { c })
        .take(max_len)
        .collect();
    spaced.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(filename: &str) -> Option<String> {
        episode_title(filename, DEFAULT_MAX_TITLE_LEN)
    }

    #[test]
    fn test_dotted_titles() {
        assert_eq!(title("s02e01.Race.M3.mp4").as_deref(), Some("Race M3"));
        assert_eq!(title("s12e02.Qualifying.MGP.mp4").as_deref(), Some("Qualifying MGP"));
        assert_eq!(title("s06e03.Race.MotoGP.mp4").as_deref(), Some("Race MotoGP"));
        assert_eq!(title("s02e01.Race.Moto3.mp4").as_deref(), Some("Race Moto3"));
    }

    #[test]
    fn test_parenthesised_suffix_is_dropped() {
        assert_eq!(
            title("s06e01. World300 - FP1 (593mb 1920x1080 47.546fps 2214kbps x265 deef).mkv")
                .as_deref(),
            Some("World300 - FP1")
        );
        assert_eq!(
            title("s06e01. WorldSSP300 - FP1 (593mb 1920x1080 47.546fps 2214kbps x265 deef).mkv")
                .as_deref(),
            Some("WorldSSP300 - FP1")
        );
    }

    #[test]
    fn test_prefix_before_episode_marker() {
        assert_eq!(
            title("MotoGP.s05e04-Sprint.Race (1080p).mp4").as_deref(),
            Some("Sprint Race")
        );
    }

    #[test]
    fn test_underscores() {
        assert_eq!(title("s01e02_Free_Practice_2.ts").as_deref(), Some("Free Practice 2"));
    }

    #[test]
    fn test_truncates_before_trimming() {
        let name = format!("s01e01.{}.mkv", "A".repeat(60));
        assert_eq!(title(&name).map(|t| t.len()), Some(48));

        // Cut lands on a space, which the trim then removes.
        assert_eq!(episode_title("s01e01.Grand.Prix.mkv", 6).as_deref(), Some("Grand"));
    }

    #[test]
    fn test_extension_allow_list() {
        assert_eq!(title("s01e01.Race.avi").as_deref(), Some("Race"));
        assert_eq!(title("s01e01.Race.ts").as_deref(), Some("Race"));
        assert_eq!(title("s01e01.Race.webm"), None);
        assert_eq!(title("s01e01.Race.mkv.part"), None);
    }

    #[test]
    fn test_known_limitations() {
        // No separator after the episode number: the first title char is eaten.
        assert_eq!(title("s03e02SprintRace.mp4").as_deref(), Some("printRace"));
        // Unbracketed release tags stay in the title.
        assert_eq!(
            title("s06e01-MotoGP.Qualifying.WEB-DL.1080p.mkv").as_deref(),
            Some("MotoGP Qualifying WEB-DL 1080p")
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(title("Race.MotoGP.mp4"), None);
        assert_eq!(title("S06E03.Race.mp4"), None);
        assert_eq!(title("s06e03.mp4"), None);
        assert_eq!(title(""), None);
    }

    #[test]
    fn test_blank_title_is_none() {
        assert_eq!(title("s06e03. .mp4"), None);
        assert_eq!(title("s06e03.__.mkv"), None);
    }

    #[test]
    fn test_parse_episode_numbers() {
        let name = parse_episode_name("s07e03.Race.MGP.mp4", DEFAULT_MAX_TITLE_LEN).unwrap();
        assert_eq!(name.season, Some(7));
        assert_eq!(name.episode, Some(3));
        assert_eq!(name.title, "Race MGP");
        assert_eq!(name.extension, "mp4");
    }
}
