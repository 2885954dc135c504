use regex::Regex;
use std::sync::LazyLock;

use crate::path;

/// "Season 07 - France", "season 7-France", "07- France".
static RE_SEASON_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:season\s+)?(\d+)\s?-?\s?(.*)$").unwrap());

/// Extract a season title from the directory holding an episode file.
///
/// `media_path` is the path of any episode in the season; only its parent
/// directory name is inspected. Returns `None` when the path has no parent
/// segment, the directory name doesn't follow the `(Season )## - Title`
/// convention, or the title part is empty.
pub fn season_title(media_path: &str) -> Option<String> {
    if media_path.trim().is_empty() {
        return None;
    }

    let Some(dir_name) = path::containing_dir_name(media_path) else {
        tracing::debug!(path = %media_path, "No season directory in media path");
        return None;
    };

    title_from_dir_name(dir_name)
}

/// Match a bare season directory name.
pub fn title_from_dir_name(dir_name: &str) -> Option<String> {
    let Some(caps) = RE_SEASON_DIR.captures(dir_name) else {
        tracing::debug!(dir = %dir_name, "Season directory does not match pattern");
        return None;
    };

    let title = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
    if title.is_empty() {
        tracing::debug!(dir = %dir_name, "Season directory has no title after its number");
        None
    } else {
        Some(title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_path() {
        assert_eq!(
            season_title(r"R:\sports\MGP 2022\07- France\s07e03.Race.MGP.mp4").as_deref(),
            Some("France")
        );
    }

    #[test]
    fn test_season_prefix_variants() {
        for path in [
            "R:/sports/MGP 2022/07- France/s07e03.Race.MGP.mp4",
            "R:/sports/MGP 2022/Season 07- France/s07e03.Race.MGP.mp4",
            "R:/sports/MGP 2022/Season 07 - France/s07e03.Race.MGP.mp4",
            "R:/sports/MGP 2022/Season 07-France/s07e03.Race.MGP.mp4",
            "R:/sports/MGP 2022/season 7 - France/s07e03.Race.MGP.mp4",
            "R:/sports/MGP 2022/SEASON 7 - France/s07e03.Race.MGP.mp4",
        ] {
            assert_eq!(season_title(path).as_deref(), Some("France"), "{path}");
        }
    }

    #[test]
    fn test_multi_word_title_is_kept() {
        assert_eq!(
            title_from_dir_name("Season 12 - San Marino & Rimini").as_deref(),
            Some("San Marino & Rimini")
        );
    }

    #[test]
    fn test_digits_only_has_no_title() {
        assert_eq!(title_from_dir_name("Season 07"), None);
        assert_eq!(title_from_dir_name("07"), None);
        assert_eq!(title_from_dir_name("07 - "), None);
    }

    #[test]
    fn test_non_season_directory() {
        assert_eq!(title_from_dir_name("MGP 2022"), None);
        assert_eq!(title_from_dir_name("Specials"), None);
        assert_eq!(title_from_dir_name(""), None);
    }

    #[test]
    fn test_path_without_parent() {
        assert_eq!(season_title("s07e03.Race.MGP.mp4"), None);
        assert_eq!(season_title("/s07e03.Race.MGP.mp4"), None);
        assert_eq!(season_title("   "), None);
    }
}
