//! Title extraction from noisy release filenames
//!
//! Turns a raw filename into a `(title, year)` candidate plus an optional
//! episode marker. The policy is an ordered list of named rules (see
//! [`rules::RULES`]): episode-marker truncation, then the year anchor, then the
//! technical-token denylist as a last resort.

pub mod rules;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use rules::{ExtractionRule, RULES};

/// Recognised video file extensions (lowercase, without the dot)
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "wmv", "flv", "webm", "m4v"];

/// Output of title extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTitle {
    /// Cleaned, whitespace-collapsed title; never empty
    pub normalized_title: String,
    /// Four digit release year, when one anchored the title
    pub year: Option<String>,
    /// Season/episode marker the title was truncated at (e.g. `S01E01`)
    pub episode_marker: Option<String>,
    /// Part number removed from the name (`part001`, `CD2`, ...)
    pub part: Option<u32>,
}

/// Multi-part indicators: "part001", "Pt.2", "CD1", "Disc 3"
static PART_INDICATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s._\-])(?:part|pt|cd|disc)[\s._\-]?(\d{1,3})(?:[^0-9A-Za-z]|$)").unwrap()
});

/// Leading release group tags: "[SubsPlease] Title ..."
static LEADING_TAGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:\[[^\]]*\]\s*)+").unwrap());

/// Extract a title candidate from a raw filename
pub fn extract(filename: &str) -> ParsedTitle {
    let stem = strip_video_extension(filename);
    let stem = LEADING_TAGS_RE.replace(stem, "");
    let (stem, part) = strip_part_indicators(&stem);

    let mut parsed = RULES
        .iter()
        .find_map(|rule| {
            let result = (rule.apply)(&stem);
            if let Some(ref parsed) = result {
                debug!("Rule '{}' matched {} -> {:?}", rule.name, filename, parsed.normalized_title);
            }
            result
        })
        .unwrap_or_default();

    parsed.normalized_title = rules::polish(&parsed.normalized_title);
    if parsed.normalized_title.is_empty() {
        debug!("Extraction left nothing for {}, keeping the raw filename", filename);
        parsed.normalized_title = filename.to_string();
    }
    parsed.part = part;
    parsed
}

/// Whether the filename ends with one of `extensions` (case-insensitive, no dot)
pub fn has_video_extension<S: AsRef<str>>(filename: &str, extensions: &[S]) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| extensions.iter().any(|allowed| allowed.as_ref().eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn strip_video_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) if has_video_extension(filename, VIDEO_EXTENSIONS) => stem,
        _ => filename,
    }
}

fn strip_part_indicators(stem: &str) -> (String, Option<u32>) {
    let part = PART_INDICATOR_RE
        .captures(stem)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());

    (PART_INDICATOR_RE.replace_all(stem, " ").into_owned(), part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_episode_filename() {
        let parsed = extract("Frieren.Beyond.Journeys.End.S01E01.1080p.BluRay.x265-Pahe.in.mkv");
        assert_eq!(parsed.normalized_title, "Frieren Beyond Journeys End");
        assert_eq!(parsed.episode_marker.as_deref(), Some("S01E01"));
        assert_eq!(parsed.year, None);
    }

    #[test]
    fn test_movie_with_year() {
        let parsed = extract("Your.Name.2016.2160p.BluRay.x265-Pahe.in.mkv");
        assert_eq!(parsed.normalized_title, "Your Name");
        assert_eq!(parsed.year.as_deref(), Some("2016"));
        assert_eq!(parsed.episode_marker, None);
    }

    #[test]
    fn test_split_parts_share_a_title() {
        let first = extract("Movie_part001.mkv");
        let second = extract("Movie_part002.mkv");
        assert_eq!(first.normalized_title, "Movie");
        assert_eq!(second.normalized_title, "Movie");
        assert_eq!(first.part, Some(1));
        assert_eq!(second.part, Some(2));
    }

    #[test]
    fn test_part_indicator_variants() {
        assert_eq!(extract("Old.Film.1962.CD2.avi").normalized_title, "Old Film");
        assert_eq!(extract("Old Film Disc 1.mkv").normalized_title, "Old Film");
        assert_eq!(extract("Epic.Pt.3.2001.mp4").year.as_deref(), Some("2001"));
    }

    #[test]
    fn test_year_in_parentheses() {
        let parsed = extract("Spirited Away (2001) [1080p].mp4");
        assert_eq!(parsed.normalized_title, "Spirited Away");
        assert_eq!(parsed.year.as_deref(), Some("2001"));
    }

    #[test]
    fn test_leading_group_tag_and_absolute_numbering() {
        let parsed = extract("[SubsPlease] Sousou no Frieren - 07 (1080p) [A1B2C3D4].mkv");
        assert_eq!(parsed.normalized_title, "Sousou no Frieren");
        assert_eq!(parsed.episode_marker.as_deref(), Some("E07"));
    }

    #[test]
    fn test_numbered_sequel_keeps_its_year() {
        let parsed = extract("Toy Story - 2 (1999).mkv");
        assert_eq!(parsed.normalized_title, "Toy Story - 2");
        assert_eq!(parsed.year.as_deref(), Some("1999"));
        assert_eq!(parsed.episode_marker, None);

        assert_eq!(extract("Toy Story - 3 (2010).mkv").normalized_title, "Toy Story - 3");
    }

    #[test]
    fn test_no_year_falls_back_to_denylist() {
        let parsed = extract("Some.Movie.1080p.WEB-DL.x264-GRP.mkv");
        assert_eq!(parsed.normalized_title, "Some Movie");
        assert_eq!(parsed.year, None);

        assert_eq!(extract("Charlotte's Web.mkv").normalized_title, "Charlotte's Web");
    }

    #[test]
    fn test_empty_result_keeps_raw_filename() {
        assert_eq!(extract("1080p.x265.mkv").normalized_title, "1080p.x265.mkv");
        assert_eq!(extract("").normalized_title, "");
    }

    #[test]
    fn test_title_never_contains_the_year() {
        for name in ["Heat.1995.1080p.mkv", "Alien 1979 Directors Cut.mp4", "The.Thing.1982.REMASTERED.mkv"] {
            let parsed = extract(name);
            let year = parsed.year.clone().unwrap();
            assert!(!parsed.normalized_title.contains(&year), "{} kept its year", name);
        }
    }

    #[test]
    fn test_has_video_extension() {
        assert!(has_video_extension("a.MKV", VIDEO_EXTENSIONS));
        assert!(has_video_extension("movie.m4v", VIDEO_EXTENSIONS));
        assert!(!has_video_extension("notes.txt", VIDEO_EXTENSIONS));
        assert!(!has_video_extension("noextension", VIDEO_EXTENSIONS));

        let configured = vec!["ts".to_string()];
        assert!(has_video_extension("recording.TS", configured.as_slice()));
        assert!(!has_video_extension("movie.mkv", configured.as_slice()));
    }
}
