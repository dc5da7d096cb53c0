//! Named extraction rules, evaluated in order with first-match-wins
//!
//! Each rule is a pure `fn(&str) -> Option<ParsedTitle>` over a filename stem
//! that already had its extension, leading release tags and part indicators
//! removed. Rules return titles that are already polished and non-empty.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ParsedTitle;

/// A single named step of the extraction policy
#[derive(Clone, Copy)]
pub struct ExtractionRule {
    /// Name used in debug logs and tests
    pub name: &'static str,
    /// The rule itself
    pub apply: fn(&str) -> Option<ParsedTitle>,
}

impl std::fmt::Debug for ExtractionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionRule").field("name", &self.name).finish()
    }
}

/// Extraction policy in priority order
pub const RULES: [ExtractionRule; 3] = [
    ExtractionRule {
        name: "episode-marker",
        apply: episode_marker,
    },
    ExtractionRule {
        name: "year-anchor",
        apply: year_anchor,
    },
    ExtractionRule {
        name: "technical-denylist",
        apply: technical_denylist,
    },
];

/// Plausible release years
const YEAR_RANGE: std::ops::RangeInclusive<u32> = 1920..=2029;

/// Characters trimmed from both ends of a title
const EDGE_PUNCTUATION: &[char] = &[
    '-', '–', '—', '_', '.', ',', ':', ';', '|', '/', '\\', '[', ']', '(', ')', '{', '}', '~', '+',
];

/// Technical tokens that never belong to a title (compared lowercase)
const DENYLIST: &[&str] = &[
    // Resolution
    "4k", "uhd", "fhd",
    // Source
    "bluray", "blu-ray", "bdrip", "brrip", "bdremux", "remux", "web-dl", "webdl", "webrip",
    "hdtv", "dvdrip", "hdrip", "dvdscr", "hdcam",
    // Codec
    "x265", "x264", "h265", "h264", "hevc", "avc", "xvid", "divx", "vp9", "av1",
    // Audio
    "aac", "ac3", "eac3", "dts", "dts-hd", "atmos", "truehd", "flac", "mp3", "ddp",
    // Bit depth and dynamic range
    "10bit", "10-bit", "8bit", "8-bit", "hdr", "hdr10", "sdr",
    // Release groups
    "pahe", "rarbg", "yts", "yify", "sparks", "geckos", "amiable", "fgt", "ntb", "ion10", "mzabi",
    // Edition noise
    "proper", "repack", "unrated", "remastered", "subbed", "dubbed",
];

static SEASON_EPISODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s._\-\[(])(S\d{1,2}[\s._]?E\d{1,3}(?:-?E\d{1,3})?)").unwrap()
});

static EPISODE_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[\s._\-\[(])(Episode[\s._\-]*\d{1,4})(?:[^0-9]|$)").unwrap());

static SEASON_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[\s._\-\[(])(S\d{1,2})(?:[\s._\-\])]|$)").unwrap());

static EPISODE_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[\s._\-\[(])(E\d{2,3})(?:[\s._\-\])]|$)").unwrap());

/// Fansub-style absolute numbering: "Title - 07 [1080p]"
static ABSOLUTE_EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s-\s(\d{1,3})(?:v\d)?(?:[\s._\[(]|$)").unwrap());

static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

static BRACKETED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)|\{[^}]*\}").unwrap());

/// Technical tokens containing a dot, removed before the stem is tokenized
static DOTTED_TECH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:h\.26[45]|(?:ddp?|dd\+|aac|ac3|eac3|dts|opus)?[257]\.[01]|pahe\.in)\b").unwrap()
});

static RESOLUTION_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:\d{3,4}[pi]|\d{3,4}x\d{3,4})$").unwrap());

static BIT_DEPTH_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\d{1,2}-?bits?$").unwrap());

static SEPARATOR_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[._\s]+").unwrap());

/// Truncate at the earliest season/episode marker; the prefix is the title
pub fn episode_marker(stem: &str) -> Option<ParsedTitle> {
    let (start, marker) = find_episode_marker(stem)?;
    let title = polish(&stem[..start]);
    if title.is_empty() {
        return None;
    }

    Some(ParsedTitle {
        normalized_title: title,
        year: None,
        episode_marker: Some(marker),
        part: None,
    })
}

/// Treat the first plausible year as the boundary between title and technical noise
pub fn year_anchor(stem: &str) -> Option<ParsedTitle> {
    for run in year_candidates(stem) {
        let title = polish(&stem[..run.start()]);
        if title.is_empty() || title.split(' ').any(|word| word == run.as_str()) {
            continue;
        }

        return Some(ParsedTitle {
            normalized_title: title,
            year: Some(run.as_str().to_string()),
            episode_marker: None,
            part: None,
        });
    }

    None
}

/// Four digit runs in the year range that are not part of a resolution
fn year_candidates(stem: &str) -> impl Iterator<Item = regex::Match<'_>> + '_ {
    DIGIT_RUN_RE.find_iter(stem).filter(move |run| {
        let in_range = run.as_str().len() == 4
            && run.as_str().parse::<u32>().is_ok_and(|year| YEAR_RANGE.contains(&year));

        // 1920x1080, 2000p and friends are resolutions, not years
        let next = stem[run.end()..].chars().next();
        let prev = stem[..run.start()].chars().next_back();
        in_range
            && !matches!(next, Some('p' | 'P' | 'i' | 'I' | 'x' | 'X'))
            && !matches!(prev, Some('x' | 'X'))
    })
}

/// First plausible year in the text
fn find_year(text: &str) -> Option<&str> {
    year_candidates(text).next().map(|run| run.as_str())
}

/// Last resort when there is no year: drop bracketed content and technical tokens
pub fn technical_denylist(stem: &str) -> Option<ParsedTitle> {
    let without_brackets = BRACKETED_RE.replace_all(stem, " ");
    let without_dotted = DOTTED_TECH_RE.replace_all(&without_brackets, " ");

    let kept: Vec<&str> = without_dotted
        .split(|c: char| c.is_whitespace() || c == '.' || c == '_')
        .filter(|token| !token.is_empty() && !is_technical_token(token))
        .collect();

    Some(ParsedTitle {
        normalized_title: polish(&kept.join(" ")),
        year: None,
        episode_marker: None,
        part: None,
    })
}

/// Locate the earliest episode marker, returning the truncation point and the marker label
pub fn find_episode_marker(stem: &str) -> Option<(usize, String)> {
    let mut found: Vec<(usize, String)> = Vec::new();

    for re in [&*SEASON_EPISODE_RE, &*EPISODE_WORD_RE, &*SEASON_ONLY_RE, &*EPISODE_ONLY_RE] {
        if let Some(caps) = re.captures(stem) {
            let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
            if let Some(marker) = caps.get(1) {
                found.push((whole, normalize_marker(marker.as_str())));
            }
        }
    }

    // "Toy Story - 2 (1999)" is a sequel with a year, not episode 2
    if let Some(caps) = ABSOLUTE_EPISODE_RE.captures(stem) {
        if let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) {
            if find_year(&stem[number.end()..]).is_none() {
                found.push((whole.start(), format!("E{:0>2}", number.as_str())));
            }
        }
    }

    found.into_iter().min_by_key(|(start, _)| *start)
}

fn normalize_marker(raw: &str) -> String {
    let upper = raw.to_uppercase();
    if upper.starts_with("EPISODE") {
        let digits: String = upper.chars().filter(|c| c.is_ascii_digit()).collect();
        return format!("EPISODE {}", digits.parse::<u32>().unwrap_or(0));
    }
    upper.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-').collect()
}

/// Whether a single filename token is technical metadata rather than title text
pub fn is_technical_token(token: &str) -> bool {
    let lower = token.to_lowercase();
    let lower = lower.trim_matches(|c: char| EDGE_PUNCTUATION.contains(&c));
    if lower.is_empty() {
        return false;
    }

    if DENYLIST.contains(&lower)
        || RESOLUTION_TOKEN_RE.is_match(lower)
        || BIT_DEPTH_TOKEN_RE.is_match(lower)
    {
        return true;
    }

    // "x265-Pahe", "AAC-GRP": a technical token carrying a release group suffix
    match lower.split_once('-') {
        Some((head, tail)) if !head.is_empty() && !tail.is_empty() => is_technical_token(head),
        _ => false,
    }
}

/// Repeatedly drop trailing technical words from an already-normalized title
pub fn strip_technical_suffix(title: &str) -> String {
    let mut words: Vec<&str> = title.split_whitespace().collect();
    while words.len() > 1 && words.last().is_some_and(|word| is_technical_token(word)) {
        words.pop();
    }
    words.join(" ")
}

/// Collapse separators, then trim edge punctuation
pub fn polish(raw: &str) -> String {
    let collapsed = SEPARATOR_RUN_RE.replace_all(raw, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c))
        .to_string()
}
