//! Release-name normalizer.
//!
//! Turns scene-style names such as `Show.Name.S02E05.720p.WEB` into
//! library-friendly titles (`Show Name S02E05`). Recognizes, in order:
//! season+episode markers, a lone season marker, a lone episode marker, a
//! release year (with optional `NN-NN` collection ranges), and falls back to
//! plain cleanup.

mod media;

pub use media::{is_media_file, media_file_name, MEDIA_EXTENSIONS};

use once_cell::sync::Lazy;
use regex_lite::Regex;

static SEASON_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:S(?:eason)?\s*(\d{1,2})\s*E(?:pisode)?\s*(\d{1,2})|E(?:pisode)?\s*(\d{1,2})\s*S(?:eason)?\s*(\d{1,2}))\b",
    )
    .expect("valid season/episode pattern")
});

static SEASON_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(?:eason)?\s*(\d{1,2})\b").expect("valid season pattern"));

static EPISODE_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bE(?:pisode)?\s*(\d{1,2})\b").expect("valid episode pattern"));

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid year pattern"));

static COLLECTION_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\s*-\s*(\d{1,2})\b").expect("valid collection range pattern")
});

static COLLECTION_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcollection\b").expect("valid collection pattern"));

/// Release noise removed before display (compared lower-cased).
const JUNK_WORDS: &[&str] = &[
    "1080p", "720p", "480p", "2160p", "4k", "bluray", "brrip", "webrip", "webdl", "web", "hdrip",
    "dvdrip", "remux", "proper", "repack", "x264", "x265", "h264", "h265", "hevc", "aac", "dts",
    "ac3", "dd5", "ddp5", "cam", "ts", "hc",
];

/// Beautify a raw release name into a human-readable title.
///
/// ```
/// use tagrunner_core::normalizer::beautify;
///
/// assert_eq!(beautify("The.Matrix.1999.1080p.BluRay.x264"), "The Matrix (1999)");
/// assert_eq!(beautify("Show.Name.S02E05.720p.WEB"), "Show Name S02E05");
/// ```
pub fn beautify(raw: &str) -> String {
    let name = normalize(raw);

    if let Some(caps) = SEASON_EPISODE.captures(&name) {
        let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        let (season, episode) = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
            (Some(s), Some(e), _, _) => (parse_number(s.as_str()), parse_number(e.as_str())),
            (_, _, Some(e), Some(s)) => (parse_number(s.as_str()), parse_number(e.as_str())),
            _ => (0, 0),
        };
        let label = format!("S{:02}E{:02}", season, episode);
        return around_marker(&name, whole, &label);
    }

    if let Some(caps) = SEASON_ONLY.captures(&name) {
        if let (Some(whole), Some(season)) = (caps.get(0), caps.get(1)) {
            let label = format!("S{:02}", parse_number(season.as_str()));
            return around_marker(&name, (whole.start(), whole.end()), &label);
        }
    }

    if let Some(caps) = EPISODE_ONLY.captures(&name) {
        if let (Some(whole), Some(episode)) = (caps.get(0), caps.get(1)) {
            let label = format!("E{:02}", parse_number(episode.as_str()));
            return around_marker(&name, (whole.start(), whole.end()), &label);
        }
    }

    if let Some(year) = YEAR.find_iter(&name).last() {
        let title = name[..year.start()].trim();
        let year_label = format!("({})", year.as_str());

        if COLLECTION_WORD.is_match(raw) {
            if let Some(range) = COLLECTION_RANGE.captures(raw) {
                if let (Some(start), Some(end)) = (range.get(1), range.get(2)) {
                    let title = strip_collection(title, start.as_str(), end.as_str());
                    let title = title_case(&remove_junk(&title));
                    let span = format!("{}-{}", start.as_str(), end.as_str());
                    return join_parts(&[&title, &span, &year_label]);
                }
            }
        }

        let title = title_case(&remove_junk(title));
        return join_parts(&[&title, &year_label]);
    }

    title_case(&remove_junk(&name))
}

/// Replace separator punctuation with spaces and collapse whitespace runs.
fn normalize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '.' | '-' | '_' | '[' | ']' | '(' | ')' => ' ',
            other => other,
        })
        .collect();
    collapse_whitespace(&replaced)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop junk tokens and long numeric tokens.
fn remove_junk(title: &str) -> String {
    title
        .split_whitespace()
        .filter(|word| {
            let lower = word.to_lowercase();
            let long_number = lower.len() > 4 && lower.chars().all(|c| c.is_ascii_digit());
            !long_number && !JUNK_WORDS.contains(&lower.as_str())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Capitalize the first character of every word, lower-case the rest.
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Assemble `<prefix> <label> <suffix>` from the text around a marker match.
fn around_marker(name: &str, (start, end): (usize, usize), label: &str) -> String {
    let prefix = title_case(&remove_junk(name[..start].trim()));
    let suffix = title_case(&remove_junk(name[end..].trim()));
    join_parts(&[&prefix, label, &suffix])
}

fn strip_collection(title: &str, start: &str, end: &str) -> String {
    let pattern = format!(
        r"\b{}\s+{}\b",
        regex_lite::escape(start),
        regex_lite::escape(end)
    );
    let without_range = match Regex::new(&pattern) {
        Ok(range) => range.replace_all(title, " ").into_owned(),
        Err(_) => title.to_string(),
    };
    let without_word = COLLECTION_WORD.replace_all(&without_range, " ");
    collapse_whitespace(&without_word)
}

fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_number(digits: &str) -> u32 {
    digits.parse().unwrap_or(0)
}
