//! Source reference normalization.
//!
//! Users paste watch URLs, short links, embed links, shorts links or bare
//! identifiers interchangeably.  `normalize` turns any of those into the
//! 11-character identifier the player backend needs, and degrades to a
//! plain scan of the text when the input is not a recognizable URL.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

pub const VIDEO_ID_LEN: usize = 11;

const SHORT_LINK_HOST: &str = "youtu.be";
const MAIN_HOST: &str = "youtube.com";

/// Zero-width characters and the byte-order mark, all invisible when pasted.
const INVISIBLE: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

static ID_RUN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_-]{11}").ok());

/// Canonical 11-character video identifier, `[A-Za-z0-9_-]{11}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Strict check: the whole string must be an identifier.
    pub fn parse(candidate: &str) -> Option<Self> {
        is_video_id(candidate).then(|| Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Watch URL handed to the player backend.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VideoId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_video_id(&value) {
            Ok(Self(value))
        } else {
            Err(format!("not a video id: {value:?}"))
        }
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

fn is_video_id(s: &str) -> bool {
    s.len() == VIDEO_ID_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Resolve a raw source reference into a video identifier.
///
/// Returns `None` for empty input or when nothing in the text looks like an
/// identifier.  Never panics on any input.
pub fn normalize(raw: &str) -> Option<VideoId> {
    if raw.is_empty() {
        return None;
    }
    let cleaned: String = raw.chars().filter(|c| !INVISIBLE.contains(c)).collect();
    let cleaned = cleaned.trim();

    if let Some(id) = VideoId::parse(cleaned) {
        return Some(id);
    }

    if let Ok(url) = Url::parse(cleaned) {
        if let Some(id) = from_url(&url) {
            return Some(id);
        }
    }

    ID_RUN
        .as_ref()?
        .find(cleaned)
        .map(|m| VideoId(m.as_str().to_string()))
}

/// `normalize` for references that may be absent altogether.
pub fn normalize_opt(raw: Option<&str>) -> Option<VideoId> {
    raw.and_then(normalize)
}

fn from_url(url: &Url) -> Option<VideoId> {
    let host = url.host_str()?.to_ascii_lowercase();
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if host.contains(SHORT_LINK_HOST) {
        if let Some(id) = segments.first().and_then(|seg| VideoId::parse(seg)) {
            return Some(id);
        }
    }

    if host.contains(MAIN_HOST) {
        let v = url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned());
        if let Some(id) = v.as_deref().and_then(VideoId::parse) {
            return Some(id);
        }

        for marker in ["embed", "shorts"] {
            if let Some(pos) = segments.iter().position(|seg| *seg == marker) {
                if let Some(id) = segments.get(pos + 1).and_then(|seg| VideoId::parse(seg)) {
                    return Some(id);
                }
            }
        }
    }

    None
}
