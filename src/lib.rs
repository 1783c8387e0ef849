pub mod config;
pub mod notes;
pub mod output;
pub mod pipeline;
pub mod select;
pub mod server;
pub mod transcript;
pub mod youtube;

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Language code requested from the metadata service
pub const LANGUAGE: &str = "en";

/// A single subtitle track as offered by the metadata service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleDescriptor {
    pub language: String,
    pub ext: String,
    pub url: String,
}

impl SubtitleDescriptor {
    pub fn new(language: &str, ext: &str, url: &str) -> Self {
        Self {
            language: language.to_string(),
            ext: ext.to_string(),
            url: url.to_string(),
        }
    }

    /// The parsed format tag, if it is one we can handle
    pub fn format(&self) -> Option<SubtitleFormat> {
        self.ext.parse().ok()
    }
}

/// Manual and automatic tracks for one video, in service order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleTracks {
    pub manual: Vec<SubtitleDescriptor>,
    pub automatic: Vec<SubtitleDescriptor>,
}

/// Caption markup formats the parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Vtt,
    Json3,
}

impl FromStr for SubtitleFormat {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vtt" => Ok(SubtitleFormat::Vtt),
            "json3" => Ok(SubtitleFormat::Json3),
            other => Err(eyre::eyre!("unsupported subtitle format: {other}")),
        }
    }
}

impl std::fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtitleFormat::Vtt => write!(f, "vtt"),
            SubtitleFormat::Json3 => write!(f, "json3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Outcome of one notes generation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesResult {
    pub status: Status,
    pub message: String,
    pub content: Option<String>,
}

/// The JSON body returned for every `/process` submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Envelope {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            transcript: None,
            notes: None,
        }
    }

    pub fn success(message: impl Into<String>, transcript: String, notes: Option<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
            transcript: Some(transcript),
            notes,
        }
    }
}

const VIDEO_ID_PATTERNS: [&str; 6] = [
    // Bare 11-character video ID
    r"^([a-zA-Z0-9_-]{11})$",
    r"youtube\.com/watch\?.*v=([a-zA-Z0-9_-]{11})",
    r"youtu\.be/([a-zA-Z0-9_-]{11})",
    r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
    r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
    r"youtube\.com/live/([a-zA-Z0-9_-]{11})",
];

static VIDEO_ID_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| VIDEO_ID_PATTERNS.iter().filter_map(|p| Regex::new(p).ok()).collect());

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    VIDEO_ID_RES
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
}
