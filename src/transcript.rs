use std::sync::LazyLock;

use eyre::{Result, WrapErr, bail};
use regex::Regex;
use serde::Deserialize;

use crate::SubtitleFormat;

/// Cue span tags (`<c.x>`, `</i>`, `<v Name>`) and karaoke timestamps (`<00:00:01.500>`)
static CUE_TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"</?[a-zA-Z][^<>]*>|<(?:\d{2,}:)?\d{2}:\d{2}\.\d{3}>").ok()
});

/// Flatten a subtitle body in the given format into space-joined text
pub fn parse(body: &str, format: SubtitleFormat) -> Result<String> {
    match format {
        SubtitleFormat::Vtt => parse_vtt(body),
        SubtitleFormat::Json3 => parse_json3(body),
    }
}

/// Concatenate the text of every WebVTT cue, in cue order.
///
/// Timestamps, cue identifiers, cue settings, inline tags and the NOTE/STYLE/REGION
/// blocks are dropped. Multi-line cue payloads keep their inner line breaks.
pub fn parse_vtt(body: &str) -> Result<String> {
    let body = body.trim_start_matches('\u{feff}').replace("\r\n", "\n").replace('\r', "\n");

    let header = body.lines().next().unwrap_or_default();
    if !(header == "WEBVTT" || header.starts_with("WEBVTT ") || header.starts_with("WEBVTT\t")) {
        bail!("invalid WebVTT: missing WEBVTT header");
    }

    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut in_header = true;

    for line in body.lines().chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if block.is_empty() {
            continue;
        }
        if in_header {
            in_header = false;
        } else if let Some(text) = cue_text(&block) {
            cues.push(text);
        }
        block.clear();
    }

    Ok(cues.join(" "))
}

fn cue_text(block: &[&str]) -> Option<String> {
    let timing = block.iter().take(2).position(|l| l.contains("-->"))?;
    let payload = block[timing + 1..].join("\n");
    let stripped = match CUE_TAG_RE.as_ref() {
        Some(re) => re.replace_all(&payload, "").into_owned(),
        None => payload,
    };
    Some(html_escape::decode_html_entities(&stripped).trim().to_string())
}

#[derive(Debug, Deserialize)]
struct Json3Document {
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Option<Vec<Json3Segment>>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: Option<String>,
}

/// Concatenate every `events[].segs[].utf8` string, in event-then-segment order
pub fn parse_json3(body: &str) -> Result<String> {
    let doc: Json3Document = serde_json::from_str(body).wrap_err("invalid json3 subtitle document")?;

    let text = doc
        .events
        .into_iter()
        .filter_map(|event| event.segs)
        .flatten()
        .filter_map(|seg| seg.utf8)
        .collect::<Vec<_>>()
        .join(" ");

    Ok(text)
}
