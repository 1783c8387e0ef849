use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, WrapErr, bail};
use log::debug;
use serde::Deserialize;

use crate::{LANGUAGE, SubtitleDescriptor, SubtitleTracks};

/// Longest slice of yt-dlp stderr carried into an error message
const MAX_STDERR_CHARS: usize = 1000;

/// Where subtitle tracks come from and how their bodies are fetched
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// List the English manual and automatic tracks for a video, without downloading media
    async fn list_tracks(&self, video_url: &str) -> Result<SubtitleTracks>;

    /// Fetch the raw body of one track
    async fn download(&self, track: &SubtitleDescriptor) -> Result<String>;
}

/// The subset of `yt-dlp --dump-single-json` output we read
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    subtitles: Option<HashMap<String, Vec<YtDlpTrack>>>,
    automatic_captions: Option<HashMap<String, Vec<YtDlpTrack>>>,
}

#[derive(Debug, Deserialize)]
struct YtDlpTrack {
    ext: Option<String>,
    url: Option<String>,
}

/// Caption provider backed by the `yt-dlp` executable and a plain HTTP client
pub struct YtDlp {
    binary: PathBuf,
    client: reqwest::Client,
    timeout: Duration,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            client,
            timeout,
        }
    }

    async fn dump_info(&self, video_url: &str) -> Result<Vec<u8>> {
        debug!("Extracting subtitle metadata via {}: {video_url}", self.binary.display());

        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args([
            "--dump-single-json",
            "--skip-download",
            "--write-subs",
            "--write-auto-subs",
            "--sub-langs",
            LANGUAGE,
            "--no-playlist",
            "--no-exec",
            "--",
        ])
        .arg(video_url)
        .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                bail!(
                    "yt-dlp not found at {}. Install it to fetch subtitles:\n  \
                     pip install yt-dlp\n  \
                     or: brew install yt-dlp",
                    self.binary.display()
                );
            }
            Ok(Err(e)) => return Err(e).wrap_err("failed to run yt-dlp"),
            Err(_) => bail!("yt-dlp timed out after {:?}", self.timeout),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
            bail!("yt-dlp exited with status {}: {stderr}", output.status);
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl CaptionProvider for YtDlp {
    async fn list_tracks(&self, video_url: &str) -> Result<SubtitleTracks> {
        let stdout = self.dump_info(video_url).await?;
        let tracks = parse_tracks(&stdout)?;
        debug!(
            "Found {} manual and {} automatic {LANGUAGE} tracks",
            tracks.manual.len(),
            tracks.automatic.len()
        );
        Ok(tracks)
    }

    async fn download(&self, track: &SubtitleDescriptor) -> Result<String> {
        debug!("Downloading {} subtitles", track.ext);

        let body = self
            .client
            .get(&track.url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(body)
    }
}

/// Translate yt-dlp's info JSON into our own track lists
fn parse_tracks(json: &[u8]) -> Result<SubtitleTracks> {
    let info: YtDlpInfo = serde_json::from_slice(json).wrap_err("could not parse yt-dlp metadata")?;

    Ok(SubtitleTracks {
        manual: descriptors(info.subtitles.and_then(|mut m| m.remove(LANGUAGE))),
        automatic: descriptors(info.automatic_captions.and_then(|mut m| m.remove(LANGUAGE))),
    })
}

fn descriptors(tracks: Option<Vec<YtDlpTrack>>) -> Vec<SubtitleDescriptor> {
    tracks
        .unwrap_or_default()
        .into_iter()
        .filter_map(|t| match (t.ext, t.url) {
            (Some(ext), Some(url)) => Some(SubtitleDescriptor {
                language: LANGUAGE.to_string(),
                ext,
                url,
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tracks() {
        let json = br#"{
            "id": "dQw4w9WgXcQ",
            "title": "Test",
            "subtitles": {
                "en": [
                    {"ext": "json3", "url": "https://example.com/m.json3", "name": "English"},
                    {"ext": "vtt", "url": "https://example.com/m.vtt"}
                ],
                "de": [{"ext": "vtt", "url": "https://example.com/de.vtt"}]
            },
            "automatic_captions": {
                "en": [{"ext": "srv1", "url": "https://example.com/a.srv1"}]
            }
        }"#;

        let tracks = parse_tracks(json).unwrap();
        assert_eq!(
            tracks.manual,
            vec![
                SubtitleDescriptor::new("en", "json3", "https://example.com/m.json3"),
                SubtitleDescriptor::new("en", "vtt", "https://example.com/m.vtt"),
            ]
        );
        assert_eq!(
            tracks.automatic,
            vec![SubtitleDescriptor::new("en", "srv1", "https://example.com/a.srv1")]
        );
    }

    #[test]
    fn test_parse_tracks_missing_maps() {
        let tracks = parse_tracks(br#"{"id": "x", "subtitles": null}"#).unwrap();
        assert!(tracks.manual.is_empty());

        let tracks = parse_tracks(br#"{"id": "x"}"#).unwrap();
        assert!(tracks.manual.is_empty());
        assert!(tracks.automatic.is_empty());
    }

    #[test]
    fn test_parse_tracks_skips_incomplete_entries() {
        let json = br#"{"automatic_captions": {"en": [{"ext": "vtt"}, {"url": "u"}, {"ext": "vtt", "url": "ok"}]}}"#;
        let tracks = parse_tracks(json).unwrap();
        assert_eq!(tracks.automatic, vec![SubtitleDescriptor::new("en", "vtt", "ok")]);
    }

    #[test]
    fn test_parse_tracks_invalid_json() {
        assert!(parse_tracks(b"ERROR: not json").is_err());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let ytdlp = YtDlp::new(
            "/nonexistent/yt-dlp-binary",
            reqwest::Client::new(),
            Duration::from_secs(5),
        );
        let err = ytdlp.list_tracks("https://youtu.be/dQw4w9WgXcQ").await.unwrap_err();
        assert!(err.to_string().contains("yt-dlp not found"));
    }

    async fn serve_subtitles() -> std::net::SocketAddr {
        use axum::http::StatusCode;
        use axum::routing::get;

        let app = axum::Router::new()
            .route("/missing.vtt", get(|| async { (StatusCode::NOT_FOUND, "gone") }))
            .route("/ok.vtt", get(|| async { "WEBVTT\n\n00:00.000 --> 00:01.000\nhi\n" }))
            .route(
                "/slow.vtt",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "WEBVTT\n"
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    fn local_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn test_download_status_handling() {
        let addr = serve_subtitles().await;
        let ytdlp = YtDlp::new("yt-dlp", local_client(), Duration::from_secs(5));

        let missing = SubtitleDescriptor::new("en", "vtt", &format!("http://{addr}/missing.vtt"));
        let err = ytdlp.download(&missing).await.unwrap_err();
        assert!(err.to_string().contains("404"));

        let ok = SubtitleDescriptor::new("en", "vtt", &format!("http://{addr}/ok.vtt"));
        assert_eq!(
            ytdlp.download(&ok).await.unwrap(),
            "WEBVTT\n\n00:00.000 --> 00:01.000\nhi\n"
        );
    }

    #[tokio::test]
    async fn test_download_times_out() {
        let addr = serve_subtitles().await;
        let ytdlp = YtDlp::new("yt-dlp", local_client(), Duration::from_millis(200));

        let slow = SubtitleDescriptor::new("en", "vtt", &format!("http://{addr}/slow.vtt"));
        assert!(ytdlp.download(&slow).await.is_err());
    }
}
