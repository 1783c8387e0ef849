use std::sync::Arc;

use eyre::Result;
use log::{debug, info, warn};

use crate::notes::{NotesClient, generate_notes};
use crate::output::{OutputFiles, OutputStore};
use crate::select::select_track;
use crate::youtube::CaptionProvider;
use crate::{Envelope, Status, SubtitleFormat, transcript};

pub const MISSING_URL: &str = "Please provide a YouTube URL";

/// One form submission's worth of work: fetch, select, download, parse, summarize
pub struct Pipeline {
    captions: Arc<dyn CaptionProvider>,
    notes: Arc<dyn NotesClient>,
    store: OutputStore,
}

impl Pipeline {
    pub fn new(captions: Arc<dyn CaptionProvider>, notes: Arc<dyn NotesClient>, store: OutputStore) -> Self {
        Self { captions, notes, store }
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    /// Run the whole pipeline. Every failure ends up in the returned envelope.
    pub async fn process(&self, video_url: Option<&str>, api_key: Option<&str>) -> Envelope {
        let Some(video_url) = video_url.map(str::trim).filter(|u| !u.is_empty()) else {
            return Envelope::error(MISSING_URL);
        };
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty());

        info!("Processing {video_url} (notes: {})", api_key.is_some());
        let files = self.store.for_request(video_url);

        let transcript = match self.fetch_transcript(video_url, &files).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Transcript failed for {video_url}: {e:#}");
                return Envelope::error(format!("{e:#}"));
            }
        };

        let Some(api_key) = api_key else {
            return Envelope::success("Transcript generated successfully", transcript, None);
        };

        let notes = generate_notes(self.notes.as_ref(), &transcript, api_key, &files).await;
        match notes.status {
            Status::Success => Envelope::success(
                "Transcript and notes generated successfully",
                transcript,
                notes.content,
            ),
            Status::Error => Envelope::success(
                format!("Transcript generated successfully, but notes generation failed: {}", notes.message),
                transcript,
                None,
            ),
        }
    }

    async fn fetch_transcript(&self, video_url: &str, files: &OutputFiles) -> Result<String> {
        let tracks = self.captions.list_tracks(video_url).await?;
        let track = select_track(&tracks)?;
        let format: SubtitleFormat = track.ext.parse()?;

        let body = self.captions.download(track).await?;
        let text = transcript::parse(&body, format)?;
        debug!("Transcript length: {} chars", text.len());

        if let Err(e) = files.write_transcript(&text) {
            warn!("Failed to write transcript file: {e}");
        }
        Ok(text)
    }
}
