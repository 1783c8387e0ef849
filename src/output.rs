use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use eyre::{Result, WrapErr};
use log::debug;

use crate::extract_video_id;

pub const TRANSCRIPT_FILE: &str = "transcript.txt";
pub const NOTES_FILE: &str = "notes_and_summary.txt";

/// Root directory that holds one subdirectory of output files per request key
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it is missing
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .wrap_err_with(|| format!("could not create output directory {}", self.root.display()))
    }

    /// Output files for one submission, keyed by video ID where the URL has one
    pub fn for_request(&self, video_url: &str) -> OutputFiles {
        OutputFiles::new(self.root.join(request_key(video_url)))
    }
}

fn request_key(video_url: &str) -> String {
    extract_video_id(video_url).unwrap_or_else(|| {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("req-{millis}")
    })
}

/// The transcript and notes files of a single request
#[derive(Debug, Clone)]
pub struct OutputFiles {
    dir: PathBuf,
}

impl OutputFiles {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn transcript_path(&self) -> PathBuf {
        self.dir.join(TRANSCRIPT_FILE)
    }

    pub fn notes_path(&self) -> PathBuf {
        self.dir.join(NOTES_FILE)
    }

    pub fn write_transcript(&self, text: &str) -> Result<PathBuf> {
        self.write(self.transcript_path(), text)
    }

    pub fn write_notes(&self, text: &str) -> Result<PathBuf> {
        self.write(self.notes_path(), text)
    }

    fn write(&self, path: PathBuf, text: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, text).wrap_err_with(|| format!("could not write {}", path.display()))?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }
}
