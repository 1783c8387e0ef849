use eyre::{Result, bail};
use log::debug;

use crate::{SubtitleDescriptor, SubtitleTracks};

pub const NO_SUBTITLES: &str = "No English subtitles found for this video.";
pub const NO_SUPPORTED_FORMAT: &str = "No supported subtitle format found.";

/// Pick the track to download.
///
/// Manual subtitles win whenever any exist, even if none of them is in a
/// supported format. Within the chosen list the first vtt or json3 entry wins.
pub fn select_track(tracks: &SubtitleTracks) -> Result<&SubtitleDescriptor> {
    let (kind, candidates) = if !tracks.manual.is_empty() {
        ("manual", &tracks.manual)
    } else {
        ("automatic", &tracks.automatic)
    };

    if candidates.is_empty() {
        bail!(NO_SUBTITLES);
    }

    match candidates.iter().find(|d| d.format().is_some()) {
        Some(track) => {
            debug!("Selected {kind} track: ext={} lang={}", track.ext, track.language);
            Ok(track)
        }
        None => bail!(NO_SUPPORTED_FORMAT),
    }
}
