use log::warn;

const SEGMENT_MARKER: &str = "#EXTINF";
const KEY_MARKER: &str = "#EXT-X-KEY";

/// One fetchable chunk of the stream, in playback order.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub uri: String,
    pub duration: Option<f64>,
}

#[derive(Debug, Default)]
pub struct MediaPlaylist {
    pub segments: Vec<Segment>,
    pub total_duration: f64,
    /// Relative reference to the AES-128 key, empty when the stream is
    /// unencrypted.
    pub key_uri: String,
}

impl MediaPlaylist {
    pub fn is_encrypted(&self) -> bool {
        !self.key_uri.is_empty()
    }
}

/// Scans media-playlist text line by line. Segments are collected exactly in
/// file order; nothing is dropped or deduplicated. A duration that fails to
/// parse is logged and contributes zero to the total.
pub fn parse_media_playlist(text: &str) -> MediaPlaylist {
    let mut playlist = MediaPlaylist::default();
    let mut duration = None;
    let mut expect_segment = false;

    for line in text.lines() {
        if line.starts_with(SEGMENT_MARKER) {
            duration = parse_duration(line);

            if let Some(duration) = duration {
                playlist.total_duration += duration;
            }

            expect_segment = true;
        } else if line.starts_with(KEY_MARKER) {
            playlist.key_uri = parse_key_uri(line);
        } else if !line.starts_with('#') && !line.is_empty() && expect_segment {
            playlist.segments.push(Segment {
                uri: line.to_owned(),
                duration: duration.take(),
            });
            expect_segment = false;
        }
    }

    playlist
}

/// `#EXTINF:<duration>,...` - the substring after the last `:`, trimmed of
/// stray punctuation.
fn parse_duration(line: &str) -> Option<f64> {
    let raw = line.rsplit(':').next()?.trim_matches([':', ' ', '!', ',', '.', '?']);

    match raw.parse::<f64>() {
        Ok(duration) => Some(duration),
        Err(_) => {
            warn!("unparsable segment duration in {:?}", line);
            None
        }
    }
}

/// `URI="..."` attribute of a `#EXT-X-KEY` line, empty when absent.
fn parse_key_uri(line: &str) -> String {
    for attr in line.split(',') {
        if let Some(value) = attr.trim().strip_prefix("URI=\"") {
            return value.trim_end_matches('"').to_owned();
        }
    }

    String::new()
}
