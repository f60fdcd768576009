use crate::downloader::fetch;
use anyhow::Result;
use log::debug;
use regex::Regex;
use reqwest::blocking::Client;

const MASTER_MARKER: &str = "#EXT-X-STREAM-INF";

/// A media playlist ready for parsing. When `is_redirect` is false the caller
/// must rebase relative references with [`path_prefix`] of the entry url
/// instead of `base_url`.
pub struct ResolvedPlaylist {
    pub text: String,
    pub base_url: String,
    pub is_redirect: bool,
}

/// Earliest `scheme://sub.domain.tld` match in `url`, falling back to
/// `scheme://domain.tld`. Returns an empty string when neither pattern
/// matches; the concatenated urls built from it will fail downstream.
pub fn base_url_of(url: &str) -> String {
    let re = Regex::new(r"https?://\w+\.\w+\.\w+").unwrap();

    if let Some(m) = re.find(url) {
        return m.as_str().to_owned();
    }

    let re = Regex::new(r"https?://\w+\.\w+").unwrap();
    re.find(url).map(|m| m.as_str().to_owned()).unwrap_or_default()
}

/// The url truncated just past its final `/`.
pub fn path_prefix(url: &str) -> String {
    match url.rfind('/') {
        Some(i) => url[..=i].to_owned(),
        None => url.to_owned(),
    }
}

/// Line following the master-stream marker, rebased against `base_url`.
fn master_redirect(text: &str, base_url: &str) -> (Option<String>, bool) {
    let mut is_redirect = false;

    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        if line.starts_with(MASTER_MARKER) {
            is_redirect = true;
            return (lines.next().map(|uri| format!("{base_url}{uri}")), is_redirect);
        }
    }

    (None, is_redirect)
}

/// Fetches the entry playlist and, when it is a master playlist, follows one
/// redirect hop to the true media playlist. Network failures are fatal to the
/// job; there are no retries.
pub fn resolve(client: &Client, url: &str) -> Result<ResolvedPlaylist> {
    let text = fetch::text(client, url)?;
    let base_url = base_url_of(url);

    let (media_url, is_redirect) = master_redirect(&text, &base_url);

    let text = match media_url {
        Some(media_url) => {
            debug!("following master playlist to {}", media_url);
            fetch::text(client, &media_url)?
        }
        None => text,
    };

    Ok(ResolvedPlaylist {
        text,
        base_url,
        is_redirect,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_prefers_three_label_hosts() {
        assert_eq!(
            base_url_of("https://cdn.example.com/hls/video.m3u8"),
            "https://cdn.example.com"
        );
    }

    #[test]
    fn base_url_falls_back_to_two_label_hosts() {
        assert_eq!(
            base_url_of("http://example.com/hls/video.m3u8"),
            "http://example.com"
        );
    }

    #[test]
    fn base_url_of_unrecognized_input_is_empty() {
        assert_eq!(base_url_of("not a url"), "");
    }

    #[test]
    fn path_prefix_keeps_trailing_slash() {
        assert_eq!(
            path_prefix("http://example.com/hls/video.m3u8"),
            "http://example.com/hls/"
        );
    }

    #[test]
    fn master_marker_redirects_to_next_line() {
        let text = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1280000\n/hls/index.m3u8\n";
        let (media_url, is_redirect) = master_redirect(text, "http://example.com");
        assert_eq!(media_url.as_deref(), Some("http://example.com/hls/index.m3u8"));
        assert!(is_redirect);
    }

    #[test]
    fn media_playlist_is_not_a_redirect() {
        let text = "#EXTM3U\n#EXTINF:10.0,\nseg0.ts\n";
        let (media_url, is_redirect) = master_redirect(text, "http://example.com");
        assert!(media_url.is_none());
        assert!(!is_redirect);
    }
}
