use anyhow::{Result, ensure};
use reqwest::blocking::Client;

/// What a job needs to know before it can start downloading: a display title
/// and the url of the media itself (an `.m3u8` playlist or a plain file).
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub title: String,
    pub media_url: String,
}

/// Seam for site-specific scrapers that turn a video page url into a
/// [`VideoInfo`]. Scrapers live outside this crate; the downloader only ever
/// sees the trait.
pub trait InfoExtractor: Send + Sync {
    fn extract(&self, client: &Client, url: &str) -> Result<VideoInfo>;
}

/// Extractor for urls that already point at a playlist or media file. The
/// title is the final path segment with its query string and extension
/// stripped.
pub struct UrlExtractor;

impl InfoExtractor for UrlExtractor {
    fn extract(&self, _client: &Client, url: &str) -> Result<VideoInfo> {
        let name = url.rsplit('/').next().unwrap_or(url);
        let name = name.split('?').next().unwrap_or(name);
        let title = match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        };
        ensure!(!title.is_empty(), "could not derive a title from {}", url);

        Ok(VideoInfo {
            title: title.to_owned(),
            media_url: url.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_from_playlist_url() {
        let info = UrlExtractor
            .extract(&Client::new(), "http://example.com/videos/episode-01.m3u8")
            .unwrap();
        assert_eq!(info.title, "episode-01");
        assert_eq!(info.media_url, "http://example.com/videos/episode-01.m3u8");
    }

    #[test]
    fn query_string_is_stripped() {
        let info = UrlExtractor
            .extract(&Client::new(), "http://example.com/video.mp4?token=abc")
            .unwrap();
        assert_eq!(info.title, "video");
    }

    #[test]
    fn bare_host_has_no_title() {
        assert!(UrlExtractor.extract(&Client::new(), "http://example.com/").is_err());
    }
}
