pub mod encryption;
pub mod fetch;

use crate::{
    extract::{InfoExtractor, VideoInfo},
    hls,
    merger::Assembler,
    tracker::{JobId, JobTracker, TitlePromise, TitleSender, title_rendezvous},
    utils,
};
use anyhow::{Context, Result};
use encryption::Decrypter;
use log::{error, info};
use reqwest::blocking::Client;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

/// Handle returned by [`submit`]. The download runs on its own worker thread;
/// the handle carries the job id and the one-shot title promise.
pub struct SubmittedJob {
    pub id: JobId,
    title: Option<TitlePromise>,
    handle: thread::JoinHandle<()>,
}

impl SubmittedJob {
    /// Blocks until the worker has resolved the job's title. This is the
    /// submission surface's response point; the download keeps running in the
    /// background afterwards.
    pub fn recv_title(&mut self) -> Result<String> {
        self.title
            .take()
            .context("title was already received for this job.")?
            .wait()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker to finish. Worker errors are reported through the
    /// tracker, not here.
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

/// Starts one worker thread for `url`. Jobs run concurrently with each other;
/// within a job every fetch is strictly sequential. A worker failure is
/// logged, published as a `Failed` status, and never affects other jobs.
pub fn submit(
    client: Client,
    tracker: Arc<JobTracker>,
    extractor: Arc<dyn InfoExtractor>,
    url: String,
    directory: PathBuf,
) -> SubmittedJob {
    let id = tracker.next_id();
    let (title_tx, title_rx) = title_rendezvous();

    let handle = thread::spawn(move || {
        match run_job(&client, &tracker, extractor.as_ref(), id, &url, &directory, title_tx) {
            Ok(()) => tracker.publish_completed(id),
            Err(e) => {
                error!("job {} ({}) failed: {:#}", id, url, e);
                tracker.publish_failed(id, &url, &format!("{:#}", e));
            }
        }
    });

    SubmittedJob {
        id,
        title: Some(title_rx),
        handle,
    }
}

#[allow(clippy::too_many_arguments)]
fn run_job(
    client: &Client,
    tracker: &JobTracker,
    extractor: &dyn InfoExtractor,
    id: JobId,
    url: &str,
    directory: &Path,
    title_tx: TitleSender,
) -> Result<()> {
    let info = extractor.extract(client, url)?;
    title_tx.send(&info.title);

    let path = directory.join(format!("{}.mp4", utils::sanitize_filename(&info.title)));

    if info.media_url.to_ascii_lowercase().ends_with(".m3u8") {
        download_hls(client, tracker, id, &info, &path)
    } else {
        download_direct(client, tracker, id, &info, &path)
    }
}

fn download_hls(
    client: &Client,
    tracker: &JobTracker,
    id: JobId,
    info: &VideoInfo,
    path: &Path,
) -> Result<()> {
    let resolved = hls::resolve(client, &info.media_url)?;
    let base_url = if resolved.is_redirect {
        resolved.base_url.clone()
    } else {
        // Relative references on a directly served media playlist resolve
        // against the playlist's own directory, not the host root.
        hls::path_prefix(&info.media_url)
    };

    let playlist = hls::parse_media_playlist(&resolved.text);
    info!(
        "{}: {} segments, {:.1}s total{}",
        info.title,
        playlist.segments.len(),
        playlist.total_duration,
        if playlist.is_encrypted() { " (encrypted)" } else { "" },
    );

    let decrypter = if playlist.is_encrypted() {
        let key_url = format!("{}{}", base_url, playlist.key_uri);
        let key = fetch::bytes(client, &key_url).context("failed to fetch decryption key")?;
        Decrypter::new_aes_128(&key)?
    } else {
        Decrypter::None
    };

    tracker.publish_start(id, &info.title, playlist.segments.len(), !decrypter.is_none());

    let mut assembler = Assembler::new();

    for (index, segment) in playlist.segments.iter().enumerate() {
        let segment_url = format!("{}{}", base_url, segment.uri);
        let data = fetch::bytes(client, &segment_url)
            .with_context(|| format!("failed to fetch segment {}", index))?;
        let data = decrypter
            .decrypt(data)
            .with_context(|| format!("failed to decrypt segment {}", index))?;
        assembler.push(data);
        tracker.publish_progress(id, index, &segment_url);
    }

    info!(
        "{}: writing {} ({})",
        info.title,
        path.display(),
        utils::format_bytes(assembler.stored(), 2).2,
    );
    assembler.write_to(path)?;
    Ok(())
}

fn download_direct(
    client: &Client,
    tracker: &JobTracker,
    id: JobId,
    info: &VideoInfo,
    path: &Path,
) -> Result<()> {
    tracker.publish_start(id, &info.title, 1, false);

    let data = fetch::bytes(client, &info.media_url)?;
    tracker.publish_progress(id, 0, &info.media_url);

    info!(
        "{}: writing {} ({})",
        info.title,
        path.display(),
        utils::format_bytes(data.len(), 2).2,
    );
    let mut assembler = Assembler::new();
    assembler.push(data);
    assembler.write_to(path)?;
    Ok(())
}
