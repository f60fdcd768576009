use anyhow::{Context, Result, bail};
use clap::Parser;
use kdam::{Bar, BarExt, term, term::Colorizer, tqdm};
use log::{LevelFilter, info, warn};
use reqwest::blocking::Client;
use std::{
    fs,
    io::{IsTerminal, stderr},
    process,
    sync::Arc,
    thread,
    time::Duration,
};
use vdl::{Args, InfoExtractor, JobStatus, JobTracker, Logger, UrlExtractor, downloader};

fn run() -> Result<()> {
    let args = Args::parse();

    term::init(stderr().is_terminal());
    Logger::install(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    })?;

    // The output directory is the one piece of required configuration; a
    // missing or unusable path is fatal before any job starts.
    fs::create_dir_all(&args.directory)
        .with_context(|| format!("could not create {}", args.directory.display()))?;
    fs::read_dir(&args.directory)
        .with_context(|| format!("could not read {}", args.directory.display()))?;

    let client = Client::builder()
        .user_agent(&args.user_agent)
        .build()
        .context("could not build http client")?;

    let tracker = Arc::new(JobTracker::new());
    let extractor: Arc<dyn InfoExtractor> = Arc::new(UrlExtractor);

    let mut jobs = vec![];

    for url in &args.urls {
        let mut job = downloader::submit(
            client.clone(),
            tracker.clone(),
            extractor.clone(),
            url.clone(),
            args.directory.clone(),
        );

        match job.recv_title() {
            Ok(title) => info!("downloading {}", title.colorize("bold")),
            Err(e) => warn!("{} ({})", e, url),
        }

        jobs.push(job);
    }

    render_progress(&tracker, &jobs)?;

    for job in jobs {
        job.join();
    }

    let failed = tracker
        .list()
        .into_iter()
        .filter(|snapshot| snapshot.status == JobStatus::Failed)
        .count();

    if failed > 0 {
        bail!("{} job(s) failed.", failed);
    }

    Ok(())
}

fn render_progress(tracker: &JobTracker, jobs: &[downloader::SubmittedJob]) -> Result<()> {
    let mut pb: Bar = tqdm!(
        total = 0,
        unit = " seg".to_owned(),
        desc = "downloading".to_owned(),
        dynamic_ncols = true
    );

    while !jobs.iter().all(|job| job.is_finished()) {
        let snapshots = tracker.list();
        let total = snapshots.iter().map(|s| s.total_count).sum();
        let done = snapshots
            .iter()
            .map(|s| match s.status {
                JobStatus::Starting => 0,
                JobStatus::Completed => s.total_count,
                JobStatus::Running | JobStatus::Failed => s.current_index + 1,
            })
            .sum();

        pb.total = total;
        pb.update_to(done)?;
        thread::sleep(Duration::from_millis(500));
    }

    pb.update_to(pb.total)?;
    eprintln!();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".colorize("bold red"), e);
        process::exit(1);
    }
}
