mod args;
mod logger;

pub mod downloader;
pub mod extract;
pub mod hls;
pub mod merger;
pub mod tracker;
pub mod utils;

pub use args::Args;
pub use downloader::{SubmittedJob, submit};
pub use extract::{InfoExtractor, UrlExtractor, VideoInfo};
pub use logger::Logger;
pub use tracker::{JobStatus, JobTracker, ProgressSnapshot};

pub use reqwest;
