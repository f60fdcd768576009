use clap::Parser;
use std::path::PathBuf;

/// Download videos served over HTTP, either as single files or as HLS
/// (.m3u8) playlists.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Args {
    /// Playlist or media urls; one download job is started per url.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Directory where finished downloads are written.
    #[arg(short, long)]
    pub directory: PathBuf,

    /// Update and set user agent header for requests.
    #[arg(
        long,
        help_heading = "Client Options",
        default_value = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36"
    )]
    pub user_agent: String,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}
