mod playlist;
mod resolve;

pub use playlist::{MediaPlaylist, Segment, parse_media_playlist};
pub use resolve::{ResolvedPlaylist, base_url_of, path_prefix, resolve};
