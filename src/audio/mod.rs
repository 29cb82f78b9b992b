//! Audio download utilities.

mod downloader;

pub use downloader::download_audio;
