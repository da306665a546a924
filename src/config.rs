use std::path::PathBuf;

use crate::{ffmpeg, platform::PlatformProfile};

/// Everything the provisioning and download steps can be pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Zip with the Windows FFmpeg build.
    pub ffmpeg_archive_url: String,
    /// Where the FFmpeg executables are copied to.
    pub install_dir: PathBuf,
    /// Interpreter used for `-m pip install`.
    pub python: String,
    pub download_dir: PathBuf,
    /// Parent for scratch directories; the system temp dir when unset.
    pub temp_root: Option<PathBuf>,
}

impl Config {
    pub fn for_platform(platform: PlatformProfile) -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            ffmpeg_archive_url: ffmpeg::ARCHIVE_URL.to_string(),
            install_dir: home.join("ffmpeg"),
            python: match platform {
                PlatformProfile::WindowsLike => "python",
                _ => "python3",
            }
            .to_string(),
            download_dir: home.join("Downloads"),
            temp_root: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_platform(PlatformProfile::current())
    }
}
