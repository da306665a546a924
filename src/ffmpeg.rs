use crate::tool::{InstallRecipe, ToolRequirement};

pub const ARCHIVE_URL: &str =
    "https://github.com/BtbN/FFmpeg-Builds/releases/download/latest/ffmpeg-master-latest-win64-gpl.zip";

/// Executables copied out of the Windows build archive.
pub const WINDOWS_EXECUTABLES: [&str; 2] = ["ffmpeg.exe", "ffprobe.exe"];

/// FFmpeg is needed to merge formats and to extract audio.
pub fn requirement(archive_url: &str) -> ToolRequirement {
    ToolRequirement {
        name: "ffmpeg".to_string(),
        probe_args: vec!["-version".to_string()],
        required: true,
        recipe: InstallRecipe::Archive {
            url: archive_url.to_string(),
            executables: WINDOWS_EXECUTABLES.iter().map(|s| s.to_string()).collect(),
            mac_hints: vec![
                "On macOS, it's recommended to install FFmpeg via Homebrew:".to_string(),
                "1. Install Homebrew from https://brew.sh/ if you don't have it".to_string(),
                "2. Run this command in terminal: brew install ffmpeg".to_string(),
            ],
            linux_hints: vec![
                "On Linux, install FFmpeg using your package manager, for example:".to_string(),
                "Ubuntu/Debian: sudo apt-get install ffmpeg".to_string(),
                "Fedora: sudo dnf install ffmpeg".to_string(),
                "Arch Linux: sudo pacman -S ffmpeg".to_string(),
            ],
        },
    }
}
