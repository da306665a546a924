use std::{
    ffi::{OsStr, OsString},
    path::PathBuf,
    str::FromStr,
};

use crate::tool::{InstallRecipe, ToolRequirement};

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

#[derive(thiserror::Error, Debug)]
pub enum YtDlpError {
    #[error("could not start yt-dlp: {0}")]
    IoError(#[from] std::io::Error),
    #[error("yt-dlp {0}")]
    Failed(std::process::ExitStatus),
}

pub fn requirement() -> ToolRequirement {
    ToolRequirement {
        name: "yt-dlp".to_string(),
        probe_args: vec!["--version".to_string()],
        required: true,
        recipe: InstallRecipe::PythonPackage {
            package: "yt-dlp".to_string(),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Best,
    /// 720p or below.
    Medium,
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best" => Ok(Quality::Best),
            "medium" | "720p" => Ok(Quality::Medium),
            other => Err(format!("unknown quality {:?}, expected best or medium", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub output_dir: PathBuf,
    /// Extract MP3 audio instead of downloading MP4 video.
    pub audio_only: bool,
    pub quality: Quality,
}

impl DownloadRequest {
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if self.audio_only {
            for a in ["-f", "bestaudio", "-x", "--audio-format", "mp3", "--audio-quality", "0"] {
                args.push(a.into());
            }
        } else {
            let format = match self.quality {
                Quality::Best => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
                Quality::Medium => {
                    "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720][ext=mp4]/best"
                }
            };
            args.push("-f".into());
            args.push(format.into());
        }

        args.push("-o".into());
        args.push(self.output_dir.join(OUTPUT_TEMPLATE).into_os_string());
        args.push(self.url.as_str().into());
        args
    }
}

/// Run yt-dlp in the foreground so its own progress output is visible.
pub async fn download(request: &DownloadRequest, search_path: &OsStr) -> Result<(), YtDlpError> {
    let args = request.args();
    debug!("yt-dlp {:?}", args);

    let status = tokio::process::Command::new("yt-dlp")
        .args(&args)
        .env("PATH", search_path)
        .kill_on_drop(true)
        .spawn()?
        .wait()
        .await?;

    if status.success() {
        Ok(())
    } else {
        Err(YtDlpError::Failed(status))
    }
}
