use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use log::{error, warn};
use ytdl_setup::{
    config::Config,
    env::ProcessEnv,
    ffmpeg,
    operator::{Operator, TerminalOperator},
    platform::PlatformProfile,
    probe::CommandProbe,
    provision::Provisioner,
    util,
    worker,
    ytdlp::{self, DownloadRequest, Quality},
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Download this URL once instead of prompting
    url: Option<String>,

    /// Extract MP3 audio instead of MP4 video
    #[arg(long)]
    audio: bool,

    /// Video quality: best or medium (720p)
    #[arg(long, default_value = "best")]
    quality: Quality,

    /// Download directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// FFmpeg build archive used on Windows
    #[arg(long)]
    ffmpeg_url: Option<String>,

    /// Where FFmpeg gets installed on Windows
    #[arg(long)]
    install_dir: Option<PathBuf>,

    /// Python interpreter used to install yt-dlp
    #[arg(long)]
    python: Option<String>,
}

impl Cli {
    fn config(&self, platform: PlatformProfile) -> Config {
        let mut config = Config::for_platform(platform);
        if let Some(url) = &self.ffmpeg_url {
            config.ffmpeg_archive_url = url.clone();
        }
        if let Some(dir) = &self.install_dir {
            config.install_dir = dir.clone();
        }
        if let Some(python) = &self.python {
            config.python = python.clone();
        }
        if let Some(dir) = &self.output {
            config.download_dir = dir.clone();
        }
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let operator = TerminalOperator::new();

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    worker::session(&operator, run(cli, &operator), interrupt)
        .await
        .unwrap_or_else(|| ExitCode::from(130))
}

async fn run(cli: Cli, operator: &TerminalOperator) -> ExitCode {
    let platform = PlatformProfile::current();
    let config = cli.config(platform);

    let client = match util::HttpClient::new() {
        Ok(client) => client,
        Err(e) => {
            error!("could not create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut env = ProcessEnv::new(platform);

    operator.show_message("\n===== YOUTUBE DOWNLOADER WITH FFMPEG SETUP =====");

    let requirements = [
        ytdlp::requirement(),
        ffmpeg::requirement(&config.ffmpeg_archive_url),
    ];
    let ready = Provisioner {
        platform,
        prober: &CommandProbe,
        operator,
        env: &mut env,
        client: &client,
        config: &config,
    }
    .ensure_ready(&requirements)
    .await;

    if !ready {
        operator.show_message("\nRequired tools are missing. yt-dlp can be installed with:");
        operator.show_message("pip install yt-dlp");
        operator.show_message("Install anything else listed above, then run this program again.");
        return ExitCode::FAILURE;
    }

    match cli.url {
        Some(url) => {
            let request = DownloadRequest {
                url,
                output_dir: config.download_dir.clone(),
                audio_only: cli.audio,
                quality: cli.quality,
            };
            if worker::download(operator, &env, &config, request).await {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        None => {
            worker::start(operator, &env, &config).await;
            ExitCode::SUCCESS
        }
    }
}
