use std::{
    future::Future,
    path::{Path, PathBuf},
};

use crate::{
    config::Config,
    env::EnvContext,
    operator::Operator,
    ytdlp::{self, DownloadRequest, Quality},
};

/// Run `work` until it finishes or `interrupt` fires, whichever comes first.
/// `None` means the operator interrupted the session.
pub async fn session<T>(
    operator: &dyn Operator,
    work: impl Future<Output = T>,
    interrupt: impl Future,
) -> Option<T> {
    tokio::select! {
        done = work => Some(done),
        _ = interrupt => {
            info!("session interrupted");
            operator.show_message("\n\nProgram terminated by user.");
            None
        }
    }
}

/// Prompt for downloads until the operator is done or input closes.
pub async fn start(operator: &dyn Operator, env: &dyn EnvContext, config: &Config) {
    while let Some(request) = ask_request(operator, config).await {
        download(operator, env, config, request).await;

        if !operator
            .ask_yes_no("\nDo you want to download another?")
            .await
        {
            break;
        }
    }

    operator.show_message("\nThank you for using YouTube Downloader!");
}

/// Collect URL, format, quality and destination. `None` when input closes.
pub async fn ask_request(operator: &dyn Operator, config: &Config) -> Option<DownloadRequest> {
    let url = loop {
        let url = operator.ask_line("\nEnter YouTube URL: ").await?;
        if !url.is_empty() {
            break url;
        }
    };

    operator.show_message("\nChoose download format:");
    operator.show_message("1. MP4 (Video)");
    operator.show_message("2. MP3 (Audio only)");
    let audio_only = operator.ask_line("Enter your choice (1 or 2): ").await? == "2";

    let mut quality = Quality::Best;
    if !audio_only {
        operator.show_message("\nChoose video quality:");
        operator.show_message("1. Highest available quality");
        operator.show_message("2. Medium quality (720p - faster download)");
        if operator.ask_line("Enter your choice (1 or 2): ").await? == "2" {
            quality = Quality::Medium;
        }
    }

    operator.show_message(&format!(
        "\nDefault download location: {}",
        config.download_dir.display()
    ));
    let custom = operator
        .ask_line("Press Enter to use default location or type a custom path: ")
        .await?;
    let output_dir = if custom.is_empty() {
        config.download_dir.clone()
    } else {
        PathBuf::from(custom)
    };

    Some(DownloadRequest {
        url,
        output_dir,
        audio_only,
        quality,
    })
}

/// Create `requested` if needed; fall back to `default` when that fails.
pub fn prepare_output_dir(operator: &dyn Operator, requested: &Path, default: &Path) -> PathBuf {
    if requested.is_dir() {
        return requested.to_path_buf();
    }

    match std::fs::create_dir_all(requested) {
        Ok(()) => requested.to_path_buf(),
        Err(e) => {
            warn!("could not create {}: {}", requested.display(), e);
            operator.show_message(&format!("Error creating directory: {}", e));
            operator.show_message("Using default downloads folder instead.");
            default.to_path_buf()
        }
    }
}

/// Run one download; reports the outcome to the operator.
pub async fn download(
    operator: &dyn Operator,
    env: &dyn EnvContext,
    config: &Config,
    mut request: DownloadRequest,
) -> bool {
    request.output_dir = prepare_output_dir(operator, &request.output_dir, &config.download_dir);

    operator.show_message("\nStarting download...");
    operator.show_message(
        "This may take a few moments depending on the video size and your internet speed.",
    );
    operator.show_message("Download progress will be shown below:\n");

    match ytdlp::download(&request, &env.search_path()).await {
        Ok(()) => {
            info!("downloaded {} to {}", request.url, request.output_dir.display());
            operator.show_message("\n✓ Download completed successfully!");
            operator.show_message(&format!(
                "Your file has been saved to: {}",
                request.output_dir.display()
            ));
            true
        }
        Err(e) => {
            error!("download of {} failed: {}", request.url, e);
            operator.show_message(&format!("\nError during download: {}", e));
            false
        }
    }
}
