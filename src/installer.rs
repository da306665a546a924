use std::path::{Path, PathBuf};

use crate::{
    archive::{self, ArchiveError},
    config::Config,
    env::{EnvContext, EnvError},
    operator::Operator,
    platform::PlatformProfile,
    tool::{InstallRecipe, ToolRequirement},
    util::{DownloadError, HttpClient},
};

/// What an installation attempt achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The tool was installed. Carries the directory it was placed in when
    /// the installer chose it.
    Installed(Option<PathBuf>),
    /// No automated path; the operator was told what to run.
    ManualInstructionsShown,
    Failed(String),
}

#[derive(thiserror::Error, Debug)]
pub enum InstallError {
    #[error("download failed: {0}")]
    DownloadError(#[from] DownloadError),
    #[error("could not extract archive: {0}")]
    ArchiveError(#[from] ArchiveError),
    #[error("could not find a directory containing {0} in the extracted files")]
    LayoutNotFound(String),
    #[error("could not update search path: {0}")]
    EnvError(#[from] EnvError),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("{0} exited with {1}")]
    CommandFailed(String, std::process::ExitStatus),
    #[error("{0} has no installer for this recipe")]
    WrongRecipe(String),
}

/// Everything an installer may touch.
pub struct InstallContext<'a> {
    pub operator: &'a dyn Operator,
    pub env: &'a mut dyn EnvContext,
    pub client: &'a HttpClient,
    pub config: &'a Config,
    /// A non-working copy is already on the search path; the new one has to
    /// come before it.
    pub replaces_broken: bool,
}

#[async_trait::async_trait]
pub trait Installer: Send + Sync {
    /// Never fails outright: errors end up in `InstallOutcome::Failed`.
    async fn install(&self, tool: &ToolRequirement, ctx: &mut InstallContext<'_>)
        -> InstallOutcome;
}

/// Downloads a zip, extracts the executables, and puts them on the path.
pub struct ArchiveInstaller;

/// Prints package-manager commands for the operator to run.
pub struct ManualInstaller {
    pub platform: PlatformProfile,
}

/// `python -m pip install <package>`.
pub struct PackageInstaller;

static ARCHIVE: ArchiveInstaller = ArchiveInstaller;
static PACKAGE: PackageInstaller = PackageInstaller;
static MANUAL_MAC: ManualInstaller = ManualInstaller {
    platform: PlatformProfile::MacLike,
};
static MANUAL_LINUX: ManualInstaller = ManualInstaller {
    platform: PlatformProfile::LinuxLike,
};

/// The one place where recipe and platform decide the strategy.
pub fn installer_for(recipe: &InstallRecipe, platform: PlatformProfile) -> &'static dyn Installer {
    match (recipe, platform) {
        (InstallRecipe::PythonPackage { .. }, _) => &PACKAGE,
        (InstallRecipe::Archive { .. }, PlatformProfile::WindowsLike) => &ARCHIVE,
        (InstallRecipe::Archive { .. }, PlatformProfile::MacLike) => &MANUAL_MAC,
        (InstallRecipe::Archive { .. }, PlatformProfile::LinuxLike) => &MANUAL_LINUX,
    }
}

fn failed(ctx: &InstallContext<'_>, tool: &ToolRequirement, e: InstallError) -> InstallOutcome {
    error!("installing {} failed: {}", tool.name, e);
    ctx.operator
        .show_message(&format!("Error installing {}: {}", tool.name, e));
    InstallOutcome::Failed(e.to_string())
}

#[async_trait::async_trait]
impl Installer for ArchiveInstaller {
    async fn install(
        &self,
        tool: &ToolRequirement,
        ctx: &mut InstallContext<'_>,
    ) -> InstallOutcome {
        let (url, executables) = match &tool.recipe {
            InstallRecipe::Archive {
                url, executables, ..
            } => (url, executables),
            _ => return failed(ctx, tool, InstallError::WrongRecipe(tool.name.clone())),
        };

        match self.run(tool, url, executables, ctx).await {
            Ok(dir) => {
                self.offer_persistence(&dir, ctx).await;
                InstallOutcome::Installed(Some(dir))
            }
            Err(e) => failed(ctx, tool, e),
        }
    }
}

impl ArchiveInstaller {
    /// The scratch directory lives exactly as long as this call.
    async fn run(
        &self,
        tool: &ToolRequirement,
        url: &str,
        executables: &[String],
        ctx: &mut InstallContext<'_>,
    ) -> Result<PathBuf, InstallError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ytdl-setup-");
        let scratch = match &ctx.config.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        debug!("scratch dir {}", scratch.path().display());

        let operator = ctx.operator;
        operator.show_message(&format!("\nDownloading {}...", tool.name));
        let zip_path = scratch.path().join(format!("{}.zip", tool.name));
        let fetched = ctx
            .client
            .fetch(url, &zip_path, |got, total| operator.show_progress(got, total))
            .await;
        operator.show_message("");
        fetched?;
        operator.show_message("Download complete!");

        operator.show_message(&format!("Extracting {}...", tool.name));
        let extract_root = scratch.path().join("extracted");
        archive::extract_zip(&zip_path, &extract_root)?;

        let bin_dir = archive::find_executable_dir(&extract_root, executables)?
            .ok_or_else(|| InstallError::LayoutNotFound(executables.join(", ")))?;

        let install_dir = ctx.config.install_dir.clone();
        copy_executables(&bin_dir, &install_dir, executables)?;
        operator.show_message(&format!("✓ {} installed to: {}", tool.name, install_dir.display()));

        if ctx.replaces_broken {
            ctx.env.prepend_to_search_path(&install_dir)?;
        } else {
            ctx.env.append_to_search_path(&install_dir)?;
        }
        Ok(install_dir)
    }

    async fn offer_persistence(&self, dir: &Path, ctx: &mut InstallContext<'_>) {
        let operator = ctx.operator;
        operator.show_message(
            "\nIMPORTANT: For this to work in future sessions, the directory must be on your PATH.",
        );
        operator.show_message(&format!("Add this to your PATH: {}", dir.display()));

        if !operator
            .ask_yes_no("\nWould you like me to add it to your PATH permanently?")
            .await
        {
            return;
        }

        match ctx.env.persist_search_path(dir).await {
            Ok(()) => operator.show_message(
                "✓ Added to your PATH. You may need to restart your command prompt.",
            ),
            Err(e) => {
                warn!("persisting search path failed: {}", e);
                operator.show_message(&format!("Could not add to PATH automatically: {}", e));
                operator.show_message("Please add it to your PATH manually.");
            }
        }
    }
}

fn copy_executables(from: &Path, to: &Path, executables: &[String]) -> Result<(), InstallError> {
    std::fs::create_dir_all(to)?;
    for exe in executables {
        std::fs::copy(from.join(exe), to.join(exe))?;
        debug!("copied {} to {}", exe, to.display());
    }
    Ok(())
}

#[async_trait::async_trait]
impl Installer for ManualInstaller {
    async fn install(
        &self,
        tool: &ToolRequirement,
        ctx: &mut InstallContext<'_>,
    ) -> InstallOutcome {
        ctx.operator.show_message("");
        let hints = tool.recipe.manual_hints(self.platform);
        if hints.is_empty() {
            ctx.operator.show_message(&format!(
                "Please install {} with your system's package manager.",
                tool.name
            ));
        }
        for line in hints {
            ctx.operator.show_message(line);
        }
        info!("showed manual install steps for {} on {}", tool.name, self.platform);
        InstallOutcome::ManualInstructionsShown
    }
}

#[async_trait::async_trait]
impl Installer for PackageInstaller {
    async fn install(
        &self,
        tool: &ToolRequirement,
        ctx: &mut InstallContext<'_>,
    ) -> InstallOutcome {
        let package = match &tool.recipe {
            InstallRecipe::PythonPackage { package } => package,
            _ => return failed(ctx, tool, InstallError::WrongRecipe(tool.name.clone())),
        };

        ctx.operator
            .show_message(&format!("{} is not installed. Installing now...", tool.name));

        let python = &ctx.config.python;
        let status = tokio::process::Command::new(python)
            .args(["-m", "pip", "install", package.as_str()])
            .env("PATH", ctx.env.search_path())
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(s) if s.success() => {
                ctx.operator
                    .show_message(&format!("✓ {} installed successfully!", tool.name));
                InstallOutcome::Installed(None)
            }
            Ok(s) => failed(
                ctx,
                tool,
                InstallError::CommandFailed(format!("{} -m pip", python), s),
            ),
            Err(e) => failed(ctx, tool, InstallError::IoError(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        archive::tests::build_zip,
        ffmpeg,
        testing::{FakeEnv, ScriptedOperator},
        util::tests::serve,
        ytdlp,
    };

    fn config(root: &Path) -> Config {
        let temp_root = root.join("tmp");
        std::fs::create_dir_all(&temp_root).unwrap();
        Config {
            ffmpeg_archive_url: String::new(),
            install_dir: root.join("ffmpeg"),
            python: "ytdl-setup-no-such-python".to_string(),
            download_dir: root.join("Downloads"),
            temp_root: Some(temp_root),
        }
    }

    fn scratch_is_empty(config: &Config) -> bool {
        let root = config.temp_root.as_ref().unwrap();
        std::fs::read_dir(root).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn archive_install_places_executables() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        let body = build_zip(&[
            ("ffmpeg-master-latest-win64-gpl/bin/ffmpeg.exe", b"ffmpeg"),
            ("ffmpeg-master-latest-win64-gpl/bin/ffprobe.exe", b"ffprobe"),
            ("ffmpeg-master-latest-win64-gpl/bin/ffplay.exe", b"ffplay"),
        ]);
        let url = serve(body.clone(), body.len()).await;

        let operator = ScriptedOperator::new(&["n"]);
        let mut env = FakeEnv::default();
        let client = HttpClient::new().unwrap();
        let mut ctx = InstallContext {
            operator: &operator,
            env: &mut env,
            client: &client,
            config: &config,
            replaces_broken: false,
        };

        let tool = ffmpeg::requirement(&url);
        let outcome = ARCHIVE.install(&tool, &mut ctx).await;

        assert_eq!(outcome, InstallOutcome::Installed(Some(config.install_dir.clone())));
        assert_eq!(std::fs::read(config.install_dir.join("ffmpeg.exe")).unwrap(), b"ffmpeg");
        assert_eq!(std::fs::read(config.install_dir.join("ffprobe.exe")).unwrap(), b"ffprobe");
        assert!(!config.install_dir.join("ffplay.exe").exists());
        assert!(env.contains(&config.install_dir));
        assert!(env.persisted.is_empty());
        assert!(operator.progress_calls() > 0);
        assert!(scratch_is_empty(&config));
    }

    #[tokio::test]
    async fn persistence_failure_is_guidance() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        let body = build_zip(&[("bin/ffmpeg.exe", b"a"), ("bin/ffprobe.exe", b"b")]);
        let url = serve(body.clone(), body.len()).await;

        let operator = ScriptedOperator::new(&["y"]);
        let mut env = FakeEnv {
            refuse_persist: true,
            ..FakeEnv::default()
        };
        let client = HttpClient::new().unwrap();
        let mut ctx = InstallContext {
            operator: &operator,
            env: &mut env,
            client: &client,
            config: &config,
            replaces_broken: false,
        };

        let outcome = ARCHIVE.install(&ffmpeg::requirement(&url), &mut ctx).await;

        assert!(matches!(outcome, InstallOutcome::Installed(_)));
        assert!(env.contains(&config.install_dir));
        assert!(operator.said("Please add it to your PATH manually."));
    }

    #[tokio::test]
    async fn failed_download_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        let url = serve(vec![0u8; 16], 4096).await;

        let operator = ScriptedOperator::new(&[]);
        let mut env = FakeEnv::default();
        let client = HttpClient::new().unwrap();
        let mut ctx = InstallContext {
            operator: &operator,
            env: &mut env,
            client: &client,
            config: &config,
            replaces_broken: false,
        };

        let outcome = ARCHIVE.install(&ffmpeg::requirement(&url), &mut ctx).await;

        assert!(matches!(outcome, InstallOutcome::Failed(_)));
        assert!(!config.install_dir.exists());
        assert!(!env.contains(&config.install_dir));
        assert!(scratch_is_empty(&config));
    }

    #[tokio::test]
    async fn manual_hints_without_network() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        let operator = ScriptedOperator::new(&[]);
        let mut env = FakeEnv::default();
        let client = HttpClient::new().unwrap();
        let mut ctx = InstallContext {
            operator: &operator,
            env: &mut env,
            client: &client,
            config: &config,
            replaces_broken: false,
        };

        let tool = ffmpeg::requirement("http://127.0.0.1:9/unused.zip");
        let outcome = installer_for(&tool.recipe, PlatformProfile::MacLike)
            .install(&tool, &mut ctx)
            .await;

        assert_eq!(outcome, InstallOutcome::ManualInstructionsShown);
        assert!(operator.said("2. Run this command in terminal: brew install ffmpeg"));

        let outcome = installer_for(&tool.recipe, PlatformProfile::LinuxLike)
            .install(&tool, &mut ctx)
            .await;
        assert_eq!(outcome, InstallOutcome::ManualInstructionsShown);
        assert!(operator.said("Ubuntu/Debian: sudo apt-get install ffmpeg"));
        assert_eq!(operator.progress_calls(), 0);
    }

    #[tokio::test]
    async fn pip_missing_is_failure_on_every_platform() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        let operator = ScriptedOperator::new(&[]);
        let mut env = FakeEnv::default();
        let client = HttpClient::new().unwrap();
        let mut ctx = InstallContext {
            operator: &operator,
            env: &mut env,
            client: &client,
            config: &config,
            replaces_broken: false,
        };

        let tool = ytdlp::requirement();
        for platform in [
            PlatformProfile::WindowsLike,
            PlatformProfile::MacLike,
            PlatformProfile::LinuxLike,
        ] {
            let outcome = installer_for(&tool.recipe, platform)
                .install(&tool, &mut ctx)
                .await;
            assert!(matches!(outcome, InstallOutcome::Failed(_)), "{:?}", outcome);
        }
    }
}
