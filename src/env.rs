use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;

use crate::platform::PlatformProfile;

#[derive(thiserror::Error, Debug)]
pub enum EnvError {
    #[error("cannot add {} to the search path", .0.display())]
    JoinPaths(PathBuf, #[source] std::env::JoinPathsError),
    #[error("persisting the search path is not supported on {0}")]
    Unsupported(PlatformProfile),
    #[error("setx failed: {0}")]
    SetxFailed(String),
    #[error("cannot read the user Path: {0}")]
    RegQueryFailed(String),
    #[error("the user Path would be {0} characters long, setx stores at most {}", SETX_LIMIT)]
    TooLong(usize),
    #[error("I/O error")]
    IoError(#[from] std::io::Error),
}

/// The search path seen by every tool this program launches, plus a way to
/// make additions survive the current session.
#[async_trait::async_trait]
pub trait EnvContext: Send + Sync {
    fn search_path(&self) -> OsString;

    /// Append `dir` for the rest of this process. Appending a directory that
    /// is already present is a no-op.
    fn append_to_search_path(&mut self, dir: &Path) -> Result<(), EnvError>;

    /// Put `dir` ahead of every other entry, so it wins over a copy of the
    /// same tool found further along.
    fn prepend_to_search_path(&mut self, dir: &Path) -> Result<(), EnvError>;

    /// Record `dir` in the user's permanent environment.
    async fn persist_search_path(&mut self, dir: &Path) -> Result<(), EnvError>;
}

/// Appends `dir` to a PATH-style value, skipping duplicates. Empty entries
/// are dropped so the current directory never ends up on the path.
pub fn appended_path(current: &OsString, dir: &Path) -> Result<OsString, EnvError> {
    let mut entries = std::env::split_paths(current)
        .filter(|p| !p.as_os_str().is_empty())
        .collect::<Vec<_>>();
    if entries.iter().any(|p| p == dir) {
        return Ok(current.clone());
    }
    entries.push(dir.to_path_buf());
    std::env::join_paths(entries).map_err(|e| EnvError::JoinPaths(dir.to_path_buf(), e))
}

/// Moves `dir` to the front of a PATH-style value.
pub fn prepended_path(current: &OsString, dir: &Path) -> Result<OsString, EnvError> {
    let entries = std::iter::once(dir.to_path_buf()).chain(
        std::env::split_paths(current).filter(|p| !p.as_os_str().is_empty() && p != dir),
    );
    std::env::join_paths(entries).map_err(|e| EnvError::JoinPaths(dir.to_path_buf(), e))
}

/// setx truncates anything longer.
pub const SETX_LIMIT: usize = 1024;

/// Pulls the value out of `reg query HKCU\Environment /v Path` output.
pub fn parse_reg_query(output: &str) -> Option<String> {
    static LINE: OnceLock<Regex> = OnceLock::new();
    let line = LINE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*Path[ \t]+REG_\w+[ \t]*(.*?)\s*$").expect("static regex")
    });
    line.captures(output).map(|c| c[1].to_string())
}

/// The user Path with `dir` added at the end. Only the user's own entries
/// are kept; the machine-wide part of PATH is not copied in.
pub fn user_path_with(current: Option<&str>, dir: &Path) -> Result<String, EnvError> {
    let dir = dir.to_string_lossy();
    let norm = |s: &str| s.trim().trim_end_matches('\\').to_ascii_lowercase();

    let mut entries = current
        .unwrap_or_default()
        .split(';')
        .filter(|e| !e.trim().is_empty())
        .collect::<Vec<_>>();
    let wanted = norm(dir.as_ref());
    if !entries.iter().any(|e| norm(*e) == wanted) {
        entries.push(dir.as_ref());
    }

    let value = entries.join(";");
    if value.chars().count() > SETX_LIMIT {
        return Err(EnvError::TooLong(value.chars().count()));
    }
    Ok(value)
}

fn command_error(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        output.status.to_string()
    } else {
        stderr
    }
}

/// Search path seeded from the process environment at startup. Children are
/// launched with this value instead of mutating the global environment.
pub struct ProcessEnv {
    platform: PlatformProfile,
    search_path: OsString,
}

impl ProcessEnv {
    pub fn new(platform: PlatformProfile) -> Self {
        Self {
            platform,
            search_path: std::env::var_os("PATH").unwrap_or_default(),
        }
    }

    /// The `Path` stored for the current user, `None` if it was never set.
    async fn user_path(&self) -> Result<Option<String>, EnvError> {
        let output = tokio::process::Command::new("reg")
            .args(["query", r"HKCU\Environment", "/v", "Path"])
            .env("PATH", &self.search_path)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.to_ascii_lowercase().contains("unable to find") {
                return Ok(None);
            }
            return Err(EnvError::RegQueryFailed(command_error(&output)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_reg_query(&stdout) {
            Some(value) => Ok(Some(value)),
            None => Err(EnvError::RegQueryFailed(format!(
                "unexpected output: {}",
                stdout.trim()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl EnvContext for ProcessEnv {
    fn search_path(&self) -> OsString {
        self.search_path.clone()
    }

    fn append_to_search_path(&mut self, dir: &Path) -> Result<(), EnvError> {
        self.search_path = appended_path(&self.search_path, dir)?;
        info!("search path now includes {}", dir.display());
        Ok(())
    }

    fn prepend_to_search_path(&mut self, dir: &Path) -> Result<(), EnvError> {
        self.search_path = prepended_path(&self.search_path, dir)?;
        info!("search path now starts with {}", dir.display());
        Ok(())
    }

    async fn persist_search_path(&mut self, dir: &Path) -> Result<(), EnvError> {
        if self.platform != PlatformProfile::WindowsLike {
            return Err(EnvError::Unsupported(self.platform));
        }

        let current = self.user_path().await?;
        let value = user_path_with(current.as_deref(), dir)?;
        let output = tokio::process::Command::new("setx")
            .arg("Path")
            .arg(&value)
            .env("PATH", &self.search_path)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(EnvError::SetxFailed(command_error(&output)));
        }

        Ok(())
    }
}
