use std::{ffi::OsStr, io, process::Stdio, sync::OnceLock};

use regex::Regex;
use tokio::process::Command;

use crate::tool::ToolRequirement;

/// Result of checking whether a tool is installed and responsive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Present { version: String },
    /// The executable is not on the search path.
    Absent,
    /// The executable exists but could not be launched or exited non-zero.
    Broken { reason: String },
}

impl ProbeStatus {
    pub fn is_present(&self) -> bool {
        matches!(self, ProbeStatus::Present { .. })
    }
}

#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, tool: &ToolRequirement, search_path: &OsStr) -> ProbeStatus;
}

/// Probes by actually running the tool.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandProbe;

#[async_trait::async_trait]
impl Prober for CommandProbe {
    async fn probe(&self, tool: &ToolRequirement, search_path: &OsStr) -> ProbeStatus {
        let args = tool.probe_args().collect::<Vec<_>>();
        probe(&tool.name, &args, search_path).await
    }
}

/// Run `name args..` with `search_path` as its PATH. Output is captured and
/// never reaches the terminal.
pub async fn probe(name: &str, args: &[&str], search_path: &OsStr) -> ProbeStatus {
    let output = Command::new(name)
        .args(args)
        .env("PATH", search_path)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;

    let status = match output {
        Err(e) if e.kind() == io::ErrorKind::NotFound => ProbeStatus::Absent,
        Err(e) => ProbeStatus::Broken {
            reason: e.to_string(),
        },
        Ok(out) if !out.status.success() => ProbeStatus::Broken {
            reason: format!("{} {}", name, out.status),
        },
        Ok(out) => ProbeStatus::Present {
            version: parse_version(&String::from_utf8_lossy(&out.stdout)),
        },
    };

    debug!("probe {}: {:?}", name, status);
    status
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)+").expect("static regex"))
}

/// Pull a version out of `--version` output. Falls back to the first line for
/// builds that report a git revision instead of a number.
pub fn parse_version(output: &str) -> String {
    if let Some(m) = version_regex().find(output) {
        return m.as_str().to_string();
    }

    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_from_output() {
        assert_eq!(parse_version("2024.08.06\n"), "2024.08.06");
        assert_eq!(
            parse_version("ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023"),
            "6.1.1"
        );
        assert_eq!(
            parse_version("\nffmpeg version N-113286-gabcdef\nbuilt with gcc"),
            "ffmpeg version N-113286-gabcdef"
        );
        assert_eq!(parse_version(""), "unknown");
    }

    #[tokio::test]
    async fn missing_executable_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let status = probe(
            "ytdl-setup-no-such-tool",
            &["--version"],
            dir.path().as_os_str(),
        )
        .await;
        assert_eq!(status, ProbeStatus::Absent);
        assert!(!status.is_present());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn responsive_tool_is_present() {
        let path = std::env::var_os("PATH").unwrap_or_default();
        let status = probe("sh", &["-c", "echo 2024.08.06"], &path).await;
        assert_eq!(
            status,
            ProbeStatus::Present {
                version: "2024.08.06".to_string()
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_is_broken() {
        let path = std::env::var_os("PATH").unwrap_or_default();
        let status = probe("sh", &["-c", "exit 3"], &path).await;
        assert!(matches!(status, ProbeStatus::Broken { .. }), "{:?}", status);
    }
}
