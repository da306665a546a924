use std::fmt;

/// Host classification used to pick an installation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformProfile {
    WindowsLike,
    MacLike,
    LinuxLike,
}

impl PlatformProfile {
    /// Classify the host this binary was built for.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Classify an OS name as reported by `std::env::consts::OS`. Anything
    /// that is neither Windows nor macOS is treated as a Linux-like Unix.
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => PlatformProfile::WindowsLike,
            "macos" | "ios" => PlatformProfile::MacLike,
            _ => PlatformProfile::LinuxLike,
        }
    }
}

impl fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlatformProfile::WindowsLike => "Windows",
            PlatformProfile::MacLike => "macOS",
            PlatformProfile::LinuxLike => "Linux",
        };
        f.write_str(name)
    }
}
