use crate::platform::PlatformProfile;

/// An external executable that must be available before downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequirement {
    /// Executable name as looked up on the search path.
    pub name: String,
    /// Arguments that make the tool print its version and exit 0.
    pub probe_args: Vec<String>,
    pub required: bool,
    pub recipe: InstallRecipe,
}

/// How a missing tool can be acquired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallRecipe {
    /// Installed through the Python package manager.
    PythonPackage { package: String },
    /// A zip archive with prebuilt executables, only usable on Windows. Other
    /// platforms get the matching hints instead.
    Archive {
        url: String,
        executables: Vec<String>,
        mac_hints: Vec<String>,
        linux_hints: Vec<String>,
    },
}

impl InstallRecipe {
    /// Package manager guidance for platforms without an automated path.
    pub fn manual_hints(&self, platform: PlatformProfile) -> &[String] {
        match (self, platform) {
            (InstallRecipe::Archive { mac_hints, .. }, PlatformProfile::MacLike) => mac_hints,
            (InstallRecipe::Archive { linux_hints, .. }, PlatformProfile::LinuxLike) => {
                linux_hints
            }
            _ => &[],
        }
    }
}

impl ToolRequirement {
    pub fn probe_args(&self) -> impl Iterator<Item = &str> {
        self.probe_args.iter().map(String::as_str)
    }
}
