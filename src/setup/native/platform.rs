//! Host platform families that change the CMake invocation.

use std::fmt;

/// Operating system family of the build host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Platform {
    /// Linux, single-configuration Makefile/Ninja generators.
    Linux,
    /// macOS; pins a minimum deployment target.
    Darwin,
    /// Windows, multi-configuration Visual Studio generator.
    Windows,
    /// Any other Unix-like system, treated like Linux.
    Other(String),
}

impl Platform {
    /// Detects the platform the tool is running on.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Maps an `std::env::consts::OS` value to a platform family.
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Self::Linux,
            "macos" | "darwin" => Self::Darwin,
            "windows" => Self::Windows,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the platform uses the multi-configuration Windows generator.
    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => f.write_str("Linux"),
            Self::Darwin => f.write_str("Darwin"),
            Self::Windows => f.write_str("Windows"),
            Self::Other(os) => f.write_str(os),
        }
    }
}
