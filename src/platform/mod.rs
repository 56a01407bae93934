pub fn platform() -> &'static dyn PlatformOps {
    &ConcretePlatform
}

use anyhow::Result;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

mod registry;
mod shell;

pub use registry::{index_of, normalize_path_entry};
pub use shell::RcFilePersistence;
#[cfg(windows)]
pub use registry::RegistryPersistence;

pub trait PlatformOps: Sync + Send {
    fn home_dir(&self) -> Option<PathBuf>;
    fn default_install_dir(&self) -> Option<PathBuf>;
    /// File name used when a tool is not installed yet.
    fn default_executable_name(&self, tool_name: &str) -> String;
    fn make_executable(&self, path: &Path) -> Result<()>;
    fn system_dirs(&self) -> &'static [&'static str];
    fn path_list_separator(&self) -> char;
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::UNIX_PLATFORM as ConcretePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WINDOWS_PLATFORM as ConcretePlatform;

/// Extensions tried, in order, when resolving an installed executable.
pub const EXECUTABLE_EXTENSIONS: [&str; 3] = ["", ".exe", ".bat"];

/// Resolves the executable for `tool_name` inside `base_dir`. The flag says
/// whether the returned path exists.
pub fn executable_path(base_dir: &Path, tool_name: &str) -> (PathBuf, bool) {
    for ext in EXECUTABLE_EXTENSIONS {
        let candidate = base_dir.join(format!("{tool_name}{ext}"));
        if candidate.is_file() {
            return (candidate, true);
        }
    }
    (base_dir.join(platform().default_executable_name(tool_name)), false)
}

/// Lexically resolves `.` and `..` without touching the filesystem.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True only when `candidate` is a strict descendant of `parent`.
pub fn is_sub_path(parent: &Path, candidate: &Path) -> bool {
    let parent = clean_path(parent);
    let candidate = clean_path(candidate);
    candidate != parent && candidate.starts_with(&parent)
}

pub fn is_system_dir(path: &Path) -> bool {
    let lowered = clean_path(path).to_string_lossy().to_lowercase();
    platform().system_dirs().iter().any(|sys| {
        let sys = sys.to_lowercase();
        lowered == sys || lowered.starts_with(&format!("{sys}{}", std::path::MAIN_SEPARATOR))
    })
}

/// Host facts sent to the catalog and used for asset selection, in Go's
/// naming (`darwin`, `amd64`) since that is what release assets use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub os: String,
    pub arch: String,
    pub go_version: Option<String>,
}

impl HostInfo {
    pub fn detect() -> Self {
        Self {
            os: detect_os().to_string(),
            arch: detect_arch().to_string(),
            go_version: go_toolchain_version(),
        }
    }

    /// OS segment used in asset file names.
    pub fn asset_os(&self) -> &str {
        if self.os.eq_ignore_ascii_case("darwin") {
            "macOS"
        } else {
            &self.os
        }
    }
}

pub fn detect_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

pub fn detect_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

pub fn go_toolchain_version() -> Option<String> {
    let go = which::which("go").ok()?;
    let output = Command::new(go).arg("version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    // "go version go1.22.1 linux/amd64"
    String::from_utf8_lossy(&output.stdout)
        .split_whitespace()
        .find(|tok| tok.starts_with("go1"))
        .map(str::to_string)
}

/// Whether `dir` appears in the live `PATH` of this process.
pub fn is_in_live_path(dir: &Path) -> bool {
    let live = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&live).any(|p| clean_path(&p) == clean_path(dir))
}

/// Persists `PATH` membership for future shells.
pub trait PathPersistence {
    /// Returns true when the entry was written (or already scripted).
    fn add(&self, dir: &Path) -> Result<bool>;
    fn remove(&self, dir: &Path) -> Result<bool>;
    fn is_set(&self, dir: &Path) -> Result<bool>;
}

pub fn persistence() -> Result<Box<dyn PathPersistence>> {
    #[cfg(windows)]
    {
        Ok(Box::new(RegistryPersistence::from_env()?))
    }
    #[cfg(not(windows))]
    {
        Ok(Box::new(RcFilePersistence::from_env()?))
    }
}
