use crate::assets::select_asset;
use crate::error::ToolError;
use crate::github::ReleaseSource;
use crate::installer::{self, Installed};
use crate::output::Output;
use crate::platform::{executable_path, is_sub_path, is_system_dir, platform, HostInfo};
use crate::requirements;
use crate::tool::{InstallType, Tool};
use crate::versioning::{installed_version, is_up_to_date};
use anyhow::Result;
use fs_err as fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Derived per-tool state shown by the status listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    NotSupported,
    NotInstalled,
    Latest(String),
    Outdated { installed: String, latest: String },
    Unknown(String),
}

/// Status of `tool` as installed under `install_path`.
pub fn tool_status(tool: &Tool, install_path: &Path, host: &HostInfo) -> ToolStatus {
    let (_, exists) = executable_path(install_path, &tool.name);
    if !exists {
        return match select_asset(tool, host) {
            Ok(_) => ToolStatus::NotInstalled,
            Err(_) => ToolStatus::NotSupported,
        };
    }
    match installed_version(tool, install_path) {
        Ok(installed) if is_up_to_date(&tool.version, &installed) => ToolStatus::Latest(installed),
        Ok(installed) => ToolStatus::Outdated { installed, latest: tool.version.clone() },
        Err(e) => ToolStatus::Unknown(e.to_string()),
    }
}

/// Install, update, remove and status for single tools against one
/// install directory.
pub struct Manager<'a> {
    install_path: PathBuf,
    home_guard: Option<PathBuf>,
    host: HostInfo,
    releases: &'a dyn ReleaseSource,
    output: Output,
    disable_changelog: bool,
}

impl<'a> Manager<'a> {
    pub fn new(install_path: impl Into<PathBuf>, host: HostInfo, releases: &'a dyn ReleaseSource, output: Output) -> Self {
        Self {
            install_path: install_path.into(),
            home_guard: platform().home_dir(),
            host,
            releases,
            output,
            disable_changelog: false,
        }
    }

    /// Directory the install path must live under; `None` lifts the guard.
    pub fn with_home_guard(mut self, home: Option<PathBuf>) -> Self {
        self.home_guard = home;
        self
    }

    pub fn with_changelog(mut self, enabled: bool) -> Self {
        self.disable_changelog = !enabled;
        self
    }

    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    fn guard(&self) -> Result<(), ToolError> {
        match &self.home_guard {
            Some(home) if !is_sub_path(home, &self.install_path) => {
                Err(ToolError::OutsideHome(self.install_path.clone()))
            }
            _ => Ok(()),
        }
    }

    fn not_found(&self, tool: &Tool) -> ToolError {
        ToolError::ToolNotFound(tool.name.clone(), self.install_path.display().to_string())
    }

    pub fn install(&self, tool: &Tool) -> Result<Installed> {
        self.guard()?;
        let (_, exists) = executable_path(&self.install_path, &tool.name);
        if exists {
            return Err(ToolError::AlreadyInstalled.into());
        }
        let installed = self.fetch_and_place(tool)?;
        requirements::report_unmet(tool, &self.host.os, &self.output);
        Ok(installed)
    }

    /// Replaces an installed tool with the catalog version. The old binary
    /// stays in place until the new one has been fully staged.
    pub fn update(&self, tool: &Tool) -> Result<Installed> {
        self.guard()?;
        let (path, exists) = executable_path(&self.install_path, &tool.name);
        if !exists {
            return Err(self.not_found(tool).into());
        }
        match installed_version(tool, &self.install_path) {
            Ok(current) if is_up_to_date(&tool.version, &current) => {
                return Err(ToolError::AlreadyUpToDate.into());
            }
            Ok(current) => debug!("{}: installed {current}, catalog {}", tool.name, tool.version),
            Err(e) => warn!("{}: {e}; updating anyway", tool.name),
        }
        if tool.assets.is_empty() {
            return Err(ToolError::NoAssetFound(tool.name.clone(), path.display().to_string()).into());
        }
        let installed = self.fetch_and_place(tool)?;
        if !self.disable_changelog {
            self.print_release_notes(tool);
        }
        Ok(installed)
    }

    pub fn remove(&self, tool: &Tool) -> Result<PathBuf> {
        self.guard()?;
        let (path, exists) = executable_path(&self.install_path, &tool.name);
        if !exists {
            return Err(self.not_found(tool).into());
        }
        if is_system_dir(&path) {
            return Err(ToolError::SystemDirectory(path).into());
        }
        fs::remove_file(&path)?;
        Ok(path)
    }

    pub fn status(&self, tool: &Tool) -> ToolStatus {
        tool_status(tool, &self.install_path, &self.host)
    }

    /// Source build first for Go tools when a toolchain exists; otherwise
    /// the release archive, with the source build as a last resort.
    fn fetch_and_place(&self, tool: &Tool) -> Result<Installed> {
        let can_build = installer::go_available() && !tool.go_install_path.trim().is_empty();
        if tool.install_type == InstallType::Go && can_build {
            match installer::install_from_source(tool, &self.install_path, &self.output) {
                Ok(installed) => return Ok(installed),
                Err(e) => warn!("{}: go install failed: {e:#}; trying release assets", tool.name),
            }
        }
        match installer::install_from_release(tool, &self.install_path, &self.host, self.releases, &self.output) {
            Ok(installed) => Ok(installed),
            Err(err) if can_build && tool.install_type != InstallType::Go => {
                debug!("{}: release install failed: {err:#}; trying go install", tool.name);
                installer::install_from_source(tool, &self.install_path, &self.output).or(Err(err))
            }
            Err(err) => Err(err),
        }
    }

    fn print_release_notes(&self, tool: &Tool) {
        match self.releases.release_notes(&tool.repo, &tool.version) {
            Ok(Some(notes)) => info!("{} {} release notes:\n{notes}", tool.name, tool.version),
            Ok(None) => debug!("{}: no release notes for {}", tool.name, tool.version),
            Err(e) => debug!("{}: fetching release notes failed: {e:#}", tool.name),
        }
    }
}
