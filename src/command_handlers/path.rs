use crate::config::Settings;
use crate::error::{as_tool_error, ToolError};
use crate::platform::{is_in_live_path, PathPersistence};
use anyhow::Result;
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCommand {
    Show,
    Set,
    Unset,
}

impl PathCommand {
    pub fn from_flags(show: bool, set: bool, unset: bool) -> Option<Self> {
        if show {
            Some(Self::Show)
        } else if set {
            Some(Self::Set)
        } else if unset {
            Some(Self::Unset)
        } else {
            None
        }
    }
}

pub fn run(cmd: PathCommand, dir: &Path, persistence: &dyn PathPersistence) -> Result<()> {
    match cmd {
        PathCommand::Show => {
            let configured = is_in_live_path(dir) || persistence.is_set(dir)?;
            info!("Path to download project binary: {}", dir.display());
            info!("Path {} configured in environment variable $PATH: {configured}", dir.display());
            Ok(())
        }
        PathCommand::Set => {
            if !persistence.add(dir).map_err(|e| manual_hint(e, dir))? {
                info!("{} is already in $PATH", dir.display());
            }
            Ok(())
        }
        PathCommand::Unset => {
            if !persistence.remove(dir)? {
                info!("{} is not in $PATH", dir.display());
            }
            Ok(())
        }
    }
}

/// The default install directory is put on `PATH` without being asked.
/// Failures only produce a hint.
pub fn ensure_default_on_path(settings: &Settings, persistence: &dyn PathPersistence) {
    if !settings.uses_default_path || is_in_live_path(&settings.install_path) {
        return;
    }
    if let Err(e) = persistence.add(&settings.install_path) {
        warn!("{:#}", manual_hint(e, &settings.install_path));
    }
}

fn manual_hint(err: anyhow::Error, dir: &Path) -> anyhow::Error {
    if matches!(as_tool_error(&err), Some(ToolError::ShellNotSupported(_))) {
        error!("add it manually: export PATH=$PATH:{}", dir.display());
    }
    err
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::platform::RcFilePersistence;

    #[test]
    fn flags_pick_one_command() {
        assert_eq!(PathCommand::from_flags(false, false, false), None);
        assert_eq!(PathCommand::from_flags(true, true, false), Some(PathCommand::Show));
        assert_eq!(PathCommand::from_flags(false, false, true), Some(PathCommand::Unset));
    }

    #[test]
    fn set_then_unset_round_trip_through_rc_file() {
        let home = tempfile::tempdir().expect("tempdir");
        let dir = home.path().join(".toolsmith/bin");
        let p = RcFilePersistence::new(home.path(), "/bin/bash", "/usr/bin");
        run(PathCommand::Set, &dir, &p).expect("set");
        run(PathCommand::Set, &dir, &p).expect("set again");
        let rc = std::fs::read_to_string(home.path().join(".bashrc")).expect("rc");
        assert_eq!(rc.matches(&format!("export PATH=$PATH:{}", dir.display())).count(), 1);

        let live = format!("/usr/bin:{}", dir.display());
        let p = RcFilePersistence::new(home.path(), "/bin/bash", live);
        run(PathCommand::Unset, &dir, &p).expect("unset");
        let rc = std::fs::read_to_string(home.path().join(".bashrc")).expect("rc");
        assert!(rc.contains("export PATH=/usr/bin\n"));
    }

    #[test]
    fn unsupported_shell_fails_set() {
        let home = tempfile::tempdir().expect("tempdir");
        let p = RcFilePersistence::new(home.path(), "/usr/bin/fish", "/usr/bin");
        assert!(run(PathCommand::Set, &home.path().join("bin"), &p).is_err());
    }
}
