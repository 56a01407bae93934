use crate::error::ToolError;
use crate::platform::{clean_path, platform, PathPersistence};
use anyhow::{anyhow, Context, Result};
use fs_err as fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SENTINEL: &str = "# Generated for toolsmith. Do not edit.";

struct ShellConfig {
    shell_name: &'static str,
    rc_file: &'static str,
}

const SHELLS: [ShellConfig; 2] = [
    ShellConfig { shell_name: "bash", rc_file: ".bashrc" },
    ShellConfig { shell_name: "zsh", rc_file: ".zshrc" },
];

/// Persists `PATH` changes by appending `export PATH=...` blocks to the
/// login shell's rc file.
#[derive(Debug, Clone)]
pub struct RcFilePersistence {
    home: PathBuf,
    shell: String,
    live_path: String,
}

impl RcFilePersistence {
    pub fn new(home: impl Into<PathBuf>, shell: impl Into<String>, live_path: impl Into<String>) -> Self {
        Self { home: home.into(), shell: shell.into(), live_path: live_path.into() }
    }

    pub fn from_env() -> Result<Self> {
        let home = platform()
            .home_dir()
            .ok_or_else(|| anyhow!("unable to determine the home directory"))?;
        Ok(Self::new(
            home,
            std::env::var("SHELL").unwrap_or_default(),
            std::env::var("PATH").unwrap_or_default(),
        ))
    }

    fn live_entries(&self) -> Vec<&str> {
        self.live_path.split(platform().path_list_separator()).collect()
    }

    fn contains(&self, dir: &Path) -> bool {
        let wanted = clean_path(dir);
        self.live_entries().iter().any(|p| clean_path(Path::new(p)) == wanted)
    }

    fn lookup_shell(&self) -> Result<&'static ShellConfig> {
        let name = Path::new(&self.shell)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        // an unset $SHELL is common in containers; bash is the usual default there
        if name.is_empty() {
            return Ok(&SHELLS[0]);
        }
        SHELLS
            .iter()
            .find(|c| c.shell_name == name)
            .ok_or_else(|| ToolError::ShellNotSupported(name).into())
    }

    pub fn rc_file_path(&self) -> Result<PathBuf> {
        let conf = self.lookup_shell()?;
        self.ensure_rc_file(conf)
    }

    fn ensure_rc_file(&self, conf: &ShellConfig) -> Result<PathBuf> {
        let path = self.home.join(conf.rc_file);
        if !path.exists() {
            fs::write(&path, "#\n")
                .with_context(|| format!("failed to create rc file {}", path.display()))?;
        }
        Ok(path)
    }

    fn export_to_config(&self, conf: &ShellConfig, dir: &Path, script: &str) -> Result<bool> {
        let rc_path = self.ensure_rc_file(conf)?;
        let existing = fs::read_to_string(&rc_path)?;
        if existing.lines().any(|line| line.trim().eq_ignore_ascii_case(script)) {
            info!("Run `source ~/{}` to add {} to $PATH", conf.rc_file, dir.display());
            return Ok(true);
        }
        let mut f = fs::OpenOptions::new().append(true).open(&rc_path)?;
        write!(f, "\n\n{SENTINEL}\n{script}\n\n")?;
        warn!("Run `source ~/{}` to add $PATH ({})", conf.rc_file, dir.display());
        Ok(true)
    }
}

impl PathPersistence for RcFilePersistence {
    fn add(&self, dir: &Path) -> Result<bool> {
        if self.contains(dir) {
            return Ok(false);
        }
        let conf = self
            .lookup_shell()
            .with_context(|| format!("add {} to $PATH env", dir.display()))?;
        let script = format!("export PATH=$PATH:{}", dir.display());
        self.export_to_config(conf, dir, &script)
    }

    fn remove(&self, dir: &Path) -> Result<bool> {
        if !self.contains(dir) {
            return Ok(false);
        }
        let conf = self
            .lookup_shell()
            .with_context(|| format!("remove {} from $PATH env", dir.display()))?;
        let wanted = clean_path(dir);
        let pruned: Vec<&str> = self
            .live_entries()
            .into_iter()
            .filter(|p| clean_path(Path::new(p)) != wanted)
            .collect();
        let script = format!("export PATH={}", pruned.join(":"));
        self.export_to_config(conf, dir, &script)
    }

    fn is_set(&self, dir: &Path) -> Result<bool> {
        Ok(self.contains(dir))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::as_tool_error;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn adding_twice_writes_entry_once() {
        let home = tempfile::tempdir().expect("tempdir");
        let p = RcFilePersistence::new(home.path(), "/bin/zsh", "/usr/bin:/bin");
        let dir = Path::new("/opt/tools/bin");
        assert!(p.add(dir).expect("first add"));
        assert!(p.add(dir).expect("second add"));
        let rc = std::fs::read_to_string(home.path().join(".zshrc")).expect("rc");
        assert_eq!(count(&rc, "export PATH=$PATH:/opt/tools/bin"), 1);
        assert_eq!(count(&rc, SENTINEL), 1);
        assert!(rc.starts_with("#\n"));
    }

    #[test]
    fn add_is_noop_when_live_path_has_entry() {
        let home = tempfile::tempdir().expect("tempdir");
        let p = RcFilePersistence::new(home.path(), "/bin/bash", "/usr/bin:/opt/tools/bin/");
        assert!(!p.add(Path::new("/opt/tools/bin")).expect("add"));
        assert!(!home.path().join(".bashrc").exists());
        assert!(p.is_set(Path::new("/opt/tools/bin")).expect("is_set"));
    }

    #[test]
    fn unsupported_shell_is_reported() {
        let home = tempfile::tempdir().expect("tempdir");
        let p = RcFilePersistence::new(home.path(), "/usr/bin/fish", "/usr/bin");
        let err = p.add(Path::new("/opt/tools/bin")).expect_err("fish is unsupported");
        assert!(matches!(as_tool_error(&err), Some(ToolError::ShellNotSupported(s)) if s == "fish"));
    }

    #[test]
    fn empty_shell_defaults_to_bash() {
        let home = tempfile::tempdir().expect("tempdir");
        let p = RcFilePersistence::new(home.path(), "", "/usr/bin");
        assert_eq!(p.rc_file_path().expect("rc"), home.path().join(".bashrc"));
    }

    #[test]
    fn remove_exports_pruned_path() {
        let home = tempfile::tempdir().expect("tempdir");
        let p = RcFilePersistence::new(home.path(), "/bin/bash", "/usr/bin:/opt/tools/bin:/bin");
        assert!(p.remove(Path::new("/opt/tools/bin")).expect("remove"));
        let rc = std::fs::read_to_string(home.path().join(".bashrc")).expect("rc");
        assert!(rc.contains("export PATH=/usr/bin:/bin\n"));
        assert!(!p.remove(Path::new("/not/present")).expect("remove absent"));
    }
}
