use crate::platform::PlatformOps;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub static UNIX_PLATFORM: Unix = Unix;

pub struct Unix;

impl PlatformOps for Unix {
    fn home_dir(&self) -> Option<PathBuf> {
        std::env::var_os("HOME").map(PathBuf::from).or_else(dirs::home_dir)
    }
    fn default_install_dir(&self) -> Option<PathBuf> {
        self.home_dir().map(|h| h.join(".toolsmith").join("bin"))
    }
    fn default_executable_name(&self, tool_name: &str) -> String {
        tool_name.to_string()
    }
    fn make_executable(&self, path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs_err::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs_err::set_permissions(path, perms)?;
        Ok(())
    }
    fn system_dirs(&self) -> &'static [&'static str] {
        &["/bin", "/sbin", "/usr/bin", "/usr/sbin", "/usr/local/bin", "/usr/local/sbin"]
    }
    fn path_list_separator(&self) -> char {
        ':'
    }
}
