use crate::platform::PlatformOps;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub static WINDOWS_PLATFORM: Windows = Windows;

pub struct Windows;

impl PlatformOps for Windows {
    fn home_dir(&self) -> Option<PathBuf> {
        std::env::var_os("USERPROFILE").map(PathBuf::from).or_else(dirs::home_dir)
    }
    fn default_install_dir(&self) -> Option<PathBuf> {
        self.home_dir().map(|h| h.join(".toolsmith").join("bin"))
    }
    fn default_executable_name(&self, tool_name: &str) -> String {
        if tool_name.to_ascii_lowercase().ends_with(".exe") {
            tool_name.to_string()
        } else {
            format!("{tool_name}.exe")
        }
    }
    fn make_executable(&self, _path: &Path) -> Result<()> {
        // the .exe extension is what makes a file runnable here
        Ok(())
    }
    fn system_dirs(&self) -> &'static [&'static str] {
        &[r"C:\Windows", r"C:\Program Files", r"C:\Program Files (x86)"]
    }
    fn path_list_separator(&self) -> char {
        ';'
    }
}
