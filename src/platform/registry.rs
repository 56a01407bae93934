//! `HKCU\Environment\Path` handling. The entry comparison helpers are plain
//! string functions so they behave identically wherever they are tested.

/// Returns the `(absolute, %USERPROFILE%-relative)` spellings of an absolute
/// `entry`. A spelling identical to `entry` itself comes back empty.
pub fn normalize_path_entry(entry: &str, home: &str) -> (String, String) {
    let sep = '\\';
    let abs = entry.trim_end_matches(sep).to_string();
    let home = home.trim_end_matches(sep);

    let mut home_entry = String::new();
    if format!("{}{sep}", abs.to_lowercase()).starts_with(&format!("{}{sep}", home.to_lowercase())) {
        if let Some(rest) = abs.get(home.len()..) {
            home_entry = format!("%USERPROFILE%{rest}");
        }
    }
    let abs = if abs == entry { String::new() } else { abs };
    if home_entry == entry {
        home_entry.clear();
    }
    (abs, home_entry)
}

/// First index in `paths` that names the same directory as `entry`, compared
/// case-insensitively across literal, absolute and home-relative spellings.
pub fn index_of(paths: &[String], entry: &str, home: &str) -> Option<usize> {
    let (abs, home_entry) = normalize_path_entry(entry, home);
    let wanted: Vec<String> = [entry.to_string(), abs, home_entry]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect();
    paths
        .iter()
        .position(|p| !p.is_empty() && wanted.contains(&p.to_lowercase()))
}

/// NUL-terminated UTF-16, as the wide Win32 calls expect.
pub fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(windows)]
pub use imp::RegistryPersistence;

#[cfg(windows)]
mod imp {
    use super::{index_of, wide};
    use crate::platform::{platform, PathPersistence};
    use anyhow::{anyhow, Context, Result};
    use std::path::Path;
    use tracing::warn;
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        SendMessageTimeoutW, HWND_BROADCAST, SMTO_ABORTIFHUNG, WM_SETTINGCHANGE,
    };
    use winreg::enums::{HKEY_CURRENT_USER, KEY_QUERY_VALUE, KEY_SET_VALUE};
    use winreg::RegKey;

    const BROADCAST_TIMEOUT_MS: u32 = 5000;

    /// Tells running programs that `HKCU\Environment` changed. Returns
    /// false when the broadcast fails or times out.
    fn broadcast_environment_change() -> bool {
        let param = wide("Environment");
        let mut result = 0usize;
        // SAFETY: `param` is NUL-terminated and outlives the call; `result`
        // is a valid out pointer.
        let sent = unsafe {
            SendMessageTimeoutW(
                HWND_BROADCAST,
                WM_SETTINGCHANGE,
                0,
                param.as_ptr() as isize,
                SMTO_ABORTIFHUNG,
                BROADCAST_TIMEOUT_MS,
                &mut result,
            )
        };
        sent != 0
    }


    pub struct RegistryPersistence {
        home: String,
    }

    impl RegistryPersistence {
        pub fn from_env() -> Result<Self> {
            let home = platform()
                .home_dir()
                .ok_or_else(|| anyhow!("unable to determine the home directory"))?;
            Ok(Self { home: home.to_string_lossy().to_string() })
        }

        fn read(&self) -> Result<Vec<String>> {
            let key = RegKey::predef(HKEY_CURRENT_USER)
                .open_subkey_with_flags("Environment", KEY_QUERY_VALUE)
                .context("can't open HKCU Environment for reads")?;
            match key.get_value::<String, _>("Path") {
                Ok(v) => Ok(v.split(';').map(str::to_string).collect()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
                Err(e) => Err(e).context("can't query HKCU Environment[Path]"),
            }
        }

        fn write(&self, dir: &Path, entries: &[String]) -> Result<()> {
            let key = RegKey::predef(HKEY_CURRENT_USER)
                .open_subkey_with_flags("Environment", KEY_SET_VALUE)
                .context("can't open HKCU Environment for writes")?;
            key.set_value("Path", &entries.join(";"))
                .context("can't set HKCU Environment[Path]")?;
            if !broadcast_environment_change() {
                warn!("Please reload terminal to load newly added $PATH ({})", dir.display());
            }
            Ok(())
        }

        fn absolute(dir: &Path) -> String {
            std::path::absolute(dir)
                .unwrap_or_else(|_| dir.to_path_buf())
                .to_string_lossy()
                .to_string()
        }
    }

    impl PathPersistence for RegistryPersistence {
        fn add(&self, dir: &Path) -> Result<bool> {
            let mut cur = self.read()?;
            let entry = Self::absolute(dir);
            if index_of(&cur, &entry, &self.home).is_some() {
                return Ok(false);
            }
            cur.push(entry);
            self.write(dir, &cur)?;
            Ok(true)
        }

        fn remove(&self, dir: &Path) -> Result<bool> {
            let mut cur = self.read()?;
            let entry = Self::absolute(dir);
            let mut removed = false;
            while let Some(i) = index_of(&cur, &entry, &self.home) {
                cur.remove(i);
                removed = true;
            }
            if removed {
                self.write(dir, &cur)?;
            }
            Ok(removed)
        }

        fn is_set(&self, dir: &Path) -> Result<bool> {
            Ok(index_of(&self.read()?, &Self::absolute(dir), &self.home).is_some())
        }
    }
}
