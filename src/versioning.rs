use crate::error::ProbeError;
use crate::platform::executable_path;
use crate::tool::Tool;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

static VERSION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[v\s](\d+\.\d+\.\d+)").expect("version regex is valid"));

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Version reported by the installed binary's `--version` output.
pub fn installed_version(tool: &Tool, base: &Path) -> Result<String, ProbeError> {
    let (path, _) = executable_path(base, &tool.name);
    let output = probe(&path, PROBE_TIMEOUT)?;
    parse_version(&output).ok_or(ProbeError::NoVersion)
}

pub fn parse_version(output: &str) -> Option<String> {
    let lowered = output.to_lowercase();
    let found = VERSION_NUMBER.find(&lowered)?;
    Some(found.as_str().trim().trim_start_matches('v').to_string())
}

/// The catalog version merely has to contain the installed one, so
/// `v1.1.1` and `1.1.1-rc` both count as up to date for `1.1.1`.
pub fn is_up_to_date(catalog_version: &str, installed: &str) -> bool {
    catalog_version.contains(installed)
}

/// Runs `path --version` and returns stdout followed by stderr.
pub(crate) fn probe(path: &Path, timeout: Duration) -> Result<String, ProbeError> {
    let mut child = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProbeError::Exec { path: path.to_path_buf(), source })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out = thread::spawn(move || drain(stdout));
    let err = thread::spawn(move || drain(stderr));

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProbeError::Timeout(path.to_path_buf()));
            }
            Ok(None) => thread::sleep(Duration::from_millis(20)),
            Err(source) => return Err(ProbeError::Exec { path: path.to_path_buf(), source }),
        }
    };
    if !status.success() {
        return Err(ProbeError::Failed { path: path.to_path_buf(), status: status.to_string() });
    }
    let mut combined = out.join().unwrap_or_default();
    combined.push_str(&err.join().unwrap_or_default());
    Ok(combined)
}

fn drain(pipe: Option<impl Read>) -> String {
    let mut buf = Vec::new();
    if let Some(mut p) = pipe {
        let _ = p.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}
