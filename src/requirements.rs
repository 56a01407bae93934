use crate::output::Output;
use crate::tool::{RequirementSpec, Tool};
use std::path::Path;
use tracing::{info, warn};

#[cfg(target_os = "macos")]
const LIBRARY_DIRS: &[&str] = &["/usr/lib", "/usr/local/lib", "/opt/homebrew/lib", "/opt/local/lib"];
#[cfg(all(unix, not(target_os = "macos")))]
const LIBRARY_DIRS: &[&str] = &[
    "/lib",
    "/lib64",
    "/usr/lib",
    "/usr/lib64",
    "/usr/local/lib",
    "/lib/x86_64-linux-gnu",
    "/usr/lib/x86_64-linux-gnu",
    "/lib/aarch64-linux-gnu",
    "/usr/lib/aarch64-linux-gnu",
];
#[cfg(windows)]
const LIBRARY_DIRS: &[&str] = &["C:\\Windows\\System32", "C:\\Windows\\SysWOW64"];

/// Requirements declared for `os` that `satisfied` says are missing.
pub fn unmet<'a>(tool: &'a Tool, os: &str, satisfied: impl Fn(&RequirementSpec) -> bool) -> Vec<&'a RequirementSpec> {
    tool.requirements
        .iter()
        .filter(|r| r.os.eq_ignore_ascii_case(os))
        .flat_map(|r| r.specification.iter())
        .filter(|spec| !satisfied(spec))
        .collect()
}

/// Executables are looked up on `PATH`; anything else is treated as a
/// shared library and searched for in the usual library directories.
pub fn is_satisfied(spec: &RequirementSpec) -> bool {
    if !spec.command.trim().is_empty() {
        return which::which(spec.command.trim()).is_ok();
    }
    LIBRARY_DIRS.iter().any(|dir| library_in(Path::new(dir), &spec.name))
}

fn library_in(dir: &Path, name: &str) -> bool {
    let wanted = name.to_lowercase();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|e| {
        let file = e.file_name().to_string_lossy().to_lowercase();
        file.starts_with(&wanted) && [".so", ".dylib", ".dll", ".a"].iter().any(|ext| file.contains(ext))
    })
}

pub fn label(spec: &RequirementSpec) -> &'static str {
    if spec.required {
        "required"
    } else {
        "optional"
    }
}

pub fn report_unmet(tool: &Tool, os: &str, output: &Output) {
    for spec in unmet(tool, os, is_satisfied) {
        let line = format!("{}: {} dependency {} is missing: {}", tool.name, label(spec), spec.name, spec.instruction);
        if spec.required {
            warn!("{}", output.warning(&line));
        } else {
            info!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolRequirement;

    fn spec(name: &str, required: bool, command: &str) -> RequirementSpec {
        RequirementSpec { name: name.into(), required, command: command.into(), instruction: format!("install {name}") }
    }

    fn naabu() -> Tool {
        let mut tool = crate::test_support::tool_named("naabu", "2.1.0");
        tool.requirements = vec![
            ToolRequirement { os: "linux".into(), specification: vec![spec("libpcap", true, ""), spec("nmap", false, "nmap")] },
            ToolRequirement { os: "windows".into(), specification: vec![spec("npcap", true, "")] },
        ];
        tool
    }

    #[test]
    fn only_host_os_requirements_are_considered() {
        let tool = naabu();
        let missing = unmet(&tool, "LINUX", |_| false);
        assert_eq!(missing.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["libpcap", "nmap"]);
        assert_eq!(label(missing[0]), "required");
        assert_eq!(label(missing[1]), "optional");
        assert!(unmet(&tool, "darwin", |_| false).is_empty());
        assert!(unmet(&tool, "linux", |s| s.name == "libpcap").iter().all(|s| s.name == "nmap"));
    }

    #[test]
    fn library_lookup_matches_versioned_shared_objects() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("libpcap.so.0.8"), b"").expect("write");
        assert!(library_in(dir.path(), "libpcap"));
        assert!(!library_in(dir.path(), "libssl"));
        assert!(!library_in(&dir.path().join("missing"), "libpcap"));
    }

    #[cfg(unix)]
    #[test]
    fn commands_resolve_through_path() {
        assert!(is_satisfied(&spec("sh", true, "sh")));
        assert!(!is_satisfied(&spec("nope", true, "definitely-not-a-real-command-xyz")));
    }
}
