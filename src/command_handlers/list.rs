use crate::ops::Manager;
use crate::platform::is_in_live_path;
use crate::tool::Tool;
use tracing::info;

/// One numbered line per catalog entry, in catalog order.
pub fn status_lines(manager: &Manager, tools: &[Tool]) -> Vec<String> {
    tools
        .iter()
        .enumerate()
        .map(|(i, tool)| {
            let status = manager.status(tool);
            format!("{}. {} {}", i + 1, tool.name, manager.output().render_status(&status))
        })
        .collect()
}

pub fn print_status(manager: &Manager, tools: &[Tool]) {
    let host = manager.host();
    info!(
        "{}/{} (go: {})",
        host.os,
        host.arch,
        host.go_version.as_deref().unwrap_or("not found")
    );
    info!("Path to download project binary: {}", manager.install_path().display());
    info!(
        "Path {} configured in environment variable $PATH: {}",
        manager.install_path().display(),
        is_in_live_path(manager.install_path())
    );
    for line in status_lines(manager, tools) {
        println!("{line}");
    }
}
