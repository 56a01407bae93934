use anyhow::Result;
use clap::Parser;
use tracing::debug;

use toolsmith::catalog::{load_tool_list, HttpCatalog, ToolCache};
use toolsmith::cli::Cli;
use toolsmith::command_handlers::dispatch::{dispatch, Requests};
use toolsmith::command_handlers::path::{self, PathCommand};
use toolsmith::config::Settings;
use toolsmith::github::GitHubReleases;
use toolsmith::ops::Manager;
use toolsmith::platform::{self, HostInfo};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;
    settings.output.init_logging();
    settings.output.banner();

    if let Some(cmd) = PathCommand::from_flags(cli.show_path, cli.set_path, cli.unset_path) {
        let persistence = platform::persistence()?;
        return path::run(cmd, &settings.install_path, persistence.as_ref());
    }
    match platform::persistence() {
        Ok(p) => path::ensure_default_on_path(&settings, p.as_ref()),
        Err(e) => debug!("path persistence unavailable: {e:#}"),
    }

    let host = HostInfo::detect();
    let catalog = HttpCatalog::new(&settings.catalog_url, host.clone())?;
    let cache = ToolCache::new(settings.cache_path.clone());
    let (tools, refresh) = load_tool_list(&catalog, &cache)?;

    let releases = GitHubReleases::new(&settings.github_api, &settings.organization)?;
    let manager = Manager::new(settings.install_path.clone(), host, &releases, settings.output)
        .with_changelog(!settings.disable_changelog);
    let requests = Requests::from_cli(&cli, &tools);
    let summary = dispatch(&requests, &tools, &manager);
    debug!(
        "done: {} succeeded, {} skipped, {} failed",
        summary.succeeded, summary.skipped, summary.failed
    );

    if let Some(refresh) = refresh {
        refresh.report();
    }
    Ok(())
}
