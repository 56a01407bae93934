use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    version,
    name = "toolsmith",
    about = "toolsmith: install, update and remove tools published in the release catalog"
)]
pub struct Cli {
    /// Flag configuration file (defaults to ~/.config/toolsmith/config.yaml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory tools are installed into (defaults to ~/.toolsmith/bin)
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Catalog service URL
    #[arg(long, value_name = "URL")]
    pub source: Option<String>,

    /// Install the given tools (comma separated)
    #[arg(short, long, value_delimiter = ',', value_name = "NAME")]
    pub install: Vec<String>,
    /// Install every tool in the catalog
    #[arg(long, visible_alias = "ia")]
    pub install_all: bool,

    /// Update the given tools (comma separated)
    #[arg(short, long, value_delimiter = ',', value_name = "NAME")]
    pub update: Vec<String>,
    /// Update every installed tool in the catalog
    #[arg(long, visible_alias = "ua")]
    pub update_all: bool,

    /// Remove the given tools (comma separated)
    #[arg(short, long, value_delimiter = ',', value_name = "NAME")]
    pub remove: Vec<String>,
    /// Remove every tool in the catalog
    #[arg(long, visible_alias = "ra")]
    pub remove_all: bool,

    /// Show the install path and whether it is on $PATH
    #[arg(long, visible_alias = "sp")]
    pub show_path: bool,
    /// Persist the install path in $PATH for future shells
    #[arg(long)]
    pub set_path: bool,
    /// Drop the install path from $PATH for future shells
    #[arg(long)]
    pub unset_path: bool,

    /// Don't print release notes after an update
    #[arg(long, visible_alias = "dc")]
    pub disable_changelog: bool,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,
    /// Disable colors in output
    #[arg(long, visible_alias = "nc")]
    pub no_color: bool,
    /// Show only errors
    #[arg(long)]
    pub silent: bool,
}

impl Cli {
    /// Normalized tool names: trimmed, lower-cased, empty entries dropped.
    pub fn names(list: &[String]) -> Vec<String> {
        list.iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect()
    }
}
