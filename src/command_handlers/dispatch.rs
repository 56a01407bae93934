use crate::cli::Cli;
use crate::command_handlers::list;
use crate::error::{as_tool_error, ToolError};
use crate::ops::Manager;
use crate::tool::{find_tool, Tool};
use anyhow::Result;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Install,
    Update,
    Remove,
}

impl Operation {
    fn verb(self) -> &'static str {
        match self {
            Operation::Install => "install",
            Operation::Update => "update",
            Operation::Remove => "remove",
        }
    }
}

/// Names requested per operation. `*_all` flags are expanded against the
/// catalog before anything runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Requests {
    pub install: Vec<String>,
    pub update: Vec<String>,
    pub remove: Vec<String>,
    expanded: [bool; 3],
}

impl Requests {
    pub fn from_cli(cli: &Cli, tools: &[Tool]) -> Self {
        let all = || tools.iter().map(|t| t.name.clone()).collect::<Vec<_>>();
        let pick = |flag: bool, list: &[String]| if flag { all() } else { Cli::names(list) };
        Self {
            install: pick(cli.install_all, &cli.install),
            update: pick(cli.update_all, &cli.update),
            remove: pick(cli.remove_all, &cli.remove),
            expanded: [cli.install_all, cli.update_all, cli.remove_all],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.install.is_empty() && self.update.is_empty() && self.remove.is_empty()
    }

    fn groups(&self) -> [(Operation, &[String], bool); 3] {
        [
            (Operation::Install, self.install.as_slice(), self.expanded[0]),
            (Operation::Update, self.update.as_slice(), self.expanded[1]),
            (Operation::Remove, self.remove.as_slice(), self.expanded[2]),
        ]
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Runs install, then update, then remove. With nothing requested the
/// status listing is printed instead. Per-tool failures are logged and
/// counted; they never stop the run.
pub fn dispatch(requests: &Requests, tools: &[Tool], manager: &Manager) -> RunSummary {
    let mut summary = RunSummary::default();
    if requests.is_empty() {
        list::print_status(manager, tools);
        return summary;
    }
    for (op, names, expanded) in requests.groups() {
        for name in names {
            let outcome = match find_tool(tools, name) {
                Some(tool) => run_one(op, tool, manager),
                None => Err(ToolError::NotInCatalog(name.clone()).into()),
            };
            match outcome {
                Ok(done) => {
                    info!("{done}");
                    summary.succeeded += 1;
                }
                Err(err) => {
                    if is_skip(&err, expanded) {
                        info!("{name}: {err}");
                        summary.skipped += 1;
                    } else {
                        error!("{} {name}: {err:#}", op.verb());
                        summary.failed += 1;
                    }
                }
            }
        }
    }
    summary
}

fn run_one(op: Operation, tool: &Tool, manager: &Manager) -> Result<String> {
    let out = manager.output();
    Ok(match op {
        Operation::Install => {
            let installed = manager.install(tool)?;
            format!("installed {} {} ({})", tool.name, installed.version, out.latest("latest"))
        }
        Operation::Update => {
            let installed = manager.update(tool)?;
            format!("updated {} to {} ({})", tool.name, installed.version, out.latest("latest"))
        }
        Operation::Remove => {
            manager.remove(tool)?;
            format!("removed {}", tool.name)
        }
    })
}

/// Informational outcomes; a missing binary only counts as one when the
/// name came from an `--*-all` expansion.
fn is_skip(err: &anyhow::Error, expanded: bool) -> bool {
    match as_tool_error(err) {
        Some(ToolError::ToolNotFound(..)) => expanded,
        Some(e) => e.is_informational(),
        None => false,
    }
}
