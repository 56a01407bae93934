//! Hooks for programs that ship their own "check for update" and
//! "update yourself" flags. Both look the tool up through the single-tool
//! catalog endpoint instead of downloading the whole list.

use crate::catalog::Catalog;
use crate::error::{as_tool_error, ToolError};
use crate::ops::{tool_status, Manager};
use crate::output::Output;
use crate::platform::HostInfo;
use crate::tool::Tool;
use anyhow::Result;
use std::io::Write;
use std::path::Path;
use tracing::info;

fn lookup(catalog: &dyn Catalog, tool_name: &str) -> Result<Tool> {
    Ok(catalog
        .fetch_tool(tool_name)?
        .filter(|t| t.name.eq_ignore_ascii_case(tool_name))
        .ok_or_else(|| ToolError::NotInCatalog(tool_name.to_string()))?)
}

/// Returns a callback that writes `<name> <status>` for the installed copy
/// of `tool_name` under `base`.
pub fn version_check_callback<'a>(
    catalog: &'a dyn Catalog,
    host: &'a HostInfo,
    output: Output,
    tool_name: &'a str,
    base: &'a Path,
) -> impl Fn(&mut dyn Write) -> Result<()> + 'a {
    move |w| {
        let tool = lookup(catalog, tool_name)?;
        let status = tool_status(&tool, base, host);
        write!(w, "{tool_name} {}", output.render_status(&status))?;
        Ok(())
    }
}

/// Returns a callback that updates `tool_name` through `manager`. Being up
/// to date already is reported and treated as success.
pub fn updater_callback<'a>(
    catalog: &'a dyn Catalog,
    manager: &'a Manager<'a>,
    tool_name: &'a str,
) -> impl Fn() -> Result<()> + 'a {
    move || {
        let tool = lookup(catalog, tool_name)?;
        match manager.update(&tool) {
            Ok(installed) => {
                info!("updated {tool_name} to {}", installed.version);
                Ok(())
            }
            Err(e) if matches!(as_tool_error(&e), Some(ToolError::AlreadyUpToDate)) => {
                info!("{tool_name}: {e}");
                Ok(())
            }
            Err(e) => Err(e.context(format!("error while updating {tool_name}"))),
        }
    }
}
