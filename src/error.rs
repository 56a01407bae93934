use std::path::PathBuf;
use thiserror::Error;

/// Outcomes of a single tool operation that callers classify. Anything that
/// is not one of these travels as a plain `anyhow::Error` with context.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("already installed")]
    AlreadyInstalled,
    #[error("already up to date")]
    AlreadyUpToDate,
    #[error("could not find release asset for your platform ({0}/{1})")]
    NoAssetFound(String, String),
    #[error("{0}: tool not found in path {1}: skipping")]
    ToolNotFound(String, String),
    #[error("{0}: not found in the tool list")]
    NotInCatalog(String),
    #[error("tool catalog unavailable: remote service unreachable and no usable cache")]
    CatalogUnavailable,
    #[error("shell not supported: {0:?}")]
    ShellNotSupported(String),
    #[error("refusing to touch {0:?}: not inside the user's home directory")]
    OutsideHome(PathBuf),
    #[error("refusing to remove {0:?}: it lives in a system directory")]
    SystemDirectory(PathBuf),
    #[error("archive entry {0:?} escapes the target directory")]
    PathTraversal(String),
    #[error("checksum mismatch for {asset}: expected {expected} got {actual}")]
    ChecksumMismatch {
        asset: String,
        expected: String,
        actual: String,
    },
}

impl ToolError {
    /// Informational outcomes are reported at info level, never as failures.
    pub fn is_informational(&self) -> bool {
        matches!(self, ToolError::AlreadyInstalled | ToolError::AlreadyUpToDate)
    }
}

/// Classifies an `anyhow::Error` coming out of a tool operation.
pub fn as_tool_error(err: &anyhow::Error) -> Option<&ToolError> {
    err.downcast_ref::<ToolError>()
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to execute {path:?}: {source}")]
    Exec {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path:?} exited with {status}")]
    Failed { path: PathBuf, status: String },
    #[error("{0:?} did not exit within the probe timeout")]
    Timeout(PathBuf),
    #[error("unable to extract installed version")]
    NoVersion,
}
