use crate::assets::{checksums_asset, expected_checksum, select_asset, ArchiveKind, SelectedAsset};
use crate::error::ToolError;
use crate::github::ReleaseSource;
use crate::output::Output;
use crate::platform::{clean_path, executable_path, platform, HostInfo};
use crate::tool::Tool;
use anyhow::{anyhow, bail, Context, Result};
use flate2::read::GzDecoder;
use fs_err as fs;
use sha2::{Digest, Sha256};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use tar::Archive;
use tempfile::TempDir;
use tracing::{debug, warn};
use zip::ZipArchive;

/// Result of a successful install. `binary` is `None` when the archive held
/// no entry named after the tool; nothing was written in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub version: String,
    pub binary: Option<PathBuf>,
}

/// Downloads the release archive for this platform and places the tool's
/// executable in `target`. An existing binary is replaced atomically.
pub fn install_from_release(
    tool: &Tool,
    target: &Path,
    host: &HostInfo,
    releases: &dyn ReleaseSource,
    output: &Output,
) -> Result<Installed> {
    let asset = select_asset(tool, host)?;
    let staging = staging_dir(target)?;
    let expected = fetch_checksum(tool, &asset, releases)?;

    let pb = output.spinner(format!("Downloading {} {}", tool.name, tool.version));
    let extracted = download_and_extract(tool, &asset, staging.path(), releases);
    pb.finish_and_clear();
    let (staged, actual) = extracted.with_context(|| format!("installing {} from {}", tool.name, asset.key))?;

    if let Some(expected) = expected {
        if expected != actual {
            return Err(ToolError::ChecksumMismatch { asset: asset.key, expected, actual }.into());
        }
        debug!("checksum verified for {}", asset.key);
    }

    let binary = match staged {
        Some(staged) => Some(promote(&staged, target)?),
        None => {
            warn!("{}: archive {} holds no executable named {}", tool.name, asset.key, tool.name);
            None
        }
    };
    Ok(Installed { version: tool.version.clone(), binary })
}

pub fn go_available() -> bool {
    which::which("go").is_ok()
}

/// Builds the tool with `go install`, placing the result in `target`.
pub fn install_from_source(tool: &Tool, target: &Path, output: &Output) -> Result<Installed> {
    let go = which::which("go").context("go toolchain not found in PATH")?;
    if tool.go_install_path.trim().is_empty() {
        bail!("{}: no go install path published in the catalog", tool.name);
    }
    let package = if tool.go_install_path.contains('@') {
        tool.go_install_path.clone()
    } else {
        format!("{}@latest", tool.go_install_path)
    };
    let staging = staging_dir(target)?;

    let pb = output.spinner(format!("Building {} from source", tool.name));
    let result = Command::new(go)
        .args(["install", "-v", &package])
        .env("GOBIN", staging.path())
        .output()
        .with_context(|| format!("running go install {package}"));
    pb.finish_and_clear();
    let out = result?;
    if !out.status.success() {
        bail!(
            "go install {package} failed ({}): {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }

    let (built, exists) = executable_path(staging.path(), &tool.name);
    if !exists {
        bail!("go install {package} did not produce {}", built.display());
    }
    let binary = promote(&built, target)?;
    Ok(Installed { version: tool.version.clone(), binary: Some(binary) })
}

/// Scratch directory next to the final location so the closing rename
/// never crosses filesystems. Removed on drop.
fn staging_dir(target: &Path) -> Result<TempDir> {
    fs::create_dir_all(target)?;
    tempfile::Builder::new()
        .prefix(".toolsmith-staging-")
        .tempdir_in(target)
        .with_context(|| format!("creating staging directory in {}", target.display()))
}

fn promote(staged: &Path, target: &Path) -> Result<PathBuf> {
    let file_name = staged
        .file_name()
        .ok_or_else(|| anyhow!("staged binary {} has no file name", staged.display()))?;
    let dest = target.join(file_name);
    platform().make_executable(staged)?;
    fs::rename(staged, &dest)?;
    Ok(dest)
}

fn fetch_checksum(tool: &Tool, asset: &SelectedAsset, releases: &dyn ReleaseSource) -> Result<Option<String>> {
    let Some((key, id)) = checksums_asset(tool) else {
        return Ok(None);
    };
    let mut listing = String::new();
    releases
        .open_asset(&tool.repo, id)?
        .read_to_string(&mut listing)
        .with_context(|| format!("reading {key}"))?;
    let expected = expected_checksum(&listing, &asset.key);
    if expected.is_none() {
        warn!("{key} lists no checksum for {}; skipping verification", asset.key);
    }
    Ok(expected)
}

/// Returns the staged executable (if any) and the archive's SHA-256.
fn download_and_extract(
    tool: &Tool,
    asset: &SelectedAsset,
    staging: &Path,
    releases: &dyn ReleaseSource,
) -> Result<(Option<PathBuf>, String)> {
    let mut body = releases.open_asset(&tool.repo, asset.id)?;
    match asset.kind {
        ArchiveKind::Zip => {
            // the central directory sits at the end, so zip needs the whole payload
            let mut bytes = Vec::new();
            body.read_to_end(&mut bytes).context("downloading archive")?;
            let digest = hex::encode(Sha256::digest(&bytes));
            Ok((extract_zip(&bytes, &tool.name, staging)?, digest))
        }
        ArchiveKind::TarGz => {
            let (staged, mut rest) = extract_tar_gz(HashingReader::new(body), &tool.name, staging)?;
            io::copy(&mut rest, &mut io::sink()).context("downloading archive")?;
            Ok((staged, rest.hex_digest()))
        }
    }
}

fn extract_zip(bytes: &[u8], tool_name: &str, staging: &Path) -> Result<Option<PathBuf>> {
    let mut zip = ZipArchive::new(Cursor::new(bytes)).context("opening zip archive")?;
    let mut staged = None;
    for i in 0..zip.len() {
        let mut file = zip.by_index(i)?;
        let name = file.name().to_string();
        ensure_contained(staging, &name)?;
        if file.is_dir() || !entry_matches(&name, tool_name) {
            continue;
        }
        staged = Some(write_entry(&mut file, &name, staging)?);
    }
    Ok(staged)
}

fn extract_tar_gz<R: Read>(reader: R, tool_name: &str, staging: &Path) -> Result<(Option<PathBuf>, R)> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let mut staged = None;
    for entry in archive.entries().context("reading tar.gz archive")? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        ensure_contained(staging, &name)?;
        if !entry_matches(&name, tool_name) {
            continue;
        }
        let kind = entry.header().entry_type();
        if !kind.is_file() {
            if !kind.is_dir() {
                warn!("{tool_name}: skipping archive entry {name:?}, not a regular file ({kind:?})");
            }
            continue;
        }
        staged = Some(write_entry(&mut entry, &name, staging)?);
    }
    Ok((staged, archive.into_inner().into_inner()))
}

/// Rejects entries whose path would land outside `root` once joined. The
/// root itself (`./`) is fine.
fn ensure_contained(root: &Path, entry: &str) -> Result<(), ToolError> {
    let root = clean_path(root);
    let dest = clean_path(&root.join(entry));
    if dest.starts_with(&root) {
        Ok(())
    } else {
        Err(ToolError::PathTraversal(entry.to_string()))
    }
}

/// Entry base name, minus an `.exe` suffix, equals the tool name ignoring case.
fn entry_matches(entry: &str, tool_name: &str) -> bool {
    let Some(base) = Path::new(entry).file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return false;
    };
    let stem = if base.to_ascii_lowercase().ends_with(".exe") {
        &base[..base.len() - 4]
    } else {
        base.as_str()
    };
    stem.eq_ignore_ascii_case(tool_name)
}

fn write_entry(reader: &mut impl Read, entry: &str, staging: &Path) -> Result<PathBuf> {
    let file_name = Path::new(entry)
        .file_name()
        .ok_or_else(|| anyhow!("archive entry {entry:?} has no file name"))?;
    let dest = staging.join(file_name);
    let mut out = fs::File::create(&dest)?;
    io::copy(reader, &mut out).with_context(|| format!("extracting {entry}"))?;
    Ok(dest)
}

struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
}

impl<R: Read> HashingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, hasher: Sha256::new() }
    }

    fn hex_digest(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}
