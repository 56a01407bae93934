use crate::error::ToolError;
use crate::platform::HostInfo;
use crate::tool::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Preference order when a platform publishes both.
    pub const PREFERENCE: [ArchiveKind; 2] = [ArchiveKind::Zip, ArchiveKind::TarGz];

    pub fn extension(self) -> &'static str {
        match self {
            ArchiveKind::Zip => ".zip",
            ArchiveKind::TarGz => ".tar.gz",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedAsset {
    pub key: String,
    pub id: u64,
    pub kind: ArchiveKind,
}

/// `{name}_{version}_{os}_{arch}` with the version's leading `v` dropped.
pub fn asset_base_name(tool: &Tool, host: &HostInfo) -> String {
    format!(
        "{}_{}_{}_{}",
        tool.name,
        tool.version_without_prefix(),
        host.asset_os(),
        host.arch
    )
}

pub fn select_asset(tool: &Tool, host: &HostInfo) -> Result<SelectedAsset, ToolError> {
    let base = asset_base_name(tool, host);
    for kind in ArchiveKind::PREFERENCE {
        let wanted = format!("{base}{}", kind.extension());
        let found = tool
            .assets
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&wanted))
            .and_then(|(key, id)| id.trim().parse::<u64>().ok().map(|id| (key, id)));
        if let Some((key, id)) = found {
            return Ok(SelectedAsset { key: key.clone(), id, kind });
        }
    }
    Err(ToolError::NoAssetFound(host.os.clone(), host.arch.clone()))
}

/// Checksums file published next to the archives, if the catalog lists one.
pub fn checksums_asset(tool: &Tool) -> Option<(String, u64)> {
    let wanted = format!("{}_{}_checksums.txt", tool.name, tool.version_without_prefix());
    tool.assets
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(&wanted))
        .and_then(|(key, id)| id.trim().parse().ok().map(|id| (key.clone(), id)))
}

/// Looks up `asset` in a `sha256sum`-style listing.
pub fn expected_checksum(listing: &str, asset: &str) -> Option<String> {
    listing.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let sum = parts.next()?;
        let name = parts.next()?.trim_start_matches('*');
        name.eq_ignore_ascii_case(asset).then(|| sum.to_lowercase())
    })
}
