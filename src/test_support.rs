//! Fixtures shared by the unit tests and the lifecycle scenarios.

use crate::catalog::Catalog;
use crate::github::ReleaseSource;
use crate::platform::HostInfo;
use crate::tool::{find_tool, Tool};
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn linux_amd64() -> HostInfo {
    HostInfo { os: "linux".into(), arch: "amd64".into(), go_version: None }
}

pub fn tool_named(name: &str, version: &str) -> Tool {
    Tool {
        name: name.into(),
        repo: name.into(),
        version: version.into(),
        go_install_path: String::new(),
        requirements: vec![],
        assets: Default::default(),
        install_type: Default::default(),
    }
}

pub fn dnsx_tool(assets: &[(&str, &str)]) -> Tool {
    let mut tool = tool_named("dnsx", "1.1.1");
    tool.assets = assets.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    tool
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file(*name, zip::write::FileOptions::default()).expect("start zip entry");
        zip.write_all(data.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

pub fn tar_gz_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(enc);
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data.as_bytes()).expect("append tar entry");
    }
    builder.into_inner().expect("finish tar").finish().expect("finish gzip")
}

/// Like [`tar_gz_bytes`] but keeps entry names verbatim (`./`, `./dnsx`)
/// and takes the entry type. For links `data` is the link target.
pub fn tar_gz_raw(entries: &[(&str, tar::EntryType, &str)]) -> Vec<u8> {
    let enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(enc);
    for (name, kind, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_entry_type(*kind);
        header.set_mode(if kind.is_dir() { 0o755 } else { 0o644 });
        let body = if kind.is_file() {
            data.as_bytes()
        } else {
            if kind.is_symlink() || kind.is_hard_link() {
                header.set_link_name(data).expect("link name");
            }
            &[][..]
        };
        header.set_size(body.len() as u64);
        header.set_cksum();
        builder.append(&header, body).expect("append tar entry");
    }
    builder.into_inner().expect("finish tar").finish().expect("finish gzip")
}

/// Shell script that prints the given version banner on `--version`.
#[cfg(unix)]
pub fn version_script(version: &str) -> String {
    format!("#!/bin/sh\necho 'Current Version: v{version}'\n")
}

#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

/// In-memory release host that counts every asset download.
#[derive(Default)]
pub struct FakeReleases {
    assets: Mutex<HashMap<u64, Vec<u8>>>,
    notes: Option<String>,
    downloads: AtomicUsize,
}

impl FakeReleases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(self, id: u64, data: Vec<u8>) -> Self {
        self.put_asset(id, data);
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn put_asset(&self, id: u64, data: Vec<u8>) {
        self.assets.lock().expect("lock").insert(id, data);
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl ReleaseSource for FakeReleases {
    fn open_asset(&self, repo: &str, asset_id: u64) -> Result<Box<dyn Read + Send>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let data = self
            .assets
            .lock()
            .expect("lock")
            .get(&asset_id)
            .cloned()
            .ok_or_else(|| anyhow!("asset {asset_id} of {repo} not found"))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn release_notes(&self, _repo: &str, _tag: &str) -> Result<Option<String>> {
        Ok(self.notes.clone())
    }
}

/// Catalog backed by a mutable list; `None` simulates an outage.
pub struct FakeCatalog {
    tools: Mutex<Option<Vec<Tool>>>,
    fetches: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(tools: Vec<Tool>) -> Self {
        Self { tools: Mutex::new(Some(tools)), fetches: AtomicUsize::new(0) }
    }

    pub fn offline() -> Self {
        Self { tools: Mutex::new(None), fetches: AtomicUsize::new(0) }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Catalog for FakeCatalog {
    fn fetch_tools(&self) -> Result<Option<Vec<Tool>>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.tools.lock().expect("lock").clone())
    }

    fn fetch_tool(&self, name: &str) -> Result<Option<Tool>> {
        Ok(self.fetch_tools()?.and_then(|t| find_tool(&t, name).cloned()))
    }
}
