use crate::error::ToolError;
use crate::platform::HostInfo;
use crate::tool::Tool;
use anyhow::{anyhow, Context, Result};
use fs_err as fs;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const CATALOG_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of catalog entries. `Ok(None)` means "unavailable right now",
/// which callers answer by falling back to the cache.
pub trait Catalog: Send + Sync {
    fn fetch_tools(&self) -> Result<Option<Vec<Tool>>>;
    fn fetch_tool(&self, name: &str) -> Result<Option<Tool>>;
}

pub struct HttpCatalog {
    client: Client,
    base_url: String,
    host: HostInfo,
}

impl HttpCatalog {
    pub fn new(base_url: &str, host: HostInfo) -> Result<Self> {
        let client = Client::builder()
            .timeout(CATALOG_TIMEOUT)
            .user_agent(concat!("toolsmith/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building catalog http client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), host })
    }

    fn query(&self) -> [(&'static str, String); 3] {
        [
            ("os", self.host.os.clone()),
            ("arch", self.host.arch.clone()),
            ("go_version", self.host.go_version.clone().unwrap_or_default()),
        ]
    }

    fn get<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let resp = match self.client.get(url).query(&self.query()).send() {
            Ok(r) => r,
            Err(e) => {
                debug!("catalog request to {url} failed: {e}");
                return Ok(None);
            }
        };
        if resp.status() != StatusCode::OK {
            debug!("catalog request to {url} returned {}", resp.status());
            return Ok(None);
        }
        let body = resp
            .json::<T>()
            .with_context(|| format!("decoding catalog response from {url}"))?;
        Ok(Some(body))
    }
}

impl Catalog for HttpCatalog {
    fn fetch_tools(&self) -> Result<Option<Vec<Tool>>> {
        self.get(&format!("{}/api/v1/tools", self.base_url))
    }

    fn fetch_tool(&self, name: &str) -> Result<Option<Tool>> {
        self.get(&format!("{}/api/v1/tools/{name}", self.base_url))
    }
}

/// Last successfully fetched tool list, stored as a flat JSON array.
#[derive(Debug, Clone)]
pub struct ToolCache {
    path: PathBuf,
}

impl ToolCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Tool>> {
        let data = fs::read(&self.path)?;
        serde_json::from_slice(&data)
            .with_context(|| format!("decoding tool cache {}", self.path.display()))
    }

    /// Replaces the cache through a temp file + rename so readers never see
    /// a half-written file.
    pub fn store(&self, tools: &[Tool]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| anyhow!("cache path {} has no parent", self.path.display()))?;
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        serde_json::to_writer(&mut tmp, tools).context("serializing tool cache")?;
        tmp.persist(&self.path)
            .with_context(|| format!("writing tool cache {}", self.path.display()))?;
        Ok(())
    }
}

/// Handle on the background cache write. Dropping it detaches the writer.
pub struct CacheRefresh {
    rx: Receiver<Result<()>>,
}

impl CacheRefresh {
    pub fn spawn(cache: ToolCache, tools: Vec<Tool>) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let res = cache.store(&tools);
            if let Err(e) = &res {
                warn!("failed to update tool cache: {e:#}");
            }
            let _ = tx.send(res);
        });
        Self { rx }
    }

    /// Logs the outcome if the writer already finished; never blocks.
    pub fn report(&self) {
        match self.rx.try_recv() {
            Ok(Ok(())) => debug!("tool cache refreshed"),
            Ok(Err(_)) => {}
            Err(TryRecvError::Empty) => debug!("tool cache refresh still running"),
            Err(TryRecvError::Disconnected) => warn!("tool cache writer exited without reporting"),
        }
    }

    pub fn wait(&self, timeout: Duration) -> Option<Result<()>> {
        match self.rx.recv_timeout(timeout) {
            Ok(res) => Some(res),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Live catalog first, cache second. Only when both fail is the run over.
pub fn load_tool_list(catalog: &dyn Catalog, cache: &ToolCache) -> Result<(Vec<Tool>, Option<CacheRefresh>)> {
    match catalog.fetch_tools() {
        Ok(Some(tools)) if !tools.is_empty() => {
            let refresh = CacheRefresh::spawn(cache.clone(), tools.clone());
            return Ok((tools, Some(refresh)));
        }
        Ok(_) => debug!("catalog unavailable, falling back to {}", cache.path().display()),
        Err(e) => warn!("error fetching tool list: {e:#}; falling back to cache"),
    }
    match cache.load() {
        Ok(tools) => Ok((tools, None)),
        Err(e) => {
            debug!("tool cache unusable: {e:#}");
            Err(ToolError::CatalogUnavailable.into())
        }
    }
}
