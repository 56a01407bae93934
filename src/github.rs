use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, LOCATION};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::io::Read;
use std::time::Duration;
use tracing::{debug, error};

const API_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Release hosting: resolves asset ids to byte streams and fetches notes.
pub trait ReleaseSource: Send + Sync {
    fn open_asset(&self, repo: &str, asset_id: u64) -> Result<Box<dyn Read + Send>>;
    fn release_notes(&self, repo: &str, tag: &str) -> Result<Option<String>>;
}

pub struct GitHubReleases {
    api: Client,
    download: Client,
    api_base: String,
    organization: String,
    token: Option<String>,
}

impl GitHubReleases {
    pub fn new(api_base: &str, organization: &str) -> Result<Self> {
        let ua = concat!("toolsmith/", env!("CARGO_PKG_VERSION"));
        // The asset endpoint answers with a redirect to a short-lived URL;
        // it is followed by hand so the token never leaves the API host.
        let api = Client::builder()
            .timeout(API_TIMEOUT)
            .user_agent(ua)
            .redirect(Policy::none())
            .build()
            .context("building github api client")?;
        let download = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(ua)
            .build()
            .context("building download client")?;
        Ok(Self {
            api,
            download,
            api_base: api_base.trim_end_matches('/').to_string(),
            organization: organization.to_string(),
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => req.header(AUTHORIZATION, format!("Bearer {t}")),
            None => req,
        }
    }

    fn rate_limit_hint(resp: &Response) {
        let remaining = resp.headers().get("x-ratelimit-remaining").and_then(|v| v.to_str().ok());
        if remaining == Some("0") {
            let retry = resp
                .headers()
                .get("retry-after")
                .or_else(|| resp.headers().get("x-ratelimit-reset"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            error!("github api rate limit exhausted (retry after: {retry}); set GITHUB_TOKEN to raise it");
        }
    }

    fn download_url(&self, repo: &str, asset_id: u64) -> Result<DownloadTarget> {
        let url = format!(
            "{}/repos/{}/{repo}/releases/assets/{asset_id}",
            self.api_base, self.organization
        );
        let resp = self
            .authorized(self.api.get(&url).header(ACCEPT, "application/octet-stream"))
            .send()
            .with_context(|| format!("GET {url}"))?;
        if resp.status().is_redirection() {
            let location = resp
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| anyhow!("asset {asset_id} redirect without location"))?;
            return Ok(DownloadTarget::Url(location.to_string()));
        }
        if resp.status() == StatusCode::OK {
            return Ok(DownloadTarget::Body(resp));
        }
        Self::rate_limit_hint(&resp);
        Err(anyhow!("resolving asset {asset_id} of {repo} failed: {}", resp.status()))
    }
}

enum DownloadTarget {
    Url(String),
    Body(Response),
}

impl ReleaseSource for GitHubReleases {
    fn open_asset(&self, repo: &str, asset_id: u64) -> Result<Box<dyn Read + Send>> {
        match self.download_url(repo, asset_id)? {
            DownloadTarget::Body(resp) => Ok(Box::new(resp)),
            DownloadTarget::Url(url) => {
                debug!("downloading asset {asset_id} of {repo}");
                let resp = self
                    .download
                    .get(&url)
                    .send()
                    .with_context(|| format!("downloading asset {asset_id} of {repo}"))?;
                if resp.status() != StatusCode::OK {
                    return Err(anyhow!("download failed {}", resp.status()));
                }
                Ok(Box::new(resp))
            }
        }
    }

    fn release_notes(&self, repo: &str, tag: &str) -> Result<Option<String>> {
        let mut tags = vec![tag.to_string()];
        if !tag.starts_with('v') {
            tags.push(format!("v{tag}"));
        }
        for t in tags {
            let url = format!("{}/repos/{}/{repo}/releases/tags/{t}", self.api_base, self.organization);
            let resp = self
                .authorized(self.api.get(&url).header(ACCEPT, "application/vnd.github+json"))
                .send()
                .with_context(|| format!("GET {url}"))?;
            if resp.status() == StatusCode::NOT_FOUND {
                continue;
            }
            if !resp.status().is_success() {
                Self::rate_limit_hint(&resp);
                return Err(anyhow!("fetching release {t} of {repo} failed: {}", resp.status()));
            }
            let release: serde_json::Value = resp.json()?;
            return Ok(release
                .get("body")
                .and_then(|b| b.as_str())
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()));
        }
        Ok(None)
    }
}
