use crate::cli::Cli;
use crate::output::Output;
use crate::platform::platform;
use anyhow::{anyhow, Context, Result};
use fs_err as fs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CATALOG_URL: &str = "https://api.pdtm.sh";
pub const DEFAULT_ORGANIZATION: &str = "projectdiscovery";
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Values accepted in the YAML flag file. Every key is optional; the
/// command line wins over whatever is set here.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub path: Option<PathBuf>,
    pub source: Option<String>,
    pub organization: Option<String>,
    pub github_api: Option<String>,
    pub disable_changelog: Option<bool>,
    pub verbose: Option<bool>,
    pub no_color: Option<bool>,
    pub silent: Option<bool>,
}

impl FileConfig {
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Some(Self::default()));
        }
        let cfg = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(Some(cfg))
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub install_path: PathBuf,
    pub uses_default_path: bool,
    pub catalog_url: String,
    pub organization: String,
    pub github_api: String,
    pub cache_path: PathBuf,
    pub disable_changelog: bool,
    pub output: Output,
}

pub fn config_dir() -> Option<PathBuf> {
    platform().home_dir().map(|h| h.join(".config").join("toolsmith"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.yaml"))
}

pub fn default_cache_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("cache.json"))
}

impl Settings {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.clone().or_else(default_config_path);
        let file = match &config_path {
            Some(p) => FileConfig::load(p)?.unwrap_or_default(),
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self> {
        let home = platform()
            .home_dir()
            .ok_or_else(|| anyhow!("failed to get user home directory"))?;
        let default_path = platform()
            .default_install_dir()
            .unwrap_or_else(|| home.join(".toolsmith").join("bin"));
        let install_path = match cli.path.clone().or(file.path) {
            Some(p) => absolutize(&expand_home(&p, &home))?,
            None => default_path.clone(),
        };
        let output = Output::new(
            cli.verbose || file.verbose.unwrap_or(false),
            cli.silent || file.silent.unwrap_or(false),
            cli.no_color || file.no_color.unwrap_or(false),
        );
        Ok(Self {
            uses_default_path: install_path == default_path,
            install_path,
            catalog_url: cli
                .source
                .clone()
                .or(file.source)
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            organization: file.organization.unwrap_or_else(|| DEFAULT_ORGANIZATION.to_string()),
            github_api: file
                .github_api
                .unwrap_or_else(|| DEFAULT_GITHUB_API.to_string())
                .trim_end_matches('/')
                .to_string(),
            cache_path: default_cache_path().unwrap_or_else(|| home.join(".config/toolsmith/cache.json")),
            disable_changelog: cli.disable_changelog || file.disable_changelog.unwrap_or(false),
            output,
        })
    }
}

fn expand_home(p: &Path, home: &Path) -> PathBuf {
    match p.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => p.to_path_buf(),
    }
}

fn absolutize(p: &Path) -> Result<PathBuf> {
    if p.is_absolute() {
        return Ok(p.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_yaml_flag_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "path: /opt/tools\nsource: https://catalog.example/\ndisable_changelog: true\nverbose: true\n",
        )
        .expect("write");
        let cfg = FileConfig::load(&path).expect("load").expect("present");
        assert_eq!(cfg.path, Some(PathBuf::from("/opt/tools")));
        assert_eq!(cfg.disable_changelog, Some(true));
        assert!(FileConfig::load(&dir.path().join("absent.yaml")).expect("load").is_none());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "path: [unclosed\n").expect("write");
        assert!(FileConfig::load(&path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn command_line_overrides_file() {
        let cli = Cli { path: Some(PathBuf::from("/srv/bin")), source: Some("http://localhost:8080/".into()), ..Cli::default() };
        let file = FileConfig {
            path: Some(PathBuf::from("/opt/tools")),
            source: Some("https://catalog.example".into()),
            no_color: Some(true),
            ..FileConfig::default()
        };
        let settings = Settings::merge(&cli, file).expect("merge");
        assert_eq!(settings.install_path, PathBuf::from("/srv/bin"));
        assert_eq!(settings.catalog_url, "http://localhost:8080");
        assert!(!settings.output.color);
        assert!(!settings.uses_default_path);
        assert_eq!(settings.organization, DEFAULT_ORGANIZATION);
    }
}
