use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::ConvertError;

static REMOTE_JS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.*/(.*\.js)").unwrap());

/// A resolved script destined for the output package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub content: String,
}

impl Asset {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Resolves directive values into assets. The builder only depends on this
/// trait, so tests can substitute canned content for network and disk.
pub trait AssetResolver {
    /// Fetch a `@require` dependency. Returns `Ok(None)` when the value is
    /// not an http(s) URL ending in a `.js` segment; such values produce no
    /// asset. A failed fetch of a recognized URL is an error.
    fn fetch_remote(&self, url: &str) -> Result<Option<Asset>>;

    /// Load the local helper for a `@grant` API identifier. Missing helpers
    /// are a hard failure.
    fn fetch_grant(&self, api: &str) -> Result<Asset>;
}

/// The production resolver: blocking HTTP for dependencies, a configured
/// search directory for grant helpers. The grants directory is an explicit
/// constructor parameter with no default.
pub struct HttpAssetResolver {
    grants_dir: PathBuf,
    client: reqwest::blocking::Client,
}

impl HttpAssetResolver {
    pub fn new(grants_dir: impl AsRef<Path>) -> Self {
        Self {
            grants_dir: grants_dir.as_ref().to_path_buf(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// The helper file name for a grant API, e.g. `grantGM_getValue.js`.
    pub fn grant_asset_name(api: &str) -> String {
        format!("grant{}.js", api)
    }
}

impl AssetResolver for HttpAssetResolver {
    fn fetch_remote(&self, url: &str) -> Result<Option<Asset>> {
        let Some(captures) = REMOTE_JS.captures(url) else {
            return Ok(None);
        };
        let name = captures[1].to_string();

        let content = self
            .client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::text)
            .with_context(|| format!("Failed to fetch remote script from {}", url))?;

        Ok(Some(Asset { name, content }))
    }

    fn fetch_grant(&self, api: &str) -> Result<Asset> {
        let name = Self::grant_asset_name(api);
        let path = self.grants_dir.join(&name);
        if !path.exists() {
            return Err(ConvertError::GrantNotFound {
                api: api.to_string(),
                path,
            }
            .into());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read grant helper {}", path.display()))?;

        Ok(Asset { name, content })
    }
}
