use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::builder::ExtensionPackage;

/// Persists a built package as an extension directory: `manifest.json` plus
/// every asset by name. The destination is wiped and recreated on each
/// write, so repeated conversions are idempotent.
pub struct ExtensionWriter {
    dest: PathBuf,
}

impl ExtensionWriter {
    pub fn new(dest: impl AsRef<Path>) -> Self {
        Self {
            dest: dest.as_ref().to_path_buf(),
        }
    }

    pub fn write(&self, package: &ExtensionPackage) -> Result<()> {
        match fs::remove_dir_all(&self.dest) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to clear destination {}", self.dest.display())
                });
            }
        }
        fs::create_dir_all(&self.dest)
            .with_context(|| format!("Failed to create destination {}", self.dest.display()))?;

        let manifest_json = serde_json::to_string_pretty(&package.manifest)
            .context("Failed to serialize manifest to JSON")?;
        self.write_file("manifest.json", &manifest_json)?;

        for asset in &package.assets {
            self.write_file(&asset.name, &asset.content)?;
        }

        Ok(())
    }

    fn write_file(&self, name: &str, content: &str) -> Result<()> {
        let path = self.dest.join(name);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Asset;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn package() -> ExtensionPackage {
        let manifest = match json!({ "manifest_version": 2, "name": "t" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        ExtensionPackage {
            manifest,
            assets: vec![
                Asset::new("jquery.min.js", "jq"),
                Asset::new("1.js", "main"),
            ],
        }
    }

    #[test]
    fn test_writes_manifest_and_assets() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("ext");

        ExtensionWriter::new(&dest).write(&package()).unwrap();

        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(dest.join("manifest.json")).unwrap())
                .unwrap();
        assert_eq!(manifest["name"], json!("t"));
        assert_eq!(fs::read_to_string(dest.join("jquery.min.js")).unwrap(), "jq");
        assert_eq!(fs::read_to_string(dest.join("1.js")).unwrap(), "main");
    }

    #[test]
    fn test_preexisting_destination_is_replaced() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("ext");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.js"), "old").unwrap();

        ExtensionWriter::new(&dest).write(&package()).unwrap();

        assert!(!dest.join("stale.js").exists());
        assert!(dest.join("manifest.json").exists());
    }
}
