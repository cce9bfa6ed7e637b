use anyhow::Result;
use serde_json::{Map, Value, json};

use crate::error::ConvertError;
use crate::merge::{merge, merge_with_passthrough};
use crate::metadata::DirectiveMapping;
use crate::resolver::{Asset, AssetResolver};

/// The finished conversion: a manifest ready to serialize plus every script
/// asset in the order the content script must load them.
#[derive(Debug, Clone)]
pub struct ExtensionPackage {
    pub manifest: Map<String, Value>,
    pub assets: Vec<Asset>,
}

pub struct PackageBuilder<'a, R: AssetResolver> {
    resolver: &'a R,
}

impl<'a, R: AssetResolver> PackageBuilder<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    /// Assemble the manifest and ordered asset list for one userscript.
    ///
    /// Asset order is significant and mirrors directive declaration order:
    /// `@require` dependencies first, then `@grant` helpers, then the main
    /// script itself. The manifest starts from a generated base, takes the
    /// directive mapping as an overlay, and finally the predefined overlay
    /// (which also passes unknown keys through).
    pub fn build(
        &self,
        directives: &DirectiveMapping,
        script: Asset,
        predefined: Option<&Map<String, Value>>,
    ) -> Result<ExtensionPackage> {
        let mut assets = Vec::new();
        for url in directives.values("require") {
            // Non-URL values are silently skipped, matching the historical
            // behavior for local-looking @require entries.
            if let Some(asset) = self.resolver.fetch_remote(url)? {
                assets.push(asset);
            }
        }
        for api in directives.values("grant") {
            assets.push(self.resolver.fetch_grant(api)?);
        }

        let mut manifest = self.base_manifest(directives, &assets, &script.name)?;

        merge(&mut manifest, &directives.to_json());
        if let Some(predefined) = predefined {
            merge_with_passthrough(&mut manifest, predefined);
        }
        normalize_manifest_version(&mut manifest);

        assets.push(script);
        Ok(ExtensionPackage { manifest, assets })
    }

    fn base_manifest(
        &self,
        directives: &DirectiveMapping,
        resolved: &[Asset],
        script_name: &str,
    ) -> Result<Map<String, Value>> {
        let name = required(directives, "name")?;
        let description = required(directives, "description")?;
        let version = required(directives, "version")?;
        let matches = directives.values("match");
        if matches.is_empty() {
            return Err(ConvertError::MissingField { field: "match" }.into());
        }

        let mut js: Vec<&str> = resolved.iter().map(|asset| asset.name.as_str()).collect();
        js.push(script_name);

        let manifest = json!({
            "manifest_version": 2,
            "name": name,
            "description": description,
            "version": version,
            "content_scripts": [{
                "matches": matches,
                "js": js,
                "run_at": "document_end",
                "all_frames": true,
            }],
            "permissions": matches,
        });
        match manifest {
            Value::Object(map) => Ok(map),
            _ => unreachable!(),
        }
    }
}

fn required<'m>(directives: &'m DirectiveMapping, field: &'static str) -> Result<&'m str> {
    directives
        .scalar(field)
        .ok_or_else(|| ConvertError::MissingField { field }.into())
}

/// Merging can leave `manifest_version` as a string (directive values are
/// always strings). Settle on a single numeric representation here rather
/// than coercing at every consumer.
fn normalize_manifest_version(manifest: &mut Map<String, Value>) {
    if let Some(value) = manifest.get_mut("manifest_version") {
        if let Value::String(s) = value {
            if let Ok(n) = s.trim().parse::<u64>() {
                *value = Value::from(n);
            }
        }
    }
}
