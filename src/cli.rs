use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::builder::PackageBuilder;
use crate::metadata::DirectiveMapping;
use crate::resolver::{Asset, HttpAssetResolver};
use crate::writer::ExtensionWriter;

#[derive(Parser)]
#[command(name = "greasepack")]
#[command(about = "Convert userscripts with metadata headers into browser extension packages")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a userscript into an extension package
    Convert {
        /// Path to the source userscript
        #[arg(long)]
        source: PathBuf,

        /// Destination directory for the extension package
        #[arg(long)]
        dest: PathBuf,

        /// Optional predefined manifest (JSON) merged with highest priority
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Directory searched for grant helper scripts
        #[arg(long, default_value = "grants")]
        grants_dir: PathBuf,
    },

    /// Inspect the grant helper setup
    Doctor {
        /// Directory searched for grant helper scripts
        #[arg(long, default_value = "grants")]
        grants_dir: PathBuf,
    },
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            source,
            dest,
            manifest,
            grants_dir,
        } => convert_command(source, dest, manifest, grants_dir),
        Commands::Doctor { grants_dir } => doctor_command(grants_dir),
    }
}

fn convert_command(
    source: PathBuf,
    dest: PathBuf,
    manifest: Option<PathBuf>,
    grants_dir: PathBuf,
) -> Result<()> {
    let script = read_script(&source)?;
    let predefined = manifest.as_deref().map(read_predefined).transpose()?;

    let directives = DirectiveMapping::parse(&script.content);
    if directives.is_empty() {
        println!("Warning: no userscript header found in {}", source.display());
    }

    let resolver = HttpAssetResolver::new(&grants_dir);
    let builder = PackageBuilder::new(&resolver);
    let package = builder
        .build(&directives, script, predefined.as_ref())
        .context("Failed to build extension package")?;

    println!("Built manifest with {} assets", package.assets.len());

    ExtensionWriter::new(&dest)
        .write(&package)
        .context("Failed to write extension package")?;

    println!("Convert finished: {}", dest.display());

    Ok(())
}

fn read_script(source: &Path) -> Result<Asset> {
    let content = fs::read_to_string(source)
        .with_context(|| format!("Failed to read source script {}", source.display()))?;
    let name = source
        .file_name()
        .ok_or_else(|| anyhow!("Source path has no file name: {}", source.display()))?
        .to_string_lossy()
        .into_owned();
    Ok(Asset { name, content })
}

fn read_predefined(path: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read predefined manifest {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse predefined manifest {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow!(
            "Predefined manifest {} must be a JSON object",
            path.display()
        )),
    }
}

fn doctor_command(grants_dir: PathBuf) -> Result<()> {
    println!("Greasepack Doctor - Checking grant helper setup...\n");

    if !grants_dir.is_dir() {
        println!("✗ Grants directory not found: {}", grants_dir.display());
        println!("  Create it and add grant<API>.js helpers, or pass --grants-dir");
        return Err(anyhow!(
            "Grants directory {} does not exist",
            grants_dir.display()
        ));
    }

    println!("✓ Grants directory: {}", grants_dir.display());

    let mut helpers: Vec<String> = fs::read_dir(&grants_dir)
        .with_context(|| format!("Failed to list {}", grants_dir.display()))?
        .filter_map(|entry| {
            let name = entry.ok()?.file_name().to_string_lossy().into_owned();
            (name.starts_with("grant") && name.ends_with(".js")).then_some(name)
        })
        .collect();
    helpers.sort();

    if helpers.is_empty() {
        println!("  No grant helpers found (scripts using @grant will fail to convert)");
    } else {
        println!("  {} grant helper(s) available:", helpers.len());
        for helper in &helpers {
            let api = helper
                .strip_prefix("grant")
                .and_then(|rest| rest.strip_suffix(".js"))
                .unwrap_or(helper);
            println!("    {} -> {}", api, helper);
        }
    }

    println!("\n✓ Greasepack doctor check complete");

    Ok(())
}
