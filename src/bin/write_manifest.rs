//! Manifest utility for Cardiorisk model artifacts.
//!
//! Hashes the exported artifact files and writes `manifest.json` next to them,
//! so the server can detect tampered or mismatched files at load time.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin write_manifest -- <model_dir> [--verify]
//! ```
//!
//! With `--verify`, the directory is loaded exactly as the server would load it
//! after the manifest is written.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use cardiorisk::adapters::logistic::{sha256_hex, ModelManifest, ARTIFACT_FILES, MANIFEST_FILE};
use cardiorisk::adapters::LogisticModel;
use cardiorisk::ports::RiskModel;

fn usage() -> &'static str {
    "Usage: write_manifest <model_dir> [--verify]"
}

fn parse_args() -> Result<(PathBuf, bool)> {
    let mut model_dir: Option<PathBuf> = None;
    let mut verify = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--verify" => verify = true,
            "-h" | "--help" => bail!(usage()),
            _ if model_dir.is_none() => model_dir = Some(PathBuf::from(arg)),
            _ => bail!(usage()),
        }
    }

    let model_dir = model_dir.context(usage())?;
    Ok((model_dir, verify))
}

fn main() -> Result<()> {
    let (model_dir, verify) = parse_args()?;

    let mut files = BTreeMap::new();
    for name in ARTIFACT_FILES {
        let path = model_dir.join(name);
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {path:?}"))?;
        files.insert(name.to_string(), sha256_hex(&bytes));
    }

    let manifest = ModelManifest {
        version: 1,
        created_at: Some(chrono::Utc::now().timestamp()),
        files,
    };
    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;
    println!("Wrote manifest: {manifest_path:?}");

    if verify {
        let model = LogisticModel::load(&model_dir).context("Verification failed")?;
        println!(
            "Verified '{}' (sha256={})",
            model.name(),
            model.metadata().artifact_sha256.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
