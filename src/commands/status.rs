use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{StatusArgs, manifest_directory};
use crate::commands::inventory::load_manifest;

pub fn run(args: StatusArgs) -> Result<()> {
    info!(cache_root = %args.cache_root.display(), "status requested");

    let directory = manifest_directory(&args.cache_root);
    if !directory.is_dir() {
        warn!(path = %directory.display(), "no inventory manifests yet");
        return Ok(());
    }

    let manifests = list_manifests(&directory)?;
    if manifests.is_empty() {
        warn!(path = %directory.display(), "no inventory manifests yet");
    }

    for manifest_path in manifests {
        let manifest = load_manifest(&manifest_path)?;
        let titles = manifest
            .documents
            .iter()
            .map(|document| document.title.as_str())
            .collect::<Vec<&str>>()
            .join(",");

        info!(
            format = %manifest.format,
            generated_at = %manifest.generated_at,
            source = %manifest.source_directory,
            document_count = manifest.document_count,
            titles = %titles,
            "loaded inventory manifest"
        );
    }

    Ok(())
}

fn list_manifests(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(directory)
        .with_context(|| format!("failed to read {}", directory.display()))?;

    let mut manifests = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", directory.display()))?
            .path();
        let is_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with("_inventory.json"));
        if is_manifest {
            manifests.push(path);
        }
    }

    manifests.sort();
    Ok(manifests)
}
