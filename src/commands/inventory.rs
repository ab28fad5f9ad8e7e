use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{info, warn};

use crate::cli::{InventoryArgs, SourceFormat};
use crate::model::{DocumentEntry, DocumentInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let source_dir = args.source.source_directory();
    let manifest = build_manifest(&source_dir, args.source.format)?;

    if args.dry_run {
        info!(
            document_count = manifest.document_count,
            format = args.source.format.as_str(),
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.source.manifest_path());

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(document_count = manifest.document_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(
    source_dir: &Path,
    format: SourceFormat,
) -> Result<DocumentInventoryManifest> {
    let mut documents = discover_titles(source_dir, format)?
        .into_iter()
        .map(|(title, path)| {
            Ok(DocumentEntry {
                sha256: sha256_file(&path)?,
                filename: file_name(&path)?,
                title,
            })
        })
        .collect::<Result<Vec<DocumentEntry>>>()?;

    if documents.is_empty() {
        bail!(
            "no {} documents found in {}",
            format.as_str(),
            source_dir.display()
        );
    }

    documents.sort_by(|a, b| a.filename.cmp(&b.filename));

    Ok(DocumentInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        format: format.as_str().to_string(),
        source_directory: source_dir.display().to_string(),
        document_count: documents.len(),
        documents,
    })
}

/// Reuses the manifest at `manifest_path` unless `force` is set or it was
/// recorded for a different source directory.
pub fn load_or_refresh(
    manifest_path: &Path,
    source_dir: &Path,
    format: SourceFormat,
    force: bool,
) -> Result<DocumentInventoryManifest> {
    if !force && manifest_path.exists() {
        let manifest = load_manifest(manifest_path)?;
        let expected = source_dir.display().to_string();

        if manifest.source_directory == expected {
            info!(
                path = %manifest_path.display(),
                document_count = manifest.document_count,
                "loaded existing inventory manifest"
            );
            return Ok(manifest);
        }

        warn!(
            path = %manifest_path.display(),
            recorded = %manifest.source_directory,
            requested = %expected,
            "inventory manifest lists another directory, rebuilding"
        );
    }

    let manifest = build_manifest(source_dir, format)?;
    write_json_pretty(manifest_path, &manifest)?;
    info!(
        path = %manifest_path.display(),
        document_count = manifest.document_count,
        "refreshed inventory manifest"
    );

    Ok(manifest)
}

pub fn load_manifest(manifest_path: &Path) -> Result<DocumentInventoryManifest> {
    let raw = fs::read(manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", manifest_path.display()))
}

pub fn select_documents(
    manifest: &DocumentInventoryManifest,
    title: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<DocumentEntry>> {
    let wanted = title.map(normalize_title_key);

    let mut documents = manifest
        .documents
        .iter()
        .filter(|document| match wanted.as_deref() {
            Some(wanted) => normalize_title_key(&document.title) == wanted,
            None => true,
        })
        .cloned()
        .collect::<Vec<DocumentEntry>>();

    if let Some(limit) = limit {
        documents.truncate(limit);
    }

    if documents.is_empty() {
        match title {
            Some(title) => bail!("no cached document for title {title}"),
            None => bail!("no cached documents selected"),
        }
    }

    Ok(documents)
}

pub fn normalize_title_key(title: &str) -> String {
    let trimmed = title.trim().to_ascii_lowercase();
    let digits_start = trimmed.trim_start_matches('0');
    if digits_start.starts_with(|ch: char| ch.is_ascii_digit()) {
        digits_start.to_string()
    } else {
        format!("0{digits_start}")
    }
}

fn title_filename_regex() -> Result<Regex> {
    Regex::new(r"(?i)^usc(\d+a?)(?:@[^.]*)?\.(?:htm|html|xml)$")
        .context("failed to compile document filename regex")
}

fn parse_title_key(filename: &str, pattern: &Regex) -> Option<String> {
    let captures = pattern.captures(filename)?;
    let raw = captures.get(1)?.as_str();
    Some(normalize_title_key(raw))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))
}

/// Title keys and paths of the `format` documents directly in `source_dir`.
fn discover_titles(source_dir: &Path, format: SourceFormat) -> Result<Vec<(String, PathBuf)>> {
    let pattern = title_filename_regex()?;
    let entries = fs::read_dir(source_dir)
        .with_context(|| format!("failed to read {}", source_dir.display()))?;

    let mut titles = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", source_dir.display()))?
            .path();

        let has_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                format
                    .extensions()
                    .iter()
                    .any(|candidate| ext.eq_ignore_ascii_case(candidate))
            });
        if !has_extension || !path.is_file() {
            continue;
        }

        let filename = file_name(&path)?;
        match parse_title_key(&filename, &pattern) {
            Some(title) => titles.push((title, path)),
            None => warn!(filename = %filename, "skipping file without a title number"),
        }
    }

    Ok(titles)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn manifest_with_titles(titles: &[&str]) -> DocumentInventoryManifest {
        let documents = titles
            .iter()
            .map(|title| DocumentEntry {
                filename: format!("usc{title}.htm"),
                title: normalize_title_key(title),
                sha256: String::new(),
            })
            .collect::<Vec<DocumentEntry>>();

        DocumentInventoryManifest {
            manifest_version: 1,
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            format: "html".to_string(),
            source_directory: "cache".to_string(),
            document_count: documents.len(),
            documents,
        }
    }

    #[test]
    fn parse_title_key_handles_padding_appendix_and_release_suffix() {
        let pattern = title_filename_regex().expect("regex should compile");

        assert_eq!(parse_title_key("usc05.htm", &pattern).as_deref(), Some("5"));
        assert_eq!(parse_title_key("USC05A.HTM", &pattern).as_deref(), Some("5a"));
        assert_eq!(
            parse_title_key("usc42@113-21.xml", &pattern).as_deref(),
            Some("42")
        );
        assert_eq!(parse_title_key("index.htm", &pattern), None);
    }

    #[test]
    fn select_documents_filters_by_normalized_title() {
        let manifest = manifest_with_titles(&["01", "05", "05a", "18"]);

        let selected = select_documents(&manifest, Some("5"), None).expect("title 5 exists");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].filename, "usc05.htm");

        let appendix = select_documents(&manifest, Some("05a"), None).expect("title 5a exists");
        assert_eq!(appendix[0].title, "5a");

        assert!(select_documents(&manifest, Some("34"), None).is_err());
    }

    #[test]
    fn select_documents_applies_limit_after_ordering() {
        let manifest = manifest_with_titles(&["01", "02", "03"]);

        let selected = select_documents(&manifest, None, Some(2)).expect("documents exist");
        let titles = selected
            .iter()
            .map(|document| document.title.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(titles, vec!["1", "2"]);
    }

    #[test]
    fn build_manifest_lists_matching_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("usc02.htm"), "<html/>").expect("write");
        fs::write(dir.path().join("usc01.htm"), "<html/>").expect("write");
        fs::write(dir.path().join("usc01.xml"), "<uscDoc/>").expect("write");
        fs::write(dir.path().join("notes.htm"), "<html/>").expect("write");

        let manifest = build_manifest(dir.path(), SourceFormat::Html).expect("manifest");
        let filenames = manifest
            .documents
            .iter()
            .map(|document| document.filename.as_str())
            .collect::<Vec<&str>>();

        assert_eq!(filenames, vec!["usc01.htm", "usc02.htm"]);
        assert_eq!(manifest.document_count, 2);
        assert_eq!(manifest.documents[0].sha256.len(), 64);
    }

    #[test]
    fn load_or_refresh_reuses_manifest_unless_forced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("xml");
        fs::create_dir_all(&source).expect("mkdir");
        fs::write(source.join("usc01.xml"), "<uscDoc/>").expect("write");
        let manifest_path = dir.path().join("manifests").join("xml_inventory.json");

        let first = load_or_refresh(&manifest_path, &source, SourceFormat::Xml, false)
            .expect("initial manifest");
        assert_eq!(first.document_count, 1);

        fs::write(source.join("usc02.xml"), "<uscDoc/>").expect("write");

        let cached = load_or_refresh(&manifest_path, &source, SourceFormat::Xml, false)
            .expect("cached manifest");
        assert_eq!(cached.document_count, 1);

        let forced = load_or_refresh(&manifest_path, &source, SourceFormat::Xml, true)
            .expect("forced manifest");
        assert_eq!(forced.document_count, 2);
    }

    #[test]
    fn load_or_refresh_rebuilds_manifest_for_another_release() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prelim = dir.path().join("xhtml").join("uscprelim");
        let dated = dir.path().join("xhtml").join("2011");
        fs::create_dir_all(&prelim).expect("mkdir");
        fs::create_dir_all(&dated).expect("mkdir");
        fs::write(prelim.join("usc01.htm"), "<html/>").expect("write");
        fs::write(dated.join("usc01.htm"), "<html/>").expect("write");
        fs::write(dated.join("usc02.htm"), "<html/>").expect("write");
        let manifest_path = dir.path().join("manifests").join("html_inventory.json");

        load_or_refresh(&manifest_path, &prelim, SourceFormat::Html, false)
            .expect("prelim manifest");
        let manifest = load_or_refresh(&manifest_path, &dated, SourceFormat::Html, false)
            .expect("dated manifest");

        assert_eq!(manifest.document_count, 2);
        assert_eq!(manifest.source_directory, dated.display().to_string());
    }

    #[test]
    fn build_manifest_fails_on_empty_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(build_manifest(dir.path(), SourceFormat::Xml).is_err());
    }
}
