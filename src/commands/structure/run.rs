use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::{SourceFormat, StructureArgs};
use crate::commands::inventory;
use crate::toc::Forest;
use crate::util::{read_document, write_json_to};

use super::legacy::LegacyExtractor;
use super::uslm::UslmExtractor;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct ExtractStats {
    pub entries_inserted: usize,
    pub phantoms_skipped: usize,
}

pub(super) trait TitleExtractor {
    fn extract(&self, document: &str, title: &str, forest: &mut Forest) -> Result<ExtractStats>;
}

pub fn run(args: StructureArgs) -> Result<()> {
    let stdout = io::stdout();
    run_with_output(args, &mut stdout.lock())
}

/// Nothing reaches `output` unless every selected document was extracted.
pub(super) fn run_with_output<W: Write>(args: StructureArgs, output: &mut W) -> Result<()> {
    let source_dir = args.source.source_directory();
    let manifest = inventory::load_or_refresh(
        &args.source.manifest_path(),
        &source_dir,
        args.source.format,
        args.force,
    )?;
    let documents = inventory::select_documents(&manifest, args.title.as_deref(), args.limit)?;

    let extractor = build_extractor(args.source.format, args.sections)?;

    info!(
        format = args.source.format.as_str(),
        documents = documents.len(),
        sections_only = args.sections,
        "starting structure extraction"
    );

    let mut forest = Forest::new();
    for document in &documents {
        info!(title = %document.title, "processing title");

        let path = source_dir.join(&document.filename);
        let raw = read_document(&path)?;
        let stats = extractor
            .extract(&raw, &document.title, &mut forest)
            .with_context(|| format!("failed to extract structure from {}", path.display()))?;

        debug!(
            title = %document.title,
            entries = stats.entries_inserted,
            phantoms = stats.phantoms_skipped,
            titles = forest.len(),
            "title processed"
        );
    }

    let entries = forest.into_sorted_entries();

    if args.debug {
        info!(titles = entries.len(), "dry run only, not outputting");
        return Ok(());
    }

    write_json_to(output, &entries)
}

pub(super) fn build_extractor(
    format: SourceFormat,
    sections_only: bool,
) -> Result<Box<dyn TitleExtractor>> {
    let extractor: Box<dyn TitleExtractor> = match format {
        SourceFormat::Html => Box::new(LegacyExtractor::new(sections_only)?),
        SourceFormat::Xml => Box::new(UslmExtractor::new(sections_only)?),
    };
    Ok(extractor)
}
