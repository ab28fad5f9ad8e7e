use anyhow::Result;
use tracing::debug;

use crate::error::StructureError;
use crate::model::{LevelKind, TreeEntry};
use crate::toc::{CitationScope, Forest, PhantomFilter, clean_name, clean_number};

use super::run::{ExtractStats, TitleExtractor};
use super::xml_tree::{XmlElement, parse_xml_document};

pub(super) struct UslmExtractor {
    phantoms: PhantomFilter,
    sections_only: bool,
}

impl UslmExtractor {
    pub(super) fn new(sections_only: bool) -> Result<Self> {
        Ok(Self {
            phantoms: PhantomFilter::new()?,
            sections_only,
        })
    }

    /// Entries contributed by `element`: none for a phantom, its children when
    /// flattening drops its level, otherwise the entry itself.
    pub(super) fn build_entries(
        &self,
        element: &XmlElement,
        level: LevelKind,
        scope: &CitationScope,
        stats: &mut ExtractStats,
    ) -> Vec<TreeEntry> {
        let number = clean_number(
            element
                .child("num")
                .and_then(|num| num.attribute("value"))
                .unwrap_or_default(),
        );
        let name = clean_name(&heading_text(element));

        if self.phantoms.is_phantom(&name) {
            debug!(level = %level, name = %name, "skipping phantom entry");
            stats.phantoms_skipped += 1;
            return Vec::new();
        }

        let scope = scope.descend(level, number.as_deref());
        let citation = scope.citation_for(level, number.as_deref());

        // Sections can carry section-like children; they are never structure.
        let subparts = if level == LevelKind::Section {
            Vec::new()
        } else {
            element
                .child_elements()
                .filter_map(|child| LevelKind::from_tag(&child.name).map(|kind| (child, kind)))
                .flat_map(|(child, kind)| self.build_entries(child, kind, &scope, stats))
                .collect::<Vec<TreeEntry>>()
        };

        if self.sections_only && !level.survives_flattening() {
            return subparts;
        }

        stats.entries_inserted += 1;
        vec![TreeEntry {
            citation,
            level,
            name: Some(name),
            number,
            subparts,
        }]
    }
}

impl TitleExtractor for UslmExtractor {
    fn extract(&self, document: &str, title: &str, forest: &mut Forest) -> Result<ExtractStats> {
        let root = parse_xml_document(document)?;
        let title_element = root
            .child("main")
            .and_then(|main| main.child("title"))
            .ok_or(StructureError::MissingTitleElement)?;

        debug!(title = %title, "walking structured title element");

        let mut stats = ExtractStats::default();
        let entries = self.build_entries(
            title_element,
            LevelKind::Title,
            &CitationScope::new(),
            &mut stats,
        );
        forest.extend(entries);

        Ok(stats)
    }
}

fn heading_text(element: &XmlElement) -> String {
    match element.child("heading") {
        Some(heading) => {
            let mut heading = heading.clone();
            heading.strip_footnotes();
            heading.text_content()
        }
        None => String::new(),
    }
}
