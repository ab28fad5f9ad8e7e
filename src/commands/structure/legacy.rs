use anyhow::{Context, Result};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use tracing::debug;

use crate::error::StructureError;
use crate::model::{LevelKind, PathSegment};
use crate::toc::{Forest, SECTION_MARK, normalize_dashes, section_citation};

use super::run::{ExtractStats, TitleExtractor};

const PATH_DELIMITER: &str = "!@!";
const MARKER_PREFIX: &str = "expcite:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum LegacyNode {
    Marker(String),
    Heading(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum MarkerPath {
    Path(Vec<PathSegment>),
    Phantom,
}

#[derive(Debug, Default)]
enum PathState {
    #[default]
    Empty,
    Path(Vec<PathSegment>),
    Phantom,
}

pub(super) struct LegacyExtractor {
    phantom_segment: Regex,
    level_segment: Regex,
    section_segment: Regex,
    placeholder_heading: Regex,
    section_heading: Regex,
    sections_only: bool,
}

impl LegacyExtractor {
    pub(super) fn new(sections_only: bool) -> Result<Self> {
        Ok(Self {
            phantom_segment: Regex::new(
                r"(?i)^\[.*-(?:REPEALED|RESERVED|OMITTED|TRANSFERRED)\]\s*$",
            )
            .context("failed to compile phantom segment regex")?,
            level_segment: Regex::new(
                r"(?i)^(TITLE|SUBTITLE|CHAPTER|SUBCHAPTER|PART|SUBPART|DIVISION) ([^-]+)-(.*)$",
            )
            .context("failed to compile level segment regex")?,
            section_segment: Regex::new(r"(?i)^Secs?\. ")
                .context("failed to compile section segment regex")?,
            placeholder_heading: Regex::new(
                r"^§§?(.*?)\. (?:Repealed.*|Transferred|Omitted)(?:\.|$)",
            )
            .context("failed to compile placeholder heading regex")?,
            section_heading: Regex::new(r"^§(.*?)\.? (.*)")
                .context("failed to compile section heading regex")?,
            sections_only,
        })
    }

    pub(super) fn parse_marker(&self, marker: &str) -> Result<MarkerPath, StructureError> {
        let descriptors = marker.split(PATH_DELIMITER).collect::<Vec<&str>>();
        let last_index = descriptors.len() - 1;
        let mut path = Vec::with_capacity(descriptors.len());

        for (index, descriptor) in descriptors.iter().enumerate() {
            if self.phantom_segment.is_match(descriptor) {
                return Ok(MarkerPath::Phantom);
            }

            if let Some(captures) = self.level_segment.captures(descriptor) {
                let level = LevelKind::from_keyword(&captures[1]).ok_or_else(|| {
                    StructureError::UnparsablePathSegment {
                        segment: descriptor.to_string(),
                        marker: marker.to_string(),
                    }
                })?;
                let number = normalize_dashes(&captures[2]);
                let name = captures[3].to_string();

                if index == 0 && level == LevelKind::Title {
                    path.push(appendix_title(number, name));
                } else {
                    path.push(PathSegment::new(level, Some(number), Some(name)));
                }
                continue;
            }

            if self.section_segment.is_match(descriptor) {
                // The heading that follows carries the section number and name.
                if index == last_index {
                    continue;
                }
                return Err(StructureError::UnparsablePathSegment {
                    segment: descriptor.to_string(),
                    marker: marker.to_string(),
                });
            }

            path.push(PathSegment::heading(descriptor));
        }

        Ok(MarkerPath::Path(path))
    }

    /// `None` for repealed, transferred and omitted placeholders.
    pub(super) fn parse_section_heading(
        &self,
        heading: &str,
        title: &str,
    ) -> Result<Option<PathSegment>, StructureError> {
        if self.placeholder_heading.is_match(heading) {
            return Ok(None);
        }

        let heading = normalize_dashes(heading);
        let captures = self.section_heading.captures(&heading).ok_or_else(|| {
            StructureError::UnparsableHeading {
                heading: heading.clone(),
            }
        })?;

        let number = captures[1].to_string();
        let name = captures[2].to_string();
        let citation = section_citation(title, &number);

        Ok(Some(
            PathSegment::new(LevelKind::Section, Some(number), Some(name)).with_citation(citation),
        ))
    }

    pub(super) fn extract_nodes(
        &self,
        nodes: &[LegacyNode],
        title: &str,
        forest: &mut Forest,
    ) -> Result<ExtractStats> {
        let mut stats = ExtractStats::default();
        let mut state = PathState::Empty;

        for node in nodes {
            match node {
                LegacyNode::Marker(marker) => {
                    state = match self.parse_marker(marker)? {
                        // A lone `Sec.` component leaves nothing to nest under.
                        MarkerPath::Path(path) if path.is_empty() => PathState::Empty,
                        MarkerPath::Path(path) => PathState::Path(path),
                        MarkerPath::Phantom => PathState::Phantom,
                    };
                }
                LegacyNode::Heading(heading) => {
                    if !heading.starts_with(SECTION_MARK) {
                        continue;
                    }

                    match std::mem::take(&mut state) {
                        PathState::Empty => {
                            return Err(StructureError::MalformedMarker {
                                heading: heading.clone(),
                            }
                            .into());
                        }
                        PathState::Phantom => {
                            debug!(heading = %heading, "skipping section under phantom path");
                            stats.phantoms_skipped += 1;
                        }
                        PathState::Path(mut path) => {
                            match self.parse_section_heading(heading, title)? {
                                Some(section) => {
                                    path.push(section);
                                    forest.insert(&path, self.sections_only);
                                    stats.entries_inserted += 1;
                                }
                                None => {
                                    debug!(heading = %heading, "skipping placeholder section");
                                    stats.phantoms_skipped += 1;
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(stats)
    }
}

impl TitleExtractor for LegacyExtractor {
    fn extract(&self, document: &str, title: &str, forest: &mut Forest) -> Result<ExtractStats> {
        let nodes = read_legacy_nodes(document)?;
        debug!(title = %title, nodes = nodes.len(), "read legacy markup nodes");
        self.extract_nodes(&nodes, title, forest)
    }
}

fn appendix_title(number: String, name: String) -> PathSegment {
    if number.contains(", APPENDIX") {
        return PathSegment::new(
            LevelKind::Title,
            Some(number.replace(", APPENDIX", "a")),
            Some(format!("{name} (APPENDIX)")),
        );
    }

    if name == "APPENDIX" {
        return PathSegment::new(LevelKind::Title, Some(format!("{number}a")), Some(name));
    }

    PathSegment::new(LevelKind::Title, Some(number), Some(name))
}

/// Markers and `h3` headings found directly inside the first `div` of `body`.
pub(super) fn read_legacy_nodes(markup: &str) -> Result<Vec<LegacyNode>> {
    let dom = parse_document(RcDom::default(), Default::default()).one(markup);

    let content = child_element(&dom.document, "html")
        .and_then(|html| child_element(&html, "body"))
        .and_then(|body| child_element(&body, "div"))
        .context("markup has no content division under body")?;

    let mut nodes = Vec::new();
    for child in content.children.borrow().iter() {
        match &child.data {
            NodeData::Comment { contents } => {
                if let Some(marker) = marker_payload(contents) {
                    nodes.push(LegacyNode::Marker(marker));
                }
            }
            NodeData::Element { name, .. } if &*name.local == "h3" => {
                let mut text = String::new();
                collect_text(child, &mut text);
                nodes.push(LegacyNode::Heading(text));
            }
            _ => {}
        }
    }

    Ok(nodes)
}

fn child_element(parent: &Handle, tag: &str) -> Option<Handle> {
    parent
        .children
        .borrow()
        .iter()
        .find(|child| matches!(&child.data, NodeData::Element { name, .. } if &*name.local == tag))
        .cloned()
}

fn collect_text(node: &Handle, out: &mut String) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } => collect_text(child, out),
            _ => {}
        }
    }
}

fn marker_payload(comment: &str) -> Option<String> {
    let payload = comment.trim_start().strip_prefix(MARKER_PREFIX)?.trim_end();
    if payload.is_empty() {
        return None;
    }
    Some(decode_entities(&payload.replace("&nbsp;", " ")))
}

/// Comment bodies keep their character references, so they are run back
/// through the HTML tokenizer as paragraph text. Unknown references and bare
/// ampersands come through unchanged.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let fragment = format!("<body><p>{}</p></body>", raw.replace('<', "&lt;"));
    let dom = parse_document(RcDom::default(), Default::default()).one(fragment);

    let mut text = String::new();
    collect_text(&dom.document, &mut text);
    text
}
