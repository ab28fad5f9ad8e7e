use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Title,
    Subtitle,
    Chapter,
    Subchapter,
    Part,
    Subpart,
    Division,
    Heading,
    Section,
}

impl LevelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::Chapter => "chapter",
            Self::Subchapter => "subchapter",
            Self::Part => "part",
            Self::Subpart => "subpart",
            Self::Division => "division",
            Self::Heading => "heading",
            Self::Section => "section",
        }
    }

    /// Level words as they appear in legacy path markers (any case).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "title" => Some(Self::Title),
            "subtitle" => Some(Self::Subtitle),
            "chapter" => Some(Self::Chapter),
            "subchapter" => Some(Self::Subchapter),
            "part" => Some(Self::Part),
            "subpart" => Some(Self::Subpart),
            "division" => Some(Self::Division),
            _ => None,
        }
    }

    /// Structural element names in the schema; the generic `level` element is a heading.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "title" => Some(Self::Title),
            "subtitle" => Some(Self::Subtitle),
            "chapter" => Some(Self::Chapter),
            "subchapter" => Some(Self::Subchapter),
            "part" => Some(Self::Part),
            "subpart" => Some(Self::Subpart),
            "division" => Some(Self::Division),
            "level" => Some(Self::Heading),
            "section" => Some(Self::Section),
            _ => None,
        }
    }

    pub fn survives_flattening(self) -> bool {
        matches!(self, Self::Title | Self::Section)
    }
}

impl fmt::Display for LevelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub level: LevelKind,
    pub number: Option<String>,
    pub name: Option<String>,
    pub citation: Option<String>,
}

impl PathSegment {
    pub fn new(level: LevelKind, number: Option<String>, name: Option<String>) -> Self {
        Self {
            level,
            number,
            name,
            citation: None,
        }
    }

    pub fn heading(text: &str) -> Self {
        Self::new(LevelKind::Heading, None, Some(text.to_string()))
    }

    pub fn with_citation(mut self, citation: String) -> Self {
        self.citation = Some(citation);
        self
    }
}

// Fields stay in alphabetical order so serialized keys are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    pub level: LevelKind,
    pub name: Option<String>,
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subparts: Vec<TreeEntry>,
}

impl TreeEntry {
    pub fn matches_segment(&self, segment: &PathSegment) -> bool {
        self.level == segment.level
            && self.number == segment.number
            && self.name == segment.name
            && self.citation == segment.citation
    }
}

impl From<PathSegment> for TreeEntry {
    fn from(segment: PathSegment) -> Self {
        Self {
            citation: segment.citation,
            level: segment.level,
            name: segment.name,
            number: segment.number,
            subparts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub filename: String,
    pub title: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub format: String,
    pub source_directory: String,
    pub document_count: usize,
    pub documents: Vec<DocumentEntry>,
}
