use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("section heading without a preceding citation path: {heading:?}")]
    MalformedMarker { heading: String },

    #[error("unparsable citation-path segment {segment:?} in marker {marker:?}")]
    UnparsablePathSegment { segment: String, marker: String },

    #[error("unparsable section heading: {heading:?}")]
    UnparsableHeading { heading: String },

    #[error("document has no main/title element")]
    MissingTitleElement,
}
