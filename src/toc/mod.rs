mod citation;
mod forest;
mod normalize;

pub use citation::{CitationScope, section_citation};
pub use forest::Forest;
pub use normalize::{PhantomFilter, SECTION_MARK, clean_name, clean_number, normalize_dashes};
