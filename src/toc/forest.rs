use crate::model::{PathSegment, TreeEntry};

#[derive(Debug, Default)]
pub struct Forest {
    entries: Vec<TreeEntry>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `path` into the forest. Only the last sibling at each depth is
    /// compared, so paths sharing a prefix must arrive contiguously.
    pub fn insert(&mut self, path: &[PathSegment], sections_only: bool) {
        let mut siblings = &mut self.entries;

        for segment in path {
            if sections_only && !segment.level.survives_flattening() {
                continue;
            }

            let merge = siblings
                .last()
                .is_some_and(|last| last.matches_segment(segment));
            if !merge {
                siblings.push(TreeEntry::from(segment.clone()));
            }

            let index = siblings.len() - 1;
            siblings = &mut siblings[index].subparts;
        }
    }

    pub fn extend(&mut self, entries: Vec<TreeEntry>) {
        self.entries.extend(entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn into_sorted_entries(self) -> Vec<TreeEntry> {
        let mut entries = self.entries;
        entries.sort_by_key(|entry| title_sort_key(entry.number.as_deref()));
        entries
    }
}

pub fn title_sort_key(number: Option<&str>) -> (u64, String) {
    let number = number.unwrap_or_default();
    let numeric = number
        .trim_end_matches(|ch: char| ch.is_ascii_alphabetic())
        .parse::<u64>()
        .unwrap_or(u64::MAX);

    (numeric, number.to_string())
}
