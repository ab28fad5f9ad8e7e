use anyhow::{Context, Result};
use regex::Regex;

pub const SECTION_MARK: char = '\u{00a7}';

const PHANTOM_NAMES: [&str; 10] = [
    "]",
    "Repealed",
    "Reserved",
    "Reserved]",
    "Omitted",
    "Omitted]",
    "Transferred",
    "Transferred]",
    "Omitted or Transferred",
    "Vacant]",
];

pub fn normalize_dashes(value: &str) -> String {
    value.replace('\u{2013}', "-")
}

pub fn clean_number(raw: &str) -> Option<String> {
    let stripped = raw.replace("\u{00a7}\u{202f}", "");
    let number = normalize_dashes(stripped.trim());
    if number.is_empty() {
        return None;
    }
    Some(number)
}

pub fn clean_name(raw: &str) -> String {
    raw.trim().replace('\u{00ad}', "")
}

/// Recognizes headings of repealed, reserved, omitted, transferred and
/// renumbered entries.
#[derive(Debug)]
pub struct PhantomFilter {
    pattern: Regex,
}

impl PhantomFilter {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"^(?:Repealed.*|Transferred|Omitted|Renumbered .*\])(?:\.|$)")
            .context("failed to compile phantom heading regex")?;
        Ok(Self { pattern })
    }

    pub fn is_phantom(&self, name: &str) -> bool {
        PHANTOM_NAMES.contains(&name) || self.pattern.is_match(name)
    }
}
