use crate::model::LevelKind;

pub fn citation_title(title: &str) -> &str {
    let trimmed = title.trim_start_matches('0');
    if trimmed.is_empty() || !trimmed.starts_with(|ch: char| ch.is_ascii_digit()) {
        return title;
    }
    trimmed
}

pub fn section_citation(title: &str, number: &str) -> String {
    format!("usc/{}/{}", citation_title(title), number)
}

pub fn chapter_citation(title: &str, number: &str) -> String {
    format!("usc/title/{}/chapter/{}", citation_title(title), number)
}

/// Numbered levels on the way down from a title. `None` marks an unnumbered
/// ancestor, below which positional citations cannot be formed.
#[derive(Debug, Clone, Default)]
pub struct CitationScope {
    steps: Vec<Option<(LevelKind, String)>>,
}

impl CitationScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descend(&self, level: LevelKind, number: Option<&str>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(number.map(|number| (level, number.to_string())));
        Self { steps }
    }

    pub fn title_number(&self) -> Option<&str> {
        self.steps
            .first()
            .and_then(|step| step.as_ref())
            .map(|(_, number)| number.as_str())
    }

    pub fn has_unnumbered_step(&self) -> bool {
        self.steps.iter().any(Option::is_none)
    }

    /// Citation for the entry that produced the last step of this scope.
    pub fn citation_for(&self, level: LevelKind, number: Option<&str>) -> Option<String> {
        match level {
            LevelKind::Section => Some(section_citation(self.title_number()?, number?)),
            LevelKind::Chapter => Some(chapter_citation(self.title_number()?, number?)),
            _ if self.has_unnumbered_step() => None,
            _ => {
                let pairs = self
                    .steps
                    .iter()
                    .flatten()
                    .map(|(level, number)| format!("{level}/{number}"))
                    .collect::<Vec<String>>();
                Some(format!("usc/{}", pairs.join("/")))
            }
        }
    }
}
