use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::QpcrError;

/// Export format selector. Only the AB7300 SDS v1.4 report is supported;
/// unknown tags are rejected at the string boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Ab7300,
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTag::Ab7300 => write!(f, "ab7300"),
        }
    }
}

impl FromStr for FormatTag {
    type Err = QpcrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "ab7300" => Ok(FormatTag::Ab7300),
            _ => Err(QpcrError::InvalidFormatTag(value.to_string())),
        }
    }
}

/// Instrument export text, line-ending normalized at construction.
/// No validation happens here; recognition is the parser's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExport(String);

impl RawExport {
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into().replace("\r\n", "\n"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Splits on the normalized newline. Unlike `str::lines` this keeps
    /// every empty line, which the section counter depends on.
    pub fn lines(&self) -> std::str::Split<'_, char> {
        self.0.split('\n')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detector {
    pub name: String,
    pub is_reference_candidate: bool,
}

/// Detector name -> reference-candidate flag, preserving first-insertion
/// order for display stability. Re-inserting a name overwrites its flag in
/// place. Detector tables are tens of rows, so lookups are linear scans.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectorMap(Vec<Detector>);

impl DetectorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, is_reference_candidate: bool) {
        if let Some(existing) = self.0.iter_mut().find(|d| d.name == name) {
            existing.is_reference_candidate = is_reference_candidate;
        } else {
            self.0.push(Detector {
                name: name.to_string(),
                is_reference_candidate,
            });
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.0
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.is_reference_candidate)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detector> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|d| d.name.as_str())
    }

    /// The auto-suggested reference detector: the last candidate in
    /// insertion order, mirroring the overwrite semantics of the source
    /// format (multiple case variants of the marker may coexist as
    /// distinct names).
    pub fn suggested_reference(&self) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|d| d.is_reference_candidate)
            .map(|d| d.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn format_tag_round_trip() {
        let tag: FormatTag = "ab7300".parse().unwrap();
        assert_eq!(tag, FormatTag::Ab7300);
        assert_eq!(tag.to_string(), "ab7300");
    }

    #[test]
    fn format_tag_unknown() {
        let err = "sds22".parse::<FormatTag>().unwrap_err();
        assert_matches!(err, QpcrError::InvalidFormatTag(_));
    }

    #[test]
    fn raw_export_normalizes_crlf() {
        let raw = RawExport::new("a\r\nb\r\n\r\nc");
        assert_eq!(raw.as_str(), "a\nb\n\nc");
        assert_eq!(raw.lines().count(), 4);
    }

    #[test]
    fn detector_map_overwrites_in_place() {
        let mut map = DetectorMap::new();
        map.insert("GeneA", false);
        map.insert("Mock", true);
        map.insert("GeneA", false);
        assert_eq!(map.len(), 2);
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["GeneA", "Mock"]);
    }

    #[test]
    fn suggested_reference_last_candidate_wins() {
        let mut map = DetectorMap::new();
        map.insert("Mock", true);
        map.insert("GeneA", false);
        map.insert("MOCK", true);
        assert_eq!(map.suggested_reference(), Some("MOCK"));
    }
}
