use tracing::warn;

use crate::domain::{DetectorMap, FormatTag, RawExport};

/// Both markers must appear somewhere in the export for it to be accepted.
pub const INSTRUMENT_MARKER: &str = "Applied Biosystems 7300 Real-Time PCR System";
pub const VERSION_MARKER: &str = "SDS v1.4";

/// A detector name case-insensitively equal to this is a reference candidate.
pub const REFERENCE_MARKER: &str = "mock";

/// Blank-line-delimited section holding the detector table in SDS v1.4
/// reports, and the 0-based field index of the detector name within a row.
const DETECTOR_SECTION: usize = 11;
const DETECTOR_FIELD: usize = 3;

/// Decodes an instrument export into its detector table.
///
/// Recognition failure is silent: an export missing either required marker
/// yields an empty map, never an error. Detector rows with fewer than four
/// comma-separated fields are skipped with a warning. Pure function of its
/// inputs, safe to call from any thread.
pub fn parse(tag: FormatTag, raw: &RawExport) -> DetectorMap {
    match tag {
        FormatTag::Ab7300 => parse_ab7300(raw),
    }
}

fn parse_ab7300(raw: &RawExport) -> DetectorMap {
    if !is_recognized(raw) {
        return DetectorMap::new();
    }

    let (_, detectors) = raw
        .lines()
        .fold((1usize, DetectorMap::new()), |(section, mut map), line| {
            if line.is_empty() {
                return (section + 1, map);
            }
            if section == DETECTOR_SECTION {
                match line.split(',').nth(DETECTOR_FIELD) {
                    Some(name) => {
                        map.insert(name, name.eq_ignore_ascii_case(REFERENCE_MARKER));
                    }
                    None => {
                        warn!(line, "detector row has fewer than 4 fields, skipping");
                    }
                }
            }
            (section, map)
        });

    detectors
}

fn is_recognized(raw: &RawExport) -> bool {
    let text = raw.as_str();
    text.contains(INSTRUMENT_MARKER) && text.contains(VERSION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognition_requires_both_markers() {
        assert!(!is_recognized(&RawExport::new(INSTRUMENT_MARKER)));
        assert!(!is_recognized(&RawExport::new(VERSION_MARKER)));
        assert!(is_recognized(&RawExport::new(format!(
            "{INSTRUMENT_MARKER}\n{VERSION_MARKER}"
        ))));
    }
}
