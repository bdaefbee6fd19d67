use qpcrbox::domain::{FormatTag, RawExport};
use qpcrbox::parser;

/// Builds a recognized SDS v1.4 export whose detector table (section 11)
/// holds the given rows. Sections are delimited by blank lines and the
/// counter starts at 1, so ten blank lines precede the table.
fn export_with_rows(rows: &[&str]) -> RawExport {
    let mut lines = vec![
        "Document Information",
        parser::INSTRUMENT_MARKER,
        "SDS v1.4 Export",
    ];
    lines.extend(std::iter::repeat_n("", 10));
    lines.extend_from_slice(rows);
    lines.push("");
    lines.push("Slope,-3.32");
    RawExport::new(lines.join("\n"))
}

#[test]
fn unrecognized_input_yields_empty_map() {
    let missing_version = RawExport::new(format!("{}\n\nrows", parser::INSTRUMENT_MARKER));
    assert!(parser::parse(FormatTag::Ab7300, &missing_version).is_empty());

    let missing_instrument = RawExport::new(format!("{}\n\nrows", parser::VERSION_MARKER));
    assert!(parser::parse(FormatTag::Ab7300, &missing_instrument).is_empty());

    assert!(parser::parse(FormatTag::Ab7300, &RawExport::new("")).is_empty());
}

#[test]
fn detector_names_come_from_fourth_field() {
    let raw = export_with_rows(&["1,A1,Sample 1,GeneA,FAM,Target,24.1", "2,A2,Sample 1,GeneB,FAM,Target,26.0"]);
    let detectors = parser::parse(FormatTag::Ab7300, &raw);

    assert_eq!(detectors.len(), 2);
    assert_eq!(detectors.get("GeneA"), Some(false));
    assert_eq!(detectors.get("GeneB"), Some(false));
    assert_eq!(detectors.names().collect::<Vec<_>>(), vec!["GeneA", "GeneB"]);
}

#[test]
fn rows_outside_detector_section_contribute_nothing() {
    // Same row shape in sections 10 and 12; only section 11 is decoded.
    let mut lines = vec![parser::INSTRUMENT_MARKER, parser::VERSION_MARKER];
    lines.extend(std::iter::repeat_n("", 9));
    lines.push("1,A1,Sample 1,Early");
    lines.push("");
    lines.push("1,A1,Sample 1,GeneA");
    lines.push("");
    lines.push("1,A1,Sample 1,Late");
    let raw = RawExport::new(lines.join("\n"));

    let detectors = parser::parse(FormatTag::Ab7300, &raw);
    assert_eq!(detectors.names().collect::<Vec<_>>(), vec!["GeneA"]);
}

#[test]
fn short_rows_are_skipped() {
    let raw = export_with_rows(&["1,A1,Sample 1", "2,A2,Sample 1,GeneA"]);
    let detectors = parser::parse(FormatTag::Ab7300, &raw);

    assert_eq!(detectors.len(), 1);
    assert_eq!(detectors.get("GeneA"), Some(false));
}

#[test]
fn reference_candidate_is_case_insensitive() {
    let raw = export_with_rows(&["1,A1,S,Mock", "2,A2,S,MOCK", "3,A3,S,GeneA"]);
    let detectors = parser::parse(FormatTag::Ab7300, &raw);

    assert_eq!(detectors.get("Mock"), Some(true));
    assert_eq!(detectors.get("MOCK"), Some(true));
    assert_eq!(detectors.get("GeneA"), Some(false));
    // Distinct case variants are distinct names; the later one is suggested.
    assert_eq!(detectors.suggested_reference(), Some("MOCK"));
}

#[test]
fn duplicate_rows_keep_one_entry_in_first_position() {
    let raw = export_with_rows(&["1,A1,S,GeneA", "2,A2,S,Mock", "3,A3,S,GeneA"]);
    let detectors = parser::parse(FormatTag::Ab7300, &raw);

    assert_eq!(detectors.len(), 2);
    assert_eq!(detectors.names().collect::<Vec<_>>(), vec!["GeneA", "Mock"]);
}

#[test]
fn recognized_export_without_detector_table_is_empty() {
    let raw = RawExport::new(format!(
        "{}\n{}\n\nwell data only",
        parser::INSTRUMENT_MARKER,
        parser::VERSION_MARKER
    ));
    assert!(parser::parse(FormatTag::Ab7300, &raw).is_empty());
}

#[test]
fn single_mock_row_scenario() {
    let raw = export_with_rows(&["a,b,c,Mock"]);
    let detectors = parser::parse(FormatTag::Ab7300, &raw);

    assert_eq!(detectors.len(), 1);
    assert_eq!(detectors.get("Mock"), Some(true));
    assert_eq!(detectors.suggested_reference(), Some("Mock"));
}
