//! ART-DECOR value set CSV reader.
//!
//! Layout of a semicolon-separated export:
//!
//! ```text
//! line 1   "Value Set <name> - <oid> ..."
//! line 2   header; designation columns are found by language tag plus
//!          "preferred" / "synonym" in their title
//! line 3+  ; ; code ; display (en) ; code system id ; code system name ; ...
//! ```

use csv::{ReaderBuilder, StringRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{TransformError, TransformResult};
use crate::model::{CodeEntry, CodeSystemRef, Language, LocalizedText, ValueSet};

const CODE_COLUMN: usize = 2;
const DISPLAY_COLUMN: usize = 3;
const CODE_SYSTEM_ID_COLUMN: usize = 4;
const CODE_SYSTEM_NAME_COLUMN: usize = 5;

static NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Value Set (.*?) -").expect("name pattern is valid"));
static OID: Lazy<Regex> = Lazy::new(|| Regex::new(r"- ([\d.]+)").expect("oid pattern is valid"));

/// Column indexes of the per-language designation columns
#[derive(Debug, Default)]
struct DesignationColumns {
    preferred: Vec<(Language, usize)>,
    synonym: Vec<(Language, usize)>,
}

impl DesignationColumns {
    fn from_header(header: &StringRecord) -> Self {
        let find = |language: Language, kind: &str| {
            header
                .iter()
                .position(|title| title.contains(language.tag()) && title.contains(kind))
                .map(|index| (language, index))
        };
        Self {
            preferred: Language::ALL
                .iter()
                .filter_map(|&l| find(l, "preferred"))
                .collect(),
            synonym: Language::ALL
                .iter()
                .filter_map(|&l| find(l, "synonym"))
                .collect(),
        }
    }
}

pub fn read_value_set_csv(path: &Path) -> TransformResult<ValueSet> {
    parse_value_set_csv(File::open(path)?)
}

pub fn parse_value_set_csv<R: Read>(input: R) -> TransformResult<ValueSet> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .quote(b'"')
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut records = reader.records();

    let title_row = records
        .next()
        .transpose()?
        .ok_or_else(|| TransformError::InvalidInput("CSV file is empty".to_string()))?;
    let title = title_row.get(0).unwrap_or_default();
    let name = NAME
        .captures(title)
        .map(|c| c[1].trim().to_string())
        .ok_or_else(|| {
            TransformError::InvalidInput(format!("no value set name in first line: '{}'", title))
        })?;
    let identifier = OID
        .captures(title)
        .map(|c| c[1].to_string())
        .ok_or_else(|| {
            TransformError::InvalidInput(format!("no value set OID in first line: '{}'", title))
        })?;

    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| TransformError::InvalidInput("CSV header line is missing".to_string()))?;
    let columns = DesignationColumns::from_header(&header);

    let mut entries = Vec::new();
    for record in records {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        entries.push(read_entry(&record, &columns)?);
    }

    Ok(ValueSet {
        name,
        identifier,
        descriptions: LocalizedText::new(),
        entries,
    })
}

fn read_entry(record: &StringRecord, columns: &DesignationColumns) -> TransformResult<CodeEntry> {
    let cell = |column: usize| {
        record.get(column).ok_or_else(|| TransformError::MissingColumn {
            line: record.position().map(|p| p.line()).unwrap_or_default(),
            column: column + 1,
        })
    };

    let code_system_name = cell(CODE_SYSTEM_NAME_COLUMN)?.trim();
    let code_system = CodeSystemRef {
        id: cell(CODE_SYSTEM_ID_COLUMN)?.trim().to_string(),
        name: (!code_system_name.is_empty()).then(|| code_system_name.to_string()),
    };

    let mut entry = CodeEntry::new(cell(CODE_COLUMN)?.trim(), code_system);
    entry.display.set(Language::En, cell(DISPLAY_COLUMN)?);

    for &(language, index) in &columns.preferred {
        let text = record.get(index).unwrap_or_default();
        entry.preferred.set(language, text);
        if language != Language::En {
            entry.display.set(language, text);
        }
    }
    for &(language, index) in &columns.synonym {
        entry.acceptable.set(language, record.get(index).unwrap_or_default());
    }

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
\"Value Set DocumentEntry.mimeType - 2.16.756.5.30.1.127.3.10.1.14 (2024-06-01)\"
Level;Type;Code;Display Name;Code System;Code System Name;Designation de-CH preferred;Designation fr-CH preferred;Designation en-US preferred;Designation de-CH synonym
0;L;application/pdf;PDF;2.16.756.5.30.1.127.3.10.1.14;MIME Types;PDF-Dokument;document PDF;Portable Document Format;Acrobat
;;;;;;;;;
0;L;text/plain;Plain text;2.16.756.5.30.1.127.3.10.1.14;MIME Types;Text;;;
";

    #[test]
    fn title_line_yields_name_and_oid() {
        let vs = parse_value_set_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(vs.name, "DocumentEntry.mimeType");
        assert_eq!(vs.identifier, "2.16.756.5.30.1.127.3.10.1.14");
        assert!(vs.descriptions.is_empty());
    }

    #[test]
    fn rows_map_to_entries() {
        let vs = parse_value_set_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(vs.entries.len(), 2);

        let pdf = &vs.entries[0];
        assert_eq!(pdf.code, "application/pdf");
        assert_eq!(pdf.display.get(Language::En), Some("PDF"));
        assert_eq!(pdf.display.get(Language::De), Some("PDF-Dokument"));
        assert_eq!(pdf.display.get(Language::It), None);
        assert_eq!(pdf.preferred.get(Language::En), Some("Portable Document Format"));
        assert_eq!(pdf.acceptable.get(Language::De), Some("Acrobat"));
        assert_eq!(pdf.code_system.name.as_deref(), Some("MIME Types"));

        let text = &vs.entries[1];
        assert_eq!(text.preferred.get(Language::Fr), None);
        assert!(text.acceptable.is_empty());
    }

    #[test]
    fn missing_oid_is_an_error() {
        let input = "Value Set Foo - unknown\nheader\n";
        let err = parse_value_set_csv(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("OID"), "{err}");
    }

    #[test]
    fn title_without_value_set_name_is_an_error() {
        let input = "DocumentEntry.mimeType - 2.16.756.5.30.1.127.3.10.1.14\nheader\n";
        let err = parse_value_set_csv(input.as_bytes()).unwrap_err();
        assert!(matches!(err, TransformError::InvalidInput(_)));
        assert!(err.to_string().contains("no value set name"), "{err}");
    }

    #[test]
    fn short_row_reports_line_and_column() {
        let input = "Value Set Foo - 1.2.3\nheader\n0;L;A;Alpha\n";
        let err = parse_value_set_csv(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingColumn { line: 3, column: 6 }
        ));
    }
}
