//! Builders for the registry's concept and codelist-entries documents.
//!
//! Each code gets its annotations in a fixed order: code system, period end,
//! period start, preferred designation and, when present, the acceptable
//! designation. Designation identifiers are the SNOMED CT acceptability ids.

use chrono::NaiveDate;
use semver::Version;

use crate::config::TransformDefaults;
use crate::error::{TransformError, TransformResult};
use crate::model::{
    Annotation, AnnotationType, CodeEntry, CodelistDocument, CodelistEntry, ConceptDocument,
    ConceptPayload, Language, LocalizedText, PersonRef, Publisher, ValueSet,
};

const PREFERRED_DESIGNATION: &str = "900000000000548007";
const ACCEPTABLE_DESIGNATION: &str = "900000000000549004";

/// Per-run settings shared by every transformed file
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub responsible: PersonRef,
    pub deputy: PersonRef,
    pub valid_from: NaiveDate,
    pub version: Version,
    pub defaults: TransformDefaults,
    /// Skip the registry lookup and treat every value set as a new concept
    pub force_new: bool,
}

impl TransformOptions {
    pub fn new(
        responsible_email: impl Into<String>,
        deputy_email: impl Into<String>,
        valid_from: NaiveDate,
        version: Version,
        defaults: TransformDefaults,
    ) -> Self {
        Self {
            responsible: PersonRef {
                email: responsible_email.into(),
            },
            deputy: PersonRef {
                email: deputy_email.into(),
            },
            valid_from,
            version,
            defaults,
            force_new: false,
        }
    }

    pub fn with_force_new(mut self, force_new: bool) -> Self {
        self.force_new = force_new;
        self
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_valid_from(value: &str) -> TransformResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        TransformError::InvalidInput(format!(
            "invalid date '{}': expected YYYY-MM-DD",
            value
        ))
    })
}

pub fn parse_version(value: &str) -> TransformResult<Version> {
    Version::parse(value.trim()).map_err(|_| TransformError::InvalidVersion(value.to_string()))
}

pub fn build_concept_document(value_set: &ValueSet, opts: &TransformOptions) -> ConceptDocument {
    let defaults = &opts.defaults;
    ConceptDocument {
        data: ConceptPayload {
            code_list_entry_value_max_length: defaults.value_max_length,
            code_list_entry_value_type: defaults.value_type.clone(),
            concept_type: defaults.concept_type.clone(),
            conforms_to: Vec::new(),
            description: value_set.descriptions.restricted_to(&Language::OFFICIAL),
            identifier: value_set.identifier.clone(),
            keywords: Vec::new(),
            name: LocalizedText::uniform(&value_set.name, &Language::OFFICIAL),
            publisher: Publisher {
                identifier: defaults.publisher_identifier.clone(),
                name: LocalizedText::uniform(&defaults.publisher_name, &Language::OFFICIAL),
            },
            responsible_person: opts.responsible.clone(),
            responsible_deputy: opts.deputy.clone(),
            themes: Vec::new(),
            valid_from: opts.valid_from,
            version: opts.version.to_string(),
        },
    }
}

pub fn build_codelist_document(value_set: &ValueSet, opts: &TransformOptions) -> CodelistDocument {
    CodelistDocument {
        data: value_set
            .entries
            .iter()
            .map(|entry| codelist_entry(entry, opts))
            .collect(),
    }
}

fn codelist_entry(entry: &CodeEntry, opts: &TransformOptions) -> CodelistEntry {
    let code_system = &entry.code_system;
    let code_system_title = code_system
        .name
        .clone()
        .unwrap_or_else(|| code_system.id.clone());

    let mut annotations = vec![
        Annotation {
            identifier: code_system.id.clone(),
            text: LocalizedText::uniform(&code_system_title, &Language::ALL),
            title: code_system_title,
            kind: AnnotationType::CodeSystem,
        },
        period("end", opts.defaults.period_end),
        period("start", opts.defaults.period_start),
        Annotation {
            identifier: PREFERRED_DESIGNATION.to_string(),
            text: entry.preferred.clone(),
            title: "Preferred".to_string(),
            kind: AnnotationType::Designation,
        },
    ];
    if !entry.acceptable.is_empty() {
        annotations.push(Annotation {
            identifier: ACCEPTABLE_DESIGNATION.to_string(),
            text: entry.acceptable.clone(),
            title: "Acceptable".to_string(),
            kind: AnnotationType::Designation,
        });
    }

    CodelistEntry {
        annotations,
        code: entry.code.clone(),
        name: entry.display.clone(),
        valid_from: opts.valid_from,
        parent_code: entry.parent_code.clone(),
    }
}

fn period(bound: &str, date: NaiveDate) -> Annotation {
    Annotation {
        identifier: bound.to_string(),
        text: LocalizedText::uniform(&date.format("%Y-%m-%d").to_string(), &[Language::En]),
        title: bound.to_string(),
        kind: AnnotationType::Period,
    }
}
