//! Mapping from transformed codelist files to registry concept ids.
//!
//! Transformed files are named `<ConceptName>_transformed.json`, or
//! `<ConceptName>_<conceptId>_transformed.json` when the transformation step
//! already resolved the concept on the registry. The embedded id wins; the
//! built-in table of the EPD (electronic patient record) codelists of
//! registry version 2.0.0 covers the rest.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{I14yError, I14yResult};

/// Codelist concept ids of the EPD metadata value sets, version 2.0.0.
const KNOWN_CODELISTS: &[(&str, &str)] = &[
    ("SubmissionSet.contentTypeCode_transformed", "08dd632d-b449-6c4f-bff5-38488abd5b6f"),
    // also referenced by SubmissionSet.Author.AuthorRole, DocumentEntry.author.authorRole
    // and DocumentEntry.originalProviderRole
    ("EprRole_transformed", "08dd632d-b378-e759-84d8-f04d0168890c"),
    ("HCProfessional.hcProfession_transformed", "08dd632d-b3c5-ed64-a995-369c44b38c06"),
    ("DocumentEntry.classCode_transformed", "08dd632d-aa6b-ffb2-a78b-fbff93d4f167"),
    ("DocumentEntry.authorSpeciality_transformed", "08dd632d-a98d-34ff-9252-123e46d6f053"),
    ("DocumentEntry.confidentialityCode_transformed", "08dd632d-aada-98dd-bbc2-21ad33bd1565"),
    ("DocumentEntry.eventCodeList_transformed", "08dd632d-ab2e-9938-8e31-4fb07a28b4a3"),
    ("DocumentEntry.formatCode_transformed", "08dd632d-ab82-6614-a9a4-c9842737aa2f"),
    ("DocumentEntry.healthcareFacilityTypeCode_transformed", "08dd632d-abd6-c1fd-9468-533a88e19499"),
    ("DocumentEntry.mimeType_transformed", "08dd632d-aca1-b77d-80c2-3e6b677753f9"),
    ("DocumentEntry.practiceSettingCode_transformed", "08dd632d-ad55-7a02-b041-ae0059ba8d79"),
    ("DocumentEntry.sourcePatientInfo.PID-8_transformed", "08dd632d-ada3-bda0-be32-f270bf291810"),
    ("DocumentEntry.typeCode_transformed", "08dd632d-adf6-96f1-9850-7ef00f059f80"),
    ("EprAuditTrailConsumptionEventType_transformed", "08dd632d-b23a-ec97-8812-886854f69afd"),
    ("EprDeletionStatus_transformed", "08dd632d-b2a2-0ed2-941d-fffb2bea1af5"),
    ("DocumentEntry.languageCode_transformed", "08dd632d-ac4d-977f-a53b-ec0b1af269f8"),
    ("EprPurposeOfUse_transformed", "08dd632d-b2f7-197a-889f-18e7a917dd67"),
    ("EprAgentRole_transformed", "08dd632d-aee2-333d-b1e4-505385fde8ff"),
];

static EMBEDDED_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"_([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})_transformed$",
    )
    .expect("embedded id pattern is valid")
});

/// File-stem → concept id lookup used by the codelist batch upload.
#[derive(Debug, Clone)]
pub struct CodelistRegistry {
    ids: BTreeMap<String, String>,
}

impl Default for CodelistRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CodelistRegistry {
    /// Registry pre-populated with the known EPD codelists.
    pub fn builtin() -> Self {
        Self {
            ids: KNOWN_CODELISTS
                .iter()
                .map(|(stem, id)| (stem.to_string(), id.to_string()))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            ids: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, stem: impl Into<String>, concept_id: impl Into<String>) {
        self.ids.insert(stem.into(), concept_id.into());
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Merge a JSON object of `{"<stem>": "<concept id>"}` pairs over the current table.
    ///
    /// Entries with an empty id are ignored.
    pub fn load_overrides(&mut self, path: &Path) -> I14yResult<usize> {
        if !path.is_file() {
            return Err(I14yError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let overrides: BTreeMap<String, String> = serde_json::from_str(&contents)?;

        let mut merged = 0;
        for (stem, id) in overrides {
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            self.ids.insert(stem, id.to_string());
            merged += 1;
        }
        Ok(merged)
    }

    /// Concept id for a transformed codelist file, if one is known.
    pub fn resolve(&self, path: &Path) -> Option<String> {
        let stem = path.file_stem()?.to_str()?;

        if let Some(captures) = EMBEDDED_ID.captures(stem) {
            return Some(captures[1].to_string());
        }

        self.ids.get(stem).cloned()
    }
}
