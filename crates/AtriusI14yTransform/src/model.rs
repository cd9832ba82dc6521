//! Value set model and the registry's output documents.
//!
//! [`ValueSet`] is what the XML and CSV readers produce. [`ConceptDocument`]
//! and [`CodelistDocument`] are the two JSON documents the registry accepts,
//! serialized with its camelCase field names.

use chrono::NaiveDate;
use serde::Serialize;

/// Languages carried by the registry's multilingual texts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    De,
    En,
    Fr,
    It,
    Rm,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::De,
        Language::En,
        Language::Fr,
        Language::It,
        Language::Rm,
    ];

    /// Languages used for concept-level texts (name, description, publisher).
    pub const OFFICIAL: [Language; 4] = [Language::De, Language::En, Language::Fr, Language::It];

    /// Parse an ART-DECOR language tag such as `de-CH` or `en-US`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "de-CH" => Some(Language::De),
            "en-US" => Some(Language::En),
            "fr-CH" => Some(Language::Fr),
            "it-CH" => Some(Language::It),
            "rm-CH" => Some(Language::Rm),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Language::De => "de-CH",
            Language::En => "en-US",
            Language::Fr => "fr-CH",
            Language::It => "it-CH",
            Language::Rm => "rm-CH",
        }
    }

    /// Key used in the registry's JSON
    pub fn key(self) -> &'static str {
        match self {
            Language::De => "de",
            Language::En => "en",
            Language::Fr => "fr",
            Language::It => "it",
            Language::Rm => "rm",
        }
    }
}

/// Text in up to five languages. Blank values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalizedText {
    #[serde(skip_serializing_if = "Option::is_none")]
    de: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    it: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rm: Option<String>,
}

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same text in each of `languages`.
    pub fn uniform(text: &str, languages: &[Language]) -> Self {
        let mut out = Self::new();
        for &language in languages {
            out.set(language, text);
        }
        out
    }

    /// Set the text for `language`; a blank `text` clears it.
    pub fn set(&mut self, language: Language, text: &str) {
        let value = (!text.trim().is_empty()).then(|| text.to_string());
        *self.slot_mut(language) = value;
    }

    pub fn get(&self, language: Language) -> Option<&str> {
        match language {
            Language::De => self.de.as_deref(),
            Language::En => self.en.as_deref(),
            Language::Fr => self.fr.as_deref(),
            Language::It => self.it.as_deref(),
            Language::Rm => self.rm.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Language::ALL.iter().all(|&l| self.get(l).is_none())
    }

    /// Copy of this text keeping only `languages`.
    pub fn restricted_to(&self, languages: &[Language]) -> Self {
        let mut out = Self::new();
        for &language in languages {
            if let Some(text) = self.get(language) {
                out.set(language, text);
            }
        }
        out
    }

    fn slot_mut(&mut self, language: Language) -> &mut Option<String> {
        match language {
            Language::De => &mut self.de,
            Language::En => &mut self.en,
            Language::Fr => &mut self.fr,
            Language::It => &mut self.it,
            Language::Rm => &mut self.rm,
        }
    }
}

/// Code system a code is drawn from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSystemRef {
    /// Code system OID
    pub id: String,
    /// Human readable name, when the export provides one
    pub name: Option<String>,
}

/// One code of a value set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    pub code: String,
    pub display: LocalizedText,
    pub parent_code: Option<String>,
    pub code_system: CodeSystemRef,
    pub preferred: LocalizedText,
    pub acceptable: LocalizedText,
}

impl CodeEntry {
    pub fn new(code: impl Into<String>, code_system: CodeSystemRef) -> Self {
        Self {
            code: code.into(),
            display: LocalizedText::new(),
            parent_code: None,
            code_system,
            preferred: LocalizedText::new(),
            acceptable: LocalizedText::new(),
        }
    }
}

/// A value set as read from an ART-DECOR export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSet {
    pub name: String,
    /// Value set OID; becomes the concept identifier on the registry
    pub identifier: String,
    pub descriptions: LocalizedText,
    pub entries: Vec<CodeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRef {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publisher {
    pub identifier: String,
    pub name: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptPayload {
    pub code_list_entry_value_max_length: u32,
    pub code_list_entry_value_type: String,
    pub concept_type: String,
    pub conforms_to: Vec<String>,
    pub description: LocalizedText,
    pub identifier: String,
    pub keywords: Vec<String>,
    pub name: LocalizedText,
    pub publisher: Publisher,
    pub responsible_person: PersonRef,
    pub responsible_deputy: PersonRef,
    pub themes: Vec<String>,
    pub valid_from: NaiveDate,
    pub version: String,
}

/// Body of `POST /concepts`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptDocument {
    pub data: ConceptPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnnotationType {
    CodeSystem,
    Period,
    Designation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub identifier: String,
    pub text: LocalizedText,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: AnnotationType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodelistEntry {
    pub annotations: Vec<Annotation>,
    pub code: String,
    pub name: LocalizedText,
    pub valid_from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,
}

/// Body of the codelist-entries JSON import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodelistDocument {
    pub data: Vec<CodelistEntry>,
}
