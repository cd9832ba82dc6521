//! ART-DECOR value set XML reader.
//!
//! Reads the first `valueSet` element of an export (`RetrieveValueSet` or a
//! decor project file) together with its descriptions, source code systems
//! and concept list.

use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{TransformError, TransformResult};
use crate::model::{CodeEntry, CodeSystemRef, Language, LocalizedText, ValueSet};

pub fn read_value_set_xml(path: &Path) -> TransformResult<ValueSet> {
    let contents = fs::read_to_string(path)?;
    parse_value_set_xml(&contents)
}

pub fn parse_value_set_xml(contents: &str) -> TransformResult<ValueSet> {
    let document = Document::parse_with_options(
        contents,
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        },
    )?;

    let value_set = document
        .descendants()
        .find(|n| n.has_tag_name("valueSet"))
        .ok_or_else(|| TransformError::MissingElement("valueSet".to_string()))?;

    let name = required_attribute(value_set, "name")?;
    let identifier = required_attribute(value_set, "id")?;

    let code_system_names: HashMap<&str, &str> = value_set
        .children()
        .filter(|n| n.has_tag_name("sourceCodeSystem"))
        .filter_map(|n| Some((n.attribute("id")?, n.attribute("identifierName")?)))
        .collect();

    let mut descriptions = LocalizedText::new();
    for desc in value_set.children().filter(|n| n.has_tag_name("desc")) {
        let Some(language) = desc.attribute("language").and_then(Language::from_tag) else {
            continue;
        };
        let source = desc
            .children()
            .find(|n| n.has_tag_name("div"))
            .unwrap_or(desc);
        descriptions.set(language, text_content(source).trim());
    }

    let mut entries = Vec::new();
    let mut current_parent: Option<String> = None;
    for concept in value_set.descendants().filter(|n| n.has_tag_name("concept")) {
        let code = required_attribute(concept, "code")?;
        let code_system_id = concept.attribute("codeSystem").unwrap_or_default();
        let code_system = CodeSystemRef {
            id: code_system_id.to_string(),
            name: code_system_names
                .get(code_system_id)
                .map(|name| name.to_string()),
        };

        let mut entry = CodeEntry::new(code.clone(), code_system);
        entry.display =
            LocalizedText::uniform(concept.attribute("displayName").unwrap_or_default(), &Language::ALL);

        if concept.attribute("level") == Some("0") {
            current_parent = Some(code);
        } else {
            entry.parent_code = current_parent.clone();
        }

        for designation in concept.children().filter(|n| n.has_tag_name("designation")) {
            let Some(language) = designation.attribute("language").and_then(Language::from_tag)
            else {
                continue;
            };
            let text = designation.attribute("displayName").unwrap_or_default();
            match designation.attribute("type") {
                Some("preferred") => {
                    entry.preferred.set(language, text);
                    // English keeps the concept's own display name
                    if language != Language::En {
                        entry.display.set(language, text);
                    }
                }
                Some("synonym") => entry.acceptable.set(language, text),
                _ => {}
            }
        }

        entries.push(entry);
    }

    Ok(ValueSet {
        name,
        identifier,
        descriptions,
        entries,
    })
}

fn required_attribute(node: Node, name: &str) -> TransformResult<String> {
    node.attribute(name)
        .map(str::to_string)
        .ok_or_else(|| {
            TransformError::MissingElement(format!("{}/@{}", node.tag_name().name(), name))
        })
}

fn text_content(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<valueSets>
  <project ident="ch-epr"/>
  <valueSet id="2.16.756.5.30.1.127.3.10.1.1.3" name="DocumentEntry.classCode" displayName="DocumentEntry.classCode">
    <desc language="de-CH"><div>Klasse des Dokuments</div></desc>
    <desc language="en-US">  Document class  </desc>
    <desc language="xx-XX">ignored</desc>
    <sourceCodeSystem id="2.16.840.1.113883.6.96" identifierName="SNOMED CT"/>
    <conceptList>
      <concept code="371531000" codeSystem="2.16.840.1.113883.6.96" displayName="Report of clinical encounter" level="0" type="A">
        <designation language="de-CH" type="preferred" displayName="Bericht"/>
        <designation language="en-US" type="preferred" displayName="Report (record artifact)"/>
        <designation language="fr-CH" type="synonym" displayName="Rapport"/>
      </concept>
      <concept code="419891008" codeSystem="2.16.840.1.113883.6.96" displayName="Record artifact" level="1" type="L"/>
      <concept code="X1" codeSystem="9.9.9" displayName="Other" level="0"/>
    </conceptList>
  </valueSet>
</valueSets>"#;

    #[test]
    fn value_set_header_is_read() {
        let vs = parse_value_set_xml(SAMPLE).unwrap();
        assert_eq!(vs.name, "DocumentEntry.classCode");
        assert_eq!(vs.identifier, "2.16.756.5.30.1.127.3.10.1.1.3");
        assert_eq!(vs.descriptions.get(Language::De), Some("Klasse des Dokuments"));
        assert_eq!(vs.descriptions.get(Language::En), Some("Document class"));
        assert_eq!(vs.entries.len(), 3);
    }

    #[test]
    fn preferred_designations_override_display_except_english() {
        let vs = parse_value_set_xml(SAMPLE).unwrap();
        let first = &vs.entries[0];
        assert_eq!(first.display.get(Language::De), Some("Bericht"));
        assert_eq!(first.display.get(Language::En), Some("Report of clinical encounter"));
        assert_eq!(first.display.get(Language::Rm), Some("Report of clinical encounter"));
        assert_eq!(first.preferred.get(Language::En), Some("Report (record artifact)"));
        assert_eq!(first.acceptable.get(Language::Fr), Some("Rapport"));
        assert_eq!(first.code_system.name.as_deref(), Some("SNOMED CT"));
    }

    #[test]
    fn level_zero_concepts_become_parents() {
        let vs = parse_value_set_xml(SAMPLE).unwrap();
        assert_eq!(vs.entries[0].parent_code, None);
        assert_eq!(vs.entries[1].parent_code.as_deref(), Some("371531000"));
        assert_eq!(vs.entries[2].parent_code, None);
        assert_eq!(vs.entries[2].code_system.name, None);
    }

    #[test]
    fn missing_value_set_is_reported() {
        let err = parse_value_set_xml("<root/>").unwrap_err();
        assert!(matches!(err, TransformError::MissingElement(ref e) if e == "valueSet"));
    }

    #[test]
    fn concept_without_code_is_reported() {
        let xml = r#"<valueSet id="1.2" name="X"><conceptList><concept displayName="a"/></conceptList></valueSet>"#;
        let err = parse_value_set_xml(xml).unwrap_err();
        assert!(err.to_string().contains("concept/@code"));
    }

    #[test]
    fn malformed_xml_is_an_xml_error() {
        assert!(matches!(
            parse_value_set_xml("<valueSet"),
            Err(TransformError::Xml(_))
        ));
    }
}
