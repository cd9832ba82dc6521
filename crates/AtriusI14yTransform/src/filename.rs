//! Concept names from export file names, and names of the generated files.

use once_cell::sync::Lazy;
use regex::Regex;

static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)").expect("parenthesized pattern is valid"));
static EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(csv|xml|json)$").expect("extension pattern is valid"));
static VS_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^VS[ _]").expect("prefix pattern is valid"));
static TRAILING_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_+$").expect("underscore pattern is valid"));

/// Standardized concept name of an export file.
///
/// `VS DocumentEntry.eventCodeList (download 2025-01-22T07_36_23).csv`,
/// `VS_DocumentEntry.eventCodeList.csv` and `DocumentEntry.eventCodeList.csv`
/// all give `DocumentEntry.eventCodeList`.
pub fn concept_name_from_filename(file_name: &str) -> String {
    let name = PARENTHESIZED.replace_all(file_name, "");
    let name = EXTENSION.replace(&name, "");
    let name = VS_PREFIX.replace(&name, "");
    let name = TRAILING_UNDERSCORES.replace(&name, "");
    name.trim().to_string()
}

/// Output file name, carrying the registry concept id when it is known.
pub fn transformed_file_name(concept_name: &str, concept_id: Option<&str>) -> String {
    match concept_id {
        Some(id) => format!("{}_{}_transformed.json", concept_name, id),
        None => format!("{}_transformed.json", concept_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_suffix_and_prefix_are_removed() {
        for input in [
            "VS DocumentEntry.eventCodeList (download 2025-01-22T07_36_23).csv",
            "VS_DocumentEntry.eventCodeList.csv",
            "DocumentEntry.eventCodeList.csv",
            "DocumentEntry.eventCodeList.XML",
            "VS_DocumentEntry.eventCodeList__.xml",
        ] {
            assert_eq!(
                concept_name_from_filename(input),
                "DocumentEntry.eventCodeList",
                "{input}"
            );
        }
    }

    #[test]
    fn only_the_last_extension_is_removed() {
        assert_eq!(concept_name_from_filename("EprRole.csv.xml"), "EprRole.csv");
        assert_eq!(concept_name_from_filename("EprRole.txt"), "EprRole.txt");
    }

    #[test]
    fn lowercase_prefix_is_kept() {
        assert_eq!(concept_name_from_filename("vs_EprRole.xml"), "vs_EprRole");
    }

    #[test]
    fn output_names() {
        assert_eq!(transformed_file_name("EprRole", None), "EprRole_transformed.json");
        assert_eq!(
            transformed_file_name("EprRole", Some("08dd632d-b378-e759-84d8-f04d0168890c")),
            "EprRole_08dd632d-b378-e759-84d8-f04d0168890c_transformed.json"
        );
    }
}
