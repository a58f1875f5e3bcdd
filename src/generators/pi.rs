use crate::collection::Template;
use crate::domain::{CollectionName, CollectionType, ParsedRecord};
use crate::error::HierarchyError;

use super::{
    COLLECTION_TYPE_ATTRIBUTE, CollectionGenerator, NamedDocument, require_all, seeded_document,
    squash,
};

pub struct PiLabGenerator<'a> {
    record: &'a ParsedRecord,
}

impl<'a> PiLabGenerator<'a> {
    pub fn new(record: &'a ParsedRecord) -> Self {
        Self { record }
    }

    fn first_value(&self, field: &str) -> Option<&'a str> {
        self.record
            .get(field)
            .and_then(|values| values.first())
            .and_then(|value| value.as_deref())
    }

    /// `PI_Lab_{first}{last}_{affiliation}` from `pi_name` (`Last, First`)
    /// and the last token of `affiliation` without parentheses.
    pub fn collection_name(&self) -> Result<CollectionName, HierarchyError> {
        let parts = require_all(
            CollectionType::PiLab,
            &[
                ("pi_name", self.first_value("pi_name")),
                ("affiliation", self.first_value("affiliation")),
            ],
        )?;
        let (pi_name, affiliation) = (parts[0], parts[1]);

        let person = match pi_name.split_once(',') {
            Some((last, first)) => format!("{}{}", squash(first), squash(last)),
            None => squash(pi_name),
        };
        let abbreviation = affiliation
            .split_whitespace()
            .last()
            .unwrap_or(affiliation)
            .replace(['(', ')'], "");

        format!("PI_Lab_{person}_{abbreviation}").parse()
    }
}

impl CollectionGenerator for PiLabGenerator<'_> {
    fn collection_type(&self) -> CollectionType {
        CollectionType::PiLab
    }

    fn build(&self, template: &Template) -> Result<Vec<NamedDocument>, HierarchyError> {
        let name = self.collection_name()?;
        let mut document = seeded_document(CollectionType::PiLab, template);
        for (field, values) in self.record {
            if field == COLLECTION_TYPE_ATTRIBUTE {
                continue;
            }
            if let Some(Some(value)) = values.first() {
                document.push(field.as_str(), value.as_str());
            }
        }
        Ok(vec![NamedDocument { name, document }])
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn record(entries: &[(&str, Option<&str>)]) -> ParsedRecord {
        entries
            .iter()
            .map(|(field, value)| (field.to_string(), vec![value.map(str::to_string)]))
            .collect()
    }

    #[test]
    fn name_from_pi_and_affiliation() {
        let record = record(&[
            ("pi_name", Some("Doe, Jane")),
            ("affiliation", Some("Dept of Genomics (NCI)")),
        ]);
        let name = PiLabGenerator::new(&record).collection_name().unwrap();
        assert_eq!(name.as_str(), "PI_Lab_JaneDoe_NCI");
    }

    #[test]
    fn name_without_comma_uses_whole_name() {
        let record = record(&[
            ("pi_name", Some("Jane Mary Doe")),
            ("affiliation", Some("CCR")),
        ]);
        let name = PiLabGenerator::new(&record).collection_name().unwrap();
        assert_eq!(name.as_str(), "PI_Lab_JaneMaryDoe_CCR");
    }

    #[test]
    fn missing_name_fields_are_reported_together() {
        let record = record(&[("pi_name", None)]);
        let err = PiLabGenerator::new(&record).collection_name().unwrap_err();
        assert_matches!(
            err,
            HierarchyError::MissingRequiredFields { fields, .. } if fields.len() == 2
        );
    }

    #[test]
    fn placeholders_are_not_copied() {
        let record = record(&[
            ("pi_name", Some("Doe, Jane")),
            ("affiliation", Some("NCI")),
            ("pi_email", None),
        ]);
        let docs = PiLabGenerator::new(&record)
            .build(&Template::skeleton(CollectionType::PiLab))
            .unwrap();
        assert_eq!(docs.len(), 1);
        let document = &docs[0].document;
        assert_eq!(document.value("collection_type"), Some("PI_Lab"));
        assert_eq!(document.value("pi_name"), Some("Doe, Jane"));
        assert_eq!(document.value("pi_email"), None);
        assert_eq!(document.entries().len(), 3);
    }
}
