use std::collections::BTreeMap;

use tracing::debug;

use crate::dictionary::FieldDictionary;
use crate::domain::CollectionType;
use crate::error::HierarchyError;
use crate::sheets::{ProjectSheet, SampleSheet};

pub struct NameConverter<'a> {
    dictionary: &'a FieldDictionary,
}

impl<'a> NameConverter<'a> {
    pub fn new(dictionary: &'a FieldDictionary) -> Self {
        Self { dictionary }
    }

    pub fn canonical_name(
        &self,
        collection: CollectionType,
        field: &str,
    ) -> Result<&'a str, HierarchyError> {
        self.dictionary
            .resolve(collection, field)
            .map(|entry| entry.canonical.as_str())
    }

    pub fn convert_record<V: Clone>(
        &self,
        collection: CollectionType,
        record: &BTreeMap<String, V>,
    ) -> Result<BTreeMap<String, V>, HierarchyError> {
        let mut converted: BTreeMap<String, V> = BTreeMap::new();
        let mut origins: BTreeMap<&str, &str> = BTreeMap::new();
        for (field, value) in record {
            let canonical = self.canonical_name(collection, field)?;
            if let Some(first) = origins.insert(canonical, field) {
                return Err(HierarchyError::DuplicateCanonicalName {
                    collection,
                    canonical: canonical.to_string(),
                    first: first.to_string(),
                    second: field.to_string(),
                });
            }
            if canonical != field {
                debug!(%collection, field, canonical, "converted field name");
            }
            converted.insert(canonical.to_string(), value.clone());
        }
        Ok(converted)
    }

    pub fn convert_project_sheet(&self, sheet: &ProjectSheet) -> Result<ProjectSheet, HierarchyError> {
        let sections = sheet
            .sections()
            .map(|(collection, record)| Ok((collection, self.convert_record(collection, record)?)))
            .collect::<Result<BTreeMap<_, _>, HierarchyError>>()?;
        Ok(ProjectSheet::from_sections(sections))
    }

    pub fn convert_sample_sheet(&self, sheet: &SampleSheet) -> Result<SampleSheet, HierarchyError> {
        let samples = sheet
            .iter()
            .map(|(sample_id, record)| {
                Ok((
                    sample_id.to_string(),
                    self.convert_record(CollectionType::Sample, record)?,
                ))
            })
            .collect::<Result<Vec<_>, HierarchyError>>()?;
        SampleSheet::from_samples(samples)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::config::DictionaryColumns;
    use crate::domain::{FlatRecord, ParsedRecord};
    use crate::table::Table;

    fn dictionary() -> FieldDictionary {
        let table = Table::from_rows(vec![
            vec!["PI Collection", "", "", ""],
            vec!["", "Yes", "PI Name", "pi_name"],
            vec!["Project Collection", "", "", ""],
            vec!["", "Yes", "Request Type", "request_type"],
            vec!["", "No", "Title", "project_title"],
            vec!["", "No", "Name", "project_title"],
            vec!["Sample Collection", "", "", ""],
            vec!["", "Yes", "Sample Name", "sample_name"],
            vec!["", "No", "Organism", "organism"],
        ]);
        FieldDictionary::from_table(&table, &DictionaryColumns::default())
            .unwrap()
            .0
    }

    #[test]
    fn converts_with_own_and_fallback_tables() {
        let dictionary = dictionary();
        let converter = NameConverter::new(&dictionary);
        let mut record = ParsedRecord::new();
        record.insert("Request Type".to_string(), vec![Some("RNA-seq".to_string())]);
        record.insert("Organism".to_string(), vec![Some("Human".to_string())]);

        let converted = converter
            .convert_record(CollectionType::Project, &record)
            .unwrap();
        assert!(converted.contains_key("request_type"));
        assert!(converted.contains_key("organism"));
        assert!(record.contains_key("Request Type"));
    }

    #[test]
    fn unresolved_field_names_the_field() {
        let dictionary = dictionary();
        let converter = NameConverter::new(&dictionary);
        let mut record = FlatRecord::new();
        record.insert("Assembly".to_string(), Some("hg38".to_string()));

        let err = converter
            .convert_record(CollectionType::Project, &record)
            .unwrap_err();
        assert_matches!(
            err,
            HierarchyError::UnresolvedField { collection: CollectionType::Project, field }
                if field == "Assembly"
        );
    }

    #[test]
    fn colliding_canonical_names_are_rejected() {
        let dictionary = dictionary();
        let converter = NameConverter::new(&dictionary);
        let mut record = FlatRecord::new();
        record.insert("Title".to_string(), Some("a".to_string()));
        record.insert("Name".to_string(), Some("b".to_string()));

        let err = converter
            .convert_record(CollectionType::Project, &record)
            .unwrap_err();
        assert_matches!(err, HierarchyError::DuplicateCanonicalName { .. });
    }
}
