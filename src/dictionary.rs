use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use tracing::debug;

use crate::config::DictionaryColumns;
use crate::domain::{CollectionType, is_placeholder};
use crate::error::HierarchyError;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    pub canonical: String,
    pub required: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldDictionary {
    tables: BTreeMap<CollectionType, BTreeMap<String, FieldEntry>>,
}

pub const FALLBACK_COLLECTION: CollectionType = CollectionType::Sample;

impl FieldDictionary {
    pub fn from_table(
        table: &Table,
        columns: &DictionaryColumns,
    ) -> Result<(Self, String), HierarchyError> {
        let mut tables: BTreeMap<CollectionType, BTreeMap<String, FieldEntry>> = BTreeMap::new();
        let mut audit = String::new();
        let mut active: Option<CollectionType> = None;

        for (row_idx, row) in table.rows().enumerate() {
            let cell = |col: usize| row.get(col).map(String::as_str).unwrap_or("");
            let marker = cell(columns.collection_type);
            let required = cell(columns.is_required);
            let field = cell(columns.field_name);
            let canonical = cell(columns.dme_name);

            if marker.to_lowercase().contains("collection") {
                let token = marker.split_whitespace().next().unwrap_or(marker);
                let collection = token.parse::<CollectionType>()?;
                debug!(row = row_idx, collection = %collection, "data dictionary section");
                active = Some(collection);
                continue;
            }
            if is_placeholder(required) || is_placeholder(field) {
                continue;
            }

            let collection = active.ok_or_else(|| HierarchyError::UndefinedCollectionType {
                sheet: "Data Dictionary",
                row: row_idx,
                field: field.to_string(),
            })?;
            let canonical = if is_placeholder(canonical) {
                field
            } else {
                canonical
            };

            let _ = writeln!(audit, "{collection}\t{required}\t{field}\t{canonical}");
            tables.entry(collection).or_default().insert(
                field.to_string(),
                FieldEntry {
                    canonical: canonical.to_string(),
                    required: required.to_string(),
                },
            );
        }

        Ok((Self { tables }, audit))
    }

    pub fn get(&self, collection: CollectionType, field: &str) -> Option<&FieldEntry> {
        self.tables.get(&collection)?.get(field)
    }

    /// Looks `field` up in its own collection table, then in the Sample
    /// table.
    pub fn resolve(
        &self,
        collection: CollectionType,
        field: &str,
    ) -> Result<&FieldEntry, HierarchyError> {
        self.get(collection, field)
            .or_else(|| self.get(FALLBACK_COLLECTION, field))
            .ok_or_else(|| HierarchyError::UnresolvedField {
                collection,
                field: field.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn table(rows: Vec<Vec<&str>>) -> Table {
        Table::from_rows(rows)
    }

    #[test]
    fn header_row_sets_active_collection() {
        let sheet = table(vec![
            vec!["PI Collection", "Yes", "pi_name", "PI_Name"],
            vec!["", "Yes", "pi_name", "PI_Name"],
            vec!["", "No", "affiliation", "Affiliation"],
            vec!["", "", "", ""],
            vec!["Project Collection", "", "", ""],
            vec!["", "Yes", "project_title", "project_title"],
        ]);
        let (dictionary, audit) =
            FieldDictionary::from_table(&sheet, &DictionaryColumns::default()).unwrap();

        let entry = dictionary.get(CollectionType::PiLab, "pi_name").unwrap();
        assert_eq!(entry.canonical, "PI_Name");
        assert_eq!(entry.required, "Yes");
        assert!(dictionary.get(CollectionType::Project, "project_title").is_some());
        assert_eq!(dictionary.len(), 3);
        assert_eq!(audit.lines().count(), 3);
        assert!(audit.starts_with("PI_Lab\tYes\tpi_name\tPI_Name\n"));
    }

    #[test]
    fn blank_and_nan_required_rows_are_skipped() {
        let sheet = table(vec![
            vec!["Sample Collection", "", "", ""],
            vec!["", "nan", "tissue", "tissue"],
            vec!["", "", "organ", "organ"],
            vec!["", "Yes", "sample_name", "sample_name"],
        ]);
        let (dictionary, _) =
            FieldDictionary::from_table(&sheet, &DictionaryColumns::default()).unwrap();
        assert_eq!(dictionary.len(), 1);
        assert!(dictionary.get(CollectionType::Sample, "tissue").is_none());
    }

    #[test]
    fn rows_before_any_header_are_a_data_error() {
        let sheet = table(vec![vec!["", "Yes", "pi_name", "PI_Name"]]);
        let err = FieldDictionary::from_table(&sheet, &DictionaryColumns::default()).unwrap_err();
        assert_matches!(err, HierarchyError::UndefinedCollectionType { row: 0, .. });
    }

    #[test]
    fn resolve_falls_back_to_sample_table() {
        let sheet = table(vec![
            vec!["Project Collection", "", "", ""],
            vec!["", "Yes", "origin", "origin"],
            vec!["Sample Collection", "", "", ""],
            vec!["", "No", "organism", "Organism"],
        ]);
        let (dictionary, _) =
            FieldDictionary::from_table(&sheet, &DictionaryColumns::default()).unwrap();

        let entry = dictionary.resolve(CollectionType::Project, "organism").unwrap();
        assert_eq!(entry.canonical, "Organism");

        let err = dictionary
            .resolve(CollectionType::Project, "unknown")
            .unwrap_err();
        assert_matches!(err, HierarchyError::UnresolvedField { field, .. } if field == "unknown");
    }

    #[test]
    fn shared_marker_and_flag_column() {
        let columns = DictionaryColumns {
            collection_type: 0,
            is_required: 0,
            field_name: 1,
            dme_name: 2,
        };
        let sheet = table(vec![
            vec!["PI Collection", "", ""],
            vec!["Yes", "pi_name", "pi_name"],
            vec!["nan", "", ""],
        ]);
        let (dictionary, _) = FieldDictionary::from_table(&sheet, &columns).unwrap();
        assert_eq!(
            dictionary.get(CollectionType::PiLab, "pi_name").unwrap().required,
            "Yes"
        );
    }
}
