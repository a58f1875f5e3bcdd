use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::domain::{
    CollectionType, FlatRecord, ParsedRecord, ValueList, cell_value, is_placeholder,
    trim_trailing_placeholders,
};
use crate::error::HierarchyError;
use crate::table::Table;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProjectSheet {
    sections: BTreeMap<CollectionType, ParsedRecord>,
}

impl ProjectSheet {
    pub fn from_sections(sections: BTreeMap<CollectionType, ParsedRecord>) -> Self {
        Self { sections }
    }

    pub fn from_table(table: &Table) -> Result<(Self, String), HierarchyError> {
        let mut sections: BTreeMap<CollectionType, ParsedRecord> = BTreeMap::new();
        let mut audit = String::new();
        let mut active: Option<CollectionType> = None;

        for (row_idx, row) in table.rows().enumerate() {
            let Some((attr, values)) = row.split_first() else {
                continue;
            };
            if is_placeholder(attr) {
                continue;
            }
            if attr.to_lowercase().contains("collection") {
                let marker = values.first().map(String::as_str).unwrap_or("");
                let collection = marker.parse::<CollectionType>()?;
                debug!(row = row_idx, collection = %collection, "project sheet section");
                active = Some(collection);
                continue;
            }

            let collection = active.ok_or_else(|| HierarchyError::UndefinedCollectionType {
                sheet: "Project Template",
                row: row_idx,
                field: attr.to_string(),
            })?;
            let values = trim_trailing_placeholders(values);

            let _ = writeln!(audit, "{collection}\t{attr}\t{}", values.join("\t"));
            sections.entry(collection).or_default().insert(
                attr.to_string(),
                values.iter().map(|value| cell_value(value)).collect(),
            );
        }

        Ok((Self { sections }, audit))
    }

    pub fn section(&self, collection: CollectionType) -> Option<&ParsedRecord> {
        self.sections.get(&collection)
    }

    pub fn project_sections(&self) -> impl Iterator<Item = (CollectionType, &ParsedRecord)> {
        self.sections
            .iter()
            .filter(|(collection, _)| **collection != CollectionType::PiLab)
            .map(|(collection, record)| (*collection, record))
    }

    pub fn sections(&self) -> impl Iterator<Item = (CollectionType, &ParsedRecord)> {
        self.sections
            .iter()
            .map(|(collection, record)| (*collection, record))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSheet {
    sample_ids: Vec<String>,
    samples: BTreeMap<String, FlatRecord>,
}

impl SampleSheet {
    pub fn from_samples(
        samples: impl IntoIterator<Item = (String, FlatRecord)>,
    ) -> Result<Self, HierarchyError> {
        let mut sheet = Self::default();
        for (sample_id, record) in samples {
            if sheet.samples.contains_key(&sample_id) {
                return Err(HierarchyError::DuplicateSampleId(sample_id));
            }
            sheet.sample_ids.push(sample_id.clone());
            sheet.samples.insert(sample_id, record);
        }
        Ok(sheet)
    }

    pub fn from_table(table: &Table) -> Result<(Self, String), HierarchyError> {
        let mut sheet = Self::default();
        let mut audit = String::new();
        let mut columns: Option<Vec<(usize, String)>> = None;

        for (row_idx, row) in table.rows().enumerate() {
            let Some((attr, values)) = row.split_first() else {
                continue;
            };
            let lowered = attr.to_lowercase();
            if is_placeholder(attr) || lowered.starts_with("optional field") {
                continue;
            }
            if lowered == "sample id" {
                // Blank ids inside the header keep their column position.
                let header = trim_trailing_placeholders(values)
                    .iter()
                    .enumerate()
                    .filter(|(_, value)| !is_placeholder(value))
                    .map(|(position, value)| (position, value.trim().to_string()))
                    .collect::<Vec<_>>();
                sheet = Self::from_samples(
                    header
                        .iter()
                        .map(|(_, sample_id)| (sample_id.clone(), FlatRecord::new())),
                )?;
                columns = Some(header);
                continue;
            }
            let Some(columns) = columns.as_ref() else {
                return Err(HierarchyError::MissingSampleHeader {
                    row: row_idx,
                    field: attr.to_string(),
                });
            };

            for (position, sample_id) in columns {
                let raw = values.get(*position).map(String::as_str).unwrap_or("");
                let _ = writeln!(audit, "{sample_id}\t{attr}\t{raw}");
                if let Some(record) = sheet.samples.get_mut(sample_id.as_str()) {
                    record.insert(attr.to_string(), cell_value(raw));
                }
            }
        }

        Ok((sheet, audit))
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn get(&self, sample_id: &str) -> Option<&FlatRecord> {
        self.samples.get(sample_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlatRecord)> {
        self.sample_ids.iter().filter_map(|sample_id| {
            self.samples
                .get(sample_id)
                .map(|record| (sample_id.as_str(), record))
        })
    }

    pub fn len(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_ids.is_empty()
    }
}

impl Serialize for SampleSheet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

pub fn value_count(record: &ParsedRecord, field: &str) -> usize {
    record.get(field).map(ValueList::len).unwrap_or(0)
}
