use std::collections::BTreeMap;
use std::fs;

use camino::Utf8Path;
use serde_json::Value;

use crate::collection::MetadataEntry;
use crate::domain::{FlatRecord, cell_value, is_placeholder};
use crate::error::HierarchyError;
use crate::table::Table;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QcMetadata {
    by_sample: BTreeMap<String, Vec<MetadataEntry>>,
}

impl QcMetadata {
    pub fn from_table(table: &Table) -> Self {
        let mut rows = table.rows();
        let Some(header) = rows.next() else {
            return Self::default();
        };

        let mut by_sample: BTreeMap<String, Vec<MetadataEntry>> = BTreeMap::new();
        for row in rows {
            let Some((sample, metrics)) = row.split_first() else {
                continue;
            };
            if is_placeholder(sample) {
                continue;
            }
            let entries = by_sample.entry(sample.trim().to_string()).or_default();
            for (attribute, value) in header.iter().skip(1).zip(metrics) {
                if is_placeholder(attribute) {
                    continue;
                }
                if let Some(value) = cell_value(value) {
                    entries.push(MetadataEntry {
                        attribute: attribute.trim().to_string(),
                        value,
                    });
                }
            }
        }
        Self { by_sample }
    }

    pub fn from_path(path: &Utf8Path) -> Result<Self, HierarchyError> {
        Ok(Self::from_table(&Table::from_tsv_path(path, 0)?))
    }

    pub fn get(&self, sample_name: &str) -> Option<&[MetadataEntry]> {
        self.by_sample.get(sample_name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_sample.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sample.is_empty()
    }
}

pub fn read_analysis_record(path: &Utf8Path) -> Result<FlatRecord, HierarchyError> {
    let input_error = |message: String| HierarchyError::InputRead {
        path: path.as_std_path().to_path_buf(),
        message,
    };

    if path.extension() == Some("json") {
        let content =
            fs::read_to_string(path.as_std_path()).map_err(|err| input_error(err.to_string()))?;
        let value: Value =
            serde_json::from_str(&content).map_err(|err| input_error(err.to_string()))?;
        return analysis_record_from_json(value).map_err(input_error);
    }

    Ok(analysis_record_from_table(&Table::from_tsv_path(path, 0)?))
}

pub fn analysis_record_from_table(table: &Table) -> FlatRecord {
    table
        .rows()
        .filter_map(|row| {
            let attribute = row.first()?;
            if is_placeholder(attribute) {
                return None;
            }
            let value = row.get(1).and_then(|value| cell_value(value));
            Some((attribute.trim().to_string(), value))
        })
        .collect()
}

pub fn analysis_record_from_json(value: Value) -> Result<FlatRecord, String> {
    let Value::Object(map) = value else {
        return Err("analysis record must be a JSON object".to_string());
    };
    map.into_iter()
        .map(|(attribute, value)| {
            let value = match value {
                Value::Null => None,
                Value::String(text) => cell_value(&text),
                Value::Number(number) => Some(number.to_string()),
                Value::Bool(flag) => Some(flag.to_string()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(format!("analysis field '{attribute}' must be a scalar"));
                }
            };
            Ok((attribute, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn qc_rows_become_entries_per_sample() {
        let table = Table::from_rows(vec![
            vec!["Sample", "percent_duplication", "total_reads", ""],
            vec!["tumor_a", "12.5", "nan", "x"],
            vec!["normal_b", "8.1", "1000000", ""],
            vec!["nan", "1", "2", ""],
        ]);
        let qc = QcMetadata::from_table(&table);

        assert_eq!(qc.len(), 2);
        let tumor = qc.get("tumor_a").unwrap();
        assert_eq!(
            tumor,
            [MetadataEntry {
                attribute: "percent_duplication".to_string(),
                value: "12.5".to_string(),
            }]
        );
        assert_eq!(qc.get("normal_b").unwrap().len(), 2);
        assert!(qc.get("missing").is_none());
    }

    #[test]
    fn analysis_record_from_two_columns() {
        let table = Table::from_rows(vec![
            vec!["method", "bulk"],
            vec!["gtf_ver", "nan"],
            vec!["", "ignored"],
        ]);
        let record = analysis_record_from_table(&table);
        assert_eq!(record.len(), 2);
        assert_eq!(record["method"], Some("bulk".to_string()));
        assert_eq!(record["gtf_ver"], None);
    }

    #[test]
    fn analysis_record_from_json_scalars() {
        let record = analysis_record_from_json(json!({
            "number_of_cases": 12,
            "assembly_name": "hg38",
            "notes": null
        }))
        .unwrap();
        assert_eq!(record["number_of_cases"], Some("12".to_string()));
        assert_eq!(record["notes"], None);

        assert!(analysis_record_from_json(json!({"inputs": ["a"]})).is_err());
    }
}
