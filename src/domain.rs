use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HierarchyError;

pub const PLACEHOLDER: &str = "nan";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CollectionType {
    #[serde(rename = "PI_Lab")]
    PiLab,
    Project,
    Sample,
    Analysis,
}

impl CollectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::PiLab => "PI_Lab",
            CollectionType::Project => "Project",
            CollectionType::Sample => "Sample",
            CollectionType::Analysis => "Analysis",
        }
    }

    pub fn template_file(&self) -> &'static str {
        match self {
            CollectionType::PiLab => "pi_lab_collection.json",
            CollectionType::Project => "project_collection.json",
            CollectionType::Sample => "sample_collection.json",
            CollectionType::Analysis => "analysis_collection.json",
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CollectionType {
    type Err = HierarchyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace(['-', ' '], "_");
        match normalized.as_str() {
            "pi" | "pi_lab" => Ok(CollectionType::PiLab),
            "project" => Ok(CollectionType::Project),
            "sample" => Ok(CollectionType::Sample),
            "analysis" => Ok(CollectionType::Analysis),
            _ => Err(HierarchyError::InvalidCollectionType(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionName(String);

impl CollectionName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CollectionName {
    type Err = HierarchyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let is_valid = !value.trim().is_empty()
            && !value.contains(['/', '\\'])
            && value != "."
            && value != "..";
        if !is_valid {
            return Err(HierarchyError::InvalidCollectionName(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

pub type ValueList = Vec<Option<String>>;

pub type ParsedRecord = BTreeMap<String, ValueList>;

pub type FlatRecord = BTreeMap<String, Option<String>>;

pub fn cell_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if is_placeholder(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn is_placeholder(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || trimmed == PLACEHOLDER
}

/// Drops trailing blank or placeholder cells; interior ones are kept.
pub fn trim_trailing_placeholders<S: AsRef<str>>(cells: &[S]) -> &[S] {
    let end = cells
        .iter()
        .rposition(|cell| !is_placeholder(cell.as_ref()))
        .map(|idx| idx + 1)
        .unwrap_or(0);
    &cells[..end]
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn collection_type_accepts_sheet_spellings() {
        for raw in ["PI", "PI_Lab", "pi lab", "PI-Lab"] {
            assert_eq!(raw.parse::<CollectionType>().unwrap(), CollectionType::PiLab);
        }
        assert_eq!(
            "project".parse::<CollectionType>().unwrap(),
            CollectionType::Project
        );
        let err = "Experiment".parse::<CollectionType>().unwrap_err();
        assert_matches!(err, HierarchyError::InvalidCollectionType(_));
    }

    #[test]
    fn collection_name_rejects_separators() {
        assert!("Sample_S1_tumor".parse::<CollectionName>().is_ok());
        let err = "Sample_S1/tumor".parse::<CollectionName>().unwrap_err();
        assert_matches!(err, HierarchyError::InvalidCollectionName(_));
        assert!("".parse::<CollectionName>().is_err());
    }

    #[test]
    fn trailing_placeholders_are_stripped() {
        let cells = ["a", "b", "nan", "nan"];
        assert_eq!(trim_trailing_placeholders(&cells), &["a", "b"]);
    }

    #[test]
    fn interior_placeholders_are_kept() {
        let cells = ["nan", "a", "nan", "b"];
        assert_eq!(trim_trailing_placeholders(&cells), &cells);
    }

    #[test]
    fn all_placeholder_row_is_empty() {
        let cells = ["", " nan ", ""];
        assert!(trim_trailing_placeholders(&cells).is_empty());
    }

    #[test]
    fn cell_value_maps_placeholders_to_none() {
        assert_eq!(cell_value(" nan "), None);
        assert_eq!(cell_value(""), None);
        assert_eq!(cell_value(" RNA-seq "), Some("RNA-seq".to_string()));
    }
}
