use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::CollectionType;

#[derive(Debug, Error, Diagnostic)]
pub enum HierarchyError {
    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to read input {path}: {message}")]
    InputRead { path: PathBuf, message: String },

    #[error("failed to read template {path}: {message}")]
    TemplateRead { path: PathBuf, message: String },

    #[error("invalid template {name}: {message}")]
    InvalidTemplate { name: String, message: String },

    #[error("invalid collection type: {0}")]
    InvalidCollectionType(String),

    #[error("{sheet} row {row} defines field '{field}' before any collection header")]
    UndefinedCollectionType {
        sheet: &'static str,
        row: usize,
        field: String,
    },

    #[error("sample sheet row {row} defines field '{field}' before the 'Sample ID' header")]
    MissingSampleHeader { row: usize, field: String },

    #[error("duplicate sample id: {0}")]
    DuplicateSampleId(String),

    #[error("field '{field}' is not defined for {collection} or Sample in the data dictionary")]
    #[diagnostic(help("add the field to the Data Dictionary sheet or disable --convert"))]
    UnresolvedField {
        collection: CollectionType,
        field: String,
    },

    #[error("fields '{first}' and '{second}' both map to '{canonical}' in the {collection} collection")]
    DuplicateCanonicalName {
        collection: CollectionType,
        canonical: String,
        first: String,
        second: String,
    },

    #[error("field '{field}' has {len} value(s), no value at sub-project index {index}")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },

    #[error("{collection} collection is missing field '{field}'")]
    MissingField {
        collection: CollectionType,
        field: String,
    },

    #[error("{collection} collection is missing required field(s): {}", .fields.join(", "))]
    MissingRequiredFields {
        collection: CollectionType,
        fields: Vec<String>,
    },

    #[error("invalid collection name: {0:?}")]
    InvalidCollectionName(String),

    #[error("{collection} collection name {name} is generated more than once")]
    DuplicateCollectionName {
        collection: CollectionType,
        name: String,
    },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to serialize metadata: {0}")]
    Serialize(String),
}

impl HierarchyError {
    pub fn is_input_access(&self) -> bool {
        matches!(
            self,
            HierarchyError::ConfigRead(_)
                | HierarchyError::ConfigParse(_)
                | HierarchyError::InputRead { .. }
                | HierarchyError::TemplateRead { .. }
        )
    }
}
