use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::HierarchyError;
use crate::extract::{IndexingPolicy, PolicyTable};

pub const DEFAULT_CONFIG_FILE: &str = "dme-hierarchy.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_dictionary: Option<DictionarySheetConfig>,
    #[serde(default)]
    pub project_sheet: Option<SheetConfig>,
    #[serde(default)]
    pub sample_sheet: Option<SheetConfig>,
    #[serde(default)]
    pub project: Option<ProjectConfig>,
    #[serde(default)]
    pub templates: Option<Utf8PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DictionarySheetConfig {
    #[serde(default)]
    pub skip_lines: Option<usize>,
    #[serde(default)]
    pub columns: Option<DictionaryColumns>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SheetConfig {
    #[serde(default)]
    pub skip_lines: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub singular_fields: Option<Vec<String>>,
    #[serde(default)]
    pub mandatory_singular_fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DictionaryColumns {
    pub collection_type: usize,
    pub is_required: usize,
    pub field_name: usize,
    pub dme_name: usize,
}

impl Default for DictionaryColumns {
    fn default() -> Self {
        Self {
            collection_type: 0,
            is_required: 1,
            field_name: 2,
            dme_name: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub dictionary_skip_lines: usize,
    pub dictionary_columns: DictionaryColumns,
    pub project_skip_lines: usize,
    pub sample_skip_lines: usize,
    pub policies: PolicyTable,
    pub templates: Option<Utf8PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, HierarchyError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| HierarchyError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| HierarchyError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, HierarchyError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(HierarchyError::InvalidConfig(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let dictionary = config.data_dictionary.unwrap_or_default();
        let dictionary_columns = dictionary.columns.unwrap_or_default();
        if dictionary_columns.field_name == dictionary_columns.dme_name {
            return Err(HierarchyError::InvalidConfig(
                "data_dictionary field_name and dme_name must be different columns".to_string(),
            ));
        }
        let project = config.project.unwrap_or_default();

        let mut policies = PolicyTable::empty();
        for field in project
            .mandatory_singular_fields
            .unwrap_or_else(default_mandatory_singular_fields)
        {
            policies.set(field, IndexingPolicy::MandatorySingular);
        }
        for field in project
            .singular_fields
            .unwrap_or_else(default_singular_fields)
        {
            if policies.policy(&field) == IndexingPolicy::MandatorySingular {
                return Err(HierarchyError::InvalidConfig(format!(
                    "field '{field}' is listed as both singular and mandatory-singular"
                )));
            }
            policies.set(field, IndexingPolicy::Singular);
        }

        Ok(ResolvedConfig {
            schema_version,
            dictionary_skip_lines: dictionary.skip_lines.unwrap_or(1),
            dictionary_columns,
            project_skip_lines: config
                .project_sheet
                .and_then(|sheet| sheet.skip_lines)
                .unwrap_or(2),
            sample_skip_lines: config
                .sample_sheet
                .and_then(|sheet| sheet.skip_lines)
                .unwrap_or(2),
            policies,
            templates: config.templates,
        })
    }
}

pub fn default_singular_fields() -> Vec<String> {
    vec![
        "project_poc".to_string(),
        "poc_email".to_string(),
        "start_date".to_string(),
    ]
}

pub fn default_mandatory_singular_fields() -> Vec<String> {
    vec![
        "project_title".to_string(),
        "project_description".to_string(),
    ]
}
