use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::domain::{CollectionName, CollectionType};
use crate::error::HierarchyError;
use crate::fs_util::{pretty_json_bytes, write_bytes_atomic};

pub const ENTRIES_KEY: &str = "metadataEntries";
pub const METADATA_SUFFIX: &str = ".metadata.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    pub attribute: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    body: Map<String, Value>,
}

impl Template {
    pub fn skeleton(collection: CollectionType) -> Self {
        let mut body = Map::new();
        body.insert(ENTRIES_KEY.to_string(), Value::Array(Vec::new()));
        Self {
            name: collection.template_file().to_string(),
            body,
        }
    }

    pub fn from_value(name: impl Into<String>, value: Value) -> Result<Self, HierarchyError> {
        let name = name.into();
        let Value::Object(body) = value else {
            return Err(HierarchyError::InvalidTemplate {
                name,
                message: "template must be a JSON object".to_string(),
            });
        };
        if !matches!(body.get(ENTRIES_KEY), Some(Value::Array(_))) {
            return Err(HierarchyError::InvalidTemplate {
                name,
                message: format!("'{ENTRIES_KEY}' must be an array"),
            });
        }
        Ok(Self { name, body })
    }

    pub fn load(dir: Option<&Utf8Path>, collection: CollectionType) -> Result<Self, HierarchyError> {
        let Some(dir) = dir else {
            return Ok(Self::skeleton(collection));
        };
        let path = dir.join(collection.template_file());
        let read_error = |message: String| HierarchyError::TemplateRead {
            path: path.as_std_path().to_path_buf(),
            message,
        };
        let content =
            fs::read_to_string(path.as_std_path()).map_err(|err| read_error(err.to_string()))?;
        let value: Value =
            serde_json::from_str(&content).map_err(|err| read_error(err.to_string()))?;
        Self::from_value(collection.template_file(), value)
    }
}

#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub pi_lab: Template,
    pub project: Template,
    pub sample: Template,
    pub analysis: Template,
}

impl TemplateSet {
    pub fn load(dir: Option<&Utf8Path>) -> Result<Self, HierarchyError> {
        Ok(Self {
            pi_lab: Template::load(dir, CollectionType::PiLab)?,
            project: Template::load(dir, CollectionType::Project)?,
            sample: Template::load(dir, CollectionType::Sample)?,
            analysis: Template::load(dir, CollectionType::Analysis)?,
        })
    }

    pub fn get(&self, collection: CollectionType) -> &Template {
        match collection {
            CollectionType::PiLab => &self.pi_lab,
            CollectionType::Project => &self.project,
            CollectionType::Sample => &self.sample,
            CollectionType::Analysis => &self.analysis,
        }
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            pi_lab: Template::skeleton(CollectionType::PiLab),
            project: Template::skeleton(CollectionType::Project),
            sample: Template::skeleton(CollectionType::Sample),
            analysis: Template::skeleton(CollectionType::Analysis),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionDocument {
    collection: CollectionType,
    template: Template,
    entries: Vec<MetadataEntry>,
}

impl CollectionDocument {
    pub fn new(collection: CollectionType, template: &Template) -> Self {
        Self {
            collection,
            template: template.clone(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, attribute: impl Into<String>, value: impl Into<String>) {
        self.entries.push(MetadataEntry {
            attribute: attribute.into(),
            value: value.into(),
        });
    }

    pub fn collection(&self) -> CollectionType {
        self.collection
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn value(&self, attribute: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.attribute == attribute)
            .map(|entry| entry.value.as_str())
    }

    pub fn to_value(&self) -> Result<Value, HierarchyError> {
        let mut body = self.template.body.clone();
        let Some(Value::Array(items)) = body.get_mut(ENTRIES_KEY) else {
            return Err(HierarchyError::InvalidTemplate {
                name: self.template.name.clone(),
                message: format!("'{ENTRIES_KEY}' must be an array"),
            });
        };
        for entry in &self.entries {
            items.push(
                serde_json::to_value(entry)
                    .map_err(|err| HierarchyError::Serialize(err.to_string()))?,
            );
        }
        Ok(Value::Object(body))
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, HierarchyError> {
        pretty_json_bytes(&self.to_value()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenCollection {
    pub collection_type: CollectionType,
    pub name: CollectionName,
    pub metadata_path: Utf8PathBuf,
    pub directory: Utf8PathBuf,
}

pub fn write_collection(
    parent: &Utf8Path,
    name: &CollectionName,
    document: &CollectionDocument,
) -> Result<WrittenCollection, HierarchyError> {
    let metadata_path = parent.join(format!("{name}{METADATA_SUFFIX}"));
    let directory = parent.join(name.as_str());

    write_bytes_atomic(&metadata_path, &document.to_json_bytes()?)?;
    fs::create_dir_all(directory.as_std_path())
        .map_err(|err| HierarchyError::Filesystem(format!("create {directory}: {err}")))?;
    info!(
        collection = %document.collection(),
        name = %name,
        entries = document.entries().len(),
        "wrote collection metadata"
    );

    Ok(WrittenCollection {
        collection_type: document.collection(),
        name: name.clone(),
        metadata_path,
        directory,
    })
}
