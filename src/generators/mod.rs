pub mod analysis;
pub mod pi;
pub mod project;
pub mod sample;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;

use crate::collection::{CollectionDocument, Template, WrittenCollection, write_collection};
use crate::domain::{CollectionName, CollectionType};
use crate::error::HierarchyError;

pub use analysis::AnalysisGenerator;
pub use pi::PiLabGenerator;
pub use project::ProjectGenerator;
pub use sample::SampleGenerator;

pub const COLLECTION_TYPE_ATTRIBUTE: &str = "collection_type";

pub type GeneratedCollections = BTreeMap<CollectionName, WrittenCollection>;

#[derive(Debug, Clone)]
pub struct NamedDocument {
    pub name: CollectionName,
    pub document: CollectionDocument,
}

pub trait CollectionGenerator {
    fn collection_type(&self) -> CollectionType;

    fn build(&self, template: &Template) -> Result<Vec<NamedDocument>, HierarchyError>;

    fn generate(
        &self,
        template: &Template,
        parent: &Utf8Path,
    ) -> Result<GeneratedCollections, HierarchyError> {
        let documents = self.build(template)?;
        let mut names = BTreeSet::new();
        for named in &documents {
            if !names.insert(&named.name) {
                return Err(HierarchyError::DuplicateCollectionName {
                    collection: self.collection_type(),
                    name: named.name.to_string(),
                });
            }
        }

        let mut written = GeneratedCollections::new();
        for named in documents {
            let location = write_collection(parent, &named.name, &named.document)?;
            written.insert(named.name, location);
        }
        Ok(written)
    }
}

fn seeded_document(collection: CollectionType, template: &Template) -> CollectionDocument {
    let mut document = CollectionDocument::new(collection, template);
    document.push(COLLECTION_TYPE_ATTRIBUTE, collection.as_str());
    document
}

/// Fails with every name field that is missing, not just the first.
fn require_all<'a>(
    collection: CollectionType,
    fields: &[(&str, Option<&'a str>)],
) -> Result<Vec<&'a str>, HierarchyError> {
    let missing = fields
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(field, _)| field.to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(HierarchyError::MissingRequiredFields {
            collection,
            fields: missing,
        });
    }
    Ok(fields.iter().filter_map(|(_, value)| *value).collect())
}

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

fn squash(value: &str) -> String {
    WHITESPACE.replace_all(value.trim(), "").into_owned()
}

fn hyphenate(value: &str) -> String {
    WHITESPACE.replace_all(value.trim(), "-").into_owned()
}

fn first_token(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn name_part_helpers() {
        assert_eq!(squash(" Jane  Doe "), "JaneDoe");
        assert_eq!(hyphenate("single cell\tRNA"), "single-cell-RNA");
        assert_eq!(first_token("2024-03-01 00:00:00"), "2024-03-01");
        assert_eq!(first_token("   "), "");
    }

    #[test]
    fn require_all_reports_every_missing_field() {
        let err = require_all(
            CollectionType::Analysis,
            &[("method", Some("bulk")), ("gtf_ver", None), ("assembly_name", None)],
        )
        .unwrap_err();
        assert_matches!(
            err,
            HierarchyError::MissingRequiredFields { fields, .. }
                if fields == vec!["gtf_ver".to_string(), "assembly_name".to_string()]
        );
    }
}
