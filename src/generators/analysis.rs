use crate::collection::Template;
use crate::domain::{CollectionName, CollectionType, FlatRecord};
use crate::error::HierarchyError;

use super::{
    COLLECTION_TYPE_ATTRIBUTE, CollectionGenerator, NamedDocument, hyphenate, require_all,
    seeded_document, squash,
};

pub const REQUIRED_ANALYSIS_FIELDS: [&str; 5] = [
    "number_of_cases",
    "method",
    "assembly_name",
    "gtf_ver",
    "md5_all_inputs_serial",
];

pub struct AnalysisGenerator<'a> {
    record: &'a FlatRecord,
}

impl<'a> AnalysisGenerator<'a> {
    pub fn new(record: &'a FlatRecord) -> Self {
        Self { record }
    }

    /// `Primary_Analysis_{cases}{method}_{assembly}_{gtf}_{md5}`. Every
    /// missing required field is reported at once.
    pub fn collection_name(&self) -> Result<CollectionName, HierarchyError> {
        let fields = REQUIRED_ANALYSIS_FIELDS
            .iter()
            .map(|field| {
                let value = self.record.get(*field).and_then(|value| value.as_deref());
                (*field, value)
            })
            .collect::<Vec<_>>();
        let parts = require_all(CollectionType::Analysis, &fields)?;

        format!(
            "Primary_Analysis_{}{}_{}_{}_{}",
            squash(parts[0]),
            hyphenate(parts[1]),
            squash(parts[2]),
            squash(parts[3]),
            squash(parts[4]),
        )
        .parse()
    }
}

impl CollectionGenerator for AnalysisGenerator<'_> {
    fn collection_type(&self) -> CollectionType {
        CollectionType::Analysis
    }

    fn build(&self, template: &Template) -> Result<Vec<NamedDocument>, HierarchyError> {
        let name = self.collection_name()?;
        let mut document = seeded_document(CollectionType::Analysis, template);
        for (field, value) in self.record {
            if field == COLLECTION_TYPE_ATTRIBUTE {
                continue;
            }
            if let Some(value) = value {
                document.push(field.as_str(), value.as_str());
            }
        }
        Ok(vec![NamedDocument { name, document }])
    }
}
