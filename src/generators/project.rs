use std::collections::BTreeSet;

use tracing::debug;

use crate::collection::{CollectionDocument, Template};
use crate::domain::{CollectionName, CollectionType, ParsedRecord};
use crate::error::HierarchyError;
use crate::extract::{PolicyTable, ValueExtractor};
use crate::sheets::{ProjectSheet, value_count};

use super::{
    COLLECTION_TYPE_ATTRIBUTE, CollectionGenerator, NamedDocument, first_token, hyphenate,
    require_all, seeded_document, squash,
};

pub const SUB_PROJECT_FIELD: &str = "request_type";

pub struct ProjectGenerator<'a> {
    sheet: &'a ProjectSheet,
    extractor: ValueExtractor<'a>,
    project_id: Option<&'a str>,
}

impl<'a> ProjectGenerator<'a> {
    pub fn new(sheet: &'a ProjectSheet, policies: &'a PolicyTable) -> Self {
        Self {
            sheet,
            extractor: ValueExtractor::new(policies),
            project_id: None,
        }
    }

    pub fn with_project_id(mut self, project_id: Option<&'a str>) -> Self {
        self.project_id = project_id.map(str::trim).filter(|id| !id.is_empty());
        self
    }

    pub fn sub_project_count(&self) -> Result<usize, HierarchyError> {
        self.sheet
            .project_sections()
            .map(|(_, record)| value_count(record, SUB_PROJECT_FIELD))
            .find(|count| *count > 0)
            .ok_or_else(|| HierarchyError::MissingField {
                collection: CollectionType::Project,
                field: SUB_PROJECT_FIELD.to_string(),
            })
    }

    fn sub_project_document(
        &self,
        template: &Template,
        index: usize,
    ) -> Result<CollectionDocument, HierarchyError> {
        let mut document = seeded_document(CollectionType::Project, template);
        let mut seen = BTreeSet::from([COLLECTION_TYPE_ATTRIBUTE]);
        for (_, record) in self.sheet.project_sections() {
            self.copy_fields(record, index, &mut document, &mut seen)?;
        }
        Ok(document)
    }

    fn copy_fields<'r>(
        &self,
        record: &'r ParsedRecord,
        index: usize,
        document: &mut CollectionDocument,
        seen: &mut BTreeSet<&'r str>,
    ) -> Result<(), HierarchyError> {
        for field in record.keys() {
            if !seen.insert(field.as_str()) {
                continue;
            }
            match self.extractor.value_or_default(record, field, index)? {
                Some(value) => document.push(field.as_str(), value),
                None => debug!(field, index, "field omitted for sub-project"),
            }
        }
        Ok(())
    }

    /// `Project_[{id}_]{poc}_{origin}_{cases}{method}_{date}` from a built
    /// sub-project document.
    pub fn collection_name(
        &self,
        document: &CollectionDocument,
    ) -> Result<CollectionName, HierarchyError> {
        let parts = require_all(
            CollectionType::Project,
            &[
                ("project_poc", document.value("project_poc")),
                ("origin", document.value("origin")),
                ("number_of_cases", document.value("number_of_cases")),
                ("method", document.value("method")),
                ("start_date", document.value("start_date")),
            ],
        )?;
        let (poc, origin, cases, method, date) = (parts[0], parts[1], parts[2], parts[3], parts[4]);

        let mut name = String::from("Project_");
        if let Some(project_id) = self.project_id {
            name.push_str(&squash(project_id));
            name.push('_');
        }
        name.push_str(&format!(
            "{}_{}_{}{}_{}",
            squash(poc),
            hyphenate(origin),
            squash(cases),
            hyphenate(method),
            first_token(date)
        ));
        name.parse()
    }
}

impl CollectionGenerator for ProjectGenerator<'_> {
    fn collection_type(&self) -> CollectionType {
        CollectionType::Project
    }

    fn build(&self, template: &Template) -> Result<Vec<NamedDocument>, HierarchyError> {
        let count = self.sub_project_count()?;
        (0..count)
            .map(|index| {
                let document = self.sub_project_document(template, index)?;
                let name = self.collection_name(&document)?;
                Ok(NamedDocument { name, document })
            })
            .collect()
    }
}
