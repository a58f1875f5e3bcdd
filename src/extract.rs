use std::collections::BTreeMap;

use crate::domain::ParsedRecord;
use crate::error::HierarchyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexingPolicy {
    #[default]
    PerSubProject,
    /// Defined once for the whole request; always read at index 0.
    Singular,
    /// Read per sub-project, falling back to index 0 when the list is too
    /// short.
    MandatorySingular,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
    policies: BTreeMap<String, IndexingPolicy>,
}

impl PolicyTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, policy: IndexingPolicy) {
        self.policies.insert(field.into(), policy);
    }

    pub fn policy(&self, field: &str) -> IndexingPolicy {
        self.policies.get(field).copied().unwrap_or_default()
    }
}

pub struct ValueExtractor<'a> {
    policies: &'a PolicyTable,
}

impl<'a> ValueExtractor<'a> {
    pub fn new(policies: &'a PolicyTable) -> Self {
        Self { policies }
    }

    pub fn effective_index(&self, field: &str, index: usize) -> usize {
        match self.policies.policy(field) {
            IndexingPolicy::Singular => 0,
            IndexingPolicy::PerSubProject | IndexingPolicy::MandatorySingular => index,
        }
    }

    /// Value of `field` at `index`. `Ok(None)` is a placeholder cell or an
    /// absent field; a list shorter than the effective index is
    /// `IndexOutOfRange`.
    pub fn value<'r>(
        &self,
        record: &'r ParsedRecord,
        field: &str,
        index: usize,
    ) -> Result<Option<&'r str>, HierarchyError> {
        let Some(values) = record.get(field) else {
            return Ok(None);
        };
        let effective = self.effective_index(field, index);
        values
            .get(effective)
            .map(|value| value.as_deref())
            .ok_or_else(|| HierarchyError::IndexOutOfRange {
                field: field.to_string(),
                index: effective,
                len: values.len(),
            })
    }

    pub fn extract<'r>(
        &self,
        record: &'r ParsedRecord,
        fields: &[&str],
        index: usize,
    ) -> Result<Vec<(String, Option<&'r str>)>, HierarchyError> {
        fields
            .iter()
            .map(|field| Ok((field.to_string(), self.value(record, field, index)?)))
            .collect()
    }

    /// Like [`ValueExtractor::value`], but resolves `IndexOutOfRange` the way
    /// sub-project documents need: mandatory-singular fields fall back to
    /// index 0, every other field is treated as absent.
    pub fn value_or_default<'r>(
        &self,
        record: &'r ParsedRecord,
        field: &str,
        index: usize,
    ) -> Result<Option<&'r str>, HierarchyError> {
        match self.value(record, field, index) {
            Err(HierarchyError::IndexOutOfRange { .. }) => {
                match self.policies.policy(field) {
                    IndexingPolicy::MandatorySingular => self.value(record, field, 0).or(Ok(None)),
                    IndexingPolicy::PerSubProject | IndexingPolicy::Singular => Ok(None),
                }
            }
            other => other,
        }
    }
}
