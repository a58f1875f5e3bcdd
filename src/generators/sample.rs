use tracing::debug;

use crate::auxiliary::QcMetadata;
use crate::collection::Template;
use crate::domain::{CollectionName, CollectionType};
use crate::error::HierarchyError;
use crate::sheets::SampleSheet;

use super::{COLLECTION_TYPE_ATTRIBUTE, CollectionGenerator, NamedDocument, seeded_document};

pub const SAMPLE_NAME_FIELD: &str = "sample_name";

pub struct SampleGenerator<'a> {
    samples: &'a SampleSheet,
    qc: Option<&'a QcMetadata>,
}

impl<'a> SampleGenerator<'a> {
    pub fn new(samples: &'a SampleSheet) -> Self {
        Self { samples, qc: None }
    }

    pub fn with_qc(mut self, qc: Option<&'a QcMetadata>) -> Self {
        self.qc = qc;
        self
    }
}

impl CollectionGenerator for SampleGenerator<'_> {
    fn collection_type(&self) -> CollectionType {
        CollectionType::Sample
    }

    fn build(&self, template: &Template) -> Result<Vec<NamedDocument>, HierarchyError> {
        self.samples
            .iter()
            .map(|(sample_id, record)| {
                let sample_name = record
                    .get(SAMPLE_NAME_FIELD)
                    .and_then(|value| value.as_deref())
                    .ok_or_else(|| HierarchyError::MissingField {
                        collection: CollectionType::Sample,
                        field: format!("{SAMPLE_NAME_FIELD} (sample {sample_id})"),
                    })?;

                let mut document = seeded_document(CollectionType::Sample, template);
                for (field, value) in record {
                    if field == COLLECTION_TYPE_ATTRIBUTE {
                        continue;
                    }
                    if let Some(value) = value {
                        document.push(field.as_str(), value.as_str());
                    }
                }

                match self.qc.and_then(|qc| qc.get(sample_name)) {
                    Some(entries) => {
                        for entry in entries {
                            document.push(entry.attribute.as_str(), entry.value.as_str());
                        }
                    }
                    None if self.qc.is_some() => {
                        debug!(sample_id, sample_name, "no QC metadata for sample");
                    }
                    None => {}
                }

                let name = sample_collection_name(sample_id, sample_name)?;
                Ok(NamedDocument { name, document })
            })
            .collect()
    }
}

pub fn sample_collection_name(
    sample_id: &str,
    sample_name: &str,
) -> Result<CollectionName, HierarchyError> {
    format!("Sample_{sample_id}_{sample_name}").parse()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::domain::FlatRecord;
    use crate::table::Table;

    fn sheet() -> SampleSheet {
        let mut s1 = FlatRecord::new();
        s1.insert("sample_name".into(), Some("tumor_a".into()));
        s1.insert("organism".into(), Some("Human".into()));
        s1.insert("tissue".into(), None);
        let mut s2 = FlatRecord::new();
        s2.insert("sample_name".into(), Some("normal_b".into()));
        SampleSheet::from_samples([("S1".to_string(), s1), ("S2".to_string(), s2)]).unwrap()
    }

    #[test]
    fn qc_metrics_merge_by_sample_name() {
        let samples = sheet();
        let qc = QcMetadata::from_table(&Table::from_rows(vec![
            vec!["Sample", "total_reads"],
            vec!["tumor_a", "1200"],
        ]));
        let docs = SampleGenerator::new(&samples)
            .with_qc(Some(&qc))
            .build(&Template::skeleton(CollectionType::Sample))
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name.as_str(), "Sample_S1_tumor_a");
        assert_eq!(docs[0].document.value("total_reads"), Some("1200"));
        assert_eq!(docs[0].document.value("tissue"), None);
        assert_eq!(docs[0].document.value("organism"), Some("Human"));
        assert_eq!(docs[1].name.as_str(), "Sample_S2_normal_b");
        assert_eq!(docs[1].document.value("total_reads"), None);
    }

    #[test]
    fn sample_without_name_is_an_error() {
        let samples =
            SampleSheet::from_samples([("S9".to_string(), FlatRecord::new())]).unwrap();
        let err = SampleGenerator::new(&samples)
            .build(&Template::skeleton(CollectionType::Sample))
            .unwrap_err();
        assert_matches!(err, HierarchyError::MissingField { .. });
    }
}
