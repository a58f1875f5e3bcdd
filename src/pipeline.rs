use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::info;

use crate::auxiliary::{QcMetadata, read_analysis_record};
use crate::collection::{TemplateSet, WrittenCollection};
use crate::config::ResolvedConfig;
use crate::convert::NameConverter;
use crate::dictionary::FieldDictionary;
use crate::domain::{CollectionType, FlatRecord, ParsedRecord};
use crate::error::HierarchyError;
use crate::fs_util::{ensure_dir, pretty_json_bytes, write_bytes_atomic};
use crate::generators::{
    AnalysisGenerator, CollectionGenerator, PiLabGenerator, ProjectGenerator, SampleGenerator,
};
use crate::sheets::{ProjectSheet, SampleSheet};
use crate::table::Table;

pub const LOG_DIR: &str = "logs";
pub const DICTIONARY_LOG: &str = "data_dictionary.txt";
pub const PROJECT_LOG: &str = "project_information.txt";
pub const SAMPLE_LOG: &str = "sample_information.txt";

#[derive(Debug, Clone)]
pub struct InputPaths {
    pub dictionary: Utf8PathBuf,
    pub project: Utf8PathBuf,
    pub sample: Utf8PathBuf,
    pub qc: Option<Utf8PathBuf>,
    pub analysis: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub dictionary: FieldDictionary,
    pub project: ProjectSheet,
    pub samples: SampleSheet,
    pub qc: Option<QcMetadata>,
    pub analysis: Option<FlatRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub convert: bool,
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub output: Utf8PathBuf,
    pub collections: Vec<WrittenCollection>,
}

impl GenerationResult {
    pub fn count(&self, collection: CollectionType) -> usize {
        self.collections
            .iter()
            .filter(|written| written.collection_type == collection)
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub dictionary_fields: usize,
    pub samples: usize,
    pub files: Vec<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

fn phase(sink: &dyn ProgressSink, message: String) {
    sink.event(ProgressEvent {
        message,
        elapsed: None,
    });
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ResolvedConfig,
}

impl Pipeline {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    pub fn load_inputs(
        &self,
        paths: &InputPaths,
        log_dir: Option<&Utf8Path>,
        sink: &dyn ProgressSink,
    ) -> Result<Inputs, HierarchyError> {
        phase(sink, format!("phase=Parse; data dictionary {}", paths.dictionary));
        let table = Table::from_tsv_path(&paths.dictionary, self.config.dictionary_skip_lines)?;
        let (dictionary, dictionary_log) =
            FieldDictionary::from_table(&table, &self.config.dictionary_columns)?;

        phase(sink, format!("phase=Parse; project sheet {}", paths.project));
        let table = Table::from_tsv_path(&paths.project, self.config.project_skip_lines)?;
        let (project, project_log) = ProjectSheet::from_table(&table)?;

        phase(sink, format!("phase=Parse; sample sheet {}", paths.sample));
        let table = Table::from_tsv_path(&paths.sample, self.config.sample_skip_lines)?;
        let (samples, sample_log) = SampleSheet::from_table(&table)?;

        if let Some(log_dir) = log_dir {
            ensure_dir(log_dir)?;
            write_bytes_atomic(&log_dir.join(DICTIONARY_LOG), dictionary_log.as_bytes())?;
            write_bytes_atomic(&log_dir.join(PROJECT_LOG), project_log.as_bytes())?;
            write_bytes_atomic(&log_dir.join(SAMPLE_LOG), sample_log.as_bytes())?;
        }

        let qc = match &paths.qc {
            Some(path) => {
                phase(sink, format!("phase=Parse; QC metrics {path}"));
                Some(QcMetadata::from_path(path)?)
            }
            None => None,
        };
        let analysis = match &paths.analysis {
            Some(path) => {
                phase(sink, format!("phase=Parse; analysis record {path}"));
                Some(read_analysis_record(path)?)
            }
            None => None,
        };

        info!(
            dictionary_fields = dictionary.len(),
            samples = samples.len(),
            qc = qc.is_some(),
            analysis = analysis.is_some(),
            "inputs parsed"
        );
        Ok(Inputs {
            dictionary,
            project,
            samples,
            qc,
            analysis,
        })
    }

    pub fn parse(
        &self,
        paths: &InputPaths,
        output: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<ParseResult, HierarchyError> {
        ensure_dir(output)?;
        let inputs = self.load_inputs(paths, Some(&output.join(LOG_DIR)), sink)?;

        phase(sink, "phase=Store; writing parsed sheets".to_string());
        let files = vec![
            output.join("data_dictionary.json"),
            output.join("project.json"),
            output.join("sample.json"),
        ];
        write_bytes_atomic(&files[0], &pretty_json_bytes(&inputs.dictionary)?)?;
        write_bytes_atomic(&files[1], &pretty_json_bytes(&inputs.project)?)?;
        write_bytes_atomic(&files[2], &pretty_json_bytes(&inputs.samples)?)?;

        Ok(ParseResult {
            dictionary_fields: inputs.dictionary.len(),
            samples: inputs.samples.len(),
            files,
        })
    }

    /// Runs PI, Project, Sample, then Analysis generation under `output`.
    /// Samples and the analysis are nested under every Project collection.
    pub fn generate(
        &self,
        inputs: &Inputs,
        templates: &TemplateSet,
        output: &Utf8Path,
        options: &GenerateOptions,
        sink: &dyn ProgressSink,
    ) -> Result<GenerationResult, HierarchyError> {
        let start = Instant::now();
        ensure_dir(output)?;

        let converted;
        let inputs = if options.convert {
            phase(sink, "phase=Convert; mapping field names".to_string());
            converted = convert_inputs(inputs)?;
            &converted
        } else {
            inputs
        };

        let mut collections = Vec::new();

        phase(sink, "phase=Generate; PI_Lab collection".to_string());
        let empty = ParsedRecord::new();
        let pi_record = inputs
            .project
            .section(CollectionType::PiLab)
            .unwrap_or(&empty);
        let pi_generator = PiLabGenerator::new(pi_record);
        let pi = pi_generator.generate(templates.get(pi_generator.collection_type()), output)?;

        for pi_collection in pi.into_values() {
            phase(sink, format!("phase=Generate; Project collections under {}", pi_collection.name));
            let project_generator = ProjectGenerator::new(&inputs.project, &self.config.policies)
                .with_project_id(options.project_id.as_deref());
            let projects = project_generator.generate(
                templates.get(project_generator.collection_type()),
                &pi_collection.directory,
            )?;
            collections.push(pi_collection);

            for project in projects.into_values() {
                phase(sink, format!("phase=Generate; Sample collections under {}", project.name));
                let sample_generator =
                    SampleGenerator::new(&inputs.samples).with_qc(inputs.qc.as_ref());
                let samples = sample_generator.generate(
                    templates.get(sample_generator.collection_type()),
                    &project.directory,
                )?;

                let analysis = match &inputs.analysis {
                    Some(record) => {
                        phase(sink, format!("phase=Generate; Analysis collection under {}", project.name));
                        let analysis_generator = AnalysisGenerator::new(record);
                        analysis_generator.generate(
                            templates.get(analysis_generator.collection_type()),
                            &project.directory,
                        )?
                    }
                    None => Default::default(),
                };

                collections.push(project);
                collections.extend(samples.into_values());
                collections.extend(analysis.into_values());
            }
        }

        sink.event(ProgressEvent {
            message: format!("phase=Done; {} collections written", collections.len()),
            elapsed: Some(start.elapsed()),
        });
        Ok(GenerationResult {
            output: output.to_path_buf(),
            collections,
        })
    }
}

/// Rewrites the project and sample sheets through the data dictionary. QC
/// metrics and the analysis record already carry canonical names.
pub fn convert_inputs(inputs: &Inputs) -> Result<Inputs, HierarchyError> {
    let converter = NameConverter::new(&inputs.dictionary);
    Ok(Inputs {
        dictionary: inputs.dictionary.clone(),
        project: converter.convert_project_sheet(&inputs.project)?,
        samples: converter.convert_sample_sheet(&inputs.samples)?,
        qc: inputs.qc.clone(),
        analysis: inputs.analysis.clone(),
    })
}
