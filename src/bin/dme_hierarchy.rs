use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use dme_hierarchy::collection::TemplateSet;
use dme_hierarchy::config::ConfigLoader;
use dme_hierarchy::error::HierarchyError;
use dme_hierarchy::output::{ConsoleOutput, JsonOutput, OutputMode};
use dme_hierarchy::pipeline::{GenerateOptions, InputPaths, LOG_DIR, Pipeline, ProgressSink};

#[derive(Parser)]
#[command(name = "dme-hierarchy")]
#[command(about = "Build DME collection metadata (PI_Lab / Project / Sample / Analysis) from request sheets")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Parse the request sheets into JSON mappings and audit logs")]
    Parse(SheetArgs),
    #[command(about = "Generate the collection hierarchy")]
    Generate(GenerateArgs),
}

#[derive(Args, Clone)]
struct SheetArgs {
    /// Data Dictionary sheet (tab-separated).
    #[arg(long)]
    dictionary: Utf8PathBuf,

    /// Project Template sheet (tab-separated).
    #[arg(long)]
    project: Utf8PathBuf,

    /// Sample Template sheet (tab-separated).
    #[arg(long)]
    sample: Utf8PathBuf,

    #[arg(long)]
    output: Utf8PathBuf,

    #[arg(long)]
    config: Option<String>,
}

#[derive(Args, Clone)]
struct GenerateArgs {
    #[command(flatten)]
    sheets: SheetArgs,

    /// Directory holding pi_lab_collection.json, project_collection.json,
    /// sample_collection.json and analysis_collection.json.
    #[arg(long)]
    templates: Option<Utf8PathBuf>,

    /// QC metrics table keyed by sample name.
    #[arg(long)]
    qc: Option<Utf8PathBuf>,

    /// Primary analysis record (.json or two-column TSV).
    #[arg(long)]
    analysis: Option<Utf8PathBuf>,

    /// Map common field names to canonical DME names first.
    #[arg(long)]
    convert: bool,

    #[arg(long)]
    project_id: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<HierarchyError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HierarchyError) -> u8 {
    if error.is_input_access() {
        return 2;
    }
    match error {
        HierarchyError::InvalidCollectionType(_)
        | HierarchyError::UndefinedCollectionType { .. }
        | HierarchyError::MissingSampleHeader { .. }
        | HierarchyError::DuplicateSampleId(_)
        | HierarchyError::UnresolvedField { .. }
        | HierarchyError::DuplicateCanonicalName { .. }
        | HierarchyError::IndexOutOfRange { .. }
        | HierarchyError::MissingField { .. }
        | HierarchyError::MissingRequiredFields { .. }
        | HierarchyError::InvalidCollectionName(_)
        | HierarchyError::DuplicateCollectionName { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Parse(args) => run_parse(args, output_mode),
        Commands::Generate(args) => run_generate(args, output_mode),
    }
}

fn sink_for(output_mode: OutputMode) -> &'static dyn ProgressSink {
    match output_mode {
        OutputMode::Interactive => &ConsoleOutput,
        OutputMode::NonInteractive => &JsonOutput,
    }
}

fn run_parse(args: SheetArgs, output_mode: OutputMode) -> miette::Result<()> {
    let config = ConfigLoader::resolve(args.config.as_deref())?;
    let pipeline = Pipeline::new(config);
    let paths = InputPaths {
        dictionary: args.dictionary,
        project: args.project,
        sample: args.sample,
        qc: None,
        analysis: None,
    };

    let result = pipeline.parse(&paths, &args.output, sink_for(output_mode))?;
    match output_mode {
        OutputMode::Interactive => ConsoleOutput::print_parse(&result),
        OutputMode::NonInteractive => JsonOutput::print_parse(&result).into_diagnostic()?,
    }
    Ok(())
}

fn run_generate(args: GenerateArgs, output_mode: OutputMode) -> miette::Result<()> {
    let sheets = args.sheets;
    let config = ConfigLoader::resolve(sheets.config.as_deref())?;
    let templates_dir = args.templates.or_else(|| config.templates.clone());
    let templates = TemplateSet::load(templates_dir.as_deref())?;
    let pipeline = Pipeline::new(config);
    let sink = sink_for(output_mode);

    let paths = InputPaths {
        dictionary: sheets.dictionary,
        project: sheets.project,
        sample: sheets.sample,
        qc: args.qc,
        analysis: args.analysis,
    };
    let log_dir = sheets.output.join(LOG_DIR);
    let inputs = pipeline.load_inputs(&paths, Some(&log_dir), sink)?;

    let options = GenerateOptions {
        convert: args.convert,
        project_id: args.project_id,
    };
    let result = pipeline.generate(&inputs, &templates, &sheets.output, &options, sink)?;
    match output_mode {
        OutputMode::Interactive => ConsoleOutput::print_generate(&result),
        OutputMode::NonInteractive => JsonOutput::print_generate(&result).into_diagnostic()?,
    }
    Ok(())
}
