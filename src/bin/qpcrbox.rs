use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use qpcrbox::api::{QpcrApi, QpcrHttpClient};
use qpcrbox::chart;
use qpcrbox::domain::{FormatTag, RawExport};
use qpcrbox::error::QpcrError;
use qpcrbox::output::{DetectorChart, DetectorsReport, JsonOutput, RunReport};
use qpcrbox::parser;
use qpcrbox::pipeline::{Pipeline, Submission};

#[derive(Parser)]
#[command(name = "qpcrbox")]
#[command(about = "Parse AB7300 qPCR exports, submit them for quantification and derive RQ chart data")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Parse an export and list its detectors")]
    Detectors(DetectorsArgs),
    #[command(about = "Run the full pipeline: parse, submit, fetch, derive chart data")]
    Run(RunArgs),
    #[command(about = "Query the quantification service's rate-limit status")]
    RateLimit(ApiArgs),
}

#[derive(Args)]
struct DetectorsArgs {
    file: PathBuf,

    #[arg(long, value_enum, default_value_t = FormatTag::Ab7300)]
    format: FormatTag,
}

#[derive(Args)]
struct RunArgs {
    file: PathBuf,

    #[arg(long, value_enum, default_value_t = FormatTag::Ab7300)]
    format: FormatTag,

    #[arg(long, help = "Reference detector; defaults to the parser's suggestion")]
    mock: Option<String>,

    #[arg(long, help = "Derive chart data for this detector only")]
    detector: Option<String>,

    #[command(flatten)]
    api: ApiArgs,
}

#[derive(Args, Clone)]
struct ApiArgs {
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long)]
    consumer_token: Option<String>,
}

impl ApiArgs {
    fn client(&self) -> Result<QpcrHttpClient, QpcrError> {
        let base_url = self
            .base_url
            .clone()
            .or_else(|| std::env::var("QPCRBOX_API_URL").ok());
        let consumer_token = self
            .consumer_token
            .clone()
            .or_else(|| std::env::var("QPCRBOX_CONSUMER_TOKEN").ok());
        QpcrHttpClient::new(base_url, consumer_token)
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(qpcr) = report.downcast_ref::<QpcrError>() {
            return ExitCode::from(map_exit_code(qpcr));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &QpcrError) -> u8 {
    match error {
        QpcrError::InvalidFormatTag(_)
        | QpcrError::MissingReference
        | QpcrError::UnknownDetector(_) => 2,
        QpcrError::ApiHttp(_) | QpcrError::ApiStatus { .. } | QpcrError::ApiDecode(_) => 3,
        QpcrError::RateLimited { .. } => 4,
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
    match cli.command {
        Commands::Detectors(args) => run_detectors(args),
        Commands::Run(args) => run_pipeline(args),
        Commands::RateLimit(args) => run_rate_limit(args),
    }
}

fn run_detectors(args: DetectorsArgs) -> miette::Result<()> {
    let raw = read_export(&args.file).into_diagnostic()?;
    let detectors = parser::parse(args.format, &raw);
    let report = DetectorsReport {
        suggested_reference: detectors.suggested_reference().map(|name| name.to_string()),
        detectors: detectors.iter().cloned().collect(),
    };
    JsonOutput::print_detectors(&report).into_diagnostic()
}

fn run_pipeline(args: RunArgs) -> miette::Result<()> {
    let raw = read_export(&args.file).into_diagnostic()?;
    let detectors = parser::parse(args.format, &raw);
    let mock = args
        .mock
        .or_else(|| detectors.suggested_reference().map(|name| name.to_string()))
        .ok_or(QpcrError::MissingReference)
        .into_diagnostic()?;

    let client = args.api.client().into_diagnostic()?;
    let mut pipeline = Pipeline::new(client, args.format);
    let experiment = match pipeline.submit(&raw, &mock).into_diagnostic()? {
        Submission::Completed(experiment) => experiment,
        Submission::Suppressed => {
            return Err(miette::Report::msg("nothing to submit: the export file is empty"));
        }
    };

    let results = experiment.results().into_diagnostic()?;
    let charts = match &args.detector {
        Some(name) => vec![DetectorChart {
            detector: name.clone(),
            points: chart::derive(results.record(name).into_diagnostic()?),
        }],
        None => results
            .detectors
            .iter()
            .map(|(name, record)| DetectorChart {
                detector: name.clone(),
                points: chart::derive(record),
            })
            .collect(),
    };

    let report = RunReport {
        experiment: experiment.clone(),
        charts,
    };
    JsonOutput::print_run(&report).into_diagnostic()
}

fn run_rate_limit(args: ApiArgs) -> miette::Result<()> {
    let client = args.client().into_diagnostic()?;
    let status = client.rate_limit().into_diagnostic()?;
    JsonOutput::print_rate_limit(&status).into_diagnostic()
}

fn read_export(path: &PathBuf) -> Result<RawExport, QpcrError> {
    let content = fs::read_to_string(path)
        .map_err(|err| QpcrError::Filesystem(format!("{}: {err}", path.display())))?;
    Ok(RawExport::new(content))
}
