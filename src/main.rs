//! churn-pipeline entrypoint: file-based batch scoring and training-set
//! preparation. All pipeline work happens in the library; this file owns
//! paths, config loading and logger setup.

use churn_pipeline::{
    config::PipelineConfig,
    logging::{CollectingSink, QualitySink, StructuredLogger, TracingSink},
    model::{ChurnModel, LinearChurnModel},
    scoring::BatchScorer,
    table::csv::{read_csv, write_csv},
    table::{RawTable, RawValue},
    training::TrainingPipeline,
};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "churn-pipeline", version, about = "Churn feature pipeline and batch scorer")]
struct Cli {
    /// JSON config file; defaults apply when it does not exist
    #[arg(long, env = "CHURN_CONFIG_PATH", default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a CSV of customer records with a fitted model
    Score {
        #[arg(long)]
        input: PathBuf,
        /// Linear model JSON, or an .onnx file when built with the `onnx` feature
        #[arg(long)]
        model: PathBuf,
        /// Target schema JSON, required for ONNX models
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Output CSV; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write data-quality events as ndjson
        #[arg(long)]
        quality_report: Option<PathBuf>,
    },
    /// Build the fitted feature layout and design matrix for a training CSV
    Prepare {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        schema_out: PathBuf,
        #[arg(long)]
        matrix_out: PathBuf,
    },
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn read_table(path: &Path) -> Result<RawTable, BoxError> {
    let file = File::open(path)?;
    Ok(read_csv(BufReader::new(file))?)
}

fn load_model(path: &Path, schema: Option<&Path>) -> Result<Box<dyn ChurnModel>, BoxError> {
    if path.extension().and_then(|e| e.to_str()) == Some("onnx") {
        #[cfg(feature = "onnx")]
        {
            let schema = schema.ok_or("--schema is required for ONNX models")?;
            let schema = serde_json::from_str(&std::fs::read_to_string(schema)?)?;
            return Ok(Box::new(churn_pipeline::model::OnnxChurnModel::load(path, schema)?));
        }
        #[cfg(not(feature = "onnx"))]
        {
            let _ = schema;
            return Err("built without the `onnx` feature".into());
        }
    }
    Ok(Box::new(LinearChurnModel::load(path)?))
}

/// Forward collected events to the subscriber and optionally to an ndjson file.
fn report_quality(sink: &CollectingSink, path: Option<&Path>) -> Result<(), BoxError> {
    let events = sink.take();
    let mut columns: Vec<&str> = events.iter().map(|e| e.column()).collect();
    columns.sort_unstable();
    columns.dedup();
    if !columns.is_empty() {
        info!(events = events.len(), columns = ?columns, "data-quality events");
    }

    if let Some(path) = path {
        let mut w = BufWriter::new(File::create(path)?);
        for event in &events {
            StructuredLogger::emit_json(event, &mut w);
        }
        w.flush()?;
    }
    for event in events {
        TracingSink.record(event);
    }
    Ok(())
}

fn score(
    config: &PipelineConfig,
    input: &Path,
    model: &Path,
    schema: Option<&Path>,
    output: Option<&Path>,
    quality_report: Option<&Path>,
) -> Result<(), BoxError> {
    let raw = read_table(input)?;
    let model = load_model(model, schema)?;
    let scorer = BatchScorer::new(config);

    let sink = CollectingSink::new();
    let scored = scorer.score(&raw, model.as_ref(), &sink);
    report_quality(&sink, quality_report)?;
    let predictions = scored?;
    info!(
        batch_id = %predictions.batch_id,
        rows = predictions.len(),
        churners = predictions.predicted_churners(),
        model = %predictions.model,
        "batch scored"
    );

    let table = predictions.to_raw_table();
    match output {
        Some(path) => write_csv(&table, BufWriter::new(File::create(path)?))?,
        None => write_csv(&table, std::io::stdout().lock())?,
    }
    Ok(())
}

fn prepare(
    config: &PipelineConfig,
    input: &Path,
    schema_out: &Path,
    matrix_out: &Path,
) -> Result<(), BoxError> {
    let raw = read_table(input)?;
    let set = TrainingPipeline::new(config).prepare(&raw, &TracingSink)?;

    let mut schema_file = BufWriter::new(File::create(schema_out)?);
    serde_json::to_writer_pretty(&mut schema_file, &set.schema)?;
    schema_file.flush()?;

    let mut columns = set.features.feature_names.clone();
    columns.push(config.input.target_column.clone());
    let rows = set
        .features
        .matrix
        .outer_iter()
        .zip(&set.labels)
        .map(|(row, label)| {
            let mut values: Vec<RawValue> = row.iter().map(|v| RawValue::Number(*v)).collect();
            values.push(RawValue::Number(*label as f64));
            values
        })
        .collect();
    write_csv(
        &RawTable::new(columns, rows),
        BufWriter::new(File::create(matrix_out)?),
    )?;

    info!(
        rows = set.labels.len(),
        features = set.schema.width(),
        schema = %schema_out.display(),
        "training set prepared"
    );
    Ok(())
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = PipelineConfig::load(&cli.config)?;

    StructuredLogger::init(config.log.json, &config.log.level);

    match &cli.command {
        Command::Score {
            input,
            model,
            schema,
            output,
            quality_report,
        } => score(
            &config,
            input,
            model,
            schema.as_deref(),
            output.as_deref(),
            quality_report.as_deref(),
        ),
        Command::Prepare {
            input,
            schema_out,
            matrix_out,
        } => prepare(&config, input, schema_out, matrix_out),
    }
}
