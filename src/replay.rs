// Replay binary entry point

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, info_span};
use uuid::Uuid;

use sim_recorder::{
    ErrorReport, ReadingBatchInserter, ReadingVector, RecorderConfig, RecordingPipeline,
    SqliteGateway, StepComponent, StepInput,
};

#[derive(Parser, Debug)]
#[command(
    about = "Replay a CSV of elapsed times and sensor readings into the Sensor table of a simulation database."
)]
struct Args {
    /// CSV file with a header row and columns `elapsed` followed by the 15 readings
    input: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = RecorderConfig::from_env().context("Failed to load configuration")?;

    let run_id = Uuid::new_v4().to_string();
    let span = info_span!("run", run_id = %run_id);
    let _guard = span.enter();

    info!(
        input = %args.input.display(),
        database = %config.database_path.display(),
        clear_on_start = config.clear_on_start,
        "Replay starting"
    );

    let gateway = SqliteGateway::open(&config.database_path)
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    let inserter = ReadingBatchInserter::new(gateway, config.inserter()?);
    let mut pipeline = RecordingPipeline::new(config.converter()?, inserter);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    if let Err(e) = pipeline.reset() {
        return fail(&run_id, e.code(), &e.to_string());
    }

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", line + 1))?;
        let row: Vec<f64> = record
            .deserialize(None)
            .with_context(|| format!("CSV row {} is not numeric", line + 1))?;

        let (elapsed, values) = row
            .split_first()
            .ok_or_else(|| anyhow!("CSV row {} is empty", line + 1))?;
        let readings = match ReadingVector::from_slice(values) {
            Ok(readings) => readings,
            Err(e) => return fail(&run_id, e.code(), &format!("CSV row {}: {}", line + 1, e)),
        };

        if let Err(e) = pipeline.step(StepInput::at(*elapsed, readings)) {
            return fail(&run_id, e.code(), &format!("CSV row {}: {}", line + 1, e));
        }
    }

    if let Err(e) = pipeline.finalize() {
        return fail(&run_id, e.code(), &e.to_string());
    }

    let summary = serde_json::to_string_pretty(pipeline.summary())?;
    info!(
        steps = pipeline.summary().steps,
        inserted = pipeline.summary().inserted,
        "Replay complete"
    );
    println!("{}", summary);

    Ok(())
}

fn fail(run_id: &str, code: &str, message: &str) -> Result<()> {
    error!(error = code, reason = message, "Replay aborted");

    let report = ErrorReport::new(code, message, run_id);
    eprintln!("{}", report.to_json()?);

    Err(anyhow!("{}: {}", code, message))
}
