use cifar_reader::parsing::cifar10::{BatchReader, ReaderConfig};
use cifar_reader::parsing::Result;
use clap::Parser;
use json::object;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

const NUM_CLASSES: usize = 10;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the CIFAR-10 binary batches
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// JSON reader config ({"path": ..., "train": ..., "test": ...}).
    /// Used instead of --path/--train/--test
    #[arg(short, long, conflicts_with_all = ["path", "train", "test"])]
    config: Option<PathBuf>,

    /// Load the five training batches
    #[arg(long)]
    train: bool,

    /// Load the test batch
    #[arg(long)]
    test: bool,

    /// Write the record count and label histogram here, in JSON format
    #[arg(short, long, default_value = None)]
    summary_path: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("A tracing subscriber is already installed");
    }
}

fn resolve_config(args: &Args) -> Result<ReaderConfig> {
    match &args.config {
        Some(config_path) => ReaderConfig::from_json_file(config_path),
        None => Ok(ReaderConfig {
            path: args.path.clone().unwrap_or_else(|| PathBuf::from(".")),
            train: args.train,
            test: args.test,
        }),
    }
}

/// Count the records of each class. Labels outside of 0..NUM_CLASSES are counted under their own value
fn label_counts(labels: &[u8]) -> Vec<usize> {
    let max_label = labels.iter().copied().max().map_or(0, usize::from);
    let mut counts = vec![0; NUM_CLASSES.max(max_label + 1)];

    for &label in labels {
        counts[label as usize] += 1;
    }

    counts
}

/// Write the summary in JSON format.
/// The keys are "records" and "label_counts", the latter mapping each label to its count
fn write_summary(summary_path: &str, records: usize, counts: &[usize]) -> std::io::Result<()> {
    let mut data = object! {
        records: records,
        label_counts: json::JsonValue::new_object(),
    };
    let mut file = File::create(summary_path)?;

    for (label, count) in counts.iter().enumerate() {
        data["label_counts"][label.to_string()] = (*count).into();
    }

    file.write_all(data.dump().as_bytes())?;

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Loading {:?} (train: {}, test: {})",
        config.path, config.train, config.test
    );

    let reader = match BatchReader::from_config(&config) {
        Ok(reader) => reader,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let counts = label_counts(&reader.get_labels());
    info!("Loaded {} records", reader.len());

    println!("The number of records is {}", reader.len());
    for (label, count) in counts.iter().enumerate() {
        println!("label {}: {}", label, count);
    }

    if let Some(summary_path) = args.summary_path {
        if let Err(err) = write_summary(&summary_path, reader.len(), &counts) {
            error!("Failed to write summary to {}: {}", summary_path, err);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
