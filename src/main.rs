use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use futures::StreamExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use condition_rs::condition::{
    subscribe, CriterionContext, CriterionLoader, LogSink, TelemetryCriterion,
    STANDARD_OPERATIONS,
};
use condition_rs::telemetry::memory::InMemoryTelemetryProvider;
use condition_rs::telemetry::time::{LocalTimeFormat, TimeFormat};
use condition_rs::telemetry::{CriterionError, Datum, RequestOptions};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a criterion once against the latest recorded samples
    Evaluate {
        /// Path to the criterion definition (YAML or JSON)
        #[arg(short, long)]
        criterion: PathBuf,

        /// JSON object of source key to recorded samples
        #[arg(short, long)]
        samples: PathBuf,
    },
    /// Replay recorded samples through a criterion in time order
    Stream {
        /// Path to the criterion definition (YAML or JSON)
        #[arg(short, long)]
        criterion: PathBuf,

        /// JSON object of source key to recorded samples
        #[arg(short, long)]
        samples: PathBuf,

        /// Time-system key used to order the samples
        #[arg(short, long, default_value = "utc")]
        time_key: String,
    },
    /// List the available operations
    Operations,
    /// Format, parse or validate local time
    Time {
        #[command(subcommand)]
        action: TimeAction,
    },
}

#[derive(Subcommand, Debug)]
enum TimeAction {
    /// Milliseconds since the epoch to local time text
    Format { millis: i64 },
    /// Local time text to milliseconds since the epoch
    Parse { text: String },
    /// Check whether text is valid local time
    Validate { text: String },
}

fn read_samples(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read samples from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid samples in {}", path.display()))
}

fn build_criterion(
    criterion: &Path,
    samples: Value,
) -> anyhow::Result<TelemetryCriterion> {
    let definition = CriterionLoader::new()
        .load_criterion(criterion)
        .with_context(|| format!("Failed to load criterion {}", criterion.display()))?;
    let provider = InMemoryTelemetryProvider::from_json(samples)
        .map_err(|e| anyhow::anyhow!("Invalid samples: {}", e))?;

    let context = CriterionContext::new(Arc::new(provider), Arc::new(LogSink));
    Ok(TelemetryCriterion::new(definition, context))
}

/// Pinned by `CONDITION_TIME_ZONE_OFFSET` (minutes east of UTC), else the machine zone
fn local_time_format() -> condition_rs::telemetry::Result<Box<dyn TimeFormat>> {
    match std::env::var("CONDITION_TIME_ZONE_OFFSET") {
        Ok(minutes) => Ok(Box::new(LocalTimeFormat::with_offset(parse_offset(&minutes)?))),
        Err(_) => Ok(Box::new(LocalTimeFormat::new())),
    }
}

fn parse_offset(minutes: &str) -> condition_rs::telemetry::Result<chrono::FixedOffset> {
    let minutes: i32 = minutes.trim().parse().map_err(|_| {
        CriterionError::config("CONDITION_TIME_ZONE_OFFSET must be a number of minutes")
    })?;
    minutes
        .checked_mul(60)
        .and_then(chrono::FixedOffset::east_opt)
        .ok_or_else(|| CriterionError::config("CONDITION_TIME_ZONE_OFFSET is out of range"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Evaluate { criterion, samples } => {
            let samples = read_samples(&samples)?;
            let mut criterion = build_criterion(&criterion, samples)?;

            let response = criterion.request_lad(RequestOptions::default()).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            criterion.destroy()?;
        }
        Commands::Stream {
            criterion,
            samples,
            time_key,
        } => {
            let samples = read_samples(&samples)?;
            let mut data: Vec<Datum> = samples
                .as_object()
                .map(|sources| {
                    sources
                        .values()
                        .filter_map(Value::as_array)
                        .flatten()
                        .filter_map(|datum| Datum::try_from(datum.clone()).ok())
                        .collect()
                })
                .unwrap_or_default();
            data.sort_by(|a, b| {
                let a = a.get(&time_key).and_then(Value::as_f64).unwrap_or(f64::MIN);
                let b = b.get(&time_key).and_then(Value::as_f64).unwrap_or(f64::MIN);
                a.total_cmp(&b)
            });
            log::info!("Replaying {} samples ordered by '{}'", data.len(), time_key);

            let mut criterion = build_criterion(&criterion, samples)?;
            let times: Vec<Value> = data
                .iter()
                .map(|datum| datum.get(&time_key).cloned().unwrap_or(Value::Null))
                .collect();
            {
                let mut results = Box::pin(subscribe(&mut criterion, tokio_stream::iter(data)));
                let mut times = times.into_iter();
                while let Some(result) = results.next().await {
                    let time = times.next().unwrap_or(Value::Null);
                    println!("{} {}", time, result?);
                }
            }
            criterion.destroy()?;
        }
        Commands::Operations => {
            for operation in STANDARD_OPERATIONS.iter() {
                println!("{:<20} {}", operation.name, operation.text);
            }
        }
        Commands::Time { action } => {
            let format = local_time_format()?;
            match action {
                TimeAction::Format { millis } => match format.format(millis) {
                    Some(text) => println!("{}", text),
                    None => anyhow::bail!("{} is not a representable time", millis),
                },
                TimeAction::Parse { text } => match format.parse(&text) {
                    Some(millis) => println!("{}", millis),
                    None => anyhow::bail!("'{}' is not valid local time", text),
                },
                TimeAction::Validate { text } => println!("{}", format.validate(&text)),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("-420").unwrap().local_minus_utc(), -7 * 3600);
        assert_eq!(parse_offset(" 60 ").unwrap().local_minus_utc(), 3600);
    }

    #[test]
    fn test_parse_offset_rejects_bad_values() {
        for value in ["99999999", "-99999999", "1440", "soon"] {
            let err = parse_offset(value).unwrap_err();
            assert!(matches!(err, CriterionError::Config(_)), "{}", value);
        }
    }
}
