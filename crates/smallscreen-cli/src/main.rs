//! smallscreen-decode - decode images on the worker pool and report sizes
//!
//! The main thread is the consumer: it enqueues every input, then replays
//! completions until each request has resolved.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use smallscreen_image::{DecodeRequest, DecodedImage, ImageLoader, ImageSource};
use smallscreen_tasks::{EngineConfig, TaskEngine, completion_channel};
use tracing_subscriber::EnvFilter;

use cli::Cli;

type Outcome = (usize, Result<DecodedImage, String>);

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// Returns whether every input decoded
fn run(cli: Cli) -> Result<bool> {
    let mut config = EngineConfig::from_env();
    if let Some(threads) = cli.threads {
        config = config.with_thread_pool_size(threads);
    }
    if let Some(capacity) = cli.completion_capacity {
        config = config.with_completion_capacity((capacity > 0).then_some(capacity));
    }
    tracing::debug!("Engine config: {:?}", config);

    let mut engine = TaskEngine::new(config.clone()).context("failed to start task engine")?;
    let (sender, completions) = completion_channel(config.completion_capacity);
    let loader = ImageLoader::new(engine.submitter(), sender);
    tracing::info!("Decoding {} inputs on {} workers", cli.inputs.len(), engine.thread_pool_size());

    let outcomes: Arc<Mutex<Vec<Outcome>>> = Arc::new(Mutex::new(Vec::new()));
    for (index, input) in cli.inputs.iter().enumerate() {
        let outcomes = Arc::clone(&outcomes);
        loader.load(request_for(&cli, input), move |result| {
            outcomes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((index, result));
        });
    }

    let expected = cli.inputs.len();
    while resolved(&outcomes) < expected {
        completions.run_next_timeout(Duration::from_millis(50));
    }
    engine.close();
    completions.drain();

    let mut outcomes = std::mem::take(&mut *outcomes.lock().unwrap_or_else(PoisonError::into_inner));
    outcomes.sort_by_key(|(index, _)| *index);

    let mut all_ok = true;
    for (index, outcome) in outcomes {
        let input = &cli.inputs[index];
        match outcome {
            Ok(image) => {
                println!(
                    "{}: {}x{} {} ({} bytes)",
                    label(&cli, input),
                    image.width,
                    image.height,
                    image.channel_order.name(),
                    image.byte_len()
                );
                loader.release(image);
            }
            Err(message) => {
                all_ok = false;
                println!("{}: error: {}", label(&cli, input), message);
            }
        }
    }
    Ok(all_ok)
}

fn request_for(cli: &Cli, input: &str) -> DecodeRequest {
    let source = if cli.markup {
        ImageSource::markup(input)
    } else if cli.base64 {
        ImageSource::base64(input)
    } else {
        ImageSource::path(PathBuf::from(input))
    };
    DecodeRequest::new(source)
        .with_size(cli.width, cli.height)
        .with_channel_order(cli.order)
        .with_resolve_by_basename(cli.basename)
}

fn label(cli: &Cli, input: &str) -> String {
    let request = request_for(cli, input);
    match smallscreen_image::effective_path(&request) {
        Some(path) => path.display().to_string(),
        None => request.source.describe(),
    }
}

fn resolved(outcomes: &Mutex<Vec<Outcome>>) -> usize {
    outcomes.lock().unwrap_or_else(PoisonError::into_inner).len()
}
