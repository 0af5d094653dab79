//! `fnn`: train, run or validate a page-based feed-forward network on
//! comma-separated sample files.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_fnn::data::{read_weights, write_weights};
use rust_fnn::{DataReader, DataWriter, LayoutConfig, Network, Pages, RandomGenerator, train};

#[derive(Parser)]
#[command(name = "fnn")]
#[command(version)]
#[command(about = "Page-based feed-forward neural network", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    files: Files,
}

#[derive(Subcommand)]
enum Command {
    /// Train on the dataset and write the updated weights
    Train {
        /// Number of passes over the dataset
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        epochs: u32,
    },

    /// Run the network on the dataset and write its outputs
    Infer,

    /// Compare one-hot decoded outputs with the expected outputs
    Valid,
}

#[derive(Args)]
struct Files {
    /// Weights to start from; created with fresh weights when missing
    #[arg(short = 'w', long, global = true, default_value = "fnn_weights.cfg")]
    weights_cfg: PathBuf,

    /// Input samples
    #[arg(short = 'd', long, global = true, default_value = "fnn_dataset.set")]
    dataset_set: PathBuf,

    /// Expected outputs
    #[arg(short = 's', long, global = true, default_value = "fnn_outputs.set")]
    outputs_set: PathBuf,

    /// Weights written after training
    #[arg(short = 'x', long, global = true, default_value = "fnn_weights.out")]
    weights_out: PathBuf,

    /// Network outputs
    #[arg(short = 'o', long, global = true, default_value = "fnn_outputs.out")]
    outputs_out: PathBuf,

    /// JSON layout; the seven-segment layout when omitted
    #[arg(long, global = true, value_name = "JSON")]
    layout: Option<PathBuf>,

    /// Seed for fresh weights; taken from the clock when omitted
    #[arg(long, global = true)]
    seed: Option<u32>,

    /// Bias weight given to every unit on fresh initialization
    #[arg(long, global = true, default_value_t = 0.5, allow_negative_numbers = true)]
    bias: f32,
}

fn reader(path: &Path) -> Result<DataReader<File>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(DataReader::new(file))
}

fn writer(path: &Path) -> Result<DataWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(DataWriter::new(file))
}

/// Load `files.weights_cfg` into `pages` if it exists. Returns whether it did.
fn load_weights(pages: &mut Pages, files: &Files) -> Result<bool> {
    let path = &files.weights_cfg;
    if !path.exists() {
        return Ok(false);
    }
    read_weights(&mut reader(path)?, pages)
        .with_context(|| format!("reading weights from {}", path.display()))?;
    info!(path = %path.display(), "weights loaded");
    Ok(true)
}

/// Initialize fresh weights and save them to `files.weights_cfg`.
fn init_weights(net: &mut Network<'_>, files: &Files) -> Result<()> {
    let path = &files.weights_cfg;
    match files.seed {
        Some(seed) => net.init_weights(files.bias, &mut RandomGenerator::new(seed)),
        None => net.init_weights_from_clock(files.bias),
    }
    let pages = net.pages().context("network has no pages")?;
    write_weights(&mut writer(path)?, pages)
        .with_context(|| format!("writing weights to {}", path.display()))?;
    info!(path = %path.display(), seed = ?files.seed, "fresh weights written");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let files = &cli.files;

    let layout = match &files.layout {
        Some(path) => LayoutConfig::load_json(path)
            .with_context(|| format!("loading layout {}", path.display()))?,
        None => LayoutConfig::default(),
    };
    let mut pages = layout.into_pages().context("building pages")?;
    let loaded = load_weights(&mut pages, files)?;

    let mut net = Network::create(&mut pages).context("creating network")?;
    if !loaded {
        init_weights(&mut net, files)?;
    }

    match cli.command {
        Command::Train { epochs } => {
            for epoch in 1..=epochs {
                let report = train::train(
                    &mut net,
                    &mut reader(&files.dataset_set)?,
                    &mut reader(&files.outputs_set)?,
                    &mut writer(&files.outputs_out)?,
                )
                .with_context(|| format!("training epoch {epoch}"))?;
                info!(epoch, samples = report.samples, mean_error = report.mean_error, "epoch done");
            }

            let pages = net.pages().context("network has no pages")?;
            write_weights(&mut writer(&files.weights_out)?, pages)
                .with_context(|| format!("writing weights to {}", files.weights_out.display()))?;
            println!("weights written to {}", files.weights_out.display());
        }

        Command::Infer => {
            let samples = train::infer(
                &mut net,
                &mut reader(&files.dataset_set)?,
                &mut writer(&files.outputs_out)?,
            )
            .context("running inference")?;
            println!("{samples} sample(s) written to {}", files.outputs_out.display());
        }

        Command::Valid => {
            let report = train::validate(
                &mut net,
                &mut reader(&files.dataset_set)?,
                &mut reader(&files.outputs_set)?,
                &mut writer(&files.outputs_out)?,
            )
            .context("validating")?;
            println!(
                "samples: {}  errors: {}  accuracy: {:.2}%",
                report.samples,
                report.errors,
                report.accuracy * 100.0
            );
        }
    }

    net.destroy();
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fnn=info,rust_fnn=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse())
}
