//! Sample-by-sample driver loops.
//!
//! Each loop streams rows from [`DataReader`]s straight into the network's
//! input buffer, runs the step functions and writes one output row per
//! sample. Only the target buffer is allocated, once per call.

use std::io::{Read, Write};

use tracing::{info, warn};

use crate::data::{DataReader, DataWriter};
use crate::metrics::{self, Accuracy};
use crate::network::Network;
use crate::{Error, Result, loss};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainReport {
    pub samples: usize,
    /// Mean summed squared error, measured before each update.
    pub mean_error: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationReport {
    pub samples: usize,
    pub errors: usize,
    pub accuracy: f32,
}

fn output_width(net: &Network<'_>) -> Result<usize> {
    if !net.is_safe() {
        return Err(Error::InvalidConfig(format!(
            "network is not ready (state {:?})",
            net.state()
        )));
    }
    net.output()
        .map(<[f32]>::len)
        .ok_or_else(|| Error::InvalidConfig("network has no pages".to_owned()))
}

/// Read the next sample into the network input. `Ok(false)` at end of input.
fn load_input<R: Read>(net: &mut Network<'_>, inputs: &mut DataReader<R>) -> Result<bool> {
    match net.input_mut() {
        Some(x) => inputs.next_values(x),
        None => Ok(false),
    }
}

/// Read the target for the current sample, warning when the target set ran out.
fn load_target<R: Read>(
    targets: &mut DataReader<R>,
    target: &mut [f32],
    sample: usize,
) -> Result<bool> {
    let found = targets.next_values(target)?;
    if !found {
        warn!(sample, "target set exhausted before dataset; remaining samples skipped");
    }
    Ok(found)
}

/// One training pass: forward, output error, SGD update for every sample.
///
/// Every output row (taken before the update) is written to `outputs`.
pub fn train<R1, R2, W>(
    net: &mut Network<'_>,
    inputs: &mut DataReader<R1>,
    targets: &mut DataReader<R2>,
    outputs: &mut DataWriter<W>,
) -> Result<TrainReport>
where
    R1: Read,
    R2: Read,
    W: Write,
{
    let mut target = vec![0.0_f32; output_width(net)?];
    let mut samples = 0_usize;
    let mut total = 0.0_f32;

    while load_input(net, inputs)? {
        if !load_target(targets, &mut target, samples)? {
            break;
        }

        net.step_forward();
        if let Some(y) = net.output() {
            total += loss::squared_error(y, &target);
            outputs.next_values(y)?;
        }
        net.step_errors(&target);
        net.step_backward();
        samples += 1;
    }
    outputs.flush()?;

    let mean_error = if samples == 0 {
        0.0
    } else {
        total / samples as f32
    };
    info!(samples, mean_error, "training pass finished");
    Ok(TrainReport {
        samples,
        mean_error,
    })
}

/// Forward every sample and write its output row. Returns the sample count.
pub fn infer<R, W>(
    net: &mut Network<'_>,
    inputs: &mut DataReader<R>,
    outputs: &mut DataWriter<W>,
) -> Result<usize>
where
    R: Read,
    W: Write,
{
    output_width(net)?;
    let mut samples = 0_usize;

    while load_input(net, inputs)? {
        net.step_forward();
        if let Some(y) = net.output() {
            outputs.next_values(y)?;
        }
        samples += 1;
    }
    outputs.flush()?;

    info!(samples, "inference finished");
    Ok(samples)
}

/// Forward every sample, one-hot decode the output and compare it with the target.
///
/// The decoded rows are written to `outputs`.
pub fn validate<R1, R2, W>(
    net: &mut Network<'_>,
    inputs: &mut DataReader<R1>,
    targets: &mut DataReader<R2>,
    outputs: &mut DataWriter<W>,
) -> Result<ValidationReport>
where
    R1: Read,
    R2: Read,
    W: Write,
{
    let width = output_width(net)?;
    let mut target = vec![0.0_f32; width];
    let mut decoded = vec![0.0_f32; width];
    let mut acc = Accuracy::new();

    while load_input(net, inputs)? {
        if !load_target(targets, &mut target, acc.samples())? {
            break;
        }

        net.step_forward();
        if let Some(y) = net.output() {
            metrics::one_hot_into(y, &mut decoded);
        }
        acc.record(&decoded, &target);
        outputs.next_values(&decoded)?;
    }
    outputs.flush()?;

    let report = ValidationReport {
        samples: acc.samples(),
        errors: acc.errors(),
        accuracy: acc.value(),
    };
    info!(
        samples = report.samples,
        errors = report.errors,
        accuracy = report.accuracy,
        "validation finished"
    );
    Ok(report)
}
