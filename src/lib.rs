//! A small page-based feed-forward neural network engine.
//!
//! `rust-fnn` trains a dense feed-forward network one sample at a time with
//! plain stochastic gradient descent. All numeric storage lives in
//! caller-owned [`Page`]s collected in a [`Pages`] arena; the compute objects
//! ([`Network`], [`Layer`], [`Neuron`]) own no buffers and only borrow it.
//!
//! # Design goals
//!
//! - Predictable memory: every buffer is allocated once by the layout step.
//!   The step functions never allocate.
//! - Explicit lifecycle: a [`Network`] is `Uninitialized`, `Safe` or
//!   `Destroyed`. Only [`Network::create`] reports failure; every step on a
//!   network that is not `Safe` is a silent no-op.
//! - Reproducible runs: [`RandomGenerator`] is a small seeded generator whose
//!   sequence is fixed for a given seed.
//!
//! # Panics vs `Result`
//!
//! - Construction and I/O return [`Result`]: layouts, [`Network::create`],
//!   [`DataReader`], [`DataWriter`] and the [`train`] driver loops.
//! - [`Network`] step functions never panic: the network holds the only
//!   mutable borrow of its pages and exposes value views
//!   ([`Network::input_mut`], [`Network::weights_mut`]) that cannot change a
//!   buffer's length, so the shapes checked at creation stay valid.
//! - Lower-level helpers treat shape mismatches as programmer error and
//!   panic: [`Layer`] and [`Neuron`] steps called with a foreign page, and
//!   the [`loss`] and [`metrics`] functions documented under `# Panics`.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f32`.
//! - A stage with `n` inputs and `m` units holds an `m x (n + 1)` row-major
//!   weight matrix; the trailing column of each row is the bias weight.
//! - Stage `k` reads stage `k - 1`'s output; stage `0` reads [`Pages::input`].
//!
//! # Quick start
//!
//! ```rust
//! use rust_fnn::{ActivationKind, LayerSpec, LayoutBuilder, Network, RandomGenerator};
//!
//! # fn main() -> rust_fnn::Result<()> {
//! let mut pages = LayoutBuilder::new(2)?
//!     .add_layer(LayerSpec::new(4, ActivationKind::Tanh, 0.1))?
//!     .add_layer(LayerSpec::new(1, ActivationKind::Sigmoid, 0.1))?
//!     .build()?;
//!
//! let mut net = Network::create(&mut pages)?;
//! net.init_weights(0.0, &mut RandomGenerator::new(7));
//!
//! if let Some(x) = net.input_mut() {
//!     x.copy_from_slice(&[0.0, 1.0]);
//! }
//! net.step_forward();
//! net.step_errors(&[1.0]);
//! net.step_backward();
//!
//! let y = net.output().unwrap_or_default();
//! assert_eq!(y.len(), 1);
//! net.destroy();
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod config;
pub mod data;
pub mod error;
pub mod layer;
pub mod layout;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod neuron;
pub mod page;
pub mod random;
pub mod train;

pub use activation::{Activation, ActivationKind};
pub use config::LayoutConfig;
pub use data::{DataReader, DataWriter};
pub use error::{Error, Result};
pub use layer::{Init, Layer};
pub use layout::{LayerSpec, LayoutBuilder};
pub use metrics::Accuracy;
pub use network::{Network, State};
pub use neuron::Neuron;
pub use page::{Matrix, Page, Pages};
pub use random::RandomGenerator;
pub use train::{TrainReport, ValidationReport};
