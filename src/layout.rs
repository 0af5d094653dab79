//! Layout builder.
//!
//! `LayoutBuilder` is the recommended way to produce a [`Pages`] arena.
//!
//! It makes the structure explicit (stage widths, activations, learning rates
//! and activation arguments), allocates zeroed, disjoint buffers for every
//! stage and wires each stage's input width to the previous stage's output.
//!
//! Softmax stages get the two scratch slots for the layer-wide reduction
//! appended to their arguments automatically.

use serde::{Deserialize, Serialize};

use crate::activation::ActivationKind;
use crate::page::{Page, Pages};
use crate::{Error, Result};

/// Description of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub activation: ActivationKind,
    pub lr: f32,
    #[serde(default)]
    pub args: Vec<f32>,
}

impl LayerSpec {
    pub fn new(size: usize, activation: ActivationKind, lr: f32) -> Self {
        Self {
            size,
            activation,
            lr,
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl Into<Vec<f32>>) -> Self {
        self.args = args.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidConfig("layer size must be > 0".to_owned()));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {}",
                self.lr
            )));
        }
        if self.args.iter().any(|a| !a.is_finite()) {
            return Err(Error::InvalidConfig(
                "activation args must be finite".to_owned(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Builder for a [`Pages`] arena.
///
/// Example:
///
/// ```rust
/// use rust_fnn::{ActivationKind, LayerSpec, LayoutBuilder};
///
/// # fn main() -> rust_fnn::Result<()> {
/// let pages = LayoutBuilder::new(2)?
///     .add_layer(LayerSpec::new(8, ActivationKind::Relu, 0.05))?
///     .add_layer(LayerSpec::new(1, ActivationKind::Sigmoid, 0.05))?
///     .build()?;
/// assert_eq!(pages.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct LayoutBuilder {
    input_dim: usize,
    layers: Vec<LayerSpec>,
}

impl LayoutBuilder {
    /// Start a layout whose first stage reads `input_dim` values.
    pub fn new(input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be > 0".to_owned()));
        }
        Ok(Self {
            input_dim,
            layers: Vec::new(),
        })
    }

    /// Append a stage.
    pub fn add_layer(mut self, spec: LayerSpec) -> Result<Self> {
        spec.validate()?;
        self.layers.push(spec);
        Ok(self)
    }

    /// Allocate and wire the pages.
    pub fn build(self) -> Result<Pages> {
        if self.layers.len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "layout must have at least 2 layers, got {}",
                self.layers.len()
            )));
        }

        let mut pages = Vec::with_capacity(self.layers.len());
        let mut x_len = self.input_dim;
        for (l_id, spec) in self.layers.into_iter().enumerate() {
            let mut page = Page::new(l_id, x_len, spec.size, spec.lr, spec.activation);
            page.af_args = spec.args;
            if spec.activation == ActivationKind::Softmax {
                page.af_args.extend_from_slice(&[0.0, 0.0]);
            }
            x_len = spec.size;
            pages.push(page);
        }

        Ok(Pages::new(pages))
    }
}

impl Pages {
    /// Reference layout of the seven-segment digit classifier:
    /// 7 -> 20 (leaky relu) -> 20 (leaky relu) -> 10 (sigmoid).
    pub fn seven_segment() -> Result<Pages> {
        LayoutBuilder::new(7)?
            .add_layer(LayerSpec::new(20, ActivationKind::LeakyRelu, 0.01).with_args([0.01]))?
            .add_layer(LayerSpec::new(20, ActivationKind::LeakyRelu, 0.02).with_args([0.01]))?
            .add_layer(LayerSpec::new(10, ActivationKind::Sigmoid, 0.03))?
            .build()
    }
}
