//! JSON layout configuration.
//!
//! The on-disk layout is deliberately separate from [`Pages`]: it only names
//! the stage widths, activations, learning rates and activation arguments.
//! Buffers are allocated by [`LayoutBuilder`] after validation.
//!
//! ```json
//! {
//!   "input": 7,
//!   "layers": [
//!     { "size": 20, "activation": "leaky_relu", "lr": 0.01, "args": [0.01] },
//!     { "size": 10, "activation": "sigmoid", "lr": 0.03 }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::activation::ActivationKind;
use crate::layout::{LayerSpec, LayoutBuilder};
use crate::page::Pages;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub input: usize,
    pub layers: Vec<LayerSpec>,
}

impl Default for LayoutConfig {
    /// The seven-segment classifier layout.
    fn default() -> Self {
        Self {
            input: 7,
            layers: vec![
                LayerSpec::new(20, ActivationKind::LeakyRelu, 0.01).with_args([0.01]),
                LayerSpec::new(20, ActivationKind::LeakyRelu, 0.02).with_args([0.01]),
                LayerSpec::new(10, ActivationKind::Sigmoid, 0.03),
            ],
        }
    }
}

impl LayoutConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: LayoutConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input == 0 {
            return Err(Error::InvalidConfig("input must be > 0".to_owned()));
        }
        if self.layers.len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "layout must have at least 2 layers, got {}",
                self.layers.len()
            )));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer
                .validate()
                .map_err(|e| Error::InvalidConfig(format!("layer {i}: {e}")))?;
        }
        Ok(())
    }

    /// Allocate the page arena for this layout.
    pub fn into_pages(self) -> Result<Pages> {
        self.validate()?;
        let mut builder = LayoutBuilder::new(self.input)?;
        for spec in self.layers {
            builder = builder.add_layer(spec)?;
        }
        builder.build()
    }
}
