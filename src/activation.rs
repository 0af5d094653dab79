//! Activation functions.
//!
//! A page stores an activation *tag* ([`ActivationKind`]) chosen by the layout,
//! and a resolved dispatch handle ([`Activation`]) filled in when the first
//! neuron bound to that page is created.
//!
//! Every activation computes both the output `y = f(z)` and the local
//! derivative `dy/dz` in one call. The derivative is cached in the page's
//! `dy_dz` vector and consumed by the backward pass.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Activation tag as written in a layout.
///
/// `Unknown` is what unrecognised names parse to; it resolves to [`Activation::Linear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    Linear,
    Tanh,
    Relu,
    LeakyRelu,
    Prelu,
    Swish,
    Elu,
    Softplus,
    Sigmoid,
    Softmax,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ActivationKind {
    pub const ALL: [ActivationKind; 10] = [
        ActivationKind::Linear,
        ActivationKind::Tanh,
        ActivationKind::Relu,
        ActivationKind::LeakyRelu,
        ActivationKind::Prelu,
        ActivationKind::Swish,
        ActivationKind::Elu,
        ActivationKind::Softplus,
        ActivationKind::Sigmoid,
        ActivationKind::Softmax,
    ];

    /// Resolve the tag to its implementation.
    #[inline]
    pub fn resolve(self) -> Activation {
        match self {
            ActivationKind::Linear | ActivationKind::Unknown => Activation::Linear,
            ActivationKind::Tanh => Activation::Tanh,
            ActivationKind::Relu => Activation::Relu,
            ActivationKind::LeakyRelu => Activation::LeakyRelu,
            ActivationKind::Prelu => Activation::Prelu,
            ActivationKind::Swish => Activation::Swish,
            ActivationKind::Elu => Activation::Elu,
            ActivationKind::Softplus => Activation::Softplus,
            ActivationKind::Sigmoid => Activation::Sigmoid,
            ActivationKind::Softmax => Activation::Softmax,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ActivationKind::Linear => "linear",
            ActivationKind::Tanh => "tanh",
            ActivationKind::Relu => "relu",
            ActivationKind::LeakyRelu => "leaky_relu",
            ActivationKind::Prelu => "prelu",
            ActivationKind::Swish => "swish",
            ActivationKind::Elu => "elu",
            ActivationKind::Softplus => "softplus",
            ActivationKind::Sigmoid => "sigmoid",
            ActivationKind::Softmax => "softmax",
            ActivationKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ActivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationKind {
    type Err = std::convert::Infallible;

    /// Never fails: unrecognised names become [`ActivationKind::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase().replace('-', "_");
        Ok(ActivationKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .unwrap_or(ActivationKind::Unknown))
    }
}

/// Resolved activation implementation.
///
/// `Softmax` is not element-wise: it reads the layer-wide reduction
/// (`args[0] = sum_exp`, `args[1] = z_max`) that the layer stores before
/// evaluating any neuron output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Linear,
    Tanh,
    Relu,
    /// Slope `args[0]` for `z <= 0`.
    LeakyRelu,
    /// Per-neuron slope `args[index]` for `z <= 0`.
    Prelu,
    Swish,
    /// Scale `args[0]` for `z <= 0`.
    Elu,
    Softplus,
    Sigmoid,
    Softmax,
}

impl Activation {
    /// Check that `args` suits this activation on a layer with `width` outputs.
    pub fn args_valid(self, args: &[f32], width: usize) -> bool {
        match self {
            Activation::LeakyRelu | Activation::Elu => !args.is_empty(),
            Activation::Prelu => args.len() == width,
            Activation::Softmax => args.len() >= 2,
            Activation::Linear
            | Activation::Tanh
            | Activation::Relu
            | Activation::Swish
            | Activation::Softplus
            | Activation::Sigmoid => true,
        }
    }

    /// Evaluate unit `index` with pre-activation `z`.
    ///
    /// Returns `(y, dy_dz)`.
    #[inline]
    pub fn apply(self, z: f32, index: usize, args: &[f32]) -> (f32, f32) {
        match self {
            Activation::Linear => (z, 1.0),
            Activation::Tanh => {
                let y = z.tanh();
                (y, 1.0 - y * y)
            }
            Activation::Relu => {
                if z > 0.0 {
                    (z, 1.0)
                } else {
                    (0.0, 0.0)
                }
            }
            Activation::LeakyRelu => leaky(z, args[0]),
            Activation::Prelu => leaky(z, args[index]),
            Activation::Swish => {
                let sigma = sigmoid(z);
                let y = z * sigma;
                (y, y + sigma * (1.0 - y))
            }
            Activation::Elu => {
                let alpha = args[0];
                if z > 0.0 {
                    (z, 1.0)
                } else {
                    let y = alpha * z.exp_m1();
                    (y, y + alpha)
                }
            }
            Activation::Softplus => {
                // ln(1 + e^z) without overflowing e^z.
                let y = z.max(0.0) + (-z.abs()).exp().ln_1p();
                (y, sigmoid(z))
            }
            Activation::Sigmoid => {
                let y = sigmoid(z);
                (y, y * (1.0 - y))
            }
            Activation::Softmax => {
                let sum_exp = args[0];
                let z_max = args[1];
                let y = (z - z_max).exp() / sum_exp;
                // Local term only; the cross-unit Jacobian terms are ignored.
                (y, y * (1.0 - y))
            }
        }
    }
}

#[inline]
fn leaky(z: f32, slope: f32) -> (f32, f32) {
    if z > 0.0 { (z, 1.0) } else { (slope * z, slope) }
}

#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}
