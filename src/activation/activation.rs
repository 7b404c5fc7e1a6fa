use serde::{Deserialize, Serialize};
use std::f64::consts::E;

/// Element-wise activation applied by weighted layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    /// `1 / (1 + e^-x)`; the default for dense layers.
    #[default]
    Logistic,
    /// `max(0, x)`; the default for convolutional filters.
    Relu,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Logistic => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Relu => if x > 0.0 { x } else { 0.0 },
        }
    }

    /// Derivative expressed in terms of the activation's *output*.
    ///
    /// Backpropagation only keeps node outputs around, so both variants are
    /// written against `a = f(x)` rather than the pre-activation `x`:
    /// logistic gives `a (1 - a)`, RELU gives `1` for positive outputs.
    pub fn derivative(&self, output: f64) -> f64 {
        match self {
            ActivationFunction::Logistic => output * (1.0 - output),
            ActivationFunction::Relu => if output > 0.0 { 1.0 } else { 0.0 },
        }
    }
}
