use crate::error::{NetworkError, Result};
use crate::loss::mse::MseLoss;
use crate::network::forward::Inputs;
use crate::network::layer::LayerId;
use crate::network::network::Network;
use crate::optim::momentum::Momentum;
use crate::optim::sgd::{LearningRateSchedule, Sgd};
use crate::weights::arena::WeightArena;

/// One training example. Unset targets leave their output node untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub inputs: Vec<f64>,
    pub targets: Vec<Option<f64>>,
}

impl Sample {
    pub fn new(inputs: Vec<f64>, targets: Vec<Option<f64>>) -> Sample {
        Sample { inputs, targets }
    }

    /// A sample with every output targeted.
    pub fn dense(inputs: Vec<f64>, targets: Vec<f64>) -> Sample {
        Sample { inputs, targets: targets.into_iter().map(Some).collect() }
    }
}

/// Stateful trainer for one output layer: owns the optimiser and, when
/// momentum is enabled, the velocity shadow that goes with it.
#[derive(Debug, Clone)]
pub struct BackPropagator {
    output: LayerId,
    sgd: Sgd,
    momentum: Option<Momentum>,
}

impl BackPropagator {
    pub fn new(output: LayerId, learning_rate: f64) -> BackPropagator {
        BackPropagator { output, sgd: Sgd::new(learning_rate), momentum: None }
    }

    /// Enables heavy-ball momentum for `network`.
    pub fn with_momentum(mut self, network: &Network, factor: f64) -> Result<BackPropagator> {
        if factor > 0.0 {
            self.momentum = Some(Momentum::new(network, self.output, factor)?);
        }
        Ok(self)
    }

    pub fn with_schedule(mut self, schedule: LearningRateSchedule) -> BackPropagator {
        self.sgd.schedule = schedule;
        self
    }

    pub fn output(&self) -> LayerId {
        self.output
    }

    pub fn learning_rate(&self) -> f64 {
        self.sgd.learning_rate
    }

    pub fn momentum(&self) -> Option<&Momentum> {
        self.momentum.as_ref()
    }

    /// One backward pass; the learning rate advances along the schedule
    /// afterwards. Returns the outputs the pass trained against.
    pub fn backpropagate<'a>(
        &mut self,
        network: &mut Network,
        weights: &mut WeightArena,
        inputs: impl Into<Inputs<'a>>,
        targets: &[Option<f64>],
    ) -> Result<Vec<f64>> {
        let predicted = network.backward_pass(
            weights,
            self.output,
            inputs.into(),
            targets,
            &self.sgd,
            self.momentum.as_mut(),
        )?;
        self.sgd.decay();
        Ok(predicted)
    }
}

/// Runs every sample once, in order, and returns the mean loss measured on the
/// outputs each pass trained against.
pub fn train_network(
    network: &mut Network,
    weights: &mut WeightArena,
    propagator: &mut BackPropagator,
    samples: &[Sample],
) -> Result<f64> {
    if samples.is_empty() {
        return Err(NetworkError::Config("no training samples supplied".to_string()));
    }
    let mut total_loss = 0.0;
    for sample in samples {
        let predicted = propagator.backpropagate(network, weights, &sample.inputs, &sample.targets)?;
        total_loss += MseLoss::loss(&predicted, &sample.targets);
    }
    Ok(total_loss / samples.len() as f64)
}
