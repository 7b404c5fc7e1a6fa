use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::network::layer::{LayerId, PoolingMode, Shape2D};
use crate::network::network::Network;
use crate::train::train_config::Hyperparameters;
use crate::weights::arena::WeightArena;
use crate::weights::init::{initialise, Initialiser};

fn default_filter_activation() -> ActivationFunction {
    ActivationFunction::Relu
}

/// Describes one layer in a network specification.
///
/// Layers refer to their predecessors by name, and a name must be declared
/// before it is referenced, so the list order is already a valid build order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerSpec {
    Input {
        name: String,
        size: usize,
    },
    Input2d {
        name: String,
        width: usize,
        height: usize,
    },
    Dense {
        name: String,
        size: usize,
        previous: Vec<String>,
        #[serde(default)]
        activation: ActivationFunction,
    },
    Filter2d {
        name: String,
        previous: Vec<String>,
        kernel_width: usize,
        kernel_height: usize,
        #[serde(default = "default_filter_activation")]
        activation: ActivationFunction,
    },
    Pooling {
        name: String,
        previous: String,
        window_width: usize,
        window_height: usize,
        #[serde(default)]
        mode: PoolingMode,
    },
}

impl LayerSpec {
    pub fn name(&self) -> &str {
        match self {
            LayerSpec::Input { name, .. }
            | LayerSpec::Input2d { name, .. }
            | LayerSpec::Dense { name, .. }
            | LayerSpec::Filter2d { name, .. }
            | LayerSpec::Pooling { name, .. } => name,
        }
    }
}

/// A fully serializable description of a network architecture plus the way
/// it should be initialised and trained.
///
/// `NetworkSpec` holds no weights. Building it allocates fresh ones, so the
/// same spec can seed any number of independent networks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Identifies the spec; errors about the spec as a whole quote it.
    pub name: String,
    /// Ordered list of layer descriptions; the last one is the output.
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub initialiser: Option<Initialiser>,
    #[serde(default)]
    pub training: Option<Hyperparameters>,
}

impl NetworkSpec {
    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Builds the described graph on `weights` and returns it together with
    /// its output layer. All weights start at zero.
    pub fn build(&self, weights: &mut WeightArena) -> Result<(Network, LayerId)> {
        let mut network = Network::new(weights);
        let mut output = None;
        for spec in &self.layers {
            if network.layer_by_name(spec.name()).is_some() {
                return Err(NetworkError::InvalidLayer(format!(
                    "layer `{}` is declared twice",
                    spec.name()
                )));
            }
            let id = match spec {
                LayerSpec::Input { name, size } => network.add_input(name, *size)?,
                LayerSpec::Input2d { name, width, height } => {
                    network.add_input_2d(name, Shape2D::new(*width, *height))?
                }
                LayerSpec::Dense { name, size, previous, activation } => {
                    let previous = resolve(&network, previous)?;
                    network.add_dense(weights, name, *size, &previous, *activation)?
                }
                LayerSpec::Filter2d { name, previous, kernel_width, kernel_height, activation } => {
                    let previous = resolve(&network, previous)?;
                    let kernel = Shape2D::new(*kernel_width, *kernel_height);
                    network.add_filter_2d(weights, name, &previous, kernel, *activation)?
                }
                LayerSpec::Pooling { name, previous, window_width, window_height, mode } => {
                    let previous = lookup(&network, previous)?;
                    let window = Shape2D::new(*window_width, *window_height);
                    network.add_pooling(name, previous, window, *mode)?
                }
            };
            output = Some(id);
        }
        let output = output.ok_or_else(|| {
            NetworkError::Config(format!("network spec `{}` declares no layers", self.name))
        })?;
        Ok((network, output))
    }

    /// Builds the graph and draws starting weights with the spec's
    /// initialiser (or the default one).
    pub fn build_initialised<R: Rng + ?Sized>(
        &self,
        weights: &mut WeightArena,
        rng: &mut R,
    ) -> Result<(Network, LayerId)> {
        let (network, output) = self.build(weights)?;
        initialise(&network, weights, output, self.initialiser.unwrap_or_default(), rng)?;
        Ok((network, output))
    }
}

fn lookup(network: &Network, name: &str) -> Result<LayerId> {
    network
        .layer_by_name(name)
        .ok_or_else(|| NetworkError::UnknownLayer(name.to_string()))
}

fn resolve(network: &Network, names: &[String]) -> Result<Vec<LayerId>> {
    names.iter().map(|name| lookup(network, name)).collect()
}
