use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::network::layer::{BiasEdge, Edge, LayerId, LayerKind, Node, NodeRef, Shape2D};
use crate::network::network::Network;
use crate::weights::arena::{WeightArena, WeightId};

impl Network {
    /// Adds an input layer whose nodes sit on a `shape` grid (row-major).
    pub fn add_input_2d(&mut self, name: &str, shape: Shape2D) -> Result<LayerId> {
        let nodes = (0..shape.area()).map(|_| Node::new(Vec::new(), Vec::new())).collect();
        self.push_layer(name, LayerKind::Input, Some(shape), Vec::new(), nodes)
    }

    /// Adds a convolutional filter over one or more equally shaped 2D layers
    /// (one channel per previous layer).
    ///
    /// The filter owns `channels × kernel.area()` kernel weights plus one bias
    /// per channel. Every output position holds handles to those *same*
    /// weights, offset across the source grid, so the output shape is
    /// `(W - kw + 1) × (H - kh + 1)`.
    pub fn add_filter_2d(
        &mut self,
        weights: &mut WeightArena,
        name: &str,
        previous: &[LayerId],
        kernel: Shape2D,
        activation: ActivationFunction,
    ) -> Result<LayerId> {
        self.check_arena(weights)?;
        self.check_previous(name, previous)?;
        let source = self.common_shape(name, previous)?;
        if kernel.width == 0 || kernel.height == 0 {
            return Err(NetworkError::InvalidLayer(format!("filter `{}` has an empty kernel", name)));
        }
        if kernel.width > source.width || kernel.height > source.height {
            return Err(NetworkError::InvalidLayer(format!(
                "filter `{}` kernel {}x{} does not fit a {}x{} input",
                name, kernel.width, kernel.height, source.width, source.height
            )));
        }
        let shape = Shape2D::new(source.width - kernel.width + 1, source.height - kernel.height + 1);

        // One kernel per channel, one bias per channel; shared by every position.
        let kernels: Vec<Vec<WeightId>> = previous
            .iter()
            .map(|_| (0..kernel.area()).map(|_| weights.alloc(0.0)).collect())
            .collect();
        let biases: Vec<WeightId> = previous.iter().map(|_| weights.alloc(0.0)).collect();

        let mut nodes = Vec::with_capacity(shape.area());
        for y in 0..shape.height {
            for x in 0..shape.width {
                let mut edges = Vec::with_capacity(previous.len() * kernel.area());
                for (channel, &prev) in previous.iter().enumerate() {
                    for ky in 0..kernel.height {
                        for kx in 0..kernel.width {
                            edges.push(Edge {
                                source: NodeRef { layer: prev, index: source.index(x + kx, y + ky) },
                                weight: kernels[channel][kernel.index(kx, ky)],
                            });
                        }
                    }
                }
                let bias_edges = previous
                    .iter()
                    .zip(&biases)
                    .map(|(&source, &weight)| BiasEdge { source, weight })
                    .collect();
                nodes.push(Node::new(edges, bias_edges));
            }
        }

        self.push_layer(
            name,
            LayerKind::Filter2D { kernel, activation },
            Some(shape),
            previous.to_vec(),
            nodes,
        )
    }

    fn common_shape(&self, name: &str, previous: &[LayerId]) -> Result<Shape2D> {
        let mut shape: Option<Shape2D> = None;
        for &prev in previous {
            let layer = self.layer(prev)?;
            let current = layer.shape().ok_or_else(|| {
                NetworkError::InvalidLayer(format!(
                    "filter `{}` reads from `{}`, which is not a 2D layer",
                    name, layer.name()
                ))
            })?;
            match shape {
                Some(s) if s != current => {
                    return Err(NetworkError::InvalidLayer(format!(
                        "filter `{}` channels disagree in shape: {}x{} vs {}x{}",
                        name, s.width, s.height, current.width, current.height
                    )))
                }
                _ => shape = Some(current),
            }
        }
        shape.ok_or_else(|| {
            NetworkError::InvalidLayer(format!("filter `{}` needs at least one previous layer", name))
        })
    }
}
