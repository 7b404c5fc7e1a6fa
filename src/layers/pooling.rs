use crate::error::{NetworkError, Result};
use crate::network::layer::{Layer, LayerId, LayerKind, Node, PoolingMode, Shape2D};
use crate::network::network::Network;

impl Network {
    /// Adds a weight-free pooling layer over the 2D layer `previous`.
    ///
    /// Windows do not overlap; when the source does not divide evenly the last
    /// row/column of windows is clipped, so the output is
    /// `ceil(W / pw) × ceil(H / ph)`.
    pub fn add_pooling(
        &mut self,
        name: &str,
        previous: LayerId,
        window: Shape2D,
        mode: PoolingMode,
    ) -> Result<LayerId> {
        let source = self.layer(previous)?;
        let source_shape = source.shape().ok_or_else(|| {
            NetworkError::InvalidLayer(format!(
                "pooling `{}` reads from `{}`, which is not a 2D layer",
                name,
                source.name()
            ))
        })?;
        if window.width == 0 || window.height == 0 {
            return Err(NetworkError::InvalidLayer(format!("pooling `{}` has an empty window", name)));
        }
        let shape = Shape2D::new(
            source_shape.width.div_ceil(window.width),
            source_shape.height.div_ceil(window.height),
        );
        let nodes = (0..shape.area()).map(|_| Node::new(Vec::new(), Vec::new())).collect();
        self.push_layer(
            name,
            LayerKind::Pooling { window, mode, source: source_shape },
            Some(shape),
            vec![previous],
            nodes,
        )
    }

    /// Appends one pooling layer after each of `filters`, named `<filter>_pool`.
    pub fn add_pooling_each(
        &mut self,
        filters: &[LayerId],
        window: Shape2D,
        mode: PoolingMode,
    ) -> Result<Vec<LayerId>> {
        filters
            .iter()
            .map(|&filter| {
                let name = format!("{}_pool", self.layer(filter)?.name());
                self.add_pooling(&name, filter, window, mode)
            })
            .collect()
    }
}

/// The single layer a pooling layer reduces.
pub(crate) fn pooling_source(layer: &Layer) -> Result<LayerId> {
    match layer.previous.as_slice() {
        [source] => Ok(*source),
        _ => Err(NetworkError::InvariantViolation(format!(
            "pooling layer `{}` must have exactly one previous layer",
            layer.name
        ))),
    }
}

/// Source indices of every window, in output (row-major) order.
fn windows(source: Shape2D, window: Shape2D) -> impl Iterator<Item = Vec<usize>> {
    let out_w = source.width.div_ceil(window.width);
    let out_h = source.height.div_ceil(window.height);
    (0..out_h).flat_map(move |oy| {
        (0..out_w).map(move |ox| {
            let xs = ox * window.width..((ox + 1) * window.width).min(source.width);
            let ys = oy * window.height..((oy + 1) * window.height).min(source.height);
            ys.flat_map(|y| xs.clone().map(move |x| source.index(x, y))).collect()
        })
    })
}

/// First index holding the largest value; ties go to the earliest cell.
fn arg_max(values: &[f64], cells: &[usize]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for &cell in cells {
        match best {
            Some(b) if values[b] >= values[cell] => {}
            _ => best = Some(cell),
        }
    }
    best
}

pub(crate) fn pool_forward(
    values: &[f64],
    source: Shape2D,
    window: Shape2D,
    mode: PoolingMode,
) -> Result<Vec<f64>> {
    if values.len() != source.area() {
        return Err(NetworkError::InvariantViolation(format!(
            "pooling expected {} source values, found {}",
            source.area(),
            values.len()
        )));
    }
    Ok(windows(source, window)
        .map(|cells| match mode {
            PoolingMode::Max => arg_max(values, &cells).map_or(0.0, |i| values[i]),
            PoolingMode::Average => cells.iter().map(|&i| values[i]).sum::<f64>() / cells.len() as f64,
        })
        .collect())
}

/// Routes each pooled delta back to the source cells it came from:
/// the arg-max cell for max pooling, an even split for average pooling.
/// Returns `(source index, share)` pairs.
pub(crate) fn route_deltas(
    values: &[f64],
    deltas: &[Option<f64>],
    source: Shape2D,
    window: Shape2D,
    mode: PoolingMode,
) -> Vec<(usize, f64)> {
    let mut routed = Vec::new();
    for (cells, delta) in windows(source, window).zip(deltas) {
        let Some(delta) = *delta else { continue };
        match mode {
            PoolingMode::Max => {
                if let Some(winner) = arg_max(values, &cells) {
                    routed.push((winner, delta));
                }
            }
            PoolingMode::Average => {
                let share = delta / cells.len() as f64;
                routed.extend(cells.iter().map(|&cell| (cell, share)));
            }
        }
    }
    routed
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: [f64; 9] = [
        1.0, 5.0, 2.0, //
        5.0, 0.0, 3.0, //
        7.0, 8.0, 9.0,
    ];

    #[test]
    fn clipped_windows_cover_the_whole_grid() {
        let cells: Vec<Vec<usize>> = windows(Shape2D::new(3, 3), Shape2D::new(2, 2)).collect();
        assert_eq!(cells, vec![vec![0, 1, 3, 4], vec![2, 5], vec![6, 7], vec![8]]);
    }

    #[test]
    fn max_pooling_picks_the_first_maximum() {
        let pooled = pool_forward(&GRID, Shape2D::new(3, 3), Shape2D::new(2, 2), PoolingMode::Max).unwrap();
        assert_eq!(pooled, vec![5.0, 3.0, 8.0, 9.0]);

        let routed = route_deltas(
            &GRID,
            &[Some(1.0), None, Some(-2.0), Some(0.5)],
            Shape2D::new(3, 3),
            Shape2D::new(2, 2),
            PoolingMode::Max,
        );
        // 5.0 appears at cells 1 and 3: the first one wins.
        assert_eq!(routed, vec![(1, 1.0), (7, -2.0), (8, 0.5)]);
    }

    #[test]
    fn average_pooling_splits_evenly() {
        let pooled = pool_forward(&GRID, Shape2D::new(3, 3), Shape2D::new(2, 2), PoolingMode::Average).unwrap();
        assert_eq!(pooled, vec![11.0 / 4.0, 2.5, 7.5, 9.0]);

        let routed = route_deltas(
            &GRID,
            &[Some(1.0), Some(2.0), None, None],
            Shape2D::new(3, 3),
            Shape2D::new(2, 2),
            PoolingMode::Average,
        );
        assert_eq!(
            routed,
            vec![(0, 0.25), (1, 0.25), (3, 0.25), (4, 0.25), (2, 1.0), (5, 1.0)]
        );
    }
}
