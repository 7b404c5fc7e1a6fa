/// Squared error restricted to the outputs that carry a target.
pub struct MseLoss;

impl MseLoss {
    /// Mean of `½ (predicted − target)²` over the targeted outputs; `0` when
    /// nothing is targeted.
    pub fn loss(predicted: &[f64], targets: &[Option<f64>]) -> f64 {
        let (sum, count) = predicted
            .iter()
            .zip(targets)
            .filter_map(|(p, t)| t.map(|t| 0.5 * (p - t).powi(2)))
            .fold((0.0, 0usize), |(sum, count), e| (sum + e, count + 1));
        if count == 0 { 0.0 } else { sum / count as f64 }
    }

    /// Per-output gradient `predicted − target`; `None` where no target is set.
    pub fn derivative(predicted: &[f64], targets: &[Option<f64>]) -> Vec<Option<f64>> {
        predicted
            .iter()
            .zip(targets)
            .map(|(p, t)| t.map(|t| p - t))
            .collect()
    }
}
