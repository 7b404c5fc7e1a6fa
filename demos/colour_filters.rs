//! Learns to tell horizontal stripes from vertical ones on 6x6 RGB images,
//! using one shared-kernel filter per colour plane followed by max pooling.

use dagnet::{
    initialise, ActivationFunction, BackPropagator, Initialiser, MseLoss, Network, PoolingMode, Shape2D,
    WeightArena,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIZE: usize = 6;

fn stripes(horizontal: bool, phase: usize, rng: &mut StdRng) -> Vec<f64> {
    let mut planes = Vec::with_capacity(3 * SIZE * SIZE);
    for _ in 0..3 {
        let brightness = rng.gen_range(0.5..1.0);
        for y in 0..SIZE {
            for x in 0..SIZE {
                let line = if horizontal { y } else { x };
                planes.push(if (line + phase) % 2 == 0 { brightness } else { 0.0 });
            }
        }
    }
    planes
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let shape = Shape2D::new(SIZE, SIZE);
    let mut weights = WeightArena::new();
    let mut network = Network::new(&weights);
    let red = network.add_input_2d("red", shape)?;
    let green = network.add_input_2d("green", shape)?;
    let blue = network.add_input_2d("blue", shape)?;

    let kernel = Shape2D::new(2, 2);
    let mut filters = Vec::new();
    for name in ["filter_a", "filter_b", "filter_c", "filter_d"] {
        filters.push(network.add_filter_2d(&mut weights, name, &[red, green, blue], kernel, ActivationFunction::Relu)?);
    }
    let pools = network.add_pooling_each(&filters, Shape2D::new(2, 2), PoolingMode::Max)?;
    let output = network.add_dense(&mut weights, "label", 2, &pools, ActivationFunction::Logistic)?;

    let mut rng = StdRng::seed_from_u64(7);
    initialise(&network, &mut weights, output, Initialiser::HeUniform, &mut rng)?;

    let mut samples = Vec::new();
    for i in 0..40 {
        let horizontal = i % 2 == 0;
        let image = stripes(horizontal, i % 3, &mut rng);
        let label = if horizontal { vec![1.0, 0.0] } else { vec![0.0, 1.0] };
        samples.push((image, label));
    }

    // A flat vector would be fed to every input layer, so split the planes.
    let area = shape.area();
    let by_layer = |image: &[f64]| {
        vec![
            (red, image[..area].to_vec()),
            (green, image[area..2 * area].to_vec()),
            (blue, image[2 * area..].to_vec()),
        ]
    };

    let mut propagator = BackPropagator::new(output, 0.05).with_momentum(&network, 0.5)?;
    for round in 0..30 {
        let mut loss = 0.0;
        for (image, label) in &samples {
            let targets: Vec<Option<f64>> = label.iter().copied().map(Some).collect();
            let predicted = propagator.backpropagate(&mut network, &mut weights, &by_layer(image), &targets)?;
            loss += MseLoss::loss(&predicted, &targets);
        }
        if round % 10 == 0 {
            println!("round {round}: loss = {:.6}", loss / samples.len() as f64);
        }
    }

    let mut correct = 0;
    for (image, label) in &samples {
        let result = network.evaluate(&weights, output, &by_layer(image))?;
        if (result[0] > result[1]) == (label[0] > label[1]) {
            correct += 1;
        }
    }
    println!("{correct}/{} classified correctly", samples.len());
    Ok(())
}
