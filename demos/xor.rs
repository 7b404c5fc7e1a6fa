use dagnet::{
    initialise, train_loop, ActivationFunction, Initialiser, Network, Sample, TrainConfig, WeightArena,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut weights = WeightArena::new();
    let mut network = Network::new(&weights);
    let input = network.add_input("in", 2)?;
    let hidden = network.add_dense(&mut weights, "hidden", 3, &[input], ActivationFunction::Logistic)?;
    let output = network.add_dense(&mut weights, "out", 1, &[hidden], ActivationFunction::Logistic)?;

    let mut rng = StdRng::seed_from_u64(42);
    initialise(&network, &mut weights, output, Initialiser::Uniform, &mut rng)?;

    let samples = vec![
        Sample::dense(vec![1.0, 0.0], vec![1.0]),
        Sample::dense(vec![1.0, 1.0], vec![0.0]),
        Sample::dense(vec![0.0, 1.0], vec![1.0]),
        Sample::dense(vec![0.0, 0.0], vec![0.0]),
    ];

    let mut config = TrainConfig::new(5000, 0.5);
    config.momentum = Some(0.9);
    let loss = train_loop(&mut network, &mut weights, output, &samples, &config)?;
    println!("final loss = {loss:.6}");

    for sample in &samples {
        let result = network.evaluate(&weights, output, &sample.inputs)?;
        println!("Input: {:?} -> Output: {:.4}", sample.inputs, result[0]);
    }
    Ok(())
}
