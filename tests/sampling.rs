//! End-to-end tests: build a network, sample it, and estimate marginals
//! by driving the ancestral sampler through the Monte Carlo estimator.

use credence::{
    estimate, estimate_parallel, AncestralSampler, BeliefNetwork, NodeSpec, ParallelConfig,
    RandomStream,
};

/// Classic sprinkler network. State index 0 means "yes"/"on".
fn sprinkler_network() -> BeliefNetwork {
    BeliefNetwork::build(vec![
        NodeSpec::new("rain", ["yes", "no"], [], [0.2, 0.8]),
        NodeSpec::new(
            "sprinkler",
            ["on", "off"],
            ["rain"],
            [0.01, 0.99, 0.4, 0.6],
        ),
        NodeSpec::new(
            "wet",
            ["yes", "no"],
            ["sprinkler", "rain"],
            [0.99, 0.01, 0.9, 0.1, 0.8, 0.2, 0.0, 1.0],
        ),
    ])
    .unwrap()
}

#[test]
fn sampler_respects_topological_order_regardless_of_declaration() {
    // Deepest node declared first; every draw must still see settled parents.
    let net = BeliefNetwork::build(vec![
        NodeSpec::new(
            "wet",
            ["yes", "no"],
            ["sprinkler", "rain"],
            [0.99, 0.01, 0.9, 0.1, 0.8, 0.2, 0.0, 1.0],
        ),
        NodeSpec::new("sprinkler", ["on", "off"], ["rain"], [0.01, 0.99, 0.4, 0.6]),
        NodeSpec::new("rain", ["yes", "no"], [], [0.2, 0.8]),
    ])
    .unwrap();

    let order: Vec<&str> = net.topological_order().map(|i| net.node(i).id()).collect();
    assert_eq!(order, ["rain", "sprinkler", "wet"]);

    let sampler = AncestralSampler::new(&net);
    let mut rng = RandomStream::seed_from_u64(21);
    for _ in 0..1000 {
        let joint = sampler.sample(&mut rng).unwrap();
        // Deterministic line: sprinkler off and no rain never wets the grass.
        let rain = joint.state(net.node_by_id("rain").unwrap().0);
        let sprinkler = joint.state(net.node_by_id("sprinkler").unwrap().0);
        let wet = joint.state(net.node_by_id("wet").unwrap().0);
        if rain == 1 && sprinkler == 1 {
            assert_eq!(wet, 1);
        }
    }
}

#[test]
fn estimated_marginal_matches_exact_inference() {
    // P(wet = yes) = 0.2*(0.01*0.99 + 0.99*0.8) + 0.8*(0.4*0.9) = 0.44838
    let net = sprinkler_network();
    let sampler = AncestralSampler::new(&net);
    let wet = net.node_by_id("wet").unwrap().0;

    let mut rng = RandomStream::seed_from_u64(2024);
    let mean = estimate(
        200_000,
        net.len(),
        1,
        |uniforms, out| {
            let joint = sampler.sample_with(uniforms).expect("validated network");
            out[0] = (joint.state(wet) == 0) as u8 as f32;
        },
        &mut rng,
    )
    .unwrap();

    assert!((mean[0] - 0.44838).abs() < 0.01, "P(wet) was {}", mean[0]);
}

#[test]
fn parallel_estimate_agrees_with_exact_marginal() {
    let net = sprinkler_network();
    let sampler = AncestralSampler::new(&net);
    let rain = net.node_by_id("rain").unwrap().0;

    let generator = |uniforms: &[f32], out: &mut [f32]| {
        let joint = sampler.sample_with(uniforms).expect("validated network");
        out[0] = (joint.state(rain) == 0) as u8 as f32;
    };
    let config = ParallelConfig {
        workers: 4,
        base_seed: 77,
    };
    let mean = estimate_parallel(200_000, net.len(), 1, &generator, &config).unwrap();

    assert!((mean[0] - 0.2).abs() < 0.01, "P(rain) was {}", mean[0]);
}

#[cfg(feature = "parallel")]
#[test]
fn batch_frequencies_match_root_prior() {
    let net = sprinkler_network();
    let sampler = AncestralSampler::new(&net);
    let rain = net.node_by_id("rain").unwrap().0;

    let batch = sampler.sample_batch(100_000, 31).unwrap();
    let rainy = batch.iter().filter(|j| j.state(rain) == 0).count();
    let freq = rainy as f64 / batch.len() as f64;
    assert!((freq - 0.2).abs() < 0.01, "empirical P(rain) was {freq}");
}

#[test]
fn root_marginal_from_generator_adapter() {
    // Two-node network used as a generator via fill_states: state indices
    // land in the output buffer in arena order.
    let net = BeliefNetwork::build(vec![
        NodeSpec::new("a", ["s0", "s1"], [], [0.5, 0.5]),
        NodeSpec::new("b", ["s0", "s1"], ["a"], [0.9, 0.1, 0.2, 0.8]),
    ])
    .unwrap();
    let sampler = AncestralSampler::new(&net);

    let mut rng = RandomStream::seed_from_u64(404);
    let mean = estimate(
        100_000,
        net.len(),
        net.len(),
        |uniforms, out| sampler.fill_states(uniforms, out).expect("validated network"),
        &mut rng,
    )
    .unwrap();

    // E[state(a)] = 0.5; E[state(b)] = P(b=1) = 0.5*0.1 + 0.5*0.8 = 0.45.
    assert!((mean[0] - 0.5).abs() < 0.01, "E[a] was {}", mean[0]);
    assert!((mean[1] - 0.45).abs() < 0.01, "E[b] was {}", mean[1]);
}
