//! End-to-end tests for the generation cycle.

use genevo_sim::prelude::*;
use genevo_sim::simulation::{
    run_replicates, EvolutionConfig, ExecutionConfig, ExpressionConfig, InitializationConfig,
    MutationConfig, SelectionConfig,
};
use genevo_sim::storage::{RecordLevels, RecordingStrategy};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn regulatory_config(seed: Option<u64>) -> Configuration {
    Configuration::new(
        ExecutionConfig::new(12, 4, seed),
        EvolutionConfig {
            expression: ExpressionConfig::Regulatory {
                edges: vec![
                    RegulatoryEdge::new(0, 1, 0.8),
                    RegulatoryEdge::new(1, 2, 1.2),
                    RegulatoryEdge::new(2, 3, -0.4),
                    RegulatoryEdge::new(3, 0, 0.5),
                ],
                kinetics: GeneKinetics::Shared(Kinetics::Hill(
                    HillExpression::new(3.0, 1.0, 2.0).unwrap(),
                )),
            },
            selection: SelectionConfig::MultiObjective(
                MultiObjectiveSelection::from_rows(&[
                    vec![1.0, 0.0],
                    vec![0.0, 1.0],
                    vec![1.0, 0.0],
                    vec![0.0, 2.0],
                ])
                .unwrap(),
            ),
            mutation: MutationConfig::Point(PointMutation::new(0.2, 0.3).unwrap()),
        },
        InitializationConfig::Uniform(1.0),
    )
}

#[test]
fn test_single_individual_proportional_fitness() {
    init_logging();
    let mut sim = GeneNetworkBuilder::new()
        .population_size(1)
        .gene_count(1)
        .expression(ConstantExpression::new(1.0).unwrap())
        .selection(ProportionalSelection::new())
        .seed(1)
        .build()
        .unwrap();
    sim.step().unwrap();
    assert_eq!(sim.fitness(), &[Some(1.0)]);
}

#[test]
fn test_silent_population_fails_threshold() {
    init_logging();
    let mut sim = GeneNetworkBuilder::new()
        .population_size(6)
        .gene_count(3)
        .expression(ConstantExpression::new(0.0).unwrap())
        .selection(ThresholdSelection::new(0.5).unwrap())
        .seed(2)
        .build()
        .unwrap();
    sim.run_for(2).unwrap();
    assert!(sim.fitness().iter().all(|f| *f == Some(0.0)));
}

#[test]
fn test_zero_interaction_matrix_scores_zero() {
    init_logging();
    let mut sim = GeneNetworkBuilder::new()
        .population_size(5)
        .gene_count(3)
        .expression(LinearExpression::new(1.0, 2.0).unwrap())
        .selection(EpistaticFitness::zeros(3))
        .mutation(PointMutation::new(0.5, 1.0).unwrap())
        .seed(3)
        .build()
        .unwrap();
    sim.run_for(4).unwrap();
    assert!(sim.fitness().iter().all(|f| *f == Some(0.0)));
}

#[test]
fn test_multi_objective_normalised_by_weight_sum() {
    init_logging();
    // No edges: each gene's level comes straight from its own kinetics.
    let network = RegulatoryNetwork::empty(2);
    let kinetics = GeneKinetics::PerGene(vec![
        Kinetics::Linear(LinearExpression::new(0.0, 2.0).unwrap()),
        Kinetics::Linear(LinearExpression::new(0.0, 4.0).unwrap()),
    ]);
    let mut sim = GeneNetworkBuilder::new()
        .population_size(1)
        .expression(RegulatoryExpression::new(network, kinetics).unwrap())
        .selection(MultiObjectiveSelection::from_weights(&[1.0, 1.0]).unwrap())
        .seed(4)
        .build()
        .unwrap();
    sim.step().unwrap();
    assert_eq!(sim.fitness(), &[Some(3.0)]);
}

#[test]
fn test_regulatory_edge_drives_target() {
    init_logging();
    let network = RegulatoryNetwork::new(2, &[RegulatoryEdge::new(0, 1, 2.0)]).unwrap();
    let model = RegulatoryExpression::new(
        network,
        GeneKinetics::Shared(Kinetics::Linear(LinearExpression::new(1.0, 0.0).unwrap())),
    )
    .unwrap();

    let mut sim = GeneNetworkBuilder::new()
        .population_size(1)
        .expression(model)
        .initial_expression(ExpressionMatrix::from_row_major(1, 2, &[3.0, 0.0]).unwrap())
        .seed(6)
        .build()
        .unwrap();
    sim.step().unwrap();

    assert_eq!(sim.expression().get(0, 1), Some(6.0));
    // Gene 0 has no regulators, so it sees zero input
    assert_eq!(sim.expression().get(0, 0), Some(0.0));
}

#[test]
fn test_seeded_runs_are_reproducible() {
    init_logging();
    let config = regulatory_config(Some(2024));
    let mut a = GeneNetwork::from_config(&config).unwrap();
    let mut b = GeneNetwork::from_config(&config).unwrap();
    a.run_for(40).unwrap();
    b.run_for(40).unwrap();

    let bits = |sim: &GeneNetwork| -> Vec<u64> {
        sim.expression()
            .to_row_major()
            .iter()
            .map(|v| v.to_bits())
            .collect()
    };
    assert_eq!(bits(&a), bits(&b));
    assert_eq!(a.fitness(), b.fitness());
}

#[test]
fn test_expression_stays_non_negative() {
    init_logging();
    let mut sim = GeneNetworkBuilder::new()
        .population_size(30)
        .gene_count(5)
        .expression(LinearExpression::new(1.0, 0.05).unwrap())
        .mutation(PointMutation::new(1.0, 2.0).unwrap())
        .seed(8)
        .build()
        .unwrap();
    for _ in 0..50 {
        sim.step().unwrap();
        assert!(sim.expression().min_value().unwrap() >= 0.0);
    }
}

#[test]
fn test_config_roundtrip_reproduces_run() {
    init_logging();
    let config = regulatory_config(Some(77));
    let restored = Configuration::from_json(&config.to_json().unwrap()).unwrap();

    let mut original = GeneNetwork::from_config(&config).unwrap();
    let mut reloaded = GeneNetwork::from_config(&restored).unwrap();
    original.run_for(10).unwrap();
    reloaded.run_for(10).unwrap();
    assert_eq!(original.population(), reloaded.population());
}

#[test]
fn test_recorder_receives_selected_generations() {
    init_logging();
    let mut sim = GeneNetwork::from_config(&regulatory_config(Some(5))).unwrap();
    let mut recorder = MemoryRecorder::new(RecordingStrategy::Specific(vec![1, 5, 9]))
        .with_levels(RecordLevels {
            model: true,
            individual: false,
            gene: true,
        });
    sim.run_for_recorded(10, &mut recorder).unwrap();

    assert_eq!(recorder.generations(), vec![1, 5, 9]);
    assert!(recorder.individual_rows().is_empty());
    assert_eq!(recorder.gene_rows().len(), 3 * 4);
    assert!(recorder
        .model_rows()
        .iter()
        .all(|row| row.fitness.min <= row.fitness.mean && row.fitness.mean <= row.fitness.max));
}

#[test]
fn test_replicates_are_independent_of_thread_count() {
    init_logging();
    let config = regulatory_config(None);
    let seeds = [10, 20, 30, 40];
    let parallel = run_replicates(&config, &seeds, 15).unwrap();

    let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let serial = pool.install(|| run_replicates(&config, &seeds, 15)).unwrap();
    assert_eq!(parallel, serial);
}
