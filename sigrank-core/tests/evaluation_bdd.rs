//! BDD tests for the evaluator
//!
//! These tests drive full evaluations through a scripted engine:
//! - Two-model evaluations stop at the omnibus tests
//! - Baseline evaluations compare against the control model only
//! - Ties, partial orders and failures land in the right result slots

mod common;

use std::collections::{BTreeMap, BTreeSet};

use common::{sample_data, uniform_matrix, Call, ScriptedEngine};
use sigrank_core::{
    Branch, CorrectionMethod, EngineHandle, EvalError, Evaluator, FailureReason, LevelOrder,
    OrderRejection, PostHocMode, SampleData, StatsConfig, TestId, TestOutcome, TestPlan,
    TriangularMatrix,
};

const MEASURE: &str = "Weighted F-Measure";

fn levels(entries: &[(usize, &[usize])]) -> LevelOrder {
    LevelOrder::Valid(
        entries
            .iter()
            .map(|(level, models)| (*level, models.iter().copied().collect::<BTreeSet<_>>()))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn evaluate(
    config: &StatsConfig,
    engine: ScriptedEngine,
    data: &SampleData,
) -> (sigrank_core::EvaluationResults, Vec<Call>) {
    let handle = EngineHandle::open(engine).unwrap();
    let results = Evaluator::new(config, &handle)
        .unwrap()
        .evaluate(data)
        .expect("evaluation should succeed");
    let calls = handle.close().unwrap().calls;
    (results, calls)
}

#[test]
fn bdd_scenario_two_models_run_only_omnibus_tests() {
    // GIVEN two models with ten paired samples and no contingency test
    let mut config = StatsConfig::default();
    config.tests.two_samples_non_parametric_contingency = None;
    let data = sample_data(MEASURE, &[0.80, 0.70], 10);

    // WHEN the evaluation runs
    let (results, calls) = evaluate(&config, ScriptedEngine::new(uniform_matrix(2, 0.01)), &data);

    // THEN only the two-sample omnibus tests were invoked
    assert_eq!(
        calls,
        vec![
            Call::TwoSample(TestId::DependentT),
            Call::TwoSample(TestId::WilcoxonSignedRank),
        ]
    );

    // AND no post-hoc result or ordering was produced
    let measure = results.measure(MEASURE).unwrap();
    for branch in Branch::BOTH {
        let result = measure.branch(branch);
        assert!(result.omnibus.is_completed());
        assert!(result.post_hoc.is_none());
        assert!(result.ordering.is_none());
    }
    assert!(matches!(results.plan, TestPlan::TwoSample { .. }));
    assert!(results.contingency.is_none());
    assert_eq!(results.orderings().count(), 0);
}

#[test]
fn bdd_scenario_baseline_dominating_three_models() {
    // GIVEN four models where the flagged baseline has the highest average
    let config = StatsConfig::default();
    let data = sample_data(MEASURE, &[0.90, 0.70, 0.72, 0.71], 8)
        .with_baseline(0)
        .unwrap();

    // AND every comparison against the baseline is significant
    let post_hoc = TriangularMatrix::control_column(vec![0.01, 0.01, 0.01]);

    // WHEN the evaluation runs
    let (results, calls) = evaluate(&config, ScriptedEngine::new(post_hoc), &data);

    // THEN the baseline post-hoc tests were used
    assert!(matches!(
        results.plan,
        TestPlan::MultiSample {
            mode: PostHocMode::VersusControl,
            ..
        }
    ));
    assert!(calls.contains(&Call::PostHoc(TestId::Dunnett)));
    assert!(calls.contains(&Call::PostHoc(TestId::PairwiseWilcoxonSignedRank)));

    // AND every non-baseline model points to the baseline
    for (_, _, ordering) in results.orderings() {
        assert_eq!(ordering.edges, vec![(1, 0), (2, 0), (3, 0)]);

        // AND the three others share the lower level, the baseline sits above
        assert_eq!(ordering.order, levels(&[(0, &[1, 2, 3]), (1, &[0])]));
    }
    assert_eq!(results.orderings().count(), 2);
}

#[test]
fn bdd_scenario_baseline_ignores_non_baseline_pairs() {
    // GIVEN the same four models but an all-pairs matrix where only the
    // baseline comparisons are significant
    let config = StatsConfig::default();
    let data = sample_data(MEASURE, &[0.90, 0.70, 0.72, 0.71], 8)
        .with_baseline(0)
        .unwrap();
    let post_hoc =
        TriangularMatrix::from_rows(vec![vec![0.01], vec![0.01, 0.9], vec![0.01, 0.9, 0.9]]);

    // WHEN the evaluation runs
    let (results, _) = evaluate(&config, ScriptedEngine::new(post_hoc), &data);

    // THEN the graph holds exactly the three baseline edges
    let ordering = results
        .measure(MEASURE)
        .unwrap()
        .parametric
        .ordering
        .clone()
        .unwrap();
    assert_eq!(ordering.edges, vec![(1, 0), (2, 0), (3, 0)]);
    assert_eq!(ordering.order, levels(&[(0, &[1, 2, 3]), (1, &[0])]));
}

#[test]
fn bdd_scenario_no_significant_pairs_is_one_tie_group() {
    // GIVEN three models where every pairwise p-value is 0.5
    let config = StatsConfig::default();
    let data = sample_data(MEASURE, &[0.80, 0.81, 0.79], 8);

    // WHEN the evaluation runs
    let (results, _) = evaluate(&config, ScriptedEngine::new(uniform_matrix(3, 0.5)), &data);

    // THEN there are no edges and all models tie on level 0
    for (_, _, ordering) in results.orderings() {
        assert!(ordering.edges.is_empty());
        assert_eq!(ordering.order, levels(&[(0, &[0, 1, 2])]));
    }
    assert_eq!(results.orderings().count(), 2);
}

#[test]
fn bdd_scenario_missing_transitive_edge_has_no_valid_order() {
    // GIVEN three models with increasing averages
    let config = StatsConfig::default();
    let data = sample_data(MEASURE, &[0.70, 0.75, 0.80], 8);

    // AND p(1,0)=0.01, p(2,0)=0.5, p(2,1)=0.01
    let post_hoc = TriangularMatrix::from_rows(vec![vec![0.01], vec![0.5, 0.01]]);

    // WHEN the evaluation runs
    let (results, _) = evaluate(&config, ScriptedEngine::new(post_hoc), &data);

    // THEN the graph has 0->1 and 1->2 but not 0->2
    let ordering = results
        .measure(MEASURE)
        .unwrap()
        .non_parametric
        .ordering
        .clone()
        .unwrap();
    assert_eq!(ordering.edges, vec![(0, 1), (1, 2)]);

    // AND the ordering is rejected
    assert_eq!(
        ordering.order,
        LevelOrder::Rejected(OrderRejection::IncompleteDominance)
    );
}

#[test]
fn bdd_scenario_graph_uses_uncorrected_p_values() {
    // GIVEN corrections that push every p-value above the threshold
    let config = StatsConfig::default();
    let data = sample_data(MEASURE, &[0.70, 0.80, 0.90], 8);
    let engine = ScriptedEngine::new(uniform_matrix(3, 0.01)).with_adjust_factor(100.0);

    // WHEN the evaluation runs
    let (results, calls) = evaluate(&config, engine, &data);

    // THEN every configured correction was applied once per branch
    let adjustments = calls
        .iter()
        .filter(|call| matches!(call, Call::Adjust(_)))
        .count();
    assert_eq!(adjustments, config.corrections.len() * 2);

    let post_hoc = results.measure(MEASURE).unwrap().parametric.post_hoc.clone().unwrap();
    let post_hoc = post_hoc.completed().unwrap();
    let holm = post_hoc.corrections[&CorrectionMethod::Holm].completed().unwrap();
    assert_eq!(holm.get(1, 1), Some(1.0));

    // AND the ordering still reflects the raw p-values
    let ordering = results.measure(MEASURE).unwrap().parametric.ordering.clone().unwrap();
    assert_eq!(ordering.edges, vec![(0, 1), (0, 2), (1, 2)]);
    assert_eq!(ordering.order, levels(&[(0, &[0]), (1, &[1]), (2, &[2])]));
}

#[test]
fn bdd_scenario_failed_omnibus_skips_post_hoc_in_that_branch_only() {
    // GIVEN an engine whose parametric omnibus test fails
    let config = StatsConfig::default();
    let data = sample_data(MEASURE, &[0.70, 0.80, 0.90], 8);
    let engine =
        ScriptedEngine::new(uniform_matrix(3, 0.01)).failing(TestId::RepeatedMeasuresOneWayANOVA);

    // WHEN the evaluation runs
    let (results, calls) = evaluate(&config, engine, &data);
    let measure = results.measure(MEASURE).unwrap();

    // THEN the parametric branch records the failure and stops
    assert!(matches!(
        measure.parametric.omnibus,
        TestOutcome::Failed(FailureReason::Engine(_))
    ));
    assert!(measure.parametric.post_hoc.is_none());
    assert!(!calls.contains(&Call::PostHoc(TestId::Tukey)));

    // AND the non-parametric branch still produces an ordering
    assert!(measure.non_parametric.omnibus.is_completed());
    assert!(measure.non_parametric.ordering.is_some());
    assert!(calls.contains(&Call::PostHoc(TestId::Nemenyi)));
}

#[test]
fn bdd_scenario_nan_omnibus_is_a_failed_slot() {
    // GIVEN an engine that answers every omnibus test with NaN
    let config = StatsConfig::default();
    let data = sample_data(MEASURE, &[0.70, 0.80, 0.90], 8);
    let engine = ScriptedEngine::new(uniform_matrix(3, 0.01)).with_omnibus_p(f64::NAN);

    // WHEN the evaluation runs
    let (results, calls) = evaluate(&config, engine, &data);

    // THEN both omnibus slots are failed and no post-hoc ran
    let measure = results.measure(MEASURE).unwrap();
    for branch in Branch::BOTH {
        assert_eq!(
            measure.branch(branch).omnibus,
            TestOutcome::Failed(FailureReason::NanPValue)
        );
        assert!(measure.branch(branch).post_hoc.is_none());
    }
    assert!(!calls.iter().any(|call| matches!(call, Call::PostHoc(_))));
}

#[test]
fn bdd_scenario_all_nan_post_hoc_is_a_failed_slot() {
    // GIVEN a post-hoc test that produces no defined p-value
    let config = StatsConfig::default();
    let data = sample_data(MEASURE, &[0.70, 0.80, 0.90], 8);
    let engine = ScriptedEngine::new(uniform_matrix(3, f64::NAN));

    // WHEN the evaluation runs
    let (results, _) = evaluate(&config, engine, &data);

    // THEN the post-hoc slot records the failure and there is no ordering
    let branch = &results.measure(MEASURE).unwrap().parametric;
    assert_eq!(
        branch.post_hoc,
        Some(TestOutcome::Failed(FailureReason::NanPValue))
    );
    assert!(branch.ordering.is_none());
}

#[test]
fn bdd_scenario_contingency_runs_once_for_two_models() {
    // GIVEN two models with a contingency table
    let config = StatsConfig::default();
    let data = sample_data(MEASURE, &[0.80, 0.70], 10).with_contingency([[40, 12], [3, 45]]);

    // WHEN the evaluation runs
    let (results, calls) = evaluate(&config, ScriptedEngine::new(uniform_matrix(2, 0.01)), &data);

    // THEN McNemar ran exactly once and its result is reported separately
    let contingency_calls = calls
        .iter()
        .filter(|call| **call == Call::Contingency(TestId::McNemar))
        .count();
    assert_eq!(contingency_calls, 1);
    assert!(results.contingency.as_ref().unwrap().is_completed());
}

#[test]
fn bdd_scenario_every_measure_is_evaluated() {
    // GIVEN two measures over the same three models
    let config = StatsConfig::default();
    let metadata = (0..3)
        .map(|i| sigrank_core::ModelMetadata::new(format!("clf{i}"), "fs"))
        .collect();
    let data = SampleData::new(
        BTreeMap::from([
            ("Accuracy".to_string(), common::model_rows(&[0.7, 0.8, 0.9], 6)),
            (MEASURE.to_string(), common::model_rows(&[0.9, 0.8, 0.7], 6)),
        ]),
        metadata,
        sigrank_core::PipelineKind::Cv,
    )
    .unwrap();

    // WHEN the evaluation runs
    let (results, _) = evaluate(&config, ScriptedEngine::new(uniform_matrix(3, 0.01)), &data);

    // THEN each measure has its own ordering with opposite directions
    let accuracy = results.measure("Accuracy").unwrap().parametric.ordering.clone().unwrap();
    let f_measure = results.measure(MEASURE).unwrap().parametric.ordering.clone().unwrap();
    assert_eq!(accuracy.order, levels(&[(0, &[0]), (1, &[1]), (2, &[2])]));
    assert_eq!(f_measure.order, levels(&[(0, &[2]), (1, &[1]), (2, &[0])]));
    assert_eq!(results.orderings().count(), 4);
}

#[test]
fn bdd_scenario_empty_sample_data_aborts() {
    // GIVEN persisted sample data without any measure
    let data: SampleData = serde_json::from_value(serde_json::json!({
        "samples": {},
        "sample_averages": {},
        "model_metadata": [],
        "baseline_indices": [],
        "contingency": null,
        "dataset_names": [],
        "pipeline": "cv",
        "folds": null,
        "repetitions": null
    }))
    .unwrap();
    let config = StatsConfig::default();
    let handle = EngineHandle::open(ScriptedEngine::new(uniform_matrix(2, 0.5))).unwrap();

    // WHEN the evaluation runs
    let err = Evaluator::new(&config, &handle)
        .unwrap()
        .evaluate(&data)
        .unwrap_err();

    // THEN the whole run is aborted
    assert!(matches!(err, EvalError::NoMeasures));
    assert!(handle.close().unwrap().calls.is_empty());
}
