mod common;

use common::{dataset, small_config, SAMPLE_TEXT};
use keyforge_evolve::api::{run, run_with_progress, RunOptions};
use keyforge_evolve::geometry::KeyboardGeometry;
use keyforge_evolve::individual::Lineage;
use keyforge_evolve::optimizer::{GenerationReport, ProgressCallback};
use keyforge_evolve::state::RunStatus;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(usize, usize, f64)>>,
    stop_after: Option<usize>,
}

impl ProgressCallback for Recorder {
    fn on_generation(&self, report: &GenerationReport<'_>) -> bool {
        self.seen.lock().unwrap().push((
            report.generation,
            report.population.len(),
            report.best_fitness,
        ));
        self.stop_after.map_or(true, |n| report.generation < n)
    }
}

#[test]
fn test_phases_drive_population_size() {
    let mut config = small_config();
    config.search.phases = "2:4,1:8".into();
    let recorder = Recorder::default();

    let result = run_with_progress(
        config,
        KeyboardGeometry::standard(),
        dataset(SAMPLE_TEXT),
        RunOptions::default(),
        &recorder,
    )
    .unwrap();

    let sizes: Vec<(usize, usize)> = recorder
        .seen
        .lock()
        .unwrap()
        .iter()
        .map(|(g, n, _)| (*g, *n))
        .collect();
    assert_eq!(sizes, vec![(1, 4), (2, 4), (3, 8)]);
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.state.generation, 3);
    assert_eq!(result.state.population.len(), 8);
}

#[test]
fn test_best_fitness_never_regresses() {
    let mut config = small_config();
    config.search.max_iterations = 5;
    let recorder = Recorder::default();

    run_with_progress(
        config,
        KeyboardGeometry::standard(),
        dataset(SAMPLE_TEXT),
        RunOptions::default(),
        &recorder,
    )
    .unwrap();

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 5);
    assert!(seen.windows(2).all(|w| w[1].2 <= w[0].2));
}

#[test]
fn test_flat_landscape_stagnates() {
    // Nothing in this corpus is typeable, so every layout scores the same.
    let mut config = small_config();
    config.search.max_iterations = 20;
    config.search.stagnant_limit = 3;

    let result = run(
        config,
        KeyboardGeometry::standard(),
        dataset("1234567890"),
        RunOptions::default(),
    )
    .unwrap();

    assert_eq!(result.status, RunStatus::Stagnated);
    assert_eq!(result.state.generation, 3);
    assert_eq!(result.state.stagnation.counter, 3);
}

#[test]
fn test_callback_can_stop_the_run() {
    let mut config = small_config();
    config.search.max_iterations = 10;
    let recorder = Recorder {
        stop_after: Some(2),
        ..Default::default()
    };

    let result = run_with_progress(
        config,
        KeyboardGeometry::standard(),
        dataset(SAMPLE_TEXT),
        RunOptions::default(),
        &recorder,
    )
    .unwrap();

    assert_eq!(result.status, RunStatus::Cancelled);
    assert_eq!(result.state.generation, 2);
    assert_eq!(recorder.seen.lock().unwrap().len(), 2);
}

#[test]
fn test_history_ids_are_unique_and_lineage_tracked() {
    let result = run(
        small_config(),
        KeyboardGeometry::standard(),
        dataset(SAMPLE_TEXT),
        RunOptions::default(),
    )
    .unwrap();

    let history = &result.state.history;
    let ids: HashSet<u64> = history.iter().map(|i| i.id()).collect();
    assert_eq!(ids.len(), history.len());
    assert!(history.iter().all(|i| i.is_scored()));

    let seeded = history
        .iter()
        .filter(|i| i.generation() == 0 && i.lineage() == Lineage::Heuristic)
        .count();
    assert_eq!(seeded, 5);
    for child in history.iter().filter(|i| i.generation() > 0) {
        assert!(!child.parents().is_empty());
        assert!(child.parents().iter().all(|p| *p < child.id()));
    }
}

#[test]
fn test_skip_heuristics_is_all_random() {
    let mut config = small_config();
    config.search.skip_heuristics = true;
    config.search.max_iterations = 1;

    let result = run(
        config,
        KeyboardGeometry::standard(),
        dataset(SAMPLE_TEXT),
        RunOptions::default(),
    )
    .unwrap();

    assert!(result
        .state
        .history
        .iter()
        .all(|i| i.lineage() == Lineage::Random));
}

#[test]
fn test_multi_layer_run_stays_in_bounds() {
    let mut config = small_config();
    config.search.num_layers = 2;
    config.search.max_layers = 3;
    config.search.layer_change_probability = 0.5;

    let result = run(
        config,
        KeyboardGeometry::standard(),
        dataset(SAMPLE_TEXT),
        RunOptions::default(),
    )
    .unwrap();

    for ind in &result.state.history {
        let n = ind.chromosome().layer_count();
        assert!((1..=3).contains(&n), "individual {} has {} layers", ind.id(), n);
    }
}

#[test]
fn test_cancel_token_stops_before_start() {
    let options = RunOptions::default();
    options.cancel.cancel();
    let err = run(
        small_config(),
        KeyboardGeometry::standard(),
        dataset(SAMPLE_TEXT),
        options,
    )
    .unwrap_err();
    assert!(matches!(err, keyforge_evolve::error::KeyForgeError::Cancelled));
}
