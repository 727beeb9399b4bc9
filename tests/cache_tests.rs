mod common;

use common::{scorer_for, ALPHA30, SAMPLE_TEXT};
use keyforge_evolve::chromosome::{CharacterSet, Chromosome, Layer};
use keyforge_evolve::geometry::KeyboardGeometry;
use keyforge_evolve::scorer::{
    FitnessCache, FitnessMode, FitnessResult, FitnessScorer, FitnessWeights, NormalizationWindow,
};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

fn qwerty() -> Chromosome {
    let cs = CharacterSet::parse("qwertyuiopasdfghjkl;zxcvbnm,./").unwrap();
    Chromosome::single(Layer::identity(&cs))
}

fn unit_mode() -> FitnessMode {
    FitnessMode::new(FitnessWeights::default(), NormalizationWindow::unit())
}

#[test]
fn test_cache_survives_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let scorer = scorer_for(KeyboardGeometry::standard(), SAMPLE_TEXT);
    let cold = scorer.score(&qwerty(), "test-corpus", &unit_mode()).unwrap();
    scorer.cache().save(&path).unwrap();

    let loaded = FitnessCache::load(&path).unwrap();
    assert_eq!(loaded.len(), 1);

    let fingerprint = FitnessScorer::fingerprint(&qwerty(), "test-corpus", &unit_mode());
    assert_eq!(loaded.get(&fingerprint), Some(cold));
}

#[test]
fn test_warm_scorer_matches_cold_scorer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let cold_scorer = scorer_for(KeyboardGeometry::standard(), SAMPLE_TEXT);
    let cold = cold_scorer
        .score(&qwerty(), "test-corpus", &unit_mode())
        .unwrap();
    cold_scorer.cache().save(&path).unwrap();

    let warm_scorer = Arc::try_unwrap(scorer_for(KeyboardGeometry::standard(), SAMPLE_TEXT))
        .ok()
        .unwrap()
        .with_cache(Arc::new(FitnessCache::load(&path).unwrap()));
    let warm = warm_scorer
        .score(&qwerty(), "test-corpus", &unit_mode())
        .unwrap();

    assert_eq!(cold, warm);
    assert_eq!(warm_scorer.cache().stats().hits, 1);
}

#[test]
fn test_corrupt_entries_are_discarded_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(
        &path,
        r#"{
            "good": {"fitness": 0.5, "distance": 10.0, "time": 3.0, "timestamp": 1},
            "null_fitness": {"fitness": null, "distance": 10.0, "time": 3.0, "timestamp": 1},
            "garbage": "not an entry"
        }"#,
    )
    .unwrap();

    let cache = FitnessCache::load(&path).unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().discarded, 2);
    assert_eq!(cache.get("good").map(|r| r.fitness), Some(0.5));
    assert!(cache.get("null_fitness").is_none());
}

#[test]
fn test_unreadable_cache_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, "[1, 2, 3]").unwrap();
    assert!(FitnessCache::load(&path).is_err());
    assert!(FitnessCache::load(dir.path().join("missing.json")).is_err());
}

#[test]
fn test_fingerprint_separates_modes_and_datasets() {
    let mode = unit_mode();
    let mut reweighted = mode;
    reweighted.weights = FitnessWeights {
        distance: 0.9,
        time: 0.1,
    };

    let base = FitnessScorer::fingerprint(&qwerty(), "d1", &mode);
    assert_ne!(base, FitnessScorer::fingerprint(&qwerty(), "d2", &mode));
    assert_ne!(base, FitnessScorer::fingerprint(&qwerty(), "d1", &reweighted));

    let cs = CharacterSet::parse(ALPHA30).unwrap();
    let other = Chromosome::single(Layer::identity(&cs));
    assert_ne!(base, FitnessScorer::fingerprint(&other, "d1", &mode));
}

#[test]
fn test_concurrent_scoring_shares_cache() {
    let scorer = scorer_for(KeyboardGeometry::standard(), SAMPLE_TEXT);
    let results: Vec<FitnessResult> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let scorer = scorer.clone();
                s.spawn(move || scorer.score(&qwerty(), "test-corpus", &unit_mode()).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(scorer.cache().len(), 1);
}
