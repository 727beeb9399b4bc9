#![allow(dead_code)]

use keyforge_evolve::config::Config;
use keyforge_evolve::corpus::{Dataset, DatasetRegistry};
use keyforge_evolve::geometry::{KeyPosition, KeyboardGeometry};
use keyforge_evolve::scorer::FitnessScorer;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const ALPHA30: &str = "abcdefghijklmnopqrstuvwxyz,.;/";

pub const SAMPLE_TEXT: &str = "the quick brown fox jumps over the lazy dog. \
    pack my box with five dozen liquor jugs; how vexingly quick daft zebras jump, \
    sphinx of black quartz judge my vow. the five boxing wizards jump quickly.";

/// Builder for hand-made boards in tests.
pub struct GeometryBuilder {
    geom: KeyboardGeometry,
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self {
            geom: KeyboardGeometry {
                keys: BTreeMap::new(),
                slots: vec![],
                layer_modifiers: vec![],
                shift: None,
                fixed: BTreeMap::new(),
            },
        }
    }

    pub fn key(mut self, id: &str, x: f64, y: f64, finger: u8, homing: bool) -> Self {
        self.geom
            .keys
            .insert(id.to_string(), KeyPosition::new(x, y, finger, homing));
        self
    }

    /// Key that is also an assignable slot.
    pub fn slot(self, id: &str, x: f64, y: f64, finger: u8, homing: bool) -> Self {
        let mut b = self.key(id, x, y, finger, homing);
        b.geom.slots.push(id.to_string());
        b
    }

    pub fn modifier(mut self, id: &str) -> Self {
        self.geom.layer_modifiers.push(id.to_string());
        self
    }

    pub fn shift(mut self, id: &str) -> Self {
        self.geom.shift = Some(id.to_string());
        self
    }

    pub fn fixed(mut self, c: char, id: &str) -> Self {
        self.geom.fixed.insert(c, id.to_string());
        self
    }

    pub fn build(self) -> KeyboardGeometry {
        self.geom
    }
}

pub fn dataset(text: &str) -> Dataset {
    Dataset::new("test-corpus", text)
}

pub fn scorer_for(geometry: KeyboardGeometry, text: &str) -> Arc<FitnessScorer> {
    Arc::new(
        FitnessScorer::new(
            geometry,
            &Default::default(),
            DatasetRegistry::with(dataset(text)),
        )
        .expect("valid scorer"),
    )
}

/// Small, seeded, fast configuration on the standard board.
pub fn small_config() -> Config {
    let mut config = Config::default();
    config.search.charset = ALPHA30.to_string();
    config.search.population_size = 6;
    config.search.max_iterations = 3;
    config.search.stagnant_limit = 100;
    config.search.workers = 2;
    config.search.seed = Some(7);
    config
}
