use crate::error::{KeyForgeError, KfResult};
use fastrand::Rng;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Ordered set of distinct characters that the search permutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSet {
    chars: Vec<char>,
}

impl CharacterSet {
    pub fn new(chars: impl IntoIterator<Item = char>) -> KfResult<Self> {
        let chars: Vec<char> = chars.into_iter().collect();
        if chars.is_empty() {
            return Err(KeyForgeError::Config("character set is empty".into()));
        }
        let mut seen = HashSet::with_capacity(chars.len());
        for &c in &chars {
            if !seen.insert(c) {
                return Err(KeyForgeError::Config(format!(
                    "character set contains {:?} twice",
                    c
                )));
            }
        }
        Ok(Self { chars })
    }

    pub fn parse(s: &str) -> KfResult<Self> {
        Self::new(s.chars())
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    /// Fewest layers able to place every character on `slot_count` keys.
    pub fn min_layers(&self, slot_count: usize) -> usize {
        if slot_count == 0 {
            return usize::MAX;
        }
        self.chars.len().div_ceil(slot_count).max(1)
    }
}

/// One permutation of the character set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layer(Vec<char>);

impl Layer {
    /// Builds a layer, checking it is a permutation of `charset`.
    pub fn new(genes: Vec<char>, charset: &CharacterSet) -> KfResult<Self> {
        let layer = Layer(genes);
        layer.check(charset)?;
        Ok(layer)
    }

    pub fn identity(charset: &CharacterSet) -> Self {
        Layer(charset.chars().to_vec())
    }

    pub fn random(charset: &CharacterSet, rng: &mut Rng) -> Self {
        let mut genes = charset.chars().to_vec();
        rng.shuffle(&mut genes);
        Layer(genes)
    }

    /// Wraps genes produced by a permutation-preserving operator.
    pub(crate) fn from_genes_unchecked(genes: Vec<char>) -> Self {
        Layer(genes)
    }

    pub fn genes(&self) -> &[char] {
        &self.0
    }

    pub(crate) fn genes_mut(&mut self) -> &mut [char] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn shuffled(&self, rng: &mut Rng) -> Self {
        let mut genes = self.0.clone();
        rng.shuffle(&mut genes);
        Layer(genes)
    }

    pub fn is_permutation_of(&self, charset: &CharacterSet) -> bool {
        self.check(charset).is_ok()
    }

    fn check(&self, charset: &CharacterSet) -> KfResult<()> {
        if self.0.len() != charset.len() {
            return Err(KeyForgeError::InvalidChromosome(format!(
                "layer has {} genes, character set has {}",
                self.0.len(),
                charset.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.0.len());
        for &c in &self.0 {
            if !charset.contains(c) {
                return Err(KeyForgeError::InvalidChromosome(format!(
                    "layer contains {:?} outside the character set",
                    c
                )));
            }
            if !seen.insert(c) {
                return Err(KeyForgeError::InvalidChromosome(format!(
                    "layer contains {:?} twice",
                    c
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join(""))
    }
}

/// Layer-count bounds a chromosome must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerBounds {
    pub min: usize,
    pub max: usize,
}

impl LayerBounds {
    pub fn new(min: usize, max: usize) -> KfResult<Self> {
        if min == 0 || min > max {
            return Err(KeyForgeError::Config(format!(
                "invalid layer bounds: min {} max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }
}

/// Full genetic encoding of one layout. Layer 0 is the permanent base layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chromosome {
    layers: Vec<Layer>,
}

impl Chromosome {
    pub fn new(layers: Vec<Layer>, charset: &CharacterSet, bounds: LayerBounds) -> KfResult<Self> {
        let chromosome = Chromosome { layers };
        chromosome.validate(charset, bounds)?;
        Ok(chromosome)
    }

    pub fn single(base: Layer) -> Self {
        Chromosome { layers: vec![base] }
    }

    /// Assembles layers produced by the genetic operators; callers keep the invariants.
    pub(crate) fn from_layers_unchecked(layers: Vec<Layer>) -> Self {
        debug_assert!(!layers.is_empty());
        Chromosome { layers }
    }

    pub fn random(
        charset: &CharacterSet,
        num_layers: usize,
        rng: &mut Rng,
    ) -> Self {
        let layers = (0..num_layers.max(1))
            .map(|_| Layer::random(charset, rng))
            .collect();
        Chromosome { layers }
    }

    /// Base layer followed by shuffled copies of it.
    pub fn from_base(base: Layer, num_layers: usize, rng: &mut Rng) -> Self {
        let mut layers = Vec::with_capacity(num_layers.max(1));
        for _ in 1..num_layers.max(1) {
            layers.push(base.shuffled(rng));
        }
        layers.insert(0, base);
        Chromosome { layers }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut Vec<Layer> {
        &mut self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Single-layer view for callers that predate multi-layer chromosomes.
    pub fn base(&self) -> &Layer {
        &self.layers[0]
    }

    pub fn validate(&self, charset: &CharacterSet, bounds: LayerBounds) -> KfResult<()> {
        if !bounds.contains(self.layers.len()) {
            return Err(KeyForgeError::InvalidChromosome(format!(
                "{} layers outside allowed range {}..={}",
                self.layers.len(),
                bounds.min,
                bounds.max
            )));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer.check(charset).map_err(|e| {
                KeyForgeError::InvalidChromosome(format!("layer {}: {}", i, e))
            })?;
        }
        Ok(())
    }

    /// Checks every layer permutes the same characters as the base layer.
    /// Used where the configured character set is not at hand.
    pub fn check_shape(&self) -> KfResult<()> {
        let base = self.layers.first().ok_or_else(|| {
            KeyForgeError::InvalidChromosome("chromosome has no layers".into())
        })?;
        let charset = CharacterSet::new(base.genes().iter().copied())
            .map_err(|e| KeyForgeError::InvalidChromosome(format!("base layer: {}", e)))?;
        for (i, layer) in self.layers.iter().enumerate().skip(1) {
            layer.check(&charset).map_err(|e| {
                KeyForgeError::InvalidChromosome(format!("layer {}: {}", i, e))
            })?;
        }
        Ok(())
    }

    /// Stable serialization used for fingerprints and persistence.
    pub fn canonical_string(&self) -> String {
        self.layers.iter().map(|l| l.to_string()).join("\u{1f}")
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.layers.iter().join(" | "))
    }
}
