use crate::chromosome::Chromosome;
use crate::scorer::FitnessResult;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Lineage {
    /// Descends from a known layout.
    Heuristic,
    Random,
}

impl Lineage {
    pub fn inherit(a: Lineage, b: Lineage) -> Lineage {
        if a == Lineage::Heuristic || b == Lineage::Heuristic {
            Lineage::Heuristic
        } else {
            Lineage::Random
        }
    }
}

/// A chromosome with its identity, ancestry and (once evaluated) fitness.
///
/// Fitness is write-once: [`Individual::scored`] consumes an unscored individual,
/// and the genetic operators always build fresh individuals from chromosomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    id: u64,
    chromosome: Chromosome,
    #[serde(default)]
    result: Option<FitnessResult>,
    generation: usize,
    #[serde(default)]
    parents: Vec<u64>,
    lineage: Lineage,
}

impl Individual {
    pub fn new(
        id: u64,
        chromosome: Chromosome,
        generation: usize,
        parents: Vec<u64>,
        lineage: Lineage,
    ) -> Self {
        Self {
            id,
            chromosome,
            result: None,
            generation,
            parents,
            lineage,
        }
    }

    /// Attaches a fitness. Already-scored individuals are returned unchanged.
    pub fn scored(mut self, result: FitnessResult) -> Self {
        if self.result.is_none() {
            self.result = Some(result);
        }
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn parents(&self) -> &[u64] {
        &self.parents
    }

    pub fn lineage(&self) -> Lineage {
        self.lineage
    }

    pub fn result(&self) -> Option<&FitnessResult> {
        self.result.as_ref()
    }

    pub fn is_scored(&self) -> bool {
        self.result.is_some()
    }

    pub fn fitness(&self) -> Option<f64> {
        self.result.map(|r| r.fitness)
    }

    pub fn distance(&self) -> Option<f64> {
        self.result.map(|r| r.distance)
    }

    pub fn time(&self) -> Option<f64> {
        self.result.map(|r| r.time)
    }

    /// Fitness for ranking; unscored individuals rank last.
    #[inline]
    pub fn rank_key(&self) -> f64 {
        self.fitness().unwrap_or(f64::INFINITY)
    }

    pub fn cmp_fitness(&self, other: &Self) -> Ordering {
        self.rank_key()
            .total_cmp(&other.rank_key())
            .then(self.id.cmp(&other.id))
    }
}

/// Hands out unique, increasing individual ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Continues after the largest id already in use.
    pub fn resume_after(max_id: Option<u64>) -> Self {
        Self {
            next: max_id.map_or(0, |m| m + 1),
        }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}
