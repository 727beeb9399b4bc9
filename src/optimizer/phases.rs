use serde::{Deserialize, Serialize};

/// `iterations` generations run with at most `max_population` individuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub iterations: usize,
    pub max_population: usize,
}

impl Phase {
    pub fn new(iterations: usize, max_population: usize) -> Self {
        Self {
            iterations,
            max_population,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSchedule {
    phases: Vec<Phase>,
}

impl PhaseSchedule {
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn total_iterations(&self) -> usize {
        self.phases.iter().map(|p| p.iterations).sum()
    }

    /// Iteration-weighted mean population. Reporting only.
    pub fn average_population(&self) -> f64 {
        let total = self.total_iterations();
        if total == 0 {
            return 0.0;
        }
        let weighted: usize = self
            .phases
            .iter()
            .map(|p| p.iterations * p.max_population)
            .sum();
        weighted as f64 / total as f64
    }

    /// Phase index covering 1-based `generation`, or `None` once exhausted.
    pub fn phase_index(&self, generation: usize) -> Option<usize> {
        let mut end = 0;
        for (i, p) in self.phases.iter().enumerate() {
            end += p.iterations;
            if generation >= 1 && generation <= end {
                return Some(i);
            }
        }
        None
    }

    pub fn population_for(&self, generation: usize) -> Option<usize> {
        self.phase_index(generation)
            .map(|i| self.phases[i].max_population)
    }

    /// Size of the initial population.
    pub fn initial_population(&self) -> usize {
        self.phases.first().map_or(0, |p| p.max_population)
    }

    /// Extends the schedule by `extra` generations at the final phase's size.
    pub fn extended(&self, extra: usize, population: usize) -> Self {
        let mut phases = self.phases.clone();
        if extra > 0 {
            phases.push(Phase::new(extra, population));
        }
        Self { phases }
    }
}
