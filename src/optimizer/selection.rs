use crate::individual::Individual;
use fastrand::Rng;

/// k-ary tournament: `k` distinct contestants, lowest fitness wins.
pub fn tournament<'a>(population: &'a [Individual], k: usize, rng: &mut Rng) -> &'a Individual {
    let n = population.len();
    debug_assert!(n > 0);
    let k = k.clamp(1, n);

    // Partial Fisher-Yates over indices gives draws without replacement.
    let mut idx: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.usize(i..n);
        idx.swap(i, j);
    }

    idx[..k]
        .iter()
        .map(|&i| &population[i])
        .min_by(|a, b| a.cmp_fitness(b))
        .unwrap_or(&population[0])
}

/// Fills a parent pool of `count` by repeated tournaments.
pub fn select_parents<'a>(
    population: &'a [Individual],
    count: usize,
    k: usize,
    rng: &mut Rng,
) -> Vec<&'a Individual> {
    if population.is_empty() {
        return Vec::new();
    }
    (0..count).map(|_| tournament(population, k, rng)).collect()
}

/// Elitist survivors: merge, sort ascending, keep the best `size`.
pub fn elitism(parents: Vec<Individual>, offspring: Vec<Individual>, size: usize) -> Vec<Individual> {
    let mut merged = parents;
    merged.extend(offspring);
    merged.sort_by(|a, b| a.cmp_fitness(b));
    merged.truncate(size);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::{CharacterSet, Chromosome, Layer};
    use crate::individual::Lineage;
    use crate::scorer::FitnessResult;

    fn pop(fits: &[f64]) -> Vec<Individual> {
        let cs = CharacterSet::parse("ab").unwrap();
        fits.iter()
            .enumerate()
            .map(|(i, &f)| {
                Individual::new(
                    i as u64,
                    Chromosome::single(Layer::identity(&cs)),
                    0,
                    vec![],
                    Lineage::Random,
                )
                .scored(FitnessResult {
                    fitness: f,
                    distance: f,
                    time: f,
                })
            })
            .collect()
    }

    #[test]
    fn full_tournament_picks_best() {
        let p = pop(&[3.0, 1.0, 2.0]);
        let mut rng = Rng::with_seed(1);
        for _ in 0..10 {
            assert_eq!(tournament(&p, 3, &mut rng).id(), 1);
        }
    }

    #[test]
    fn infinite_fitness_never_survives_elitism() {
        let parents = pop(&[0.5, f64::INFINITY]);
        let offspring = pop(&[0.7, 0.1]);
        let kept = elitism(parents, offspring, 2);
        let fits: Vec<f64> = kept.iter().filter_map(|i| i.fitness()).collect();
        assert_eq!(fits, vec![0.1, 0.5]);
    }
}
