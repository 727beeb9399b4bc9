use crate::chromosome::{CharacterSet, Chromosome};
use crate::individual::{IdAllocator, Individual, Lineage};
use crate::layouts::KnownLayout;
use fastrand::Rng;

/// Builds generation-0 individuals.
///
/// Heuristic seeds come first (each one's layout becomes layer 0, upper layers are
/// shuffled copies), then random chromosomes fill up to `size`.
pub fn initial_population(
    charset: &CharacterSet,
    num_layers: usize,
    size: usize,
    seeds: &[KnownLayout],
    ids: &mut IdAllocator,
    rng: &mut Rng,
) -> Vec<Individual> {
    let mut population = Vec::with_capacity(size);

    for layout in seeds.iter().take(size) {
        let chromosome = Chromosome::from_base(layout.to_layer(charset), num_layers, rng);
        population.push(Individual::new(
            ids.next_id(),
            chromosome,
            0,
            vec![],
            Lineage::Heuristic,
        ));
    }

    while population.len() < size {
        population.push(Individual::new(
            ids.next_id(),
            Chromosome::random(charset, num_layers, rng),
            0,
            vec![],
            Lineage::Random,
        ));
    }

    population
}
