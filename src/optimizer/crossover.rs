use crate::chromosome::{Chromosome, Layer};
use crate::individual::Individual;
use fastrand::Rng;
use fnv::FnvHashSet;

/// Biased uniform crossover of two permutations.
///
/// Each position takes the fitter parent's gene with probability `bias`, else the
/// other parent's, unless that gene is already used. Remaining holes are filled in
/// the other parent's order with the genes not yet placed.
pub fn crossover_layer(fitter: &Layer, other: &Layer, bias: f64, rng: &mut Rng) -> Layer {
    let a = fitter.genes();
    let b = other.genes();
    let len = a.len();
    let mut child: Vec<Option<char>> = vec![None; len];
    let mut used: FnvHashSet<char> = FnvHashSet::default();
    used.reserve(len);

    for i in 0..len {
        let source = if rng.f64() < bias { a } else { b };
        if let Some(&gene) = source.get(i) {
            if used.insert(gene) {
                child[i] = Some(gene);
            }
        }
    }

    // Fill gaps from the other parent, then the fitter one in case the sets differ.
    let mut donors = b.iter().chain(a.iter()).copied();
    let genes = child
        .into_iter()
        .map(|slot| match slot {
            Some(g) => g,
            None => donors
                .by_ref()
                .find(|g| used.insert(*g))
                .unwrap_or_default(),
        })
        .collect();

    Layer::from_genes_unchecked(genes)
}

/// One offspring chromosome.
///
/// Layers both parents have are crossed; upper layers only the longer parent has
/// are copied from it as they are.
pub fn crossover(
    fitter: &Chromosome,
    other: &Chromosome,
    bias: f64,
    rng: &mut Rng,
) -> Chromosome {
    let (fl, ol) = (fitter.layers(), other.layers());
    let common = fl.len().min(ol.len());

    let mut layers: Vec<Layer> = fl
        .iter()
        .zip(ol.iter())
        .map(|(f, o)| crossover_layer(f, o, bias, rng))
        .collect();

    let longer = if fl.len() >= ol.len() { fl } else { ol };
    layers.extend(longer[common..].iter().cloned());

    Chromosome::from_layers_unchecked(layers)
}

/// `count` offspring chromosomes of two scored parents, biased toward the fitter one.
pub fn breed(
    a: &Individual,
    b: &Individual,
    count: usize,
    bias: f64,
    rng: &mut Rng,
) -> Vec<Chromosome> {
    let (fitter, other) = if b.rank_key() < a.rank_key() {
        (b, a)
    } else {
        (a, b)
    };
    (0..count)
        .map(|_| crossover(fitter.chromosome(), other.chromosome(), bias, rng))
        .collect()
}
