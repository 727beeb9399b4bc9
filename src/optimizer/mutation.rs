use crate::chromosome::{Chromosome, Layer, LayerBounds};
use fastrand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationParams {
    /// Swap probability for upper layers; the base layer gets half.
    pub probability: f64,
    pub layer_change_probability: f64,
    pub bounds: LayerBounds,
}

#[inline(always)]
pub fn swap_mutation(layer: &mut Layer, rng: &mut Rng) {
    let genes = layer.genes_mut();
    let len = genes.len();
    if len < 2 {
        return;
    }
    let i = rng.usize(0..len);
    let mut j = rng.usize(0..len - 1);
    if j >= i {
        j += 1;
    }
    genes.swap(i, j);
}

/// Returns a mutated copy. Layer 0 is swapped but never removed.
pub fn mutate(chromosome: &Chromosome, params: &MutationParams, rng: &mut Rng) -> Chromosome {
    let mut child = chromosome.clone();
    let layers = child.layers_mut();

    for (idx, layer) in layers.iter_mut().enumerate() {
        let p = if idx == 0 {
            params.probability * 0.5
        } else {
            params.probability
        };
        if rng.f64() < p {
            swap_mutation(layer, rng);
        }
    }

    if rng.f64() < params.layer_change_probability {
        let can_add = layers.len() < params.bounds.max;
        let can_remove = layers.len() > params.bounds.min && layers.len() > 1;
        match (can_add, can_remove) {
            (true, true) if rng.bool() => add_layer(layers, rng),
            (true, false) => add_layer(layers, rng),
            (_, true) => {
                let victim = rng.usize(1..layers.len());
                layers.remove(victim);
            }
            _ => {}
        }
    }

    child
}

fn add_layer(layers: &mut Vec<Layer>, rng: &mut Rng) {
    let fresh = layers[0].shuffled(rng);
    layers.push(fresh);
}
