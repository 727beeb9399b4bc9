mod common;

use common::ALPHA30;
use fastrand::Rng;
use keyforge_evolve::chromosome::{CharacterSet, Chromosome, LayerBounds};
use keyforge_evolve::config::SimulationParams;
use keyforge_evolve::geometry::KeyboardGeometry;
use keyforge_evolve::keymap::CharacterMapping;
use keyforge_evolve::optimizer::crossover::crossover;
use keyforge_evolve::optimizer::mutation::{mutate, MutationParams};
use keyforge_evolve::scorer::TypingSimulator;
use proptest::prelude::*;

fn charset() -> CharacterSet {
    CharacterSet::parse(ALPHA30).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_crossover_always_yields_permutations(
        seed in any::<u64>(),
        bias in 0.0f64..=1.0,
        layers_a in 1usize..=3,
        layers_b in 1usize..=3,
    ) {
        let cs = charset();
        let mut rng = Rng::with_seed(seed);
        let a = Chromosome::random(&cs, layers_a, &mut rng);
        let b = Chromosome::random(&cs, layers_b, &mut rng);

        let child = crossover(&a, &b, bias, &mut rng);
        prop_assert_eq!(child.layer_count(), layers_a.max(layers_b));
        for layer in child.layers() {
            prop_assert!(layer.is_permutation_of(&cs));
        }
    }

    #[test]
    fn test_mutation_respects_layer_bounds(
        seed in any::<u64>(),
        start in 1usize..=3,
        probability in 0.0f64..=1.0,
    ) {
        let cs = charset();
        let bounds = LayerBounds::new(1, 3).unwrap();
        let params = MutationParams {
            probability,
            layer_change_probability: 1.0,
            bounds,
        };
        let mut rng = Rng::with_seed(seed);
        let mut current = Chromosome::random(&cs, start, &mut rng);
        let base_len = current.base().len();

        for _ in 0..10 {
            current = mutate(&current, &params, &mut rng);
            prop_assert!(current.validate(&cs, bounds).is_ok());
            prop_assert_eq!(current.base().len(), base_len);
        }
    }

    #[test]
    fn test_simulation_is_pure(seed in any::<u64>(), text in "[a-z ,.;/A-Z]{0,200}") {
        let geom = KeyboardGeometry::standard();
        let mut rng = Rng::with_seed(seed);
        let chromosome = Chromosome::random(&charset(), 1, &mut rng);
        let map = CharacterMapping::build(&chromosome, &geom).unwrap();
        let sim = TypingSimulator::new(&SimulationParams::default()).unwrap();

        let first = sim.simulate(&text, &map, &geom);
        let second = sim.simulate(&text, &map, &geom);
        prop_assert_eq!(first, second);
        prop_assert!(first.distance >= 0.0 && first.distance.is_finite());
        prop_assert!(first.time >= 0.0 && first.time.is_finite());
    }
}
