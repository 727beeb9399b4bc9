use criterion::{criterion_group, criterion_main, Criterion};
use fastrand::Rng;
use keyforge_evolve::chromosome::{CharacterSet, Chromosome, Layer, LayerBounds};
use keyforge_evolve::config::SimulationParams;
use keyforge_evolve::geometry::KeyboardGeometry;
use keyforge_evolve::keymap::CharacterMapping;
use keyforge_evolve::optimizer::crossover::crossover;
use keyforge_evolve::optimizer::mutation::{mutate, MutationParams};
use keyforge_evolve::scorer::TypingSimulator;
use std::hint::black_box;

const PANGRAMS: &str = "The quick brown fox jumps over the lazy dog. \
    Pack my box with five dozen liquor jugs; how vexingly quick daft zebras jump, \
    sphinx of black quartz, judge my vow. ";

fn corpus() -> String {
    PANGRAMS.repeat(200)
}

fn criterion_benchmark(c: &mut Criterion) {
    let geom = KeyboardGeometry::standard();
    let cs = CharacterSet::parse("qwertyuiopasdfghjkl;zxcvbnm,./").unwrap();
    let qwerty = Chromosome::single(Layer::identity(&cs));
    let map = CharacterMapping::build(&qwerty, &geom).unwrap();
    let sim = TypingSimulator::new(&SimulationParams::default()).unwrap();
    let text = corpus();

    c.bench_function("simulate (qwerty, ~30k chars)", |b| {
        b.iter(|| sim.simulate(black_box(&text), black_box(&map), black_box(&geom)))
    });

    c.bench_function("build mapping (2 layers)", |b| {
        let mut rng = Rng::with_seed(1);
        let two = Chromosome::random(&cs, 2, &mut rng);
        b.iter(|| CharacterMapping::build(black_box(&two), black_box(&geom)))
    });

    let params = MutationParams {
        probability: 0.3,
        layer_change_probability: 0.01,
        bounds: LayerBounds::new(1, 3).unwrap(),
    };
    c.bench_function("crossover + mutate", |b| {
        let mut rng = Rng::with_seed(7);
        let a = Chromosome::random(&cs, 2, &mut rng);
        let other = Chromosome::random(&cs, 3, &mut rng);
        b.iter(|| {
            let child = crossover(black_box(&a), black_box(&other), 0.75, &mut rng);
            mutate(&child, &params, &mut rng)
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
