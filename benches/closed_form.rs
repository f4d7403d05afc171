use criterion::{criterion_group, criterion_main, Criterion};
use selfing_core::algebra::diagonalize;
use selfing_core::{CrossDesign, TransitionSystem};

fn bench_closed_form(c: &mut Criterion) {
    let f1 = CrossDesign::Biparental.founding_population();
    c.bench_function("cycle_biparental_f1_to_f5", |b| {
        b.iter(|| f1.generations(5))
    });

    let four_way = CrossDesign::FourWay.founding_population();
    c.bench_function("cycle_four_way_once", |b| b.iter(|| four_way.cycle()));

    let biparental = TransitionSystem::build(CrossDesign::Biparental).unwrap();
    c.bench_function("diagonalize_biparental", |b| {
        b.iter(|| diagonalize(biparental.transition_matrix()))
    });

    c.bench_function("solve_biparental", |b| b.iter(|| biparental.solve()));

    let system = TransitionSystem::build(CrossDesign::FourWay).unwrap();
    c.bench_function("solve_four_way", |b| b.iter(|| system.solve()));

    let solution = system.solve().unwrap();
    c.bench_function("four_way_probabilities_k20", |b| {
        b.iter(|| solution.genotype_probabilities(20))
    });
}

criterion_group!(benches, bench_closed_form);
criterion_main!(benches);
