use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use narrafuse::{
    collect, select_default, Entity, EntityType, MergePlanBuilder, MergeSelection, NameScorer,
    SpanishNameScorer,
};

fn make_entities(count: usize) -> Vec<Entity> {
    (0..count)
        .map(|i| {
            Entity::new(format!("Personaje Número{i}"), EntityType::Character)
                .with_alias(format!("el personaje {i}"))
                .with_alias(format!("Alias Largo Del Personaje {i}"))
                .with_mentions(i as u64)
        })
        .collect()
}

fn bench_collect(c: &mut Criterion) {
    let entities = make_entities(64);
    let mut group = c.benchmark_group("collect");
    group.throughput(Throughput::Elements(64));
    group.bench_function("collect/64_entities", |b| {
        b.iter(|| collect(std::hint::black_box(&entities)));
    });
    group.finish();
}

fn bench_score(c: &mut Criterion) {
    let scorer = SpanishNameScorer;
    c.bench_function("score/mixed_names", |b| {
        b.iter(|| {
            std::hint::black_box(scorer.score("Juan Pérez"))
                + std::hint::black_box(scorer.score("la mujer morena"))
                + std::hint::black_box(scorer.score("Capitán"))
        });
    });
}

fn bench_build_plan(c: &mut Criterion) {
    let entities = make_entities(16);
    let candidates = collect(&entities);
    let mut selection = MergeSelection::with_entities(entities.iter().map(|e| e.id));
    let default = select_default(&candidates, &SpanishNameScorer).unwrap();
    selection.set_primary_name(default.value.clone());

    c.bench_function("plan/build_16_entities", |b| {
        b.iter(|| {
            MergePlanBuilder::new()
                .selection(std::hint::black_box(&selection))
                .entities(&entities)
                .candidates(&candidates)
                .build()
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_collect, bench_score, bench_build_plan);
criterion_main!(benches);
