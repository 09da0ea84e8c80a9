use criterion::{criterion_group, criterion_main, Criterion};
use taggable_array::{
    to_tagged_buffer, CopyQueue, DType, HostBuffer, Tag, TagSet, Taggable, TaggedBuffer,
};

fn bench_tagging(c: &mut Criterion) {
    let plain = HostBuffer::zeros([64, 64, 8], DType::F64).unwrap();
    let tagged = to_tagged_buffer(&plain, None, TagSet::from(Tag::new("scratch"))).unwrap();

    let mut group = c.benchmark_group("tagged buffer");

    group.bench_function("lift with default axes", |b| {
        b.iter(|| to_tagged_buffer(&plain, None, TagSet::default()))
    });

    group.bench_function("untagged", |b| {
        b.iter(|| TaggedBuffer::untagged(plain.clone()))
    });

    group.bench_function("tag whole array", |b| {
        b.iter(|| tagged.tagged([Tag::new("boundary")]))
    });

    group.bench_function("tag axis", |b| {
        b.iter(|| tagged.with_tagged_axis(1, [Tag::new("reduction")]))
    });

    group.bench_function("data copy", |b| b.iter(|| tagged.copy_to(CopyQueue::Inherit)));

    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().noise_threshold(0.05);
    targets = bench_tagging
);
criterion_main!(benches);
