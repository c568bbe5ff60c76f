use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::OsRng;
use rand::RngCore;
use rug::Integer;
use verifiable_delay_function::{
    create_discriminant, evaluate, generator, prove, verify, BinaryQuadraticForm,
};

fn bench_create_discriminant(c: &mut Criterion) {
    let mut group = c.benchmark_group("CreateDiscriminant");

    let mut seed = [0u8; 16];
    OsRng.fill_bytes(&mut seed);

    for &bits in [512u32, 1024].iter() {
        group.bench_with_input(
            BenchmarkId::new("create_discriminant", bits),
            &bits,
            |b, &bits| b.iter(|| create_discriminant::<Integer>(&seed, bits)),
        );
    }

    group.finish();
}

fn bench_squaring(c: &mut Criterion) {
    let mut group = c.benchmark_group("Squaring");

    for &bits in [512u32, 1024, 1827].iter() {
        let discriminant: Integer = create_discriminant(b"benchmark seed", bits).unwrap();
        let input = generator(&discriminant);

        group.bench_with_input(BenchmarkId::new("double", bits), &input, |b, input| {
            b.iter(|| input.double())
        });
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("Evaluate");

    let discriminant: Integer = create_discriminant(b"benchmark seed", 512).unwrap();
    let input = generator(&discriminant);

    for &iterations in [1_000u64, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("evaluate", iterations),
            &iterations,
            |b, &iterations| b.iter(|| evaluate(&discriminant, &input, iterations)),
        );
    }

    group.finish();
}

fn bench_prove(c: &mut Criterion) {
    let mut group = c.benchmark_group("Prove");

    let discriminant: Integer = create_discriminant(b"benchmark seed", 512).unwrap();
    let input = generator(&discriminant);
    let iterations = 10_000u64;

    group.bench_with_input(
        BenchmarkId::new("prove", iterations),
        &iterations,
        |b, &iterations| b.iter(|| prove(&discriminant, &input, iterations)),
    );

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("Verify");

    let discriminant: Integer = create_discriminant(b"benchmark seed", 512).unwrap();
    let input = generator(&discriminant);
    let iterations = 10_000u64;
    let proof = prove(&discriminant, &input, iterations).unwrap();

    group.bench_with_input(
        BenchmarkId::new("verify", iterations),
        &(proof, iterations),
        |b, (proof, iterations)| {
            b.iter(|| verify(&discriminant, &input, &proof.output, &proof.proof, *iterations))
        },
    );

    group.finish();
}

criterion_group!(
    benches,
    bench_create_discriminant,
    bench_squaring,
    bench_evaluate,
    bench_prove,
    bench_verify,
);
criterion_main!(benches);
