use bencher::{binary_payload, TestGroup};
use bmc_http::codec::{decode_base64, encoded_size, Base64Encoder};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tokio_util::bytes::BytesMut;

const CHUNK_SIZE: usize = 4096;

fn benchmark_base64_encoder(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("base64_encoder");

    for test_group in [TestGroup::Small, TestGroup::Normal, TestGroup::Large] {
        let input = binary_payload(test_group.part_size());
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{test_group:?}")), &input, |b, input| {
            b.iter_batched_ref(
                || BytesMut::with_capacity(encoded_size(input.len() as u64) as usize),
                |dst| {
                    let mut encoder = Base64Encoder::new();
                    for chunk in input.chunks(CHUNK_SIZE) {
                        encoder.encode(chunk, dst);
                    }
                    encoder.finalize(dst);
                    black_box(dst);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_base64_decoder(criterion: &mut Criterion) {
    let input = binary_payload(TestGroup::Normal.part_size());
    let mut encoded = BytesMut::new();
    let mut encoder = Base64Encoder::new();
    encoder.encode(&input, &mut encoded);
    encoder.finalize(&mut encoded);

    let mut group = criterion.benchmark_group("base64_decoder");
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("normal", |b| {
        b.iter_batched_ref(
            || BytesMut::with_capacity(input.len()),
            |dst| {
                decode_base64(black_box(&encoded), dst).expect("encoder output should decode");
                black_box(dst);
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(base64, benchmark_base64_encoder, benchmark_base64_decoder);
criterion_main!(base64);
