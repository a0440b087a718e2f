use bmc_http::codec::encode_body;
use bmc_http::protocol::body::{BodyWriter, EncodingType, HttpBody, read_body};
use bytes::{Bytes, BytesMut};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use http_body_util::Full;
use std::hint::black_box;
use std::io::Write;
use tempfile::NamedTempFile;

const FILE_SIZE: usize = 1024 * 1024;

fn create_file(size: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file should be created");
    let content: Vec<u8> = (0..=255u8).cycle().take(size).collect();
    file.write_all(&content).expect("temp file should be writable");
    file
}

fn benchmark_file_writer(c: &mut Criterion) {
    let file = create_file(FILE_SIZE);
    let mut group = c.benchmark_group("file_body_writer");
    group.throughput(Throughput::Bytes(FILE_SIZE as u64));

    for encoding in [EncodingType::Raw, EncodingType::Base64] {
        for max_size in [1000, 4096] {
            let id = BenchmarkId::new(format!("{encoding:?}"), max_size);
            group.bench_with_input(id, &max_size, |b, &max_size| {
                b.iter_batched(
                    || {
                        let mut body = HttpBody::with_encoding(encoding);
                        body.open(file.path()).expect("temp file should open");
                        BodyWriter::new(body)
                    },
                    |mut writer| {
                        let mut total = 0;
                        loop {
                            let (chunk, has_more) = writer.get_with_max_size(max_size).expect("file should be readable");
                            total += black_box(chunk).len();
                            if !has_more {
                                break;
                            }
                        }
                        total
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }

    group.finish();
}

fn benchmark_chunked_framing(c: &mut Criterion) {
    let content = Bytes::from(vec![b'a'; FILE_SIZE]);
    let mut group = c.benchmark_group("encode_body");
    group.throughput(Throughput::Bytes(FILE_SIZE as u64));

    group.bench_function("in_memory", |b| {
        b.iter_batched(
            || (BodyWriter::new(HttpBody::from(content.clone())), BytesMut::with_capacity(FILE_SIZE)),
            |(mut writer, mut dst)| {
                encode_body(&mut writer, 4096, &mut dst).expect("in-memory body should encode");
                dst
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_read_body(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime should build");
    let content = Bytes::from(vec![b'a'; FILE_SIZE]);

    let mut group = c.benchmark_group("read_body");
    group.throughput(Throughput::Bytes(FILE_SIZE as u64));
    group.bench_function("full", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut dst = HttpBody::new();
            read_body(Full::new(content.clone()), &mut dst).await.expect("full body should read");
            dst
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_file_writer, benchmark_chunked_framing, benchmark_read_body);
criterion_main!(benches);
