//! 레코드/설정 벤치마크
//!
//! RawRecord 생성, 본문 조회, 직렬화와 설정 파싱 성능을 측정합니다.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sluice_core::config::SluiceConfig;
use sluice_core::types::RawRecord;

fn create_record() -> RawRecord {
    RawRecord::new()
        .with("priority", 34)
        .with("facility", 4)
        .with("severity", 2)
        .with("timestamp", "2024-01-15T12:00:00Z")
        .with("hostname", "web-server-01")
        .with("tag", "sshd")
        .with("client", "192.168.1.100:51234")
        .with("tls_peer", "")
        .with(
            "content",
            "Failed password for root from 192.168.1.100 port 22 ssh2",
        )
}

fn bench_record(c: &mut Criterion) {
    let record = create_record();

    let mut group = c.benchmark_group("raw_record");
    group.throughput(Throughput::Elements(1));

    group.bench_function("create", |b| b.iter(|| black_box(create_record())));

    group.bench_function("body", |b| {
        b.iter(|| black_box(record.body().map(str::len)))
    });

    group.bench_function("serialize", |b| {
        b.iter(|| black_box(serde_json::to_vec(&record).map(|v| v.len())))
    });

    group.finish();
}

fn bench_config(c: &mut Criterion) {
    let toml = include_str!("../../../sluice.toml.example");

    let mut group = c.benchmark_group("config");
    group.bench_function("parse_example", |b| {
        b.iter(|| black_box(SluiceConfig::parse(black_box(toml)).is_ok()))
    });
    group.finish();
}

criterion_group!(benches, bench_record, bench_config);
criterion_main!(benches);
