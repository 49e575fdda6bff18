use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

use station_stats::generator::write_measurements;
use station_stats::{parse_record, AggregationTable, Engine, EngineConfig, ProgressPolicy};

const ROWS: u64 = 200_000;

fn measurements() -> Vec<u8> {
    let mut data = Vec::new();
    write_measurements(&mut data, ROWS, &mut StdRng::seed_from_u64(1)).unwrap();
    data
}

fn bench_parse(c: &mut Criterion) {
    let data = measurements();
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(ROWS));
    group.bench_function("parse_record", |b| {
        b.iter(|| {
            for line in data.split(|&c| c == b'\n') {
                let _ = black_box(parse_record(line));
            }
        })
    });
    group.bench_function("parse_and_update", |b| {
        b.iter(|| {
            let mut table = AggregationTable::new();
            for line in data.split(|&c| c == b'\n') {
                if let Ok(record) = parse_record(line) {
                    table.update(record.key, record.value);
                }
            }
            black_box(table.len())
        })
    });
    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let data = measurements();
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for buffer_size in [4 * 1024, 64 * 1024, 256 * 1024] {
        group.bench_function(format!("buffer_{}k", buffer_size / 1024), |b| {
            b.iter(|| {
                let config = EngineConfig::default()
                    .with_buffer_size(buffer_size)
                    .with_progress(ProgressPolicy::Disabled);
                let mut engine = Engine::new(config).unwrap();
                black_box(engine.aggregate_reader(&data[..]).unwrap().lines)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_engine);
criterion_main!(benches);
